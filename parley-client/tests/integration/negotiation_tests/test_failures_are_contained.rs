use parley_client::{LinkCommand, PeerTransport, SignalingState};
use parley_core::{PeerId, SessionDescription, SignalPayload};

use crate::integration::init_tracing;
use crate::utils::LinkFixture;

#[tokio::test]
async fn test_failed_offer_clears_making_offer() {
    init_tracing();

    let mut a = LinkFixture::new("a", "b");
    a.transport.fail_offers(true);

    a.link.handle_command(LinkCommand::Negotiate).await;

    assert!(!a.link.is_making_offer());
    assert!(a.sink.offers_to(&PeerId::from("b")).await.is_empty());

    a.transport.fail_offers(false);
    a.link.handle_command(LinkCommand::Negotiate).await;
    assert_eq!(a.sink.offers_to(&PeerId::from("b")).await.len(), 1);
}

#[tokio::test]
async fn test_unexpected_answer_is_logged_not_fatal() {
    init_tracing();

    let mut b = LinkFixture::new("b", "a");

    // Stable link: an answer has nothing to complete.
    b.link
        .handle_command(LinkCommand::Remote(SignalPayload::answer(
            SessionDescription::answer("stray"),
        )))
        .await;
    assert_eq!(b.transport.signaling_state(), SignalingState::Stable);

    b.link
        .handle_command(LinkCommand::Remote(SignalPayload::offer(
            SessionDescription::offer("offer-from-a"),
        )))
        .await;

    assert_eq!(b.sink.answers_to(&PeerId::from("a")).await.len(), 1);
    assert_eq!(b.transport.signaling_state(), SignalingState::Stable);
}
