use parley_client::{LinkCommand, OfferOutcome, PeerTransport, SignalingState};
use parley_core::{PeerId, Role};

use crate::integration::init_tracing;
use crate::utils::{Call, LinkFixture};

/// Link `x` (local `x_id`) and link `y` (local `y_id`) offer to each other
/// at once. `x_first` picks which of them receives the other's offer first;
/// the outcome must depend only on the identities.
async fn run_glare(x_id: &str, y_id: &str, x_first: bool) -> (LinkFixture, LinkFixture) {
    let mut x = LinkFixture::new(x_id, y_id);
    let mut y = LinkFixture::new(y_id, x_id);

    x.link.handle_command(LinkCommand::Negotiate).await;
    y.link.handle_command(LinkCommand::Negotiate).await;

    let offer_from_x = x.take_signals().remove(0).signal;
    let offer_from_y = y.take_signals().remove(0).signal;

    if x_first {
        x.link.handle_command(LinkCommand::Remote(offer_from_y)).await;
        y.link.handle_command(LinkCommand::Remote(offer_from_x)).await;
    } else {
        y.link.handle_command(LinkCommand::Remote(offer_from_x)).await;
        x.link.handle_command(LinkCommand::Remote(offer_from_y)).await;
    }

    let (impolite, polite) = if x.link.role() == Role::Impolite {
        (&mut x, &mut y)
    } else {
        (&mut y, &mut x)
    };

    let from_polite = polite.take_signals();
    assert_eq!(from_polite.len(), 1, "polite side answers exactly once");
    let answer = from_polite[0].signal.clone();
    assert!(answer.answer.is_some());
    assert!(impolite.take_signals().is_empty(), "impolite side never answers");

    impolite.link.handle_command(LinkCommand::Remote(answer)).await;

    (x, y)
}

fn rolled_back(fx: &LinkFixture) -> bool {
    fx.transport.calls().contains(&Call::Rollback)
}

#[tokio::test]
async fn test_roles_follow_identity_order() {
    let a = LinkFixture::new("a", "b");
    let b = LinkFixture::new("b", "a");

    assert_eq!(a.link.role(), Role::Impolite);
    assert_eq!(b.link.role(), Role::Polite);
    assert_ne!(
        Role::for_pair(&PeerId::from("a"), &PeerId::from("b")),
        Role::for_pair(&PeerId::from("b"), &PeerId::from("a"))
    );
}

#[tokio::test]
async fn test_glare_low_identity_receives_first() {
    init_tracing();

    let (a, b) = run_glare("a", "b", true).await;

    assert!(!rolled_back(&a));
    assert!(rolled_back(&b));
    assert_eq!(a.transport.signaling_state(), SignalingState::Stable);
    assert_eq!(b.transport.signaling_state(), SignalingState::Stable);
    assert_eq!(
        b.transport.remote_description().map(|d| d.sdp),
        Some("offer-to-b-1".to_owned())
    );
}

#[tokio::test]
async fn test_glare_high_identity_receives_first() {
    init_tracing();

    let (a, b) = run_glare("a", "b", false).await;

    assert!(!rolled_back(&a));
    assert!(rolled_back(&b));
    assert_eq!(a.transport.signaling_state(), SignalingState::Stable);
    assert_eq!(b.transport.signaling_state(), SignalingState::Stable);
    assert_eq!(
        a.transport.remote_description().map(|d| d.sdp),
        Some("answer-to-a".to_owned())
    );
}

#[tokio::test]
async fn test_glare_outcomes_swap_with_identities() {
    init_tracing();

    for x_first in [true, false] {
        let (x, y) = run_glare("a", "b", x_first).await;
        assert!(!rolled_back(&x), "lower identity keeps its offer");
        assert!(rolled_back(&y));
        assert_eq!(
            y.transport.remote_description().map(|d| d.sdp),
            Some("offer-to-b-1".to_owned())
        );

        let (x, y) = run_glare("b", "a", x_first).await;
        assert!(rolled_back(&x), "higher identity yields");
        assert!(!rolled_back(&y));
        assert_eq!(
            x.transport.remote_description().map(|d| d.sdp),
            Some("offer-to-b-1".to_owned())
        );
        assert_eq!(
            y.transport.remote_description().map(|d| d.sdp),
            Some("answer-to-a".to_owned())
        );

        for fx in [&x, &y] {
            assert_eq!(fx.transport.signaling_state(), SignalingState::Stable);
        }
    }
}

#[tokio::test]
async fn test_offer_outcomes() {
    init_tracing();

    let mut a = LinkFixture::new("a", "b");
    let mut b = LinkFixture::new("b", "a");

    a.link.handle_command(LinkCommand::Negotiate).await;
    b.link.handle_command(LinkCommand::Negotiate).await;
    let offer_from_a = a.take_signals().remove(0).signal.offer.unwrap();
    let offer_from_b = b.take_signals().remove(0).signal.offer.unwrap();

    assert_eq!(
        a.link.accept_offer(offer_from_b).await.unwrap(),
        OfferOutcome::Ignored
    );
    assert_eq!(
        b.link.accept_offer(offer_from_a.clone()).await.unwrap(),
        OfferOutcome::RolledBack
    );

    let mut c = LinkFixture::new("c", "a");
    assert_eq!(
        c.link.accept_offer(offer_from_a).await.unwrap(),
        OfferOutcome::Answered
    );
}
