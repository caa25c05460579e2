use parley_core::{IceCandidate, PeerId, RelayMessage, SessionDescription, SignalPayload};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, test_service};

#[tokio::test]
async fn test_signal_reaches_only_target() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", Some("alice"));
    let mut b = TestPeer::join(&service, "r1", Some("bob"));
    let mut c = TestPeer::join(&service, "r1", None);
    a.drain();
    b.drain();

    let signal = SignalPayload::offer(SessionDescription::offer("v=0 offer-from-a"));
    service
        .on_signal(&a.peer_id, &b.peer_id, signal.clone())
        .expect("signal rejected");

    assert_eq!(
        b.drain(),
        vec![RelayMessage::Signal {
            sender: a.peer_id.clone(),
            sender_display_name: Some("alice".into()),
            signal,
        }]
    );
    assert!(a.drain().is_empty());
    assert!(c.drain().is_empty());
}

#[tokio::test]
async fn test_signal_to_unknown_target_is_dropped() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", None);
    let mut b = TestPeer::join(&service, "r1", None);
    a.drain();

    let res = service.on_signal(
        &a.peer_id,
        &PeerId::from("nobody"),
        SignalPayload::candidate(IceCandidate::new("candidate:1")),
    );

    assert!(res.is_ok(), "Routing misses are not reported to the sender");
    assert!(a.drain().is_empty());
    assert!(b.drain().is_empty());
}

#[tokio::test]
async fn test_signals_keep_sender_order() {
    init_tracing();

    let service = test_service();

    let a = TestPeer::join(&service, "r1", None);
    let mut b = TestPeer::join(&service, "r1", None);

    for i in 0..10 {
        let candidate = IceCandidate::new(format!("candidate:{i}"));
        service
            .on_signal(&a.peer_id, &b.peer_id, SignalPayload::candidate(candidate))
            .unwrap();
    }

    let order: Vec<String> = b
        .drain()
        .into_iter()
        .filter_map(|msg| match msg {
            RelayMessage::Signal { signal, .. } => signal.candidate.map(|c| c.candidate),
            _ => None,
        })
        .collect();

    let expected: Vec<String> = (0..10).map(|i| format!("candidate:{i}")).collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_signal_works_without_shared_room() {
    init_tracing();

    let service = test_service();

    let a = TestPeer::connect(&service);
    let mut b = TestPeer::connect(&service);

    service
        .on_signal(
            &a.peer_id,
            &b.peer_id,
            SignalPayload::answer(SessionDescription::answer("v=0")),
        )
        .unwrap();

    let received = b.drain();
    assert_eq!(received.len(), 1);
    assert!(matches!(
        &received[0],
        RelayMessage::Signal { sender, sender_display_name: None, .. } if sender == &a.peer_id
    ));
}
