use parley_core::RelayMessage;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, test_service};

#[tokio::test]
async fn test_join_notifies_existing_members() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", Some("alice"));
    assert!(a.drain().is_empty(), "Joining an empty room notifies nobody");

    let mut b = TestPeer::join(&service, "r1", Some("bob"));

    assert_eq!(
        a.drain(),
        vec![RelayMessage::Arrived {
            peer_id: b.peer_id.clone(),
            display_name: Some("bob".into()),
        }]
    );
    assert!(b.drain().is_empty(), "The joiner is not told about existing members");
}

#[tokio::test]
async fn test_third_peer_notifies_both_existing_members() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", None);
    let mut b = TestPeer::join(&service, "r1", None);
    a.drain();

    let mut c = TestPeer::join(&service, "r1", None);

    for peer in [&mut a, &mut b] {
        let received = peer.drain();
        assert_eq!(received.len(), 1);
        assert!(matches!(
            &received[0],
            RelayMessage::Arrived { peer_id, display_name: None } if peer_id == &c.peer_id
        ));
    }
    assert!(c.drain().is_empty());
}

#[tokio::test]
async fn test_join_does_not_leak_across_rooms() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", None);
    let _b = TestPeer::join(&service, "r2", None);

    assert!(a.drain().is_empty());
    assert_eq!(service.presence().room_count(), 2);
}
