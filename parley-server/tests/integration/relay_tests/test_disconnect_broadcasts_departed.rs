use parley_core::{RelayMessage, RoomId};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, test_service};

#[tokio::test]
async fn test_disconnect_broadcasts_departed() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", None);
    let b = TestPeer::join(&service, "r1", None);
    let mut c = TestPeer::join(&service, "r1", None);
    a.drain();

    service.on_disconnect(&b.peer_id);

    let departed = RelayMessage::Departed {
        peer_id: b.peer_id.clone(),
    };
    assert_eq!(a.drain(), vec![departed.clone()]);
    assert_eq!(c.drain(), vec![departed]);

    let members = service.presence().members(&RoomId::parse("r1").unwrap());
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.peer_id != b.peer_id));
}

#[tokio::test]
async fn test_double_disconnect_is_noop() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", None);
    let b = TestPeer::join(&service, "r1", None);
    a.drain();

    service.on_disconnect(&b.peer_id);
    service.on_disconnect(&b.peer_id);

    assert_eq!(a.drain().len(), 1, "Only one departed notice");
    assert_eq!(service.connection_count(), 1);
}

#[tokio::test]
async fn test_last_member_leaving_removes_room() {
    init_tracing();

    let service = test_service();

    let a = TestPeer::join(&service, "r1", None);
    service.on_disconnect(&a.peer_id);

    assert_eq!(service.presence().room_count(), 0);
    assert_eq!(service.connection_count(), 0);
}

#[tokio::test]
async fn test_disconnect_before_join() {
    init_tracing();

    let service = test_service();

    let mut a = TestPeer::join(&service, "r1", None);
    let lurker = TestPeer::connect(&service);

    service.on_disconnect(&lurker.peer_id);

    assert!(a.drain().is_empty(), "Peers outside the room cause no notices");
}
