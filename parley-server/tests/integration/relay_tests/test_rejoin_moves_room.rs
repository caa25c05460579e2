use parley_core::{RelayMessage, RoomId};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, test_service};

#[tokio::test]
async fn test_rejoin_moves_room() {
    init_tracing();

    let service = test_service();

    let a = TestPeer::join(&service, "r1", None);
    let mut b = TestPeer::join(&service, "r1", None);
    let mut c = TestPeer::join(&service, "r2", None);
    b.drain();

    service.on_join(&a.peer_id, "r2", None).unwrap();

    assert_eq!(
        b.drain(),
        vec![RelayMessage::Departed {
            peer_id: a.peer_id.clone()
        }]
    );
    assert!(matches!(
        c.drain().as_slice(),
        [RelayMessage::Arrived { peer_id, .. }] if peer_id == &a.peer_id
    ));

    let r1 = service.presence().members(&RoomId::parse("r1").unwrap());
    let r2 = service.presence().members(&RoomId::parse("r2").unwrap());
    assert_eq!(r1.len(), 1);
    assert_eq!(r2.len(), 2);
}
