//! Relay behaviour through the running event loop, with connections
//! registered the way the WebSocket handler registers them

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use sky_arena::app::AppState;
use sky_arena::config::Config;
use sky_arena::ws::protocol::{ClientMsg, ServerMsg, Vector3};

fn start_relay() -> AppState {
    let config = Config::from_lookup(|_| None).unwrap();
    let (state, hub) = AppState::new(config);
    tokio::spawn(hub.run());
    state
}

fn join(pseudo: &str) -> ClientMsg {
    ClientMsg::PlayerJoin {
        pseudo: pseudo.to_string(),
        position: Vector3::new(0.0, 2.0, 0.0),
        rotation: Vector3::default(),
    }
}

async fn next(rx: &mut UnboundedReceiver<ServerMsg>) -> ServerMsg {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for relay")
        .expect("connection channel closed")
}

#[tokio::test]
async fn join_replies_with_roster_and_announces_to_others() {
    let state = start_relay();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut rx_a = state.connections.register(a);
    let mut rx_b = state.connections.register(b);

    state.relay.message(a, join("Ace"));
    match next(&mut rx_a).await {
        ServerMsg::Players(roster) => assert_eq!(roster.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(next(&mut rx_b).await, ServerMsg::PlayerJoined(p) if p.id == a));

    state.relay.message(b, join("Bee"));
    match next(&mut rx_b).await {
        ServerMsg::Players(roster) => {
            assert_eq!(roster.len(), 2);
            assert!(roster.iter().any(|p| p.id == a && p.pseudo == "Ace"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(next(&mut rx_a).await, ServerMsg::PlayerJoined(p) if p.pseudo == "Bee"));
}

#[tokio::test]
async fn every_update_is_forwarded_once() {
    let state = start_relay();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut rx_a = state.connections.register(a);
    let mut rx_b = state.connections.register(b);

    state.relay.message(a, join("Ace"));
    next(&mut rx_a).await;
    next(&mut rx_b).await;

    const UPDATES: u64 = 25;
    for i in 0..UPDATES {
        let update = ClientMsg::UpdatePosition {
            position: Vector3::new(i as f32, 50.0, 0.0),
            rotation: Vector3::default(),
            velocity: Vector3::new(1.0, 0.0, 0.0),
            timestamp: Some(1_000 + i),
        };
        state.relay.message(a, update);
    }

    for i in 0..UPDATES {
        match next(&mut rx_b).await {
            ServerMsg::PlayerMoved(moved) => {
                assert_eq!(moved.id, a);
                assert_eq!(moved.position.x, i as f32);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    assert!(rx_b.try_recv().is_err());
    // The sender never hears its own moves
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn departure_reaches_everyone_left() {
    let state = start_relay();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let _rx_a = state.connections.register(a);
    let mut rx_b = state.connections.register(b);

    state.relay.message(a, join("Ace"));
    next(&mut rx_b).await;

    state.connections.unregister(&a);
    state.relay.disconnect(a).await;

    assert_eq!(next(&mut rx_b).await, ServerMsg::PlayerDisconnected(a));
}

#[tokio::test(start_paused = true)]
async fn missiles_are_forgotten_after_ttl() {
    let state = start_relay();
    let a = Uuid::new_v4();
    let mut rx_a = state.connections.register(a);

    assert!(state.relay.message(
        a,
        ClientMsg::FireMissile {
            position: Vector3::new(0.0, 2.0, -10.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        },
    ));
    assert!(matches!(next(&mut rx_a).await, ServerMsg::MissilesFired { player_id, .. } if player_id == a));
    assert_eq!(state.relay.stats.missiles(), 1);

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(1_000)).await;
    }
    assert_eq!(state.relay.stats.missiles(), 1);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(state.relay.stats.missiles(), 0);
}

#[test]
fn malformed_frames_are_rejected_before_the_relay() {
    let cases = [
        ("not json", "malformed"),
        (r#"{"event":"teleport","data":{}}"#, "malformed"),
        (r#"{"event":"fireMissile","data":{"position":{"x":0,"y":0}}}"#, "malformed"),
        (
            r#"{"event":"playerJoin","data":{"pseudo":"   ","position":{"x":0,"y":0,"z":0},"rotation":{"x":0,"y":0,"z":0}}}"#,
            "invalid_field",
        ),
    ];

    for (text, code) in cases {
        let err = ClientMsg::parse(text).unwrap_err();
        assert_eq!(err.code(), code, "for {}", text);
    }
}
