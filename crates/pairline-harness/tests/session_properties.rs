//! Property-based tests for the full runtime loop.
//!
//! Random sequences of user actions, server pushes, media faults and clock
//! advances. The standard invariants are checked by the driver after every
//! render; these tests add cross-component checks after each step.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pairline_client::{ClientEvent, MediaState, SessionState, Tab};
use pairline_harness::SimWorld;
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Skip,
    EndIdle,
    EndDisconnecting,
    Match { room: u8, peers: Vec<u8> },
    PartnerLeft(u8),
    ServerEnd,
    TimerUpdate(i64),
    TimerExtended(i64),
    TimerEnded,
    Blip,
    Recover,
    Lose,
    Tab(Tab),
    Connect(u8),
    PeerConnects(u8),
    Online(bool),
    Sever,
    Ping,
    Advance(u64),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Start),
        2 => Just(Op::Skip),
        1 => Just(Op::EndIdle),
        1 => Just(Op::EndDisconnecting),
        3 => (0u8..3, prop::collection::vec(0u8..3, 0..3))
            .prop_map(|(room, peers)| Op::Match { room, peers }),
        1 => (0u8..3).prop_map(Op::PartnerLeft),
        1 => Just(Op::ServerEnd),
        1 => (0i64..300).prop_map(Op::TimerUpdate),
        1 => (0i64..300).prop_map(Op::TimerExtended),
        1 => Just(Op::TimerEnded),
        1 => Just(Op::Blip),
        1 => Just(Op::Recover),
        1 => Just(Op::Lose),
        1 => prop::sample::select(vec![Tab::Matching, Tab::Other]).prop_map(Op::Tab),
        1 => (0u8..3).prop_map(Op::Connect),
        1 => (0u8..3).prop_map(Op::PeerConnects),
        1 => any::<bool>().prop_map(Op::Online),
        1 => Just(Op::Sever),
        1 => Just(Op::Ping),
        1 => (1u64..30).prop_map(Op::Advance),
    ]
}

async fn apply(world: &mut SimWorld, op: &Op) {
    match op {
        Op::Start => world.send(ClientEvent::StartMatching).await.unwrap(),
        Op::Skip => world.send(ClientEvent::Skip).await.unwrap(),
        Op::EndIdle => world
            .send(ClientEvent::EndCall { target: SessionState::Idle, notify: true })
            .await
            .unwrap(),
        Op::EndDisconnecting => world
            .send(ClientEvent::EndCall { target: SessionState::Disconnecting, notify: true })
            .await
            .unwrap(),
        Op::Match { room, peers } => {
            let ids: Vec<String> = peers.iter().map(|p| format!("p{p}")).collect();
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            world.deliver_match(&format!("r{room}"), &ids, "lk").await.unwrap();
        },
        Op::PartnerLeft(peer) => {
            world.push("partnerLeft", json!({ "partnerId": format!("p{peer}") })).await.unwrap();
        },
        Op::ServerEnd => world.push_bare("end").await.unwrap(),
        Op::TimerUpdate(value) => {
            world.push("timerUpdate", json!({ "timerValue": value })).await.unwrap();
        },
        Op::TimerExtended(value) => {
            world.push("timerExtended", json!({ "timerValue": value })).await.unwrap();
        },
        Op::TimerEnded => world.push_bare("timerEnded").await.unwrap(),
        Op::Blip => {
            world.driver_mut().blip_media();
            world.settle().await.unwrap();
        },
        Op::Recover => {
            world.driver_mut().recover_media();
            world.settle().await.unwrap();
        },
        Op::Lose => {
            world.driver_mut().lose_media();
            world.settle().await.unwrap();
        },
        Op::Tab(tab) => world.send(ClientEvent::TabChanged(*tab)).await.unwrap(),
        Op::Connect(peer) => {
            world.send(ClientEvent::ConnectUser { user_id: format!("p{peer}") }).await.unwrap();
        },
        Op::PeerConnects(peer) => {
            world.push("connectedUser", json!({ "from": format!("p{peer}") })).await.unwrap();
        },
        Op::Online(online) => world
            .send(ClientEvent::ChangeOnlineStatus { online: *online, busy: false })
            .await
            .unwrap(),
        Op::Sever => {
            world.driver_mut().sever_transport();
            world.settle().await.unwrap();
        },
        Op::Ping => {
            world.server_mut().ping();
            world.settle().await.unwrap();
        },
        Op::Advance(secs) => world.advance(Duration::from_secs(*secs)).await.unwrap(),
    }
}

fn run(ops: &[Op]) -> SimWorld {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(async {
        let mut world = SimWorld::new();
        world.boot().await.unwrap();

        for op in ops {
            apply(&mut world, op).await;

            let view = world.view();
            let media = world.driver().media().state();

            assert_eq!(view.state, world.client().state(), "view lags client after {op:?}");
            if view.state == SessionState::Connected {
                assert!(
                    matches!(media, MediaState::Connected | MediaState::Reconnecting),
                    "connected with media {media:?} after {op:?}"
                );
            }
            if view.state == SessionState::Idle {
                assert_eq!(media, MediaState::Disconnected, "idle with media up after {op:?}");
            }
            if world.client().coordinator().skip_in_flight() {
                assert!(world.server().count("skipCall") > 0, "skip in flight but never sent");
            }
        }
        world
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_runtime_invariants_hold(ops in prop::collection::vec(arbitrary_op(), 1..40)) {
        let world = run(&ops);
        prop_assert!(world.driver().renders() > 0);
    }

    #[test]
    fn prop_one_media_session_per_match(peers in prop::collection::vec(0u8..3, 1..3), repeats in 1usize..5) {
        let ops: Vec<Op> = std::iter::once(Op::Start)
            .chain(std::iter::repeat_n(Op::Match { room: 1, peers }, repeats))
            .collect();
        let world = run(&ops);

        prop_assert_eq!(world.driver().media().connects(), 1);
        prop_assert_eq!(world.view().state, SessionState::Connected);
        prop_assert_eq!(world.server().count("joinedVideo"), 1);
    }
}
