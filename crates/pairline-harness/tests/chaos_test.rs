//! Seeded chaos runs.
//!
//! The server duplicates and reorders its pushes. Whatever order the client
//! sees, it must end up in one call with one media session, and the same
//! seed must always produce the same run.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use pairline_client::{ClientEvent, SessionState};
use pairline_harness::{SimServer, SimWorld};
use serde_json::json;

const SEEDS: u64 = 32;

async fn chaotic_call(seed: u64) -> SimWorld {
    let mut world = SimWorld::with_server(SimServer::new().with_chaos(seed, 30, 30));
    world.boot().await.unwrap();
    world.send(ClientEvent::StartMatching).await.unwrap();

    let server = world.server_mut();
    server.deliver_match("r1", &["p1", "p2"], "lk");
    server.push("timerUpdate", json!({ "timerValue": 170 }));
    server.push("partnerJoinedVideo", json!({ "userId": "p1" }));
    server.push("showNotification", json!({ "title": "Say hi" }));
    server.push("partnerLeft", json!({ "partnerId": "p2" }));
    world.settle().await.unwrap();
    world
}

#[tokio::test]
async fn call_survives_duplicated_and_reordered_pushes() {
    let allowed = BTreeSet::from(["p1", "p2"]);

    for seed in 0..SEEDS {
        let world = chaotic_call(seed).await;
        let view = world.view();

        assert_eq!(view.state, SessionState::Connected, "seed {seed}");
        assert!(!view.peers.is_empty(), "seed {seed}");
        assert!(view.peers.iter().all(|p| allowed.contains(p.id.as_str())), "seed {seed}");
        assert_eq!(world.driver().media().connects(), 1, "seed {seed}");
        assert_eq!(world.server().count("joinedVideo"), 1, "seed {seed}");
    }
}

#[tokio::test]
async fn same_seed_replays_exactly() {
    let first = chaotic_call(7).await;
    let second = chaotic_call(7).await;

    assert_eq!(first.view(), second.view());
    assert_eq!(first.server().received_names(), second.server().received_names());
    assert_eq!(first.driver().renders(), second.driver().renders());
}
