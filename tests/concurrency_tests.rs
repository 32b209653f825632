//! Concurrency tests: many sessions sharing one server
//!
//! These tests check that sessions stay isolated from each other while many
//! of them run at once, and that a silent player does not hold up the rest.

mod common;

use common::*;
use server::config::ServerConfig;
use shared::{DemoLevel, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_test::assert_ok;

/// Plays the winning route and waits for the session to close.
/// Returns the player's index and how many broadcasts it saw from others.
async fn play_to_the_end(mut player: TestPlayer) -> (usize, usize) {
    let (me, _) = player.expect_start().await;
    let mut broadcasts = 0;

    for direction in WINNING_ROUTE {
        player.send("move", Some(direction)).await;
        loop {
            match player.recv().await {
                Some(ServerMessage::Result(result)) => {
                    assert_eq!(result.player, me);
                    assert!(result.move_valid, "move {} failed", direction);
                    break;
                }
                Some(ServerMessage::Action(action)) => {
                    assert_ne!(action.player, me, "own actions are never broadcast back");
                    broadcasts += 1;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    // Keep reading until the session ends; our own win is among the broadcasts.
    let mut won = false;
    while let Some(message) = player.recv().await {
        match message {
            ServerMessage::Action(action) if action.action == "win" && action.player == me => {
                won = true;
            }
            ServerMessage::Action(_) => broadcasts += 1,
            other => panic!("unexpected {:?}", other),
        }
    }
    assert!(won, "player {} never saw its own win", me);
    (me, broadcasts)
}

/// Many rooms of two play at the same time without interfering
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_sessions() {
    const ROOMS: usize = 16;
    let addr = start_server(2).await;

    let mut players = JoinSet::new();
    for _ in 0..ROOMS * 2 {
        let player = TestPlayer::connect(addr).await;
        players.spawn(play_to_the_end(player));
    }

    let mut indices = [0usize; 2];
    let mut total_broadcasts = 0;
    while let Some(result) = players.join_next().await {
        let (me, broadcasts) = assert_ok!(result);
        indices[me] += 1;
        total_broadcasts += broadcasts;
    }

    assert_eq!(indices, [ROOMS, ROOMS]);
    // Each player sees six moves and a win from its partner, unless the
    // partner finished before it could be told.
    assert!(total_broadcasts <= ROOMS * 2 * 7);
}

/// Larger rooms: every player receives its own index exactly once
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn large_rooms_assign_every_index() {
    const ROOM_SIZE: usize = 4;
    const ROOMS: usize = 5;
    let addr = start_server(ROOM_SIZE).await;

    let mut players = JoinSet::new();
    for _ in 0..ROOM_SIZE * ROOMS {
        let player = TestPlayer::connect(addr).await;
        players.spawn(play_to_the_end(player));
    }

    let mut counts = [0usize; ROOM_SIZE];
    while let Some(result) = players.join_next().await {
        let (me, _) = assert_ok!(result);
        counts[me] += 1;
    }
    assert_eq!(counts, [ROOMS; ROOM_SIZE]);
}

/// A player that never reads is dropped at its read deadline while its partner keeps playing
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn silent_player_is_dropped_at_read_deadline() {
    let config = ServerConfig {
        room_size: 2,
        outbound_capacity: 2,
        pong_wait: Duration::from_millis(500),
        ..ServerConfig::default()
    };
    let addr = start_server_with(config, Arc::new(DemoLevel)).await;
    let mut players = start_room(addr, 2).await;
    let silent = players.pop().unwrap();
    let mut active = players.pop().unwrap();

    // The silent player never answers pings while its partner plays on.
    for i in 0..200 {
        let direction = if i % 2 == 0 { "up" } else { "down" };
        active.send("move", Some(direction)).await;
        assert_eq!(active.recv().await, Some(ServerMessage::result(0, true)));
    }
    for direction in WINNING_ROUTE {
        active.send("move", Some(direction)).await;
        assert_eq!(active.recv().await, Some(ServerMessage::result(0, true)));
    }
    assert_eq!(active.recv().await, Some(ServerMessage::win(0)));
    // Once the silent player is dropped nobody is left playing and the session closes.
    assert_eq!(active.recv().await, None);
    drop(silent);
}
