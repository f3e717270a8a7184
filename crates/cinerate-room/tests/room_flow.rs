//! Integration tests for the room system: full game flows through the
//! manager, observing what each participant's subscriber receives.

use std::sync::Arc;
use std::time::Duration;

use cinerate_presence::PresenceRegistry;
use cinerate_protocol::{ConnId, Movie, ServerEvent, Stage};
use cinerate_room::{RoomConfig, RoomError, RoomManager, Subscriber};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ConnId {
    ConnId(id)
}

fn movie(title: &str, rating: f64) -> Movie {
    Movie {
        title: title.to_owned(),
        rating,
    }
}

/// Creates a subscriber channel pair for one simulated participant.
fn client() -> (Subscriber, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

fn setup() -> (RoomManager, Arc<PresenceRegistry>) {
    let registry = Arc::new(PresenceRegistry::new());
    let manager =
        RoomManager::new(Arc::clone(&registry), RoomConfig::default());
    (manager, registry)
}

/// Collects everything currently queued on a subscriber.
fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

fn notifications(events: &[ServerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|ev| match ev {
            ServerEvent::Notification { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn stages(events: &[ServerEvent]) -> Vec<Stage> {
    events
        .iter()
        .filter_map(|ev| match ev {
            ServerEvent::UpdateStage { stage } => Some(*stage),
            _ => None,
        })
        .collect()
}

fn last_room_update(events: &[ServerEvent]) -> cinerate_protocol::RoomSnapshot {
    events
        .iter()
        .rev()
        .find_map(|ev| match ev {
            ServerEvent::UpdateRoom { room } => Some(room.clone()),
            _ => None,
        })
        .expect("expected at least one update_room")
}

// =========================================================================
// Room creation and joining
// =========================================================================

#[tokio::test]
async fn test_create_room_seats_creator_and_notifies() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    registry.award_point(cid(1)).await.unwrap();
    let (tx, mut rx) = client();

    let room_id = manager.create_room(cid(1), tx, String::new()).unwrap();
    manager.summaries().await; // barrier

    let events = drain(&mut rx);
    let snapshot = last_room_update(&events);
    assert_eq!(snapshot.id, room_id);
    assert_eq!(snapshot.host, cid(1));
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(
        snapshot.players[0].score, 0,
        "creating a room resets the score"
    );
    assert!(stages(&events).contains(&Stage::AwaitPlayers));
    assert!(notifications(&events).contains(&"Room created.".to_owned()));
}

#[tokio::test]
async fn test_create_room_while_in_a_room_is_rejected() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    let (tx, _rx) = client();
    manager.create_room(cid(1), tx, String::new()).unwrap();

    let (tx2, _rx2) = client();
    let result = manager.create_room(cid(1), tx2, String::new());

    assert!(matches!(result, Err(RoomError::AlreadyInRoom(_, _))));
}

#[tokio::test]
async fn test_join_room_rejects_malformed_id_without_mutation() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    let (tx, _rx) = client();

    let result = manager
        .join_room(cid(1), "not-a-room", String::new(), tx)
        .await;

    assert!(matches!(result, Err(RoomError::InvalidId(_))));
    assert!(manager.member_room(cid(1)).is_none());
    assert_eq!(manager.room_count(), 0);
}

#[tokio::test]
async fn test_join_room_rejects_unknown_room() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    let (tx, _rx) = client();

    let result = manager
        .join_room(cid(1), &"a".repeat(32), String::new(), tx)
        .await;

    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_join_room_rejects_wrong_password() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    registry.register(cid(2)).await;
    let (tx1, _rx1) = client();
    let room_id = manager
        .create_room(cid(1), tx1, "secret".into())
        .unwrap();

    let (tx2, _rx2) = client();
    let result = manager
        .join_room(cid(2), room_id.as_str(), "wrong".into(), tx2)
        .await;

    assert!(matches!(result, Err(RoomError::InvalidPassword(_))));
    assert!(manager.member_room(cid(2)).is_none());
}

#[tokio::test]
async fn test_join_room_rejects_active_game() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    registry.register(cid(2)).await;
    let (tx1, _rx1) = client();
    let room_id = manager.create_room(cid(1), tx1, String::new()).unwrap();
    manager.start_game(&room_id).await.unwrap();

    let (tx2, _rx2) = client();
    let result = manager
        .join_room(cid(2), room_id.as_str(), String::new(), tx2)
        .await;

    assert!(matches!(result, Err(RoomError::GameStarted(_))));
}

#[tokio::test]
async fn test_join_room_broadcasts_to_everyone() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    registry.register(cid(2)).await;
    let (tx1, mut rx1) = client();
    let room_id = manager.create_room(cid(1), tx1, String::new()).unwrap();

    let (tx2, mut rx2) = client();
    manager
        .join_room(cid(2), room_id.as_str(), String::new(), tx2)
        .await
        .unwrap();
    manager.summaries().await;

    let host_events = drain(&mut rx1);
    assert_eq!(last_room_update(&host_events).players.len(), 2);

    let joiner_events = drain(&mut rx2);
    assert!(stages(&joiner_events).contains(&Stage::AwaitPlayers));
    assert!(
        notifications(&joiner_events).contains(&"Joined room.".to_owned())
    );
}

#[tokio::test]
async fn test_summaries_reflect_player_count_and_lock() {
    let (mut manager, registry) = setup();
    registry.register(cid(1)).await;
    let (tx, _rx) = client();
    let room_id = manager.create_room(cid(1), tx, "pw".into()).unwrap();

    let index = manager.summaries().await;

    let summary = index.get(&room_id).expect("room should be indexed");
    assert_eq!(summary.player_count, 1);
    assert!(!summary.active);
    assert!(summary.locked);
}

// =========================================================================
// Game flow
// =========================================================================

/// Seats `ids` in a fresh room (first id creates it) and returns the
/// room id plus each participant's receiver.
async fn seated_room(
    manager: &mut RoomManager,
    registry: &PresenceRegistry,
    ids: &[u64],
) -> (
    cinerate_protocol::RoomId,
    Vec<mpsc::UnboundedReceiver<ServerEvent>>,
) {
    let mut receivers = Vec::new();

    registry.register(cid(ids[0])).await;
    let (tx, rx) = client();
    receivers.push(rx);
    let room_id = manager.create_room(cid(ids[0]), tx, String::new()).unwrap();

    for &id in &ids[1..] {
        registry.register(cid(id)).await;
        let (tx, rx) = client();
        receivers.push(rx);
        manager
            .join_room(cid(id), room_id.as_str(), String::new(), tx)
            .await
            .unwrap();
    }

    (room_id, receivers)
}

#[tokio::test]
async fn test_start_game_activates_and_picks_a_dealer() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2, 3]).await;

    manager.start_game(&room_id).await.unwrap();
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    let snapshot = last_room_update(&events);
    assert!(snapshot.active);
    let dealer = snapshot.dealer.expect("a dealer should be picked");
    assert!([cid(1), cid(2), cid(3)].contains(&dealer));
    assert!(stages(&events).contains(&Stage::AssignMovie));
    assert!(notifications(&events).contains(&"Game started.".to_owned()));

    // The opening pick costs no turn.
    for id in [1, 2, 3] {
        assert_eq!(registry.get(cid(id)).await.unwrap().turns, 0);
    }
}

#[tokio::test]
async fn test_full_round_scores_closest_without_exceeding() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2, 3]).await;
    manager.start_game(&room_id).await.unwrap();

    manager
        .movie_selected(&room_id, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(1), 7.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(2), 9.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(3), 6.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    assert!(stages(&events).contains(&Stage::CastVote));
    assert!(stages(&events).contains(&Stage::RoundOver));
    assert!(notifications(&events).contains(&"Round over.".to_owned()));

    let snapshot = last_room_update(&events);
    assert_eq!(snapshot.winners.len(), 1);
    assert_eq!(snapshot.winners[0].player, cid(1), "7.0 is closest under 8.0");

    assert_eq!(registry.get(cid(1)).await.unwrap().score, 1);
    assert_eq!(registry.get(cid(2)).await.unwrap().score, 0);
    assert_eq!(registry.get(cid(3)).await.unwrap().score, 0);

    // Each voter's play history records the rated title.
    assert_eq!(
        registry.get(cid(2)).await.unwrap().history,
        vec!["Heat".to_owned()]
    );
}

#[tokio::test]
async fn test_all_overshooting_votes_score_nobody() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();

    manager
        .movie_selected(&room_id, movie("Alien", 5.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(1), 6.0, movie("Alien", 5.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(2), 9.9, movie("Alien", 5.0))
        .await
        .unwrap();
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    let snapshot = last_room_update(&events);
    assert!(snapshot.winners.is_empty());
    assert_eq!(registry.get(cid(1)).await.unwrap().score, 0);
    assert_eq!(registry.get(cid(2)).await.unwrap().score, 0);
    assert!(notifications(&events).contains(&"Round over.".to_owned()));
}

#[tokio::test]
async fn test_partial_vote_acknowledged_privately() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2, 3]).await;
    manager.start_game(&room_id).await.unwrap();
    manager
        .movie_selected(&room_id, movie("Heat", 8.0))
        .await
        .unwrap();
    manager.summaries().await; // barrier
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    manager
        .cast_vote(&room_id, cid(2), 7.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager.summaries().await;

    let voter_events = drain(&mut rxs[1]);
    assert_eq!(notifications(&voter_events), vec!["Vote cast.".to_owned()]);

    // The rest of the room sees nothing until the final vote lands.
    assert!(drain(&mut rxs[0]).is_empty());
    assert!(drain(&mut rxs[2]).is_empty());
}

#[tokio::test]
async fn test_duplicate_vote_is_ignored() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    manager
        .movie_selected(&room_id, movie("Heat", 8.0))
        .await
        .unwrap();

    manager
        .cast_vote(&room_id, cid(1), 7.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(1), 8.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(2), 5.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    let snapshot = last_room_update(&events);
    assert_eq!(snapshot.guesses.len(), 2);
    let first = snapshot
        .guesses
        .iter()
        .find(|g| g.player == cid(1))
        .unwrap();
    assert_eq!(first.value, 7.0, "the second vote must not replace the first");
}

#[tokio::test]
async fn test_next_round_clears_round_state_and_rotates_dealer() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    manager
        .movie_selected(&room_id, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(1), 7.0, movie("Heat", 8.0))
        .await
        .unwrap();
    manager
        .cast_vote(&room_id, cid(2), 6.0, movie("Heat", 8.0))
        .await
        .unwrap();

    manager.next_round(&room_id).await.unwrap();
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    let snapshot = last_room_update(&events);
    assert!(snapshot.guesses.is_empty());
    assert!(snapshot.winners.is_empty());
    assert!(snapshot.crit_movie.is_none());
    // All turns were equal, so the scheduler picks the first seat and
    // charges it one turn.
    assert_eq!(snapshot.dealer, Some(cid(1)));
    assert_eq!(registry.get(cid(1)).await.unwrap().turns, 1);
    assert_eq!(registry.get(cid(2)).await.unwrap().turns, 0);
    assert!(notifications(&events).contains(&"Next round.".to_owned()));

    // A second rotation must pick the other seat.
    manager.next_round(&room_id).await.unwrap();
    manager.summaries().await;
    let snapshot = last_room_update(&drain(&mut rxs[0]));
    assert_eq!(snapshot.dealer, Some(cid(2)));
}

#[tokio::test]
async fn test_concurrent_final_votes_produce_one_round_over() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    manager
        .movie_selected(&room_id, movie("Heat", 8.0))
        .await
        .unwrap();
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    // Both votes race; the actor's command channel serializes them, so
    // exactly one of them completes the round.
    let m = &manager;
    let r = &room_id;
    tokio::join!(
        async move {
            m.cast_vote(r, cid(1), 7.0, movie("Heat", 8.0)).await.unwrap()
        },
        async move {
            m.cast_vote(r, cid(2), 6.0, movie("Heat", 8.0)).await.unwrap()
        },
    );
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    let round_overs = notifications(&events)
        .iter()
        .filter(|m| m.as_str() == "Round over.")
        .count();
    assert_eq!(round_overs, 1);
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test]
async fn test_chat_log_evicts_oldest_at_capacity() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1]).await;

    for n in 0..11 {
        manager
            .send_message(&room_id, "ada".into(), format!("message {n}"))
            .await
            .unwrap();
    }
    manager.summaries().await;

    let events = drain(&mut rxs[0]);
    assert!(
        events
            .iter()
            .any(|ev| matches!(ev, ServerEvent::UpdateRoomChatNotification))
    );

    let snapshot = last_room_update(&events);
    assert_eq!(snapshot.chat.len(), 10);
    assert_eq!(snapshot.chat[0].message, "message 1");
    assert_eq!(snapshot.chat[9].message, "message 10");
}

// =========================================================================
// Leaving and disbanding
// =========================================================================

#[tokio::test]
async fn test_leave_reassigns_host_and_notifies() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    registry.rename(cid(2), "grace".into()).await.unwrap();
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    let closed = manager.leave_room(cid(1)).await.unwrap();
    manager.summaries().await;

    assert!(!closed);
    assert!(manager.member_room(cid(1)).is_none());
    assert_eq!(manager.member_room(cid(2)), Some(&room_id));

    let remaining = drain(&mut rxs[1]);
    assert!(
        notifications(&remaining)
            .contains(&"New host assigned: grace".to_owned())
    );
    assert_eq!(last_room_update(&remaining).host, cid(2));

    let leaver = drain(&mut rxs[0]);
    assert!(stages(&leaver).contains(&Stage::Splash));
    assert!(notifications(&leaver).contains(&"Left room.".to_owned()));
}

#[tokio::test]
async fn test_dealer_leaving_clears_dealer_slot() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    manager.next_round(&room_id).await.unwrap(); // dealer = cid(1)
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    manager.leave_room(cid(1)).await.unwrap();
    manager.summaries().await;

    let snapshot = last_room_update(&drain(&mut rxs[1]));
    assert_eq!(snapshot.dealer, None);
}

#[tokio::test]
async fn test_last_leave_disbands_room() {
    let (mut manager, registry) = setup();
    let (room_id, _rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;

    assert!(!manager.leave_room(cid(1)).await.unwrap());
    assert!(manager.leave_room(cid(2)).await.unwrap());
    assert_eq!(manager.room_count(), 0);

    // The id no longer resolves; a rejoin attempt is an invalid room.
    registry.register(cid(3)).await;
    let (tx, _rx) = client();
    let result = manager
        .join_room(cid(3), room_id.as_str(), String::new(), tx)
        .await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_game_over_broadcasts_farewell_and_removes_room() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    manager.game_over(&room_id).await.unwrap();

    for rx in rxs.iter_mut() {
        let events = drain(rx);
        assert!(stages(&events).contains(&Stage::GameOver));
        assert!(notifications(&events).contains(&"Game over.".to_owned()));
    }
    assert_eq!(manager.room_count(), 0);
    assert!(manager.member_room(cid(1)).is_none());

    let result = manager.start_game(&room_id).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

// =========================================================================
// Dealer timeout
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_dealer_timeout_reassigns_after_grace() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    manager.next_round(&room_id).await.unwrap(); // dealer = cid(1), turns 1/0
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    manager.assign_dealer(&room_id).await.unwrap();
    manager.summaries().await;

    let events = drain(&mut rxs[1]);
    assert!(stages(&events).contains(&Stage::AssignDealer));
    assert!(
        notifications(&events).contains(&"Dealer time expired.".to_owned())
    );
    // Penalty turn charged up front.
    assert_eq!(registry.get(cid(1)).await.unwrap().turns, 2);

    // Paused time auto-advances through the grace period.
    tokio::time::sleep(Duration::from_secs(4)).await;
    manager.summaries().await;

    let events = drain(&mut rxs[1]);
    assert!(notifications(&events).contains(&"New dealer.".to_owned()));
    assert!(stages(&events).contains(&Stage::AssignMovie));
    let snapshot = last_room_update(&events);
    assert_eq!(snapshot.dealer, Some(cid(2)), "fewest turns takes the deal");
    assert_eq!(registry.get(cid(2)).await.unwrap().turns, 1);
}

#[tokio::test(start_paused = true)]
async fn test_next_round_supersedes_dealer_deadline() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();

    manager.assign_dealer(&room_id).await.unwrap();
    manager.next_round(&room_id).await.unwrap();
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    manager.summaries().await;

    // The superseded deadline must not fire against the new round.
    let events = drain(&mut rxs[0]);
    assert!(
        !notifications(&events).contains(&"New dealer.".to_owned()),
        "stale dealer deadline fired"
    );
}

#[tokio::test(start_paused = true)]
async fn test_game_over_before_deadline_stops_the_timer() {
    let (mut manager, registry) = setup();
    let (room_id, mut rxs) =
        seated_room(&mut manager, &registry, &[1, 2]).await;
    manager.start_game(&room_id).await.unwrap();
    manager.assign_dealer(&room_id).await.unwrap();

    manager.game_over(&room_id).await.unwrap();
    for rx in rxs.iter_mut() {
        drain(rx);
    }

    tokio::time::sleep(Duration::from_secs(10)).await;

    // The actor is gone; nothing further may arrive.
    assert!(drain(&mut rxs[0]).is_empty());
    assert!(drain(&mut rxs[1]).is_empty());
}
