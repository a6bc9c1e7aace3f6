use fuego::protocol::{ClientMessage, ServerMessage};
use fuego::state::AppState;
use fuego::types::{GameMode, GameStatus, Tier};
use fuego::ws::handlers::{handle_message, Conn};
use std::sync::Arc;

/// Pull the latest session snapshot into a connection, the way the socket
/// loop does after every published change.
async fn sync(conn: &mut Conn, state: &Arc<AppState>) {
    let code = conn.code.clone().expect("connection should be in a game");
    let session = state.get_session(&code).await.expect("session should exist");
    conn.observe_snapshot(&session);
}

async fn rank(
    conn: &mut Conn,
    state: &Arc<AppState>,
    placements: &[(&str, Tier)],
) {
    sync(conn, state).await;
    for (item, tier) in placements {
        let result = handle_message(
            ClientMessage::PlaceItem {
                item: item.to_string(),
                tier: *tier,
            },
            conn,
            state,
        )
        .await;
        assert!(
            matches!(result, Some(ServerMessage::RankingState { .. })),
            "Expected RankingState, got {:?}",
            result
        );
    }
    let result = handle_message(ClientMessage::LockInRankings, conn, state).await;
    assert!(
        matches!(result, Some(ServerMessage::SubmissionConfirmed)),
        "Expected SubmissionConfirmed, got {:?}",
        result
    );
}

/// End-to-end integration test for a complete Basic-mode round
#[tokio::test]
async fn test_full_basic_game_flow() {
    let state = Arc::new(AppState::new());
    let mut host = Conn::new();
    let mut bob = Conn::new();
    let mut cara = Conn::new();

    // 1. Host creates the game
    let created = handle_message(
        ClientMessage::CreateGame {
            host_name: "Ana".to_string(),
        },
        &mut host,
        &state,
    )
    .await;
    let code = match created {
        Some(ServerMessage::Welcome { code, you, session }) => {
            assert!(you.is_host);
            assert_eq!(you.name, "ana");
            assert_eq!(session.status, GameStatus::Waiting);
            code
        }
        other => panic!("Expected Welcome, got {:?}", other),
    };

    // 2. Two players join
    for (conn, name) in [(&mut bob, "Bob"), (&mut cara, "Cara")] {
        let joined = handle_message(
            ClientMessage::JoinGame {
                code: code.clone(),
                name: name.to_string(),
            },
            conn,
            &state,
        )
        .await;
        match joined {
            Some(ServerMessage::Welcome { you, .. }) => {
                assert!(!you.is_host);
                assert_eq!(you.name, name.to_lowercase());
            }
            other => panic!("Expected Welcome for {}, got {:?}", name, other),
        }
    }

    // 3. Host configures a custom category and starts the round
    let result = handle_message(
        ClientMessage::SetCustomCategory {
            title: "Snacks".to_string(),
            items: vec!["tacos".to_string(), "kale".to_string()],
        },
        &mut host,
        &state,
    )
    .await;
    assert!(result.is_none(), "Category change should have no direct reply");

    handle_message(ClientMessage::HostStartRound, &mut host, &state).await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Active);
    assert!(session.responses.is_empty());

    // 4. Everyone ranks and locks in
    rank(
        &mut host,
        &state,
        &[("tacos", Tier::Fuego), ("kale", Tier::Trash)],
    )
    .await;
    rank(
        &mut bob,
        &state,
        &[("tacos", Tier::Fuego), ("kale", Tier::Trash)],
    )
    .await;
    rank(
        &mut cara,
        &state,
        &[("tacos", Tier::Mid), ("kale", Tier::Trash)],
    )
    .await;

    let session = state.get_session(&code).await.unwrap();
    assert!(session.all_submitted());

    // 5. Host walks the reveal: one step per item, the last step finalizes
    handle_message(ClientMessage::HostBeginReveal, &mut host, &state).await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Reveal);
    assert_eq!(session.reveal_index, 0);

    handle_message(ClientMessage::HostAdvanceReveal, &mut host, &state).await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Reveal);
    assert_eq!(session.reveal_index, 1);

    handle_message(ClientMessage::HostAdvanceReveal, &mut host, &state).await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Scoreboard);
    assert_eq!(session.rounds.len(), 1);
    assert!(session.responses.is_empty());

    // tacos: FUEGO pair gets 1 match + 2 majority, cara's MID gets nothing.
    // kale: unanimous TRASH, 2 matches + 2 majority for everyone.
    let scores: std::collections::HashMap<_, _> = session
        .players
        .iter()
        .map(|p| (p.name.clone(), p.score))
        .collect();
    assert_eq!(scores["ana"], 7);
    assert_eq!(scores["bob"], 7);
    assert_eq!(scores["cara"], 4);
    assert_eq!(session.rounds[0].scores_this_round["cara"], 4);

    // 6. Next round resets the lobby but keeps players and history
    handle_message(ClientMessage::HostNextRound, &mut host, &state).await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Waiting);
    assert!(session.selected_category.is_none());
    assert_eq!(session.players.len(), 3);
    assert_eq!(session.rounds.len(), 1);
    assert_eq!(session.player("ana").unwrap().score, 7);
}

#[tokio::test]
async fn test_poison_round_flow() {
    let state = Arc::new(AppState::new());
    let mut host = Conn::new();
    let mut bob = Conn::new();

    let created = handle_message(
        ClientMessage::CreateGame {
            host_name: "ana".to_string(),
        },
        &mut host,
        &state,
    )
    .await;
    let code = match created {
        Some(ServerMessage::Welcome { code, .. }) => code,
        other => panic!("Expected Welcome, got {:?}", other),
    };
    handle_message(
        ClientMessage::JoinGame {
            code: code.clone(),
            name: "bob".to_string(),
        },
        &mut bob,
        &state,
    )
    .await;

    handle_message(
        ClientMessage::SetCustomCategory {
            title: "Dinner".to_string(),
            items: vec!["snake".to_string(), "cake".to_string()],
        },
        &mut host,
        &state,
    )
    .await;
    handle_message(
        ClientMessage::SetGameMode {
            mode: GameMode::PoisonRound,
        },
        &mut host,
        &state,
    )
    .await;
    handle_message(
        ClientMessage::SetKingPlayer {
            name: "bob".to_string(),
        },
        &mut host,
        &state,
    )
    .await;

    // Starting a poison round hands control to the king first
    handle_message(ClientMessage::HostStartRound, &mut host, &state).await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::KingChoosingPoison);

    // The host is not the king
    let result = handle_message(
        ClientMessage::SetPoisonItem {
            item: "snake".to_string(),
        },
        &mut host,
        &state,
    )
    .await;
    assert!(
        matches!(result, Some(ServerMessage::Error { ref code, .. }) if code == "POISON_REJECTED"),
        "Expected POISON_REJECTED, got {:?}",
        result
    );

    handle_message(
        ClientMessage::SetPoisonItem {
            item: "snake".to_string(),
        },
        &mut bob,
        &state,
    )
    .await;
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Active);
    assert_eq!(session.poison_item.as_deref(), Some("snake"));

    rank(
        &mut host,
        &state,
        &[("snake", Tier::Fuego), ("cake", Tier::Fuego)],
    )
    .await;
    rank(
        &mut bob,
        &state,
        &[("snake", Tier::Trash), ("cake", Tier::Fuego)],
    )
    .await;

    handle_message(ClientMessage::HostBeginReveal, &mut host, &state).await;
    handle_message(ClientMessage::HostAdvanceReveal, &mut host, &state).await;
    handle_message(ClientMessage::HostAdvanceReveal, &mut host, &state).await;

    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Scoreboard);
    // ana drank the poison (-15) but still matches bob on cake (+1)
    assert_eq!(session.player("ana").unwrap().score, -14);
    assert_eq!(session.player("bob").unwrap().score, 1);
    assert!(session.rounds[0]
        .breakdown
        .iter()
        .any(|line| line.contains("poison")));
}

#[tokio::test]
async fn test_host_only_actions_are_rejected() {
    let state = Arc::new(AppState::new());
    let mut host = Conn::new();
    let mut bob = Conn::new();
    let mut stranger = Conn::new();

    let created = handle_message(
        ClientMessage::CreateGame {
            host_name: "ana".to_string(),
        },
        &mut host,
        &state,
    )
    .await;
    let code = match created {
        Some(ServerMessage::Welcome { code, .. }) => code,
        other => panic!("Expected Welcome, got {:?}", other),
    };
    handle_message(
        ClientMessage::JoinGame {
            code: code.clone(),
            name: "bob".to_string(),
        },
        &mut bob,
        &state,
    )
    .await;

    let result = handle_message(ClientMessage::HostStartRound, &mut bob, &state).await;
    assert!(
        matches!(result, Some(ServerMessage::Error { ref code, .. }) if code == "NOT_HOST"),
        "Expected NOT_HOST, got {:?}",
        result
    );

    let result = handle_message(ClientMessage::HostStartRound, &mut stranger, &state).await;
    assert!(
        matches!(result, Some(ServerMessage::Error { ref code, .. }) if code == "NOT_IN_GAME"),
        "Expected NOT_IN_GAME, got {:?}",
        result
    );

    // Rejections leave the document untouched
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Waiting);
}

#[tokio::test]
async fn test_incomplete_lock_in_and_reveal_gate() {
    let state = Arc::new(AppState::new());
    let mut host = Conn::new();
    let mut bob = Conn::new();

    let created = handle_message(
        ClientMessage::CreateGame {
            host_name: "ana".to_string(),
        },
        &mut host,
        &state,
    )
    .await;
    let code = match created {
        Some(ServerMessage::Welcome { code, .. }) => code,
        other => panic!("Expected Welcome, got {:?}", other),
    };
    handle_message(
        ClientMessage::JoinGame {
            code: code.clone(),
            name: "bob".to_string(),
        },
        &mut bob,
        &state,
    )
    .await;

    handle_message(
        ClientMessage::SetCustomCategory {
            title: "Pets".to_string(),
            items: vec!["cat".to_string(), "dog".to_string()],
        },
        &mut host,
        &state,
    )
    .await;
    handle_message(ClientMessage::HostStartRound, &mut host, &state).await;

    // A half-finished ranking cannot be locked in
    sync(&mut bob, &state).await;
    handle_message(
        ClientMessage::PlaceItem {
            item: "cat".to_string(),
            tier: Tier::Fuego,
        },
        &mut bob,
        &state,
    )
    .await;
    let result = handle_message(ClientMessage::LockInRankings, &mut bob, &state).await;
    match result {
        Some(ServerMessage::Error { code, msg }) => {
            assert_eq!(code, "INCOMPLETE_RANKING");
            assert!(msg.contains("dog"));
        }
        other => panic!("Expected INCOMPLETE_RANKING, got {:?}", other),
    }

    // The reveal waits for every player
    rank(
        &mut host,
        &state,
        &[("cat", Tier::Fuego), ("dog", Tier::Mid)],
    )
    .await;
    let result = handle_message(ClientMessage::HostBeginReveal, &mut host, &state).await;
    match result {
        Some(ServerMessage::Error { code, msg }) => {
            assert_eq!(code, "REVEAL_REJECTED");
            assert!(msg.contains("1 of 2"));
        }
        other => panic!("Expected REVEAL_REJECTED, got {:?}", other),
    }

    rank(
        &mut bob,
        &state,
        &[("cat", Tier::Fuego), ("dog", Tier::Mid)],
    )
    .await;
    let result = handle_message(ClientMessage::HostBeginReveal, &mut host, &state).await;
    assert!(result.is_none(), "Reveal should start once everyone is in");
    let session = state.get_session(&code).await.unwrap();
    assert_eq!(session.status, GameStatus::Reveal);
}

#[tokio::test]
async fn test_host_disconnect_deletes_the_game() {
    let state = Arc::new(AppState::new());
    fuego::cleanup::spawn_cleanup_watcher(state.clone());

    let mut host = Conn::new();
    let created = handle_message(
        ClientMessage::CreateGame {
            host_name: "ana".to_string(),
        },
        &mut host,
        &state,
    )
    .await;
    let code = match created {
        Some(ServerMessage::Welcome { code, .. }) => code,
        other => panic!("Expected Welcome, got {:?}", other),
    };
    let host_uid = host.host_uid.clone().expect("host should have a presence key");
    assert!(state.presence.is_live(&code).await);

    // The socket loop drops host presence when the connection closes
    state.presence.remove_presence(&code, &host_uid).await;

    let mut deleted = false;
    for _ in 0..50 {
        if state.get_session(&code).await.is_none() {
            deleted = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(deleted, "Session should be cleaned up after the host leaves");
}
