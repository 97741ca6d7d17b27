//! End-to-end tests: a real server on a loopback socket, driven by
//! real WebSocket clients speaking the JSON wire format.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridfall::GridfallServerBuilder;
use gridfall_protocol::{
    ClientAction, GameMode, PlayerId, RoomCode, ServerEvent,
};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns its address.
async fn start_server() -> String {
    let server = GridfallServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Connects a client and drains the `connected` greeting, returning
/// the stream and the server-assigned player id.
async fn connect(addr: &str) -> (ClientWs, PlayerId) {
    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
    let player = match recv_event(&mut ws).await {
        ServerEvent::Connected { player_id } => player_id,
        other => panic!("expected Connected greeting, got {other:?}"),
    };
    (ws, player)
}

async fn send(ws: &mut ClientWs, action: &ClientAction) {
    let text = serde_json::to_string(action).expect("encode action");
    ws.send(Message::text(text)).await.expect("send action");
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended")
        .expect("recv failed");
    serde_json::from_slice(&msg.into_data()).expect("decode event")
}

/// Creates a room and returns its code (drains the `roomCreated`
/// reply).
async fn create_room(
    ws: &mut ClientWs,
    name: &str,
    mode: GameMode,
) -> RoomCode {
    send(
        ws,
        &ClientAction::CreateRoom {
            board_size: 9,
            max_players: None,
            player_name: name.into(),
            mode,
        },
    )
    .await;
    match recv_event(ws).await {
        ServerEvent::RoomCreated { room_code, .. } => room_code,
        other => panic!("expected RoomCreated, got {other:?}"),
    }
}

/// Joins `ws2` into a room, draining the `playerJoined` broadcast from
/// both clients.
async fn join_room(
    host_ws: &mut ClientWs,
    ws: &mut ClientWs,
    code: &RoomCode,
    name: &str,
) {
    send(
        ws,
        &ClientAction::JoinRoom {
            room_code: code.clone(),
            player_name: name.into(),
        },
    )
    .await;
    for ws in [host_ws, ws] {
        match recv_event(ws).await {
            ServerEvent::PlayerJoined { .. } => {}
            other => panic!("expected PlayerJoined, got {other:?}"),
        }
    }
}

// =========================================================================
// Connection basics
// =========================================================================

#[tokio::test]
async fn test_connected_greeting_carries_player_id() {
    let addr = start_server().await;
    let (_ws, player) = connect(&addr).await;
    assert!(player.0 > 0);
}

#[tokio::test]
async fn test_each_connection_gets_distinct_id() {
    let addr = start_server().await;
    let (_ws1, p1) = connect(&addr).await;
    let (_ws2, p2) = connect(&addr).await;
    assert_ne!(p1, p2);
}

#[tokio::test]
async fn test_garbage_frame_is_skipped() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    ws.send(Message::text("not json at all")).await.unwrap();

    // A valid action afterwards still works.
    send(
        &mut ws,
        &ClientAction::CheckSession { room_code: RoomCode::new("NOSUCH") },
    )
    .await;
    match recv_event(&mut ws).await {
        ServerEvent::SessionStatus { exists, .. } => assert!(!exists),
        other => panic!("expected SessionStatus, got {other:?}"),
    }
}

// =========================================================================
// Room lifecycle over the wire
// =========================================================================

#[tokio::test]
async fn test_create_room_replies_with_room_created() {
    let addr = start_server().await;
    let (mut ws, player) = connect(&addr).await;

    send(
        &mut ws,
        &ClientAction::CreateRoom {
            board_size: 16,
            max_players: Some(4),
            player_name: "Alice".into(),
            mode: GameMode::Classic,
        },
    )
    .await;

    match recv_event(&mut ws).await {
        ServerEvent::RoomCreated {
            room_code,
            host,
            board_size,
            max_players,
            mode,
        } => {
            assert_eq!(room_code.as_str().len(), 6);
            assert_eq!(host, player);
            assert_eq!(board_size, 16);
            assert_eq!(max_players, 4);
            assert_eq!(mode, GameMode::Classic);
        }
        other => panic!("expected RoomCreated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_broadcast_reaches_everyone() {
    let addr = start_server().await;
    let (mut ws1, p1) = connect(&addr).await;
    let (mut ws2, p2) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;

    send(
        &mut ws2,
        &ClientAction::JoinRoom {
            room_code: code,
            player_name: "Bob".into(),
        },
    )
    .await;

    for ws in [&mut ws1, &mut ws2] {
        match recv_event(ws).await {
            ServerEvent::PlayerJoined { player_id, players, .. } => {
                assert_eq!(player_id, p2);
                let ids: Vec<PlayerId> =
                    players.iter().map(|p| p.id).collect();
                assert_eq!(ids, [p1, p2]);
            }
            other => panic!("expected PlayerJoined, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_join_unknown_room_returns_error() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(
        &mut ws,
        &ClientAction::JoinRoom {
            room_code: RoomCode::new("NOSUCH"),
            player_name: "Bob".into(),
        },
    )
    .await;

    match recv_event(&mut ws).await {
        ServerEvent::Error { message } => {
            assert!(message.contains("not found"), "got: {message}");
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_third_join_into_two_player_room_is_rejected() {
    let addr = start_server().await;
    let (mut ws1, _) = connect(&addr).await;
    let (mut ws2, _) = connect(&addr).await;
    let (mut ws3, _) = connect(&addr).await;

    send(
        &mut ws1,
        &ClientAction::CreateRoom {
            board_size: 9,
            max_players: Some(2),
            player_name: "Alice".into(),
            mode: GameMode::Classic,
        },
    )
    .await;
    let code = match recv_event(&mut ws1).await {
        ServerEvent::RoomCreated { room_code, .. } => room_code,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    join_room(&mut ws1, &mut ws2, &code, "Bob").await;

    send(
        &mut ws3,
        &ClientAction::JoinRoom {
            room_code: code,
            player_name: "Carol".into(),
        },
    )
    .await;

    match recv_event(&mut ws3).await {
        ServerEvent::Error { message } => {
            assert!(message.contains("full"), "got: {message}");
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_check_session_for_existing_room() {
    let addr = start_server().await;
    let (mut ws1, _) = connect(&addr).await;
    let (mut ws2, _) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;

    send(
        &mut ws2,
        &ClientAction::CheckSession { room_code: code.clone() },
    )
    .await;

    match recv_event(&mut ws2).await {
        ServerEvent::SessionStatus { room_code, exists, joinable } => {
            assert_eq!(room_code, code);
            assert!(exists);
            assert!(joinable);
        }
        other => panic!("expected SessionStatus, got {other:?}"),
    }
}

// =========================================================================
// Playing a round
// =========================================================================

#[tokio::test]
async fn test_full_classic_round_to_game_over() {
    let addr = start_server().await;
    let (mut ws1, _p1) = connect(&addr).await;
    let (mut ws2, p2) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;
    join_room(&mut ws1, &mut ws2, &code, "Bob").await;

    // Host starts: both clients learn the game began.
    send(&mut ws1, &ClientAction::StartGame { board_size: None }).await;
    for ws in [&mut ws1, &mut ws2] {
        match recv_event(ws).await {
            ServerEvent::GameStarted { board_size, current_player, .. } => {
                assert_eq!(board_size, 9);
                assert_eq!(current_player, None);
            }
            other => panic!("expected GameStarted, got {other:?}"),
        }
    }

    // Host picks square 7 as the danger square.
    send(&mut ws1, &ClientAction::SelectDangerSquare { square_index: 7 })
        .await;
    for ws in [&mut ws1, &mut ws2] {
        match recv_event(ws).await {
            ServerEvent::DangerSquareSelected { danger_square, .. } => {
                assert_eq!(danger_square, 7);
            }
            other => panic!("expected DangerSquareSelected, got {other:?}"),
        }
    }

    // Bob reveals a safe square.
    send(&mut ws2, &ClientAction::SquareClicked { square_index: 3 }).await;
    for ws in [&mut ws1, &mut ws2] {
        match recv_event(ws).await {
            ServerEvent::SquareClicked {
                player_id,
                square_index,
                clicked_count,
                ..
            } => {
                assert_eq!(player_id, p2);
                assert_eq!(square_index, 3);
                assert_eq!(clicked_count, 1);
            }
            other => panic!("expected SquareClicked, got {other:?}"),
        }
    }

    // Bob hits the danger square and loses.
    send(&mut ws2, &ClientAction::SquareClicked { square_index: 7 }).await;
    for ws in [&mut ws1, &mut ws2] {
        match recv_event(ws).await {
            ServerEvent::GameOver { loser, loser_name, clicked_squares } => {
                assert_eq!(loser, p2);
                assert_eq!(loser_name, "Bob");
                assert_eq!(clicked_squares, vec![3]);
            }
            other => panic!("expected GameOver, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_elimination_round_announces_turns_and_rejects_queue_jumping() {
    let addr = start_server().await;
    let (mut ws1, p1) = connect(&addr).await;
    let (mut ws2, _p2) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Elimination).await;
    join_room(&mut ws1, &mut ws2, &code, "Bob").await;

    send(&mut ws1, &ClientAction::StartGame { board_size: None }).await;
    for ws in [&mut ws1, &mut ws2] {
        match recv_event(ws).await {
            ServerEvent::GameStarted { mode, current_player, .. } => {
                assert_eq!(mode, GameMode::Elimination);
                assert_eq!(current_player, Some(p1), "host goes first");
            }
            other => panic!("expected GameStarted, got {other:?}"),
        }
    }

    // Bob clicks out of turn and is told so; nobody else hears it.
    send(&mut ws2, &ClientAction::SquareClicked { square_index: 0 }).await;
    match recv_event(&mut ws2).await {
        ServerEvent::Error { message } => {
            assert!(message.contains("turn"), "got: {message}");
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_restart_after_loss_resets_the_room() {
    let addr = start_server().await;
    let (mut ws1, _) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;

    send(&mut ws1, &ClientAction::StartGame { board_size: None }).await;
    let _ = recv_event(&mut ws1).await; // gameStarted
    send(&mut ws1, &ClientAction::SelectDangerSquare { square_index: 0 })
        .await;
    let _ = recv_event(&mut ws1).await; // dangerSquareSelected
    send(&mut ws1, &ClientAction::SquareClicked { square_index: 0 }).await;
    match recv_event(&mut ws1).await {
        ServerEvent::GameOver { .. } => {}
        other => panic!("expected GameOver, got {other:?}"),
    }

    send(&mut ws1, &ClientAction::RestartGame).await;
    match recv_event(&mut ws1).await {
        ServerEvent::GameRestarted => {}
        other => panic!("expected GameRestarted, got {other:?}"),
    }

    // The room is joinable again after the restart.
    send(
        &mut ws1,
        &ClientAction::CheckSession { room_code: code.clone() },
    )
    .await;
    match recv_event(&mut ws1).await {
        ServerEvent::SessionStatus { exists, joinable, .. } => {
            assert!(exists);
            assert!(joinable);
        }
        other => panic!("expected SessionStatus, got {other:?}"),
    }
}

// =========================================================================
// Silent rejections and departures
// =========================================================================

#[tokio::test]
async fn test_non_host_start_is_silently_ignored() {
    let addr = start_server().await;
    let (mut ws1, _) = connect(&addr).await;
    let (mut ws2, _) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;
    join_room(&mut ws1, &mut ws2, &code, "Bob").await;

    // Bob tries to start; the server ignores it. We prove the silence
    // by sending a follow-up query — its reply must be the very next
    // event Bob receives.
    send(&mut ws2, &ClientAction::StartGame { board_size: None }).await;
    send(
        &mut ws2,
        &ClientAction::CheckSession { room_code: code.clone() },
    )
    .await;

    match recv_event(&mut ws2).await {
        ServerEvent::SessionStatus { joinable, .. } => {
            assert!(joinable, "room must still be waiting");
        }
        other => panic!("expected SessionStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_leave_session_promotes_new_host() {
    let addr = start_server().await;
    let (mut ws1, p1) = connect(&addr).await;
    let (mut ws2, p2) = connect(&addr).await;
    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;
    join_room(&mut ws1, &mut ws2, &code, "Bob").await;

    send(&mut ws1, &ClientAction::LeaveSession).await;

    match recv_event(&mut ws2).await {
        ServerEvent::NewHost { host_id, host_name } => {
            assert_eq!(host_id, p2);
            assert_eq!(host_name, "Bob");
        }
        other => panic!("expected NewHost, got {other:?}"),
    }
    match recv_event(&mut ws2).await {
        ServerEvent::PlayerLeft { player_id, players, .. } => {
            assert_eq!(player_id, p1);
            assert_eq!(players.len(), 1);
        }
        other => panic!("expected PlayerLeft, got {other:?}"),
    }

    // Alice's connection is still usable: she can open a new room.
    let second = create_room(&mut ws1, "Alice", GameMode::Classic).await;
    assert_ne!(second, code);
}

#[tokio::test]
async fn test_disconnect_broadcasts_departure() {
    let addr = start_server().await;
    let (mut ws1, p1) = connect(&addr).await;
    let (mut ws2, p2) = connect(&addr).await;

    let code = create_room(&mut ws1, "Alice", GameMode::Classic).await;
    join_room(&mut ws1, &mut ws2, &code, "Bob").await;

    // Alice's socket drops without a leaveSession.
    drop(ws1);

    match recv_event(&mut ws2).await {
        ServerEvent::NewHost { host_id, .. } => assert_eq!(host_id, p2),
        other => panic!("expected NewHost, got {other:?}"),
    }
    match recv_event(&mut ws2).await {
        ServerEvent::PlayerLeft { player_id, .. } => {
            assert_eq!(player_id, p1);
        }
        other => panic!("expected PlayerLeft, got {other:?}"),
    }
}
