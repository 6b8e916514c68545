//! Integration tests for the Mafia server over real WebSocket connections.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mafia::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const PATIENCE: Duration = Duration::from_secs(5);

/// Short delays so a full lobby starts within the test's patience.
fn quick_config() -> GameConfig {
    GameConfig {
        start_delay: Duration::from_secs(1),
        notification_delay: Duration::from_millis(20),
        ..GameConfig::default()
    }
}

/// Starts a server on a random port and returns its address and session.
async fn start_server() -> (String, Session) {
    let server = MafiaServer::builder()
        .bind("127.0.0.1:0")
        .game_config(quick_config())
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let session = server.session();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, session)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_request(ws: &mut ClientWs, request: ClientRequest) {
    let bytes = serde_json::to_string(&Envelope::request(0, request)).expect("encode");
    ws.send(Message::Text(bytes.into())).await.expect("send");
}

/// The next server message. Panics on close or timeout.
async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(PATIENCE, ws.next())
        .await
        .expect("timed out waiting for the server")
        .expect("stream ended")
        .expect("websocket error");
    let envelope: Envelope = match msg {
        Message::Text(text) => serde_json::from_str(&text).expect("decode"),
        Message::Binary(data) => serde_json::from_slice(&data).expect("decode"),
        other => panic!("expected a data frame, got {other:?}"),
    };
    match envelope.payload {
        Payload::Response(message) => message,
        other => panic!("expected a response, got {other:?}"),
    }
}

/// Skips notifications until a direct reply arrives.
async fn reply(ws: &mut ClientWs) -> ServerMessage {
    loop {
        match recv(ws).await {
            ServerMessage::Event { .. } => continue,
            other => return other,
        }
    }
}

/// Reads notifications until one matches `done`, returning all of them.
async fn events_until(
    ws: &mut ClientWs,
    done: impl Fn(&Notification) -> bool,
) -> Vec<Notification> {
    let mut seen = Vec::new();
    loop {
        if let ServerMessage::Event { event, .. } = recv(ws).await {
            let stop = done(&event);
            seen.push(event);
            if stop {
                return seen;
            }
        }
    }
}

async fn join(ws: &mut ClientWs, name: &str) -> PlayerId {
    send_request(ws, ClientRequest::Join { name: name.into() }).await;
    match reply(ws).await {
        ServerMessage::Joined { player_id } => player_id,
        other => panic!("expected Joined, got {other:?}"),
    }
}

async fn expect_closed(ws: &mut ClientWs) {
    let deadline = tokio::time::Instant::now() + PATIENCE;
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return,
            // notifications may still be in flight ahead of the close
            Ok(Some(Ok(_))) => continue,
            Err(_) => panic!("connection was not closed"),
        }
    }
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_replies_with_id_and_announces_player() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr).await;

    send_request(&mut ws, ClientRequest::Join { name: "ann".into() }).await;

    assert!(matches!(recv(&mut ws).await, ServerMessage::Joined { .. }));
    match recv(&mut ws).await {
        ServerMessage::Event { event, text } => {
            assert_eq!(event, Notification::ClientConnected { name: "ann".into() });
            assert_eq!(text, "Player 'ann' connected");
        }
        other => panic!("expected Event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_request_not_join_is_rejected_and_closed() {
    let (addr, session) = start_server().await;
    let mut ws = connect(&addr).await;

    send_request(&mut ws, ClientRequest::ListPlayers).await;

    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }
    expect_closed(&mut ws).await;
    assert!(session.list_players().await.is_empty());
}

#[tokio::test]
async fn test_join_taken_name_gets_409_and_may_retry() {
    let (addr, _) = start_server().await;
    let mut first = connect(&addr).await;
    let mut second = connect(&addr).await;
    join(&mut first, "ann").await;

    send_request(&mut second, ClientRequest::Join { name: "ann".into() }).await;
    match recv(&mut second).await {
        ServerMessage::Error { code, message } => {
            assert_eq!(code, 409);
            assert!(message.contains("ann"));
        }
        other => panic!("expected Error, got {other:?}"),
    }

    join(&mut second, "bob").await;
    send_request(&mut second, ClientRequest::ListPlayers).await;
    match reply(&mut second).await {
        ServerMessage::PlayerList { players } => assert_eq!(players, vec!["ann", "bob"]),
        other => panic!("expected PlayerList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_after_start_gets_403() {
    let (addr, _) = start_server().await;
    let mut clients = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let mut ws = connect(&addr).await;
        join(&mut ws, name).await;
        clients.push(ws);
    }
    events_until(&mut clients[0], |e| *e == Notification::SessionStart).await;

    let mut late = connect(&addr).await;
    send_request(&mut late, ClientRequest::Join { name: "e".into() }).await;
    match recv(&mut late).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, 403),
        other => panic!("expected Error, got {other:?}"),
    }
    expect_closed(&mut late).await;
}

// =========================================================================
// Requests
// =========================================================================

#[tokio::test]
async fn test_malformed_request_gets_400_and_connection_survives() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr).await;
    join(&mut ws, "ann").await;

    ws.send(Message::Text("not json".into())).await.expect("send");
    match reply(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }

    send_request(&mut ws, ClientRequest::ListPlayers).await;
    assert!(matches!(
        reply(&mut ws).await,
        ServerMessage::PlayerList { players } if players == vec!["ann"]
    ));
}

#[tokio::test]
async fn test_vote_in_lobby_is_acked_and_restricted_by_event() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr).await;
    join(&mut ws, "ann").await;

    send_request(&mut ws, ClientRequest::Vote { target: "bob".into() }).await;

    // The ack and the notification travel independently.
    let (mut acked, mut restricted) = (false, None);
    while !acked || restricted.is_none() {
        match recv(&mut ws).await {
            ServerMessage::Ack => acked = true,
            ServerMessage::Event {
                event: Notification::VotingRestricted { reason },
                ..
            } => restricted = Some(reason),
            ServerMessage::Event { .. } => {}
            other => panic!("unexpected reply {other:?}"),
        }
    }
    assert_eq!(restricted.as_deref(), Some("the game has not started yet"));
}

#[tokio::test]
async fn test_leave_request_acks_closes_and_notifies_others() {
    let (addr, session) = start_server().await;
    let mut ann = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut ann, "ann").await;
    join(&mut bob, "bob").await;

    send_request(&mut ann, ClientRequest::Leave).await;
    assert_eq!(reply(&mut ann).await, ServerMessage::Ack);
    expect_closed(&mut ann).await;

    events_until(&mut bob, |e| {
        *e == Notification::ClientDisconnected { name: "ann".into() }
    })
    .await;
    assert_eq!(session.list_players().await, vec!["bob"]);
}

#[tokio::test]
async fn test_dropped_connection_leaves_session() {
    let (addr, session) = start_server().await;
    let mut ann = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut ann, "ann").await;
    join(&mut bob, "bob").await;

    drop(ann);

    events_until(&mut bob, |e| {
        *e == Notification::ClientDisconnected { name: "ann".into() }
    })
    .await;
    assert_eq!(session.list_players().await, vec!["bob"]);
}

// =========================================================================
// Game start
// =========================================================================

#[tokio::test]
async fn test_full_lobby_deals_roles_and_opens_first_day() {
    let (addr, session) = start_server().await;
    let mut clients = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let mut ws = connect(&addr).await;
        join(&mut ws, name).await;
        clients.push(ws);
    }

    let mut roles = Vec::new();
    for ws in &mut clients {
        let seen = events_until(ws, |e| *e == Notification::PhaseStartDay).await;
        assert!(seen.contains(&Notification::SessionDisclaimer { seconds: 1 }));
        assert!(seen.contains(&Notification::SessionStart));
        let role = seen.iter().find_map(|e| match e {
            Notification::RoleAssigned { role } => Some(*role),
            _ => None,
        });
        roles.push(role.expect("every player is dealt a role"));
    }

    let count = |role: Role| roles.iter().filter(|r| **r == role).count();
    assert_eq!(count(Role::Mafia), 1);
    assert_eq!(count(Role::Detective), 1);
    assert_eq!(count(Role::Civilian), 2);
    assert_eq!(session.info().await.state, SessionState::Active);
}
