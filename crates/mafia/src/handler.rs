//! Per-connection handler: join, notification streaming, request routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Join` → register the player, reply `Joined`
//!   2. Spawn a forwarder that streams the player's notifications
//!   3. Loop: receive requests → call the session → reply `Ack`
//!
//! Whichever way the loop ends, the player leaves the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use mafia_engine::{EngineError, NotificationStream, Session};
use mafia_protocol::{
    ClientRequest, Codec, Envelope, Payload, PlayerId, ProtocolError, ServerMessage,
};
use mafia_transport::{Connection, WebSocketConnection};
use tokio::task::JoinHandle;

use crate::MafiaError;
use crate::server::ServerState;

/// How long a fresh connection may take to send its `Join`.
const JOIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The sending half of a connection, shared by the request loop and the
/// notification forwarder so both draw from one sequence counter.
struct Outbox<C: Codec> {
    conn: WebSocketConnection,
    codec: C,
    seq: AtomicU64,
    started: Instant,
}

impl<C: Codec> Outbox<C> {
    fn new(conn: WebSocketConnection, codec: C) -> Self {
        Self {
            conn,
            codec,
            seq: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    async fn send(&self, message: ServerMessage) -> Result<(), MafiaError> {
        let envelope = Envelope {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            timestamp: self.started.elapsed().as_millis() as u64,
            payload: Payload::Response(message),
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn error(&self, code: u16, message: impl Into<String>) -> Result<(), MafiaError> {
        self.send(ServerMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }
}

/// Leaves the session when the handler exits, even on panic.
///
/// `Drop` is synchronous, so the leave runs in a fire-and-forget task.
struct SessionGuard {
    player_id: PlayerId,
    session: Session,
    forwarder: JoinHandle<()>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.forwarder.abort();
        let player_id = self.player_id;
        let session = self.session.clone();
        tokio::spawn(async move {
            // Already gone after an explicit `Leave`.
            let _ = session.leave(player_id).await;
        });
    }
}

/// What the request loop does after a request.
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), MafiaError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let outbox = Arc::new(Outbox::new(conn, state.codec.clone()));

    // --- Step 1: Join ---
    let player_id = await_join(&outbox, &state).await?;
    tracing::info!(%conn_id, %player_id, "connection joined the session");

    // --- Step 2: Notifications ---
    // The queue exists from the moment of joining, so nothing sent in
    // between is lost.
    let stream = state.session.subscribe(player_id).await?;
    let _guard = SessionGuard {
        player_id,
        session: state.session.clone(),
        forwarder: tokio::spawn(forward_notifications(
            Arc::clone(&outbox),
            stream,
            player_id,
        )),
    };

    // --- Step 3: Request loop ---
    loop {
        let data = match outbox.conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let request = match decode_request(&state.codec, &data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode request");
                outbox.error(400, e.to_string()).await?;
                continue;
            }
        };

        if let Flow::Close = handle_request(&outbox, &state.session, player_id, request).await? {
            break;
        }
    }

    if let Err(e) = outbox.conn.close().await {
        tracing::debug!(%player_id, error = %e, "close failed");
    }
    // _guard drops here → player leaves the session.
    Ok(())
}

/// Waits for the `Join` request and registers the player.
///
/// A taken name is answered with 409 and the client may try another.
/// Anything else that is not a successful join ends the connection.
async fn await_join<C: Codec>(
    outbox: &Outbox<C>,
    state: &ServerState<C>,
) -> Result<PlayerId, MafiaError> {
    loop {
        let data = match tokio::time::timeout(JOIN_TIMEOUT, outbox.conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(ProtocolError::InvalidMessage(
                    "connection closed before joining".into(),
                )
                .into());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                outbox.error(400, "join timed out").await?;
                return Err(ProtocolError::InvalidMessage("join timed out".into()).into());
            }
        };

        let name = match decode_request(&state.codec, &data) {
            Ok(ClientRequest::Join { name }) => name,
            Ok(_) => {
                outbox.error(400, "expected Join").await?;
                return Err(
                    ProtocolError::InvalidMessage("first request must be Join".into()).into(),
                );
            }
            Err(e) => {
                outbox.error(400, e.to_string()).await?;
                return Err(e.into());
            }
        };

        match state.session.join(&name).await {
            Ok(player_id) => {
                if let Err(e) = outbox.send(ServerMessage::Joined { player_id }).await {
                    state.session.leave(player_id).await;
                    return Err(e);
                }
                return Ok(player_id);
            }
            Err(e @ EngineError::NameTaken(_)) => {
                outbox.error(409, e.to_string()).await?;
            }
            Err(e @ EngineError::SessionAlreadyStarted) => {
                outbox.error(403, e.to_string()).await?;
                return Err(e.into());
            }
            Err(e) => {
                outbox.error(400, e.to_string()).await?;
                return Err(e.into());
            }
        }
    }
}

fn decode_request<C: Codec>(codec: &C, data: &[u8]) -> Result<ClientRequest, ProtocolError> {
    let envelope: Envelope = codec.decode(data)?;
    match envelope.payload {
        Payload::Request(request) => Ok(request),
        Payload::Response(_) => Err(ProtocolError::InvalidMessage(
            "clients may only send requests".into(),
        )),
    }
}

/// Routes one request to the session.
///
/// Game-rule rejections are still acknowledged: the player learns the
/// reason from the notification that accompanies them.
async fn handle_request<C: Codec>(
    outbox: &Outbox<C>,
    session: &Session,
    player_id: PlayerId,
    request: ClientRequest,
) -> Result<Flow, MafiaError> {
    let outcome = match request {
        ClientRequest::Join { .. } => {
            outbox.error(400, "already joined").await?;
            return Ok(Flow::Continue);
        }
        ClientRequest::Leave => {
            session.leave(player_id).await;
            outbox.send(ServerMessage::Ack).await?;
            return Ok(Flow::Close);
        }
        ClientRequest::ListPlayers => {
            let players = session.list_players().await;
            outbox.send(ServerMessage::PlayerList { players }).await?;
            return Ok(Flow::Continue);
        }
        ClientRequest::Vote { target } => session.cast_vote(player_id, &target).await,
        ClientRequest::EndTurn => session.end_turn(player_id).await,
        ClientRequest::Expose => session.expose(player_id).await,
        ClientRequest::Chat { text } => session.chat(player_id, &text).await,
    };

    if let Some(reason) = outcome.rejection() {
        tracing::debug!(%player_id, %reason, "request rejected");
    }
    outbox.send(ServerMessage::Ack).await?;
    Ok(Flow::Continue)
}

/// Streams a player's notifications to their connection.
///
/// After the game-ending event the socket is closed, which in turn ends
/// the request loop.
async fn forward_notifications<C: Codec>(
    outbox: Arc<Outbox<C>>,
    mut stream: NotificationStream,
    player_id: PlayerId,
) {
    while let Some(event) = stream.recv().await {
        let terminal = event.is_terminal();
        if let Err(e) = outbox.send(ServerMessage::event(event)).await {
            tracing::debug!(%player_id, error = %e, "notification delivery failed");
            return;
        }
        if terminal {
            tracing::debug!(%player_id, "session over, closing connection");
            if let Err(e) = outbox.conn.close().await {
                tracing::debug!(%player_id, error = %e, "close after session end failed");
            }
            return;
        }
    }
}
