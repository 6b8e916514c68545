//! `MafiaServer` builder and accept loop.
//!
//! This is the entry point for running a game. It ties the layers
//! together:
//!
//! ```text
//! WebSocketTransport ──accept──→ handler task (one per connection)
//!                                   │ decode Envelope
//!                                   ▼
//!                                Session ──notifications──→ handler task
//! ```

use std::sync::Arc;

use mafia_engine::{GameConfig, Session};
use mafia_protocol::{Codec, JsonCodec};
use mafia_transport::{Transport, WebSocketTransport};

use crate::MafiaError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) session: Session,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Mafia server.
///
/// # Example
///
/// ```rust,no_run
/// use mafia::prelude::*;
///
/// # async fn start() -> Result<(), MafiaError> {
/// let server = MafiaServer::builder()
///     .bind("0.0.0.0:8080")
///     .game_config(GameConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MafiaServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
}

impl MafiaServerBuilder {
    /// Creates a builder listening on `127.0.0.1:8080` with default rules.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the thresholds and delays of the hosted game.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Binds the listener and creates the session.
    ///
    /// # Errors
    /// Returns [`MafiaError::Transport`] if the address cannot be bound.
    pub async fn build(self) -> Result<MafiaServer<JsonCodec>, MafiaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            session: Session::new(self.game_config),
            codec: JsonCodec,
        });
        Ok(MafiaServer { transport, state })
    }
}

impl Default for MafiaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Mafia server hosting one game session.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MafiaServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl MafiaServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> MafiaServerBuilder {
        MafiaServerBuilder::new()
    }
}

impl<C> MafiaServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the hosted session, for inspection.
    pub fn session(&self) -> Session {
        self.state.session.clone()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Every connection is served by its own task. A failed handshake
    /// only ends that connection.
    pub async fn run(mut self) -> Result<(), MafiaError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "mafia server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
