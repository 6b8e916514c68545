//! # Mafia
//!
//! A multiplayer Mafia game server over WebSockets.
//!
//! One server hosts one game session. Clients connect, send `Join` with
//! a name, and from then on receive every game notification addressed to
//! them while they vote, chat, and end their turns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mafia::prelude::*;
//!
//! # async fn start() -> Result<(), MafiaError> {
//! let server = MafiaServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```
//!
//! The crates underneath are re-exported for clients and tests:
//! [`protocol`] for the wire types, [`engine`] for the session itself.

mod error;
mod handler;
mod server;

pub use error::MafiaError;
pub use server::{MafiaServer, MafiaServerBuilder};

pub use mafia_engine as engine;
pub use mafia_protocol as protocol;

pub mod prelude {
    pub use crate::{MafiaError, MafiaServer, MafiaServerBuilder};
    pub use mafia_engine::{GameConfig, Session, SessionState};
    pub use mafia_protocol::{
        ClientRequest, Envelope, Notification, Outcome, Payload, PlayerId, Role, ServerMessage,
    };
}
