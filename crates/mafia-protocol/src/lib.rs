//! Wire protocol and game vocabulary for the Mafia server.
//!
//! - **Types** ([`PlayerId`], [`Role`], [`Phase`], [`Scope`], [`Outcome`])
//!   name the things a game is made of.
//! - **Notifications** ([`Notification`]) are the events a player
//!   observes, each with a canonical text rendering.
//! - **Envelopes** ([`Envelope`], [`ClientRequest`], [`ServerMessage`])
//!   are what travels on the wire.
//! - **Codec** ([`Codec`], [`JsonCodec`]) turns envelopes into bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Engine (Session operations)
//! ```

mod codec;
mod error;
mod notification;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use notification::Notification;
pub use types::{
    ClientRequest, Envelope, Outcome, Payload, Phase, PlayerId, Role, Scope, ServerMessage,
};
