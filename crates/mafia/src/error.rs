//! Unified error type for the Mafia server.

use mafia_engine::EngineError;
use mafia_player::PlayerError;
use mafia_protocol::ProtocolError;
use mafia_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` conversions let `?` lift transport, codec, and engine
/// failures into one type inside the connection handler.
#[derive(Debug, thiserror::Error)]
pub enum MafiaError {
    /// Binding, accepting, or moving frames failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session refused an operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A player record or channel operation failed.
    #[error(transparent)]
    Player(#[from] PlayerError),
}
