//! Error types for the protocol layer.
//!
//! Each crate in the workspace owns its own error enum. A
//! `ProtocolError` always means the bytes on the wire were the problem,
//! never the game rules.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value).
    ///
    /// Malformed JSON, a missing field, or an unknown request `type`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but breaks a protocol rule, e.g. a request
    /// other than `Join` arriving before the player has joined.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
