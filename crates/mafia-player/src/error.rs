//! Error types for the player layer.

use mafia_protocol::PlayerId;

/// Errors raised by the registry and per-player channels.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Another connected player already uses this name.
    #[error("there is already a player named '{0}' in the session")]
    NameTaken(String),

    /// No player with this id is registered.
    #[error("player {0} is not registered")]
    NotFound(PlayerId),

    /// The player's notification queue has been closed or already handed
    /// out to a subscriber.
    #[error("notification channel of player {0} is closed")]
    ChannelClosed(PlayerId),

    /// The player's notification queue is full; the event was dropped.
    #[error("notification queue of player {0} is full")]
    QueueFull(PlayerId),
}
