//! Error types for the engine layer.

use mafia_player::PlayerError;
use mafia_protocol::PlayerId;

/// Everything an engine operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A connected player already uses this name.
    #[error("there is already a player with the name '{0}' in the session")]
    NameTaken(String),

    /// Joins are closed once the game is running or over.
    #[error("game session has already started, try to connect later")]
    SessionAlreadyStarted,

    /// The player the detective identified is no longer connected.
    #[error("there is no player with the name '{0}' in the current session")]
    PlayerNotFound(String),

    /// The player's notifications were already claimed or closed.
    #[error("notification channel of player {0} has been closed")]
    NotificationChannelClosed(PlayerId),

    /// The detective has no successful investigation to reveal.
    #[error("you haven't exposed anyone during last night")]
    NoExposedPlayer,

    /// A rule blocked the action. Carries the reason shown to the player.
    #[error("action restricted: {0}")]
    ActionRestricted(String),

    /// The id does not belong to a connected player.
    #[error("player {0} is not in the session")]
    NotRegistered(PlayerId),
}

impl From<PlayerError> for EngineError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::NameTaken(name) => Self::NameTaken(name),
            PlayerError::NotFound(id) => Self::NotRegistered(id),
            PlayerError::ChannelClosed(id) | PlayerError::QueueFull(id) => {
                Self::NotificationChannelClosed(id)
            }
        }
    }
}

/// Result of an in-game action.
///
/// Game-rule rejections are not failures of the call: the player has
/// already been told why through their notification queue.
#[derive(Debug)]
pub enum ActionOutcome {
    Accepted,
    Rejected(EngineError),
}

impl ActionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&EngineError> {
        match self {
            Self::Accepted => None,
            Self::Rejected(err) => Some(err),
        }
    }
}
