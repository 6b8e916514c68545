//! Game configuration and the session lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Tunables for a game session.
///
/// The three player thresholds drive both the lobby trigger and the role
/// quotas (see [`quota`](crate::quota)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Players needed to start the countdown, and to survive it.
    pub min_players: usize,

    /// From this count on, two mafia members are dealt.
    pub mid_players: usize,

    /// From this count on, quotas scale with the player count.
    pub max_players_tier: usize,

    /// Lobby countdown between reaching `min_players` and dealing roles.
    pub start_delay: Duration,

    /// Pause after the day-start event before last night's results are
    /// revealed.
    pub notification_delay: Duration,

    /// Undelivered notifications buffered per player before new ones are
    /// dropped.
    pub notification_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 4,
            mid_players: 7,
            max_players_tier: 12,
            start_delay: Duration::from_secs(10),
            notification_delay: Duration::from_secs(1),
            notification_capacity: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of the single game session.
///
/// ```text
/// Lobby ──→ Starting ──→ Active ──→ Ended
///   ↑          │
///   └──(abort)─┘
/// ```
///
/// - **Lobby**: accepting players, not enough to start.
/// - **Starting**: countdown running; joins are still accepted.
/// - **Active**: roles dealt, rounds alternate Day/Night.
/// - **Ended**: outcome announced. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Lobby,
    Starting,
    Active,
    Ended,
}

impl SessionState {
    /// Returns `true` if new players may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby | Self::Starting)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::Starting)
                | (Self::Starting, Self::Active)
                | (Self::Starting, Self::Lobby)
                | (Self::Active, Self::Ended)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Starting => write!(f, "Starting"),
            Self::Active => write!(f, "Active"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
