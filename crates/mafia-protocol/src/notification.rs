//! The notification catalog.
//!
//! Every observable change in a game session reaches players as one of
//! these events. Each variant carries only the data a client needs to
//! render it; the [`fmt::Display`] impl produces the canonical text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Outcome, Role};

/// A game event queued for one player.
///
/// Serialized with a `kind` tag: `{ "kind": "role_assigned", "role": "mafia" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    ClientConnected { name: String },
    ClientDisconnected { name: String },
    /// The lobby countdown has begun.
    SessionDisclaimer { seconds: u64 },
    SessionAbort,
    SessionStart,
    /// Terminal event: nothing follows it on a subscriber's stream.
    SessionEnd { outcome: Outcome },
    RoleAssigned { role: Role },
    PlayerNotFound { name: String },
    PlayerEliminated { name: String, role: Role },
    PlayerExposed { name: String },
    NoExposedPlayer,
    GuessSuccess,
    GuessFail,
    VotingRestricted { reason: String },
    VotesMismatch,
    MafiaVotesMismatch,
    PhaseStartDay,
    PhaseStartNight,
    ChatMessage { sender: String, text: String },
    ChatRestricted { reason: String },
}

impl Notification {
    /// Returns `true` for the event that closes a subscriber's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionEnd { .. })
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientConnected { name } => write!(f, "Player '{name}' connected"),
            Self::ClientDisconnected { name } => {
                write!(f, "Player '{name}' disconnected")
            }
            Self::SessionDisclaimer { seconds } => {
                write!(f, "The game will start in {seconds} seconds")
            }
            Self::SessionAbort => f.write_str(
                "There are not enough players to continue game, some of them might have disconnected",
            ),
            Self::SessionStart => f.write_str("---- GAME STARTED ----"),
            Self::SessionEnd { outcome } => {
                write!(f, "---- GAME ENDED ----\nThe outcome: {outcome}")
            }
            Self::RoleAssigned { role } => {
                write!(f, "You have been assigned the role of: {role}")
            }
            Self::PlayerNotFound { name } => write!(
                f,
                "There is no player with the name '{name}' in the current session"
            ),
            Self::PlayerEliminated { name, role } => write!(
                f,
                "Player '{name}' was a {role} and has been eliminated. \
                 They may continue to observe the game session as a ghost"
            ),
            Self::PlayerExposed { name } => write!(
                f,
                "The Detective has found out that '{name}' is a member of Mafia!"
            ),
            Self::NoExposedPlayer => {
                f.write_str("you haven't exposed anyone during last night")
            }
            Self::GuessSuccess => f.write_str("the selected player is a member of Mafia!"),
            Self::GuessFail => f.write_str("the selected player is not a member of Mafia"),
            Self::VotingRestricted { reason } => {
                write!(f, "Voting is restricted for you: {reason}")
            }
            Self::VotesMismatch => f.write_str(
                "There wasn't a single target with the highest count of votes, so no-one is being executed",
            ),
            Self::MafiaVotesMismatch => f.write_str(
                "All mafia members have to vote for the same person, but there has been a mismatch",
            ),
            Self::PhaseStartDay => f.write_str("---- A new day has started ----"),
            Self::PhaseStartNight => f.write_str("---- Darkness falls upon the city... ----"),
            Self::ChatMessage { sender, text } => write!(f, "{sender} -> : {text}"),
            Self::ChatRestricted { reason } => {
                write!(f, "You can't send message now: {reason}")
            }
        }
    }
}
