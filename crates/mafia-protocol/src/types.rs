//! Core game vocabulary and the wire format.
//!
//! Everything here is plain data: who a player is, which role they hold,
//! which phase the game is in, and the envelopes that carry requests and
//! replies between a client and the server.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Notification;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Issued by the session on a successful join and stable for the lifetime
/// of that connection. Serialized as a plain number (`42`, not
/// `{"0":42}`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Roles and phases
// ---------------------------------------------------------------------------

/// The role a player holds once the game has started.
///
/// Roles only ever change *into* [`Role::Ghost`] (elimination). A ghost
/// stays connected as a spectator and never votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mafia,
    Detective,
    Civilian,
    Ghost,
}

impl Role {
    /// Roles handed out at the start of a game, in partition order.
    pub const ASSIGNABLE: [Role; 3] = [Role::Mafia, Role::Detective, Role::Civilian];

    /// Returns `true` for roles that act during the night.
    pub fn acts_at_night(self) -> bool {
        matches!(self, Self::Mafia | Self::Detective)
    }

    /// Returns `true` for eliminated players.
    pub fn is_ghost(self) -> bool {
        matches!(self, Self::Ghost)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mafia => "mafia",
            Self::Detective => "detective",
            Self::Civilian => "civilian",
            Self::Ghost => "ghost",
        })
    }
}

/// Half of a game round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Everyone debates and votes; the plurality target is eliminated.
    #[default]
    Day,
    /// Mafia pick a victim, detectives investigate.
    Night,
}

impl Phase {
    /// The phase that follows this one.
    pub fn next(self) -> Self {
        match self {
            Self::Day => Self::Night,
            Self::Night => Self::Day,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Night => "night",
        })
    }
}

/// Which players a broadcast reaches.
///
/// `All` includes ghosts and players whose role is not assigned yet.
/// `Role(r)` reaches only players currently holding `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    All,
    Role(Role),
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CiviliansWon,
    MafiaWon,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CiviliansWon => "civilians have won",
            Self::MafiaWon => "mafia has won",
        })
    }
}

// ---------------------------------------------------------------------------
// Requests and replies
// ---------------------------------------------------------------------------

/// Client → Server.
///
/// Internally tagged: `{ "type": "Vote", "target": "bob" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Must be the first request on a connection.
    Join { name: String },
    /// Leave the session and close the connection.
    Leave,
    /// Vote to eliminate (day) or target (night) the named player.
    Vote { target: String },
    /// Commit the day decision (skip, or lock in the last vote).
    EndTurn,
    /// Detective only: reveal last night's successful investigation.
    Expose,
    /// Send a chat line to everyone allowed to hear it.
    Chat { text: String },
    /// Ask for the names of all connected players.
    ListPlayers,
}

/// Server → Client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Reply to `Join`: the id assigned to this connection.
    Joined { player_id: PlayerId },
    /// The request was accepted for processing. Game-level rejections
    /// arrive separately as `Event`s.
    Ack,
    /// Reply to `ListPlayers`.
    PlayerList { players: Vec<String> },
    /// A game notification, with its rendered text for simple clients.
    Event { event: Notification, text: String },
    /// The request could not be processed at all. `code` follows HTTP
    /// conventions (400 bad request, 403 forbidden, 409 conflict).
    Error { code: u16, message: String },
}

impl ServerMessage {
    /// Wraps a notification together with its human-readable rendering.
    pub fn event(event: Notification) -> Self {
        let text = event.to_string();
        Self::Event { event, text }
    }
}

/// The content of an envelope.
///
/// Adjacently tagged: `{ "type": "Request", "data": { "type": "Leave" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Request(ClientRequest),
    Response(ServerMessage),
}

/// The top-level wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number, starting at 0.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    #[serde(default)]
    pub timestamp: u64,

    pub payload: Payload,
}

impl Envelope {
    /// A request envelope with no timing information, as a client sends it.
    pub fn request(seq: u64, request: ClientRequest) -> Self {
        Self {
            seq,
            timestamp: 0,
            payload: Payload::Request(request),
        }
    }
}
