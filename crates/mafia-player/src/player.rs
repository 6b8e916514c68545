//! The per-player record.

use std::sync::Arc;

use mafia_protocol::{PlayerId, Role};

use crate::{Mailbox, NotificationQueue};

/// The channels through which the engine talks to one player.
///
/// Shared behind an `Arc` so a round's decision task can keep waiting on
/// the mailboxes without holding the session lock.
pub struct PlayerChannels {
    /// Latest vote target, by name.
    pub votes: Mailbox<String>,
    /// Commit signal for the day decision.
    pub end_turn: Mailbox<()>,
    pub notifications: NotificationQueue,
}

impl PlayerChannels {
    pub fn new(owner: PlayerId, capacity: usize) -> Self {
        Self {
            votes: Mailbox::new(),
            end_turn: Mailbox::new(),
            notifications: NotificationQueue::new(owner, capacity),
        }
    }

    /// Drops decisions left over from an earlier round.
    pub fn drain(&self) {
        self.votes.clear();
        self.end_turn.clear();
    }

    /// Closes every channel. Pending decision tasks observe `None`.
    pub fn close(&self) {
        self.votes.close();
        self.end_turn.close();
        self.notifications.close();
    }
}

/// A connected participant.
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// `None` until roles are handed out.
    pub role: Option<Role>,
    /// `false` once the player committed a decision this round.
    pub active: bool,
    /// Name of the last mafia member this detective identified.
    pub exposed: Option<String>,
    channels: Arc<PlayerChannels>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id,
            name: name.into(),
            role: None,
            active: true,
            exposed: None,
            channels: Arc::new(PlayerChannels::new(id, capacity)),
        }
    }

    pub fn channels(&self) -> &Arc<PlayerChannels> {
        &self.channels
    }

    pub fn is_ghost(&self) -> bool {
        self.role == Some(Role::Ghost)
    }

    /// Turns the player into a spectator, returning the role they held.
    /// Has no effect before roles are dealt.
    pub fn eliminate(&mut self) -> Option<Role> {
        let prior = self.role?;
        self.role = Some(Role::Ghost);
        self.exposed = None;
        Some(prior)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("active", &self.active)
            .field("exposed", &self.exposed)
            .finish_non_exhaustive()
    }
}
