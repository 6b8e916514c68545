//! Notification delivery.
//!
//! Delivery never waits: each recipient has its own bounded queue, and a
//! full or closed queue only costs that recipient the event.

use mafia_player::{Player, Registry};
use mafia_protocol::{Notification, PlayerId, Scope};

fn deliver(player: &Player, event: Notification) {
    if let Err(err) = player.channels().notifications.push(event) {
        tracing::warn!(player_id = %player.id, %err, "notification dropped");
    }
}

/// Sends `event` to one player.
pub(crate) fn notify(registry: &Registry, id: PlayerId, event: Notification) {
    match registry.get(id) {
        Some(player) => deliver(player, event),
        None => tracing::debug!(player_id = %id, "notify: player not registered"),
    }
}

/// Sends `event` to every registered player inside `scope`.
pub(crate) fn broadcast(registry: &Registry, scope: Scope, event: Notification) {
    match scope {
        Scope::All => registry.iter().for_each(|p| deliver(p, event.clone())),
        Scope::Role(role) => registry
            .with_role(role)
            .for_each(|p| deliver(p, event.clone())),
    }
}

/// Night results held back until the next day breaks.
#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    events: Vec<Notification>,
}

impl DeferredQueue {
    pub fn push(&mut self, event: Notification) {
        self.events.push(event);
    }

    /// Broadcasts every held event to all players, in order, and empties
    /// the queue.
    pub fn flush(&mut self, registry: &Registry) {
        for event in self.events.drain(..) {
            broadcast(registry, Scope::All, event);
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
