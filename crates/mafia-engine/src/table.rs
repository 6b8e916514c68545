//! The shared game table: everything the session lock guards.

use std::collections::BTreeMap;

use mafia_player::{Player, Registry};
use mafia_protocol::{Notification, Outcome, Phase, PlayerId, Role, Scope};

use crate::SessionState;
use crate::bus::{self, DeferredQueue};
use crate::rules::Turn;

/// Votes collected during one round, by target name.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    votes: BTreeMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, target: impl Into<String>) {
        *self.votes.entry(target.into()).or_default() += 1;
    }

    /// The target with strictly the most votes. `None` on a tie or when
    /// nobody voted.
    pub fn leader(&self) -> Option<&str> {
        let max = self.votes.values().copied().max()?;
        let mut top = self.votes.iter().filter(|(_, n)| **n == max);
        let (name, _) = top.next()?;
        match top.next() {
            Some(_) => None,
            None => Some(name.as_str()),
        }
    }

    /// The single target everyone agreed on, if exactly one was named.
    pub fn unanimous(&self) -> Option<&str> {
        match self.votes.len() {
            1 => self.votes.keys().next().map(String::as_str),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }
}

/// Session state behind the lock.
///
/// Alive counters are adjusted on every elimination and removal, never
/// recomputed from the registry.
#[derive(Debug)]
pub(crate) struct Table {
    pub registry: Registry,
    pub state: SessionState,
    pub phase: Phase,
    pub round: u64,
    pub mafia_alive: usize,
    pub civilians_alive: usize,
    pub tally: Tally,
    pub deferred: DeferredQueue,
}

impl Table {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            state: SessionState::Lobby,
            phase: Phase::Day,
            round: 0,
            mafia_alive: 0,
            civilians_alive: 0,
            tally: Tally::default(),
            deferred: DeferredQueue::default(),
        }
    }

    pub fn turn(&self) -> Turn {
        Turn {
            state: self.state,
            phase: self.phase,
            round: self.round,
        }
    }

    /// Moves the session along its lifecycle.
    pub fn set_state(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal session transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "session state changed");
        self.state = next;
    }

    pub fn notify(&self, id: PlayerId, event: Notification) {
        bus::notify(&self.registry, id, event);
    }

    pub fn broadcast(&self, scope: Scope, event: Notification) {
        bus::broadcast(&self.registry, scope, event);
    }

    /// `Some` once one side has won.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.mafia_alive == 0 {
            Some(Outcome::CiviliansWon)
        } else if self.mafia_alive == self.civilians_alive {
            Some(Outcome::MafiaWon)
        } else {
            None
        }
    }

    fn forget(&mut self, role: Option<Role>) {
        match role {
            Some(Role::Mafia) => self.mafia_alive = self.mafia_alive.saturating_sub(1),
            Some(Role::Civilian) => {
                self.civilians_alive = self.civilians_alive.saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Turns the named player into a ghost.
    ///
    /// Returns the elimination event to announce, or `None` if nobody by
    /// that name is connected.
    pub fn eliminate(&mut self, name: &str) -> Option<Notification> {
        let player = self.registry.by_name_mut(name)?;
        let role = player.eliminate()?;
        let event = Notification::PlayerEliminated {
            name: player.name.clone(),
            role,
        };
        self.forget(Some(role));
        Some(event)
    }

    /// Unregisters a player, closing their channels and adjusting the
    /// alive counters.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.registry.remove(id).ok()?;
        self.forget(player.role);
        Some(player)
    }

    /// Announces the outcome and closes the game for good.
    pub fn finish(&mut self, outcome: Outcome) {
        self.broadcast(Scope::All, Notification::SessionEnd { outcome });
        self.tally.clear();
        self.deferred.clear();
        self.set_state(SessionState::Ended);
        tracing::info!(%outcome, round = self.round, "session ended");
    }
}
