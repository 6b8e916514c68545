//! The session handle and its lifecycle driver.
//!
//! [`Session`] is what the transport layer talks to. Every operation
//! takes the table lock once, validates, mutates, and releases it. The
//! game itself runs in a background task started when the lobby fills:
//!
//! ```text
//! join() ── count reaches min ──→ countdown ──→ deal roles ──→ rounds ──→ end
//!                                     │
//!                                     └── too few left ──→ abort (Lobby)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mafia_player::{NotificationStream, Player};
use mafia_protocol::{Notification, Phase, PlayerId, Role, Scope};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};

use crate::round::{self, SharedTable};
use crate::rules;
use crate::table::Table;
use crate::{ActionOutcome, EngineError, GameConfig, SessionState, assign_roles};

/// A read-only snapshot of the session, for operators and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub state: SessionState,
    pub phase: Phase,
    pub round: u64,
    pub mafia_alive: usize,
    pub civilians_alive: usize,
    pub players: usize,
    /// Distinct targets voted for in the round in progress.
    pub pending_votes: usize,
    /// Night results waiting for the next day.
    pub deferred: usize,
}

struct Inner {
    config: GameConfig,
    table: SharedTable,
    next_id: AtomicU64,
    /// Wakes the driver when a removal ends the game mid-round.
    game_over: Notify,
}

/// Handle to the game session. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

/// Which notification a failed gate turns into.
#[derive(Clone, Copy)]
enum Gate {
    Voting,
    Chat,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                table: Arc::new(Mutex::new(Table::new())),
                next_id: AtomicU64::new(1),
                game_over: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.inner.config
    }

    // -- Membership -------------------------------------------------------

    /// Registers a new player and returns their id.
    ///
    /// The player who brings the count up to `min_players` starts the
    /// lobby countdown.
    ///
    /// # Errors
    /// - [`EngineError::SessionAlreadyStarted`] once roles have been dealt
    /// - [`EngineError::NameTaken`] if a connected player uses `name`
    pub async fn join(&self, name: &str) -> Result<PlayerId, EngineError> {
        let mut t = self.inner.table.lock().await;
        if !t.state.is_joinable() {
            return Err(EngineError::SessionAlreadyStarted);
        }

        let id = PlayerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let player = Player::new(id, name, self.inner.config.notification_capacity);
        t.registry.insert(player)?;
        t.broadcast(
            Scope::All,
            Notification::ClientConnected {
                name: name.to_owned(),
            },
        );
        tracing::info!(player_id = %id, name, players = t.registry.len(), "player joined");

        if t.state == SessionState::Lobby && t.registry.len() >= self.inner.config.min_players {
            t.set_state(SessionState::Starting);
            t.broadcast(
                Scope::All,
                Notification::SessionDisclaimer {
                    seconds: self.inner.config.start_delay.as_secs(),
                },
            );
            tracing::info!(
                players = t.registry.len(),
                delay = ?self.inner.config.start_delay,
                "session starting"
            );
            tokio::spawn(self.clone().run());
        }

        Ok(id)
    }

    /// Removes a player and closes their channels.
    ///
    /// If the game is running and the removal decides it, the game ends
    /// immediately and any round in progress is abandoned.
    pub async fn leave(&self, id: PlayerId) -> ActionOutcome {
        let mut t = self.inner.table.lock().await;
        let Some(player) = t.remove(id) else {
            return ActionOutcome::Rejected(EngineError::NotRegistered(id));
        };
        t.broadcast(
            Scope::All,
            Notification::ClientDisconnected {
                name: player.name.clone(),
            },
        );
        tracing::info!(
            player_id = %id,
            name = %player.name,
            players = t.registry.len(),
            "player left"
        );

        if t.state.is_active() {
            if let Some(outcome) = t.outcome() {
                t.finish(outcome);
                self.inner.game_over.notify_one();
            }
        }
        ActionOutcome::Accepted
    }

    // -- Decisions --------------------------------------------------------

    /// Records a vote for `target`. Later votes in the same round replace
    /// earlier ones.
    pub async fn cast_vote(&self, id: PlayerId, target: &str) -> ActionOutcome {
        let t = self.inner.table.lock().await;
        let Some(player) = t.registry.get(id) else {
            return ActionOutcome::Rejected(EngineError::NotRegistered(id));
        };
        if let Err(reason) = rules::vote(t.turn(), player) {
            return restrict(&t, id, Gate::Voting, reason);
        }
        player.channels().votes.put(target.to_owned());
        tracing::debug!(player_id = %id, target, "vote received");
        ActionOutcome::Accepted
    }

    /// Commits the player's day decision.
    pub async fn end_turn(&self, id: PlayerId) -> ActionOutcome {
        let mut t = self.inner.table.lock().await;
        let turn = t.turn();
        let Some(player) = t.registry.get_mut(id) else {
            return ActionOutcome::Rejected(EngineError::NotRegistered(id));
        };
        if let Err(reason) = rules::end_turn(turn, player) {
            return restrict(&t, id, Gate::Voting, reason);
        }
        player.active = false;
        player.channels().end_turn.put(());
        tracing::debug!(player_id = %id, "turn ended");
        ActionOutcome::Accepted
    }

    /// Reveals the mafia member the detective identified last night.
    ///
    /// Uses up the detective's day decision either way.
    pub async fn expose(&self, id: PlayerId) -> ActionOutcome {
        let mut t = self.inner.table.lock().await;
        let turn = t.turn();
        let Some(player) = t.registry.get_mut(id) else {
            return ActionOutcome::Rejected(EngineError::NotRegistered(id));
        };
        if let Err(reason) = rules::expose(turn, player) {
            return restrict(&t, id, Gate::Voting, reason);
        }
        player.active = false;
        player.channels().end_turn.put(());

        match player.exposed.clone() {
            Some(name) if t.registry.contains_name(&name) => {
                tracing::info!(player_id = %id, %name, "detective exposed a player");
                t.broadcast(Scope::All, Notification::PlayerExposed { name });
                ActionOutcome::Accepted
            }
            Some(name) => {
                t.notify(id, Notification::PlayerNotFound { name: name.clone() });
                ActionOutcome::Rejected(EngineError::PlayerNotFound(name))
            }
            None => {
                t.notify(id, Notification::NoExposedPlayer);
                ActionOutcome::Rejected(EngineError::NoExposedPlayer)
            }
        }
    }

    /// Sends a chat line to everyone allowed to hear it right now.
    pub async fn chat(&self, id: PlayerId, text: &str) -> ActionOutcome {
        let t = self.inner.table.lock().await;
        let Some(player) = t.registry.get(id) else {
            return ActionOutcome::Rejected(EngineError::NotRegistered(id));
        };
        let scope = match rules::chat_scope(t.turn(), player) {
            Ok(scope) => scope,
            Err(reason) => return restrict(&t, id, Gate::Chat, reason),
        };
        let event = Notification::ChatMessage {
            sender: player.name.clone(),
            text: text.to_owned(),
        };
        t.broadcast(scope, event);
        ActionOutcome::Accepted
    }

    // -- Queries ----------------------------------------------------------

    /// Names of connected players, in join order.
    pub async fn list_players(&self) -> Vec<String> {
        self.inner.table.lock().await.registry.names()
    }

    /// Claims a player's notification stream. Succeeds once per player.
    ///
    /// # Errors
    /// - [`EngineError::NotRegistered`] for an unknown id
    /// - [`EngineError::NotificationChannelClosed`] if already claimed
    pub async fn subscribe(&self, id: PlayerId) -> Result<NotificationStream, EngineError> {
        let t = self.inner.table.lock().await;
        let player = t.registry.get(id).ok_or(EngineError::NotRegistered(id))?;
        Ok(player.channels().notifications.subscribe()?)
    }

    pub async fn info(&self) -> SessionInfo {
        let t = self.inner.table.lock().await;
        SessionInfo {
            state: t.state,
            phase: t.phase,
            round: t.round,
            mafia_alive: t.mafia_alive,
            civilians_alive: t.civilians_alive,
            players: t.registry.len(),
            pending_votes: t.tally.len(),
            deferred: t.deferred.len(),
        }
    }

    /// The player's current role; `None` before roles are dealt or for an
    /// unknown id.
    pub async fn role_of(&self, id: PlayerId) -> Option<Role> {
        self.inner.table.lock().await.registry.get(id)?.role
    }

    // -- Lifecycle --------------------------------------------------------

    /// Countdown, then the game. Runs as its own task.
    async fn run(self) {
        let config = &self.inner.config;
        tokio::time::sleep(config.start_delay).await;

        let Some(mut seats) = self.deal().await else {
            return;
        };

        loop {
            tokio::select! {
                _ = self.inner.game_over.notified() => {
                    tracing::debug!("round abandoned, game already decided");
                    return;
                }
                next = round::play(&self.inner.table, config, seats) => match next {
                    Some(next) => seats = next,
                    None => return,
                },
            }
        }
    }

    /// Ends the countdown: deals roles and opens the first day, or returns
    /// to the lobby if too many players left. Returns the seats of the
    /// first round, or `None` if no game is running.
    async fn deal(&self) -> Option<Vec<round::Seat>> {
        let config = &self.inner.config;
        let mut t = self.inner.table.lock().await;
        if t.state != SessionState::Starting {
            return None;
        }

        let ids = t.registry.ids();
        let Some(dealt) = assign_roles(&ids, config, &mut rand::rng()) else {
            t.set_state(SessionState::Lobby);
            t.broadcast(Scope::All, Notification::SessionAbort);
            tracing::info!(players = ids.len(), "session aborted, not enough players");
            return None;
        };

        t.mafia_alive = 0;
        t.civilians_alive = 0;
        for (id, role) in dealt {
            if let Some(player) = t.registry.get_mut(id) {
                player.role = Some(role);
            }
            match role {
                Role::Mafia => t.mafia_alive += 1,
                Role::Civilian => t.civilians_alive += 1,
                _ => {}
            }
            t.notify(id, Notification::RoleAssigned { role });
        }

        t.set_state(SessionState::Active);
        t.phase = Phase::Day;
        t.round = 0;
        t.broadcast(Scope::All, Notification::SessionStart);
        tracing::info!(
            players = ids.len(),
            mafia = t.mafia_alive,
            civilians = t.civilians_alive,
            "session started"
        );
        round::advance(&mut t)
    }
}

/// Tells the player why their action was refused.
fn restrict(t: &Table, id: PlayerId, gate: Gate, reason: &'static str) -> ActionOutcome {
    tracing::debug!(player_id = %id, reason, "action restricted");
    let reason = reason.to_owned();
    let event = match gate {
        Gate::Voting => Notification::VotingRestricted {
            reason: reason.clone(),
        },
        Gate::Chat => Notification::ChatRestricted {
            reason: reason.clone(),
        },
    };
    t.notify(id, event);
    ActionOutcome::Rejected(EngineError::ActionRestricted(reason))
}
