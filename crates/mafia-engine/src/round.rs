//! One Day or Night round.
//!
//! Every eligible player gets a decision task. The tasks wait on that
//! player's mailboxes without holding the table lock, take the lock only
//! to record their decision, and are all joined before the round is
//! resolved.

use std::sync::Arc;

use mafia_player::PlayerChannels;
use mafia_protocol::{Notification, Phase, PlayerId, Role, Scope};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::GameConfig;
use crate::table::Table;

pub(crate) type SharedTable = Arc<Mutex<Table>>;

/// A player taking part in the current round.
pub(crate) struct Seat {
    pub id: PlayerId,
    pub channels: Arc<PlayerChannels>,
}

/// Collects the decisions of `seats` for the table's current phase,
/// resolves the round, and advances the phase.
///
/// The next round is opened under the same lock as the resolution, so a
/// decision accepted once the new phase is visible always reaches its
/// task. Returns the seats of that round, or `None` once the game is
/// over or stops being active.
pub(crate) async fn play(
    table: &SharedTable,
    config: &GameConfig,
    seats: Vec<Seat>,
) -> Option<Vec<Seat>> {
    let phase = {
        let t = table.lock().await;
        if !t.state.is_active() {
            return None;
        }
        t.phase
    };
    tracing::debug!(%phase, players = seats.len(), "collecting decisions");

    let mut tasks = JoinSet::new();
    match phase {
        Phase::Day => {
            tokio::time::sleep(config.notification_delay).await;
            {
                let mut guard = table.lock().await;
                let t = &mut *guard;
                if !t.state.is_active() {
                    return None;
                }
                t.deferred.flush(&t.registry);
            }
            for seat in seats {
                tasks.spawn(day_decision(Arc::clone(table), seat));
            }
        }
        Phase::Night => {
            for seat in seats {
                tasks.spawn(night_decision(Arc::clone(table), seat));
            }
        }
    }
    join_all(tasks).await;

    let mut t = table.lock().await;
    if !t.state.is_active() {
        return None;
    }
    match phase {
        Phase::Day => resolve_day(&mut t),
        Phase::Night => {
            resolve_night(&mut t);
            t.round += 1;
        }
    }
    t.phase = phase.next();
    advance(&mut t)
}

/// Ends the game if one side has won, otherwise opens the next round.
pub(crate) fn advance(table: &mut Table) -> Option<Vec<Seat>> {
    if let Some(outcome) = table.outcome() {
        table.finish(outcome);
        return None;
    }
    let seats = open(table);
    tracing::debug!(phase = %table.phase, round = table.round, "round opened");
    Some(seats)
}

/// Resets every player for a new round, announces the phase, and returns
/// the players who must decide in it.
pub(crate) fn open(table: &mut Table) -> Vec<Seat> {
    let phase = table.phase;
    for player in table.registry.iter_mut() {
        player.active = true;
        player.channels().drain();
    }

    let start = match phase {
        Phase::Day => Notification::PhaseStartDay,
        Phase::Night => Notification::PhaseStartNight,
    };
    table.broadcast(Scope::All, start);

    table
        .registry
        .iter()
        .filter(|p| match (phase, p.role) {
            (Phase::Day, Some(role)) => !role.is_ghost(),
            (Phase::Night, Some(role)) => role.acts_at_night(),
            (_, None) => false,
        })
        .map(|p| Seat {
            id: p.id,
            channels: Arc::clone(p.channels()),
        })
        .collect()
}

async fn join_all(mut tasks: JoinSet<()>) {
    while let Some(res) = tasks.join_next().await {
        if let Err(err) = res {
            tracing::warn!(%err, "decision task failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Decision tasks
// ---------------------------------------------------------------------------

/// Keeps the latest vote until the player commits with end-turn.
pub(crate) async fn day_decision(table: SharedTable, seat: Seat) {
    let mut choice: Option<String> = None;
    loop {
        tokio::select! {
            biased;
            vote = seat.channels.votes.recv() => match vote {
                Some(target) => choice = Some(target),
                None => return,
            },
            signal = seat.channels.end_turn.recv() => match signal {
                Some(()) => {
                    if let Some(target) = seat.channels.votes.try_take() {
                        choice = Some(target);
                    }
                    break;
                }
                None => return,
            },
        }
    }

    tracing::debug!(player_id = %seat.id, choice = ?choice, "day decision committed");
    if let Some(target) = choice {
        table.lock().await.tally.add(target);
    }
}

/// Waits for one vote naming a connected player.
pub(crate) async fn night_decision(table: SharedTable, seat: Seat) {
    loop {
        let Some(target) = seat.channels.votes.recv().await else {
            return;
        };

        let mut t = table.lock().await;
        let Some(target_role) = t
            .registry
            .id_by_name(&target)
            .and_then(|id| t.registry.get(id))
            .map(|p| p.role)
        else {
            t.notify(seat.id, Notification::PlayerNotFound { name: target });
            continue;
        };

        let Some(player) = t.registry.get_mut(seat.id) else {
            return;
        };
        player.active = false;
        tracing::debug!(player_id = %seat.id, %target, "night decision committed");

        let role = player.role;
        match role {
            Some(Role::Detective) => {
                let verdict = if target_role == Some(Role::Mafia) {
                    player.exposed = Some(target);
                    Notification::GuessSuccess
                } else {
                    player.exposed = None;
                    Notification::GuessFail
                };
                t.notify(seat.id, verdict);
            }
            Some(Role::Mafia) => t.tally.add(target),
            _ => {}
        }
        return;
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Eliminates the plurality target, or announces a mismatch.
pub(crate) fn resolve_day(table: &mut Table) {
    let leader = table.tally.leader().map(str::to_owned);
    table.tally.clear();

    let Some(name) = leader else {
        tracing::info!(round = table.round, "day ended without a verdict");
        table.broadcast(Scope::All, Notification::VotesMismatch);
        return;
    };
    match table.eliminate(&name) {
        Some(event) => {
            tracing::info!(round = table.round, %name, "player executed");
            table.broadcast(Scope::All, event);
        }
        None => table.broadcast(Scope::All, Notification::PlayerNotFound { name }),
    }
}

/// Applies the mafia's kill if they agreed on one target. The
/// announcement waits for the next day.
pub(crate) fn resolve_night(table: &mut Table) {
    let target = table.tally.unanimous().map(str::to_owned);
    table.tally.clear();

    let Some(name) = target else {
        tracing::info!(round = table.round, "mafia did not agree on a victim");
        table.broadcast(Scope::Role(Role::Mafia), Notification::MafiaVotesMismatch);
        return;
    };
    match table.eliminate(&name) {
        Some(event) => {
            tracing::info!(round = table.round, %name, "player killed at night");
            table.deferred.push(event);
        }
        None => table.broadcast(
            Scope::Role(Role::Mafia),
            Notification::PlayerNotFound { name },
        ),
    }
}
