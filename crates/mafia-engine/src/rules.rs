//! Who may do what, and when.
//!
//! Each gate checks its conditions in a fixed order and reports the first
//! one that fails as the reason shown to the player.

use mafia_player::Player;
use mafia_protocol::{Phase, Role, Scope};

use crate::SessionState;

/// The parts of the session state that gates look at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Turn {
    pub state: SessionState,
    pub phase: Phase,
    pub round: u64,
}

pub(crate) const NOT_STARTED: &str = "the game has not started yet";
pub(crate) const GAME_OVER: &str = "the game is over";
pub(crate) const ALREADY_VOTED: &str = "you have already voted";
pub(crate) const ALREADY_SKIPPED: &str = "you have already skipped the current day";
pub(crate) const FIRST_DAY: &str = "you are not allowed to vote on the first day";
pub(crate) const GHOST_SPECTATES: &str = "you may only spectate as a ghost";
pub(crate) const NIGHT_VOTERS: &str =
    "only mafia members and detectives are allowed to vote at night";
pub(crate) const NO_END_AT_NIGHT: &str = "you can't end day during night phase";
pub(crate) const DETECTIVE_ONLY: &str = "only detective can expose players";
pub(crate) const EXPOSE_BY_DAY: &str = "you may expose players only during the day";
pub(crate) const GHOST_SILENT: &str = "Ghosts are not allowed to send any messages";
pub(crate) const MAFIA_NIGHT_CHAT: &str = "only mafia can communicate at night";

/// Decisions are only taken while the game runs.
fn running(turn: Turn) -> Result<(), &'static str> {
    match turn.state {
        SessionState::Active => Ok(()),
        SessionState::Ended => Err(GAME_OVER),
        SessionState::Lobby | SessionState::Starting => Err(NOT_STARTED),
    }
}

pub(crate) fn vote(turn: Turn, player: &Player) -> Result<(), &'static str> {
    running(turn)?;
    if !player.active {
        Err(ALREADY_VOTED)
    } else if turn.phase == Phase::Day && turn.round == 0 {
        Err(FIRST_DAY)
    } else if player.is_ghost() {
        Err(GHOST_SPECTATES)
    } else if turn.phase == Phase::Night && !player.role.is_some_and(Role::acts_at_night) {
        Err(NIGHT_VOTERS)
    } else {
        Ok(())
    }
}

pub(crate) fn end_turn(turn: Turn, player: &Player) -> Result<(), &'static str> {
    running(turn)?;
    if !player.active {
        Err(ALREADY_SKIPPED)
    } else if player.is_ghost() {
        Err(GHOST_SPECTATES)
    } else if turn.phase == Phase::Night {
        Err(NO_END_AT_NIGHT)
    } else {
        Ok(())
    }
}

pub(crate) fn expose(turn: Turn, player: &Player) -> Result<(), &'static str> {
    running(turn)?;
    if !player.active {
        Err(ALREADY_VOTED)
    } else if player.role != Some(Role::Detective) {
        Err(DETECTIVE_ONLY)
    } else if turn.phase != Phase::Day {
        Err(EXPOSE_BY_DAY)
    } else {
        Ok(())
    }
}

/// Who hears a chat line from `player`.
pub(crate) fn chat_scope(turn: Turn, player: &Player) -> Result<Scope, &'static str> {
    if player.is_ghost() {
        Err(GHOST_SILENT)
    } else if !turn.state.is_active() || turn.phase == Phase::Day {
        Ok(Scope::All)
    } else if player.role == Some(Role::Mafia) {
        Ok(Scope::Role(Role::Mafia))
    } else {
        Err(MAFIA_NIGHT_CHAT)
    }
}

#[cfg(test)]
mod tests {
    use mafia_protocol::PlayerId;

    use super::*;

    fn turn(phase: Phase, round: u64) -> Turn {
        Turn {
            state: SessionState::Active,
            phase,
            round,
        }
    }

    fn player(role: Role) -> Player {
        let mut p = Player::new(PlayerId(1), "p", 4);
        p.role = Some(role);
        p
    }

    #[test]
    fn test_vote_before_start_is_rejected() {
        for state in [SessionState::Lobby, SessionState::Starting] {
            let lobby = Turn {
                state,
                phase: Phase::Day,
                round: 3,
            };
            assert_eq!(vote(lobby, &player(Role::Civilian)), Err(NOT_STARTED));
        }
    }

    #[test]
    fn test_decisions_after_game_over_are_rejected_as_over() {
        let over = Turn {
            state: SessionState::Ended,
            phase: Phase::Day,
            round: 2,
        };
        assert_eq!(vote(over, &player(Role::Civilian)), Err(GAME_OVER));
        assert_eq!(end_turn(over, &player(Role::Civilian)), Err(GAME_OVER));
        assert_eq!(expose(over, &player(Role::Detective)), Err(GAME_OVER));
    }

    #[test]
    fn test_vote_first_day_is_rejected() {
        assert_eq!(vote(turn(Phase::Day, 0), &player(Role::Mafia)), Err(FIRST_DAY));
        assert_eq!(vote(turn(Phase::Night, 0), &player(Role::Mafia)), Ok(()));
    }

    #[test]
    fn test_vote_inactive_is_rejected_before_other_checks() {
        let mut p = player(Role::Ghost);
        p.active = false;
        assert_eq!(vote(turn(Phase::Day, 0), &p), Err(ALREADY_VOTED));
    }

    #[test]
    fn test_vote_ghost_is_rejected() {
        assert_eq!(vote(turn(Phase::Day, 2), &player(Role::Ghost)), Err(GHOST_SPECTATES));
        assert_eq!(vote(turn(Phase::Night, 2), &player(Role::Ghost)), Err(GHOST_SPECTATES));
    }

    #[test]
    fn test_vote_civilian_at_night_is_rejected() {
        assert_eq!(vote(turn(Phase::Night, 1), &player(Role::Civilian)), Err(NIGHT_VOTERS));
        assert_eq!(vote(turn(Phase::Night, 1), &player(Role::Detective)), Ok(()));
        assert_eq!(vote(turn(Phase::Day, 1), &player(Role::Civilian)), Ok(()));
    }

    #[test]
    fn test_end_turn_rules() {
        assert_eq!(end_turn(turn(Phase::Day, 0), &player(Role::Civilian)), Ok(()));
        assert_eq!(end_turn(turn(Phase::Night, 1), &player(Role::Mafia)), Err(NO_END_AT_NIGHT));
        assert_eq!(end_turn(turn(Phase::Day, 1), &player(Role::Ghost)), Err(GHOST_SPECTATES));

        let mut done = player(Role::Civilian);
        done.active = false;
        assert_eq!(end_turn(turn(Phase::Day, 1), &done), Err(ALREADY_SKIPPED));
    }

    #[test]
    fn test_expose_rules() {
        assert_eq!(expose(turn(Phase::Day, 1), &player(Role::Detective)), Ok(()));
        assert_eq!(expose(turn(Phase::Day, 1), &player(Role::Mafia)), Err(DETECTIVE_ONLY));
        assert_eq!(expose(turn(Phase::Day, 1), &player(Role::Ghost)), Err(DETECTIVE_ONLY));
        assert_eq!(expose(turn(Phase::Night, 1), &player(Role::Detective)), Err(EXPOSE_BY_DAY));
    }

    #[test]
    fn test_chat_scope_by_phase_and_role() {
        let lobby = Turn {
            state: SessionState::Lobby,
            phase: Phase::Day,
            round: 0,
        };
        let unassigned = Player::new(PlayerId(2), "new", 4);
        assert_eq!(chat_scope(lobby, &unassigned), Ok(Scope::All));
        assert_eq!(chat_scope(turn(Phase::Day, 1), &player(Role::Civilian)), Ok(Scope::All));
        assert_eq!(
            chat_scope(turn(Phase::Night, 1), &player(Role::Mafia)),
            Ok(Scope::Role(Role::Mafia))
        );
        assert_eq!(
            chat_scope(turn(Phase::Night, 1), &player(Role::Detective)),
            Err(MAFIA_NIGHT_CHAT)
        );
    }

    #[test]
    fn test_chat_ghost_is_always_silent() {
        assert_eq!(chat_scope(turn(Phase::Day, 1), &player(Role::Ghost)), Err(GHOST_SILENT));
        assert_eq!(chat_scope(turn(Phase::Night, 1), &player(Role::Ghost)), Err(GHOST_SILENT));
    }
}
