mod clock;
mod error;
mod event;
mod game;
mod ledger;
mod lineup;
mod period;
mod stage;
mod substitution;

pub use error::{ConstraintViolation, GameError, LedgerAppendError, NotFound, Operation};
pub use event::{CardKind, GameEvent, GameEventKind, Score, TeamSide};
pub use game::{Game, PlayerTime};
pub use ledger::PlayerGameEntry;
pub use lineup::{LineupCounts, can_confirm_lineup, lineup_counts, set_status};
pub use period::Period;
pub use stage::{GameStage, StageAction, StageTransition};
pub use substitution::Substitution;

/// Seconds of active play, always counted upwards regardless of the
/// presentation direction of the clock.
pub type GameSeconds = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub i64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubstitutionId(pub u32);

impl std::fmt::Display for SubstitutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockDirection {
    Up,
    Down,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeSettings {
    pub periods: u32,
    pub period_duration: GameSeconds,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    pub period_count: u32,
    pub period_duration: GameSeconds,
    pub clock_direction: ClockDirection,
    pub overtime: Option<OvertimeSettings>,
    pub players_on_field: u32,
    pub max_substitutions: Option<u32>,
    pub allow_reentry: bool,
}

impl GameSettings {
    pub fn is_valid(&self) -> bool {
        self.period_count > 0
            && self.period_duration > 0
            && self.players_on_field > 0
            && self
                .overtime
                .as_ref()
                .is_none_or(|ot| ot.periods > 0 && ot.period_duration > 0)
    }

    /// Regulation periods plus any configured overtime periods.
    pub fn total_periods(&self) -> u32 {
        self.period_count + self.overtime.as_ref().map_or(0, |ot| ot.periods)
    }

    pub fn period_duration_of(&self, period_number: u32) -> GameSeconds {
        match &self.overtime {
            Some(ot) if period_number > self.period_count => ot.period_duration,
            _ => self.period_duration,
        }
    }
}

/// Roster designation of a player for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Available,
    Starter,
    Goalkeeper,
    Bench,
    Unavailable,
    Injured,
    NotDressed,
    Dressed,
}

impl GameStatus {
    pub const ALL: [GameStatus; 8] = [
        GameStatus::Available,
        GameStatus::Starter,
        GameStatus::Goalkeeper,
        GameStatus::Bench,
        GameStatus::Unavailable,
        GameStatus::Injured,
        GameStatus::NotDressed,
        GameStatus::Dressed,
    ];

    /// Starters and the goalkeeper are on the field from game time zero.
    pub fn is_starting(&self) -> bool {
        matches!(self, GameStatus::Starter | GameStatus::Goalkeeper)
    }
}

/// Moment-to-moment position of a player, including in-flight substitutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldStatus {
    OnField,
    OnBench,
    SubbingOut,
    SubbingIn,
    OnFieldGk,
    SubbingOutGk,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineupAction {
    Starter,
    Goalkeeper,
    Bench,
    Available,
    Unavailable,
    Toggle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GameSettings {
        GameSettings {
            period_count: 2,
            period_duration: 1200,
            clock_direction: ClockDirection::Up,
            overtime: None,
            players_on_field: 7,
            max_substitutions: None,
            allow_reentry: true,
        }
    }

    #[test]
    fn test_game_settings_validation() {
        assert!(settings().is_valid());

        let no_periods = GameSettings {
            period_count: 0,
            ..settings()
        };
        assert!(!no_periods.is_valid());

        let no_players = GameSettings {
            players_on_field: 0,
            ..settings()
        };
        assert!(!no_players.is_valid());

        let empty_overtime = GameSettings {
            overtime: Some(OvertimeSettings {
                periods: 0,
                period_duration: 300,
            }),
            ..settings()
        };
        assert!(!empty_overtime.is_valid());
    }

    #[test]
    fn test_total_periods_includes_overtime() {
        assert_eq!(settings().total_periods(), 2);

        let with_overtime = GameSettings {
            overtime: Some(OvertimeSettings {
                periods: 2,
                period_duration: 300,
            }),
            ..settings()
        };
        assert_eq!(with_overtime.total_periods(), 4);
        assert_eq!(with_overtime.period_duration_of(2), 1200);
        assert_eq!(with_overtime.period_duration_of(3), 300);
    }

    #[test]
    fn test_starting_statuses() {
        let starting: Vec<_> = GameStatus::ALL
            .iter()
            .filter(|s| s.is_starting())
            .collect();
        assert_eq!(starting, vec![&GameStatus::Starter, &GameStatus::Goalkeeper]);
    }
}
