use thiserror::Error;

use crate::{GameSeconds, GameStatus, PlayerId, SubstitutionId, stage::GameStage};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum GameError {
    #[error("cannot {action} while the game is {stage}")]
    InvalidStateTransition { stage: GameStage, action: Operation },

    #[error("invalid ledger append for player {player}: {reason}")]
    InvalidLedgerAppend {
        player: PlayerId,
        reason: LedgerAppendError,
    },

    #[error("constraint violated: {0}")]
    ConstraintViolation(ConstraintViolation),

    #[error("{0} not found")]
    NotFound(NotFound),
}

impl GameError {
    pub(crate) fn violation<R>(violation: ConstraintViolation) -> Result<R, GameError> {
        Err(GameError::ConstraintViolation(violation))
    }

    pub(crate) fn player_not_found<R>(player: PlayerId) -> Result<R, GameError> {
        Err(GameError::NotFound(NotFound::Player(player)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    StartGame,
    StartStoppage,
    EndStoppage,
    EndPeriod,
    StartNextPeriod,
    InitiateSubstitution,
    ConfirmSubstitution,
    RecordGoal,
    RecordCard,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::StartGame => "start the game",
            Operation::StartStoppage => "start a stoppage",
            Operation::EndStoppage => "end a stoppage",
            Operation::EndPeriod => "end the period",
            Operation::StartNextPeriod => "start the next period",
            Operation::InitiateSubstitution => "initiate a substitution",
            Operation::ConfirmSubstitution => "confirm a substitution",
            Operation::RecordGoal => "record a goal",
            Operation::RecordCard => "record a card",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerAppendError {
    AlreadyOnField,
    NotOnField,
    MarkBeforeLastMark {
        mark: GameSeconds,
        last: GameSeconds,
    },
    MarkAfterGameTime {
        mark: GameSeconds,
        game_time: GameSeconds,
    },
}

impl std::fmt::Display for LedgerAppendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerAppendError::AlreadyOnField => write!(f, "player is already on the field"),
            LedgerAppendError::NotOnField => write!(f, "player is not on the field"),
            LedgerAppendError::MarkBeforeLastMark { mark, last } => {
                write!(f, "mark {}s precedes last recorded mark {}s", mark, last)
            }
            LedgerAppendError::MarkAfterGameTime { mark, game_time } => {
                write!(f, "mark {}s is past the current game time {}s", mark, game_time)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintViolation {
    InvalidSettings,
    DuplicatePlayer(PlayerId),
    MultipleRunningPeriods,
    LineupIncomplete {
        starters: u32,
        goalkeepers: u32,
        required_field_players: u32,
    },
    MultipleGoalkeepers,
    NotToggleable(GameStatus),
    StartingStatusLocked(PlayerId),
    GoalkeeperNotOnField(PlayerId),
    SamePlayer(PlayerId),
    PendingSubstitution(PlayerId),
    NotOnField(PlayerId),
    AlreadyOnField(PlayerId),
    SubstitutionLimitReached(u32),
    ReentryNotAllowed(PlayerId),
    PlayerOnOpponentGoal(PlayerId),
    InconsistentLedger(PlayerId),
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintViolation::InvalidSettings => write!(f, "invalid game settings"),
            ConstraintViolation::DuplicatePlayer(p) => {
                write!(f, "player {} appears twice on the roster", p)
            }
            ConstraintViolation::MultipleRunningPeriods => {
                write!(f, "more than one period is running")
            }
            ConstraintViolation::LineupIncomplete {
                starters,
                goalkeepers,
                required_field_players,
            } => write!(
                f,
                "lineup needs {} starters and one goalkeeper, has {} starters and {} goalkeepers",
                required_field_players.saturating_sub(1),
                starters,
                goalkeepers
            ),
            ConstraintViolation::MultipleGoalkeepers => {
                write!(f, "more than one goalkeeper assigned")
            }
            ConstraintViolation::NotToggleable(status) => {
                write!(f, "status {:?} cannot be toggled", status)
            }
            ConstraintViolation::StartingStatusLocked(p) => write!(
                f,
                "starting status of player {} cannot change after the game started",
                p
            ),
            ConstraintViolation::GoalkeeperNotOnField(p) => {
                write!(f, "player {} must be on the field to keep goal", p)
            }
            ConstraintViolation::SamePlayer(p) => {
                write!(f, "player {} cannot substitute for themselves", p)
            }
            ConstraintViolation::PendingSubstitution(p) => {
                write!(f, "player {} already has a pending substitution", p)
            }
            ConstraintViolation::NotOnField(p) => write!(f, "player {} is not on the field", p),
            ConstraintViolation::AlreadyOnField(p) => {
                write!(f, "player {} is already on the field", p)
            }
            ConstraintViolation::SubstitutionLimitReached(max) => {
                write!(f, "substitution limit of {} reached", max)
            }
            ConstraintViolation::ReentryNotAllowed(p) => {
                write!(f, "player {} may not re-enter the game", p)
            }
            ConstraintViolation::PlayerOnOpponentGoal(p) => {
                write!(f, "player {} cannot be credited with an opponent goal", p)
            }
            ConstraintViolation::InconsistentLedger(p) => {
                write!(f, "substitution ledger of player {} is inconsistent", p)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotFound {
    Player(PlayerId),
    Substitution(SubstitutionId),
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::Player(p) => write!(f, "player {}", p),
            NotFound::Substitution(s) => write!(f, "pending substitution {}", s),
        }
    }
}
