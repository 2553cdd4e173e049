use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    Game, GameSeconds, PlayerId, SubstitutionId,
    error::{ConstraintViolation, GameError, Operation},
    stage::GameStage,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TeamSide {
    Team,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardKind {
    Yellow,
    Red,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub team: u32,
    pub opponent: u32,
}

/// Something worth persisting that happened in a game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameEvent {
    pub at: DateTime<Utc>,
    pub period: u32,
    pub game_time: GameSeconds,
    pub kind: GameEventKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEventKind {
    PeriodStarted,
    PeriodEnded,
    StoppageStarted,
    StoppageEnded {
        duration: Duration,
    },
    SubstitutionConfirmed {
        substitution: SubstitutionId,
        outgoing: PlayerId,
        incoming: PlayerId,
        goalkeeper: bool,
    },
    Goal {
        side: TeamSide,
        scorer: Option<PlayerId>,
        assist: Option<PlayerId>,
        score: Score,
    },
    Card {
        player: PlayerId,
        card: CardKind,
    },
    GameEnded {
        score: Score,
    },
}

impl GameEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            GameEventKind::PeriodStarted => "period_started",
            GameEventKind::PeriodEnded => "period_ended",
            GameEventKind::StoppageStarted => "stoppage_started",
            GameEventKind::StoppageEnded { .. } => "stoppage_ended",
            GameEventKind::SubstitutionConfirmed { .. } => "substitution",
            GameEventKind::Goal { .. } => "goal",
            GameEventKind::Card { .. } => "card",
            GameEventKind::GameEnded { .. } => "game_ended",
        }
    }
}

impl Game {
    pub fn record_goal(
        &mut self,
        side: TeamSide,
        scorer: Option<PlayerId>,
        assist: Option<PlayerId>,
        now: DateTime<Utc>,
    ) -> Result<GameEvent, GameError> {
        self.require_stage(
            &[GameStage::DuringPeriod, GameStage::InStoppage],
            Operation::RecordGoal,
        )?;
        for player in scorer.iter().chain(assist.iter()) {
            self.entry_index(*player)?;
            if side == TeamSide::Opponent {
                return GameError::violation(ConstraintViolation::PlayerOnOpponentGoal(*player));
            }
        }
        if let Some(player) = scorer.filter(|s| Some(*s) == assist) {
            return GameError::violation(ConstraintViolation::SamePlayer(player));
        }

        match side {
            TeamSide::Team => self.score.team += 1,
            TeamSide::Opponent => self.score.opponent += 1,
        }
        let score = self.score;
        Ok(self.push_event(
            now,
            GameEventKind::Goal {
                side,
                scorer,
                assist,
                score,
            },
        ))
    }

    pub fn record_card(
        &mut self,
        player: PlayerId,
        card: CardKind,
        now: DateTime<Utc>,
    ) -> Result<GameEvent, GameError> {
        self.require_stage(
            &[
                GameStage::DuringPeriod,
                GameStage::InStoppage,
                GameStage::BetweenPeriods,
                GameStage::EndGame,
            ],
            Operation::RecordCard,
        )?;
        self.entry_index(player)?;
        Ok(self.push_event(now, GameEventKind::Card { player, card }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::*;

    #[test]
    fn test_goals_update_score() {
        let mut game = started_game();
        let event = game
            .record_goal(TeamSide::Team, Some(PlayerId(2)), Some(PlayerId(3)), at(300))
            .unwrap();
        assert_eq!(event.game_time, 300);
        assert_eq!(event.period, 1);
        game.record_goal(TeamSide::Opponent, None, None, at(400))
            .unwrap();
        assert_eq!(
            game.score(),
            Score {
                team: 1,
                opponent: 1
            }
        );
        assert_eq!(game.events().last().map(|e| e.kind.name()), Some("goal"));
    }

    #[test]
    fn test_goal_rejected_outside_play() {
        let mut game = game();
        assert_eq!(
            game.record_goal(TeamSide::Team, None, None, t0()),
            Err(GameError::InvalidStateTransition {
                stage: GameStage::BeforeStart,
                action: Operation::RecordGoal
            })
        );

        let mut game = started_game();
        game.end_period(at(1200)).unwrap();
        assert!(game.record_goal(TeamSide::Team, None, None, at(1210)).is_err());
        assert_eq!(game.score(), Score::default());
    }

    #[test]
    fn test_goal_player_checks() {
        let mut game = started_game();
        assert!(matches!(
            game.record_goal(TeamSide::Team, Some(PlayerId(42)), None, at(10)),
            Err(GameError::NotFound(_))
        ));
        assert_eq!(
            game.record_goal(TeamSide::Opponent, Some(PlayerId(2)), None, at(10)),
            Err(GameError::ConstraintViolation(
                ConstraintViolation::PlayerOnOpponentGoal(PlayerId(2))
            ))
        );
        assert!(
            game.record_goal(TeamSide::Team, Some(PlayerId(2)), Some(PlayerId(2)), at(10))
                .is_err()
        );
        assert_eq!(game.score(), Score::default());
    }

    #[test]
    fn test_cards() {
        let mut game = game();
        assert!(game.record_card(PlayerId(2), CardKind::Yellow, t0()).is_err());

        game.start_game(t0()).unwrap();
        let event = game
            .record_card(PlayerId(5), CardKind::Yellow, at(90))
            .unwrap();
        assert_eq!(
            event.kind,
            GameEventKind::Card {
                player: PlayerId(5),
                card: CardKind::Yellow
            }
        );
        assert!(game.record_card(PlayerId(77), CardKind::Red, at(95)).is_err());
    }
}
