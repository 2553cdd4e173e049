use chrono::{DateTime, Utc};

use crate::{
    Game, Period,
    error::{ConstraintViolation, GameError, Operation},
    event::{GameEvent, GameEventKind},
};

/// Lifecycle stage of a game, derived from its periods rather than stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStage {
    BeforeStart,
    DuringPeriod,
    InStoppage,
    BetweenPeriods,
    EndGame,
}

impl std::fmt::Display for GameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStage::BeforeStart => "before start",
            GameStage::DuringPeriod => "during a period",
            GameStage::InStoppage => "in a stoppage",
            GameStage::BetweenPeriods => "between periods",
            GameStage::EndGame => "over",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageAction {
    StartGame,
    StartStoppage,
    EndStoppage,
    EndPeriod,
    StartNextPeriod,
}

impl From<StageAction> for Operation {
    fn from(action: StageAction) -> Self {
        match action {
            StageAction::StartGame => Operation::StartGame,
            StageAction::StartStoppage => Operation::StartStoppage,
            StageAction::EndStoppage => Operation::EndStoppage,
            StageAction::EndPeriod => Operation::EndPeriod,
            StageAction::StartNextPeriod => Operation::StartNextPeriod,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageTransition {
    pub from: GameStage,
    pub to: GameStage,
    pub period: u32,
    pub events: Vec<GameEvent>,
}

impl Game {
    pub fn stage(&self) -> GameStage {
        match self.current_period() {
            None => GameStage::BeforeStart,
            Some(period) if period.in_stoppage() => GameStage::InStoppage,
            Some(period) if period.is_running() => GameStage::DuringPeriod,
            Some(period) if period.number >= self.settings.total_periods() => GameStage::EndGame,
            Some(_) => GameStage::BetweenPeriods,
        }
    }

    pub fn is_over(&self) -> bool {
        self.stage() == GameStage::EndGame
    }

    /// Fails with `InvalidStateTransition` unless the game is in one of `allowed`.
    pub(crate) fn require_stage(
        &self,
        allowed: &[GameStage],
        action: Operation,
    ) -> Result<GameStage, GameError> {
        let stage = self.stage();
        if allowed.contains(&stage) {
            Ok(stage)
        } else {
            Err(GameError::InvalidStateTransition { stage, action })
        }
    }

    pub fn apply(
        &mut self,
        action: StageAction,
        now: DateTime<Utc>,
    ) -> Result<StageTransition, GameError> {
        let from = self.stage();
        let events = match (from, action) {
            (GameStage::BeforeStart, StageAction::StartGame) => self.kick_off(now)?,
            (GameStage::DuringPeriod, StageAction::StartStoppage) => self.begin_stoppage(now),
            (GameStage::InStoppage, StageAction::EndStoppage) => self.finish_stoppage(now),
            (GameStage::DuringPeriod, StageAction::EndPeriod) => self.finish_period(now),
            (GameStage::BetweenPeriods, StageAction::StartNextPeriod) => {
                let next = self.current_period_number() + 1;
                vec![self.begin_period(next, now)]
            }
            (stage, action) => {
                return Err(GameError::InvalidStateTransition {
                    stage,
                    action: action.into(),
                });
            }
        };
        Ok(StageTransition {
            from,
            to: self.stage(),
            period: self.current_period_number(),
            events,
        })
    }

    pub fn start_game(&mut self, now: DateTime<Utc>) -> Result<StageTransition, GameError> {
        self.apply(StageAction::StartGame, now)
    }

    pub fn start_stoppage(&mut self, now: DateTime<Utc>) -> Result<StageTransition, GameError> {
        self.apply(StageAction::StartStoppage, now)
    }

    pub fn end_stoppage(&mut self, now: DateTime<Utc>) -> Result<StageTransition, GameError> {
        self.apply(StageAction::EndStoppage, now)
    }

    pub fn end_period(&mut self, now: DateTime<Utc>) -> Result<StageTransition, GameError> {
        self.apply(StageAction::EndPeriod, now)
    }

    pub fn start_next_period(&mut self, now: DateTime<Utc>) -> Result<StageTransition, GameError> {
        self.apply(StageAction::StartNextPeriod, now)
    }

    fn kick_off(&mut self, now: DateTime<Utc>) -> Result<Vec<GameEvent>, GameError> {
        if !self.can_confirm_lineup() {
            let counts = self.lineup_counts();
            return GameError::violation(ConstraintViolation::LineupIncomplete {
                starters: counts.starters,
                goalkeepers: counts.goalkeepers,
                required_field_players: self.settings.players_on_field,
            });
        }
        for entry in self.roster.iter_mut() {
            entry.ins.clear();
            entry.outs.clear();
            entry.pending_sub = None;
        }
        self.substitutions.clear();
        self.sync_field_statuses();
        Ok(vec![self.begin_period(1, now)])
    }

    fn begin_period(&mut self, number: u32, now: DateTime<Utc>) -> GameEvent {
        match self.periods.iter_mut().find(|p| p.number == number) {
            Some(planned) => *planned = Period::start(number, now),
            None => self.periods.push(Period::start(number, now)),
        }
        self.push_event(now, GameEventKind::PeriodStarted)
    }

    fn begin_stoppage(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        if let Some(period) = self.current_period_mut() {
            period.begin_stoppage(now);
        }
        vec![self.push_event(now, GameEventKind::StoppageStarted)]
    }

    fn finish_stoppage(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        let paused = self
            .current_period_mut()
            .map(|period| period.finish_stoppage(now))
            .unwrap_or_default();
        vec![self.push_event(now, GameEventKind::StoppageEnded { duration: paused })]
    }

    fn finish_period(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        if let Some(period) = self.current_period_mut() {
            period.finish(now);
        }
        let mut events = vec![self.push_event(now, GameEventKind::PeriodEnded)];
        if self.is_over() {
            let score = self.score;
            events.push(self.push_event(now, GameEventKind::GameEnded { score }));
        }
        events
    }
}
