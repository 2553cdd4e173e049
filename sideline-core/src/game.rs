use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
    FieldStatus, GameSeconds, GameSettings, GameStatus, LineupAction, Period, PlayerGameEntry,
    PlayerId, Substitution, SubstitutionId,
    error::{ConstraintViolation, GameError},
    event::{GameEvent, GameEventKind, Score},
    lineup::{self, LineupCounts},
    stage::GameStage,
};

/// A live game: settings, periods and the roster it exclusively owns.
#[derive(Clone, Debug)]
pub struct Game {
    pub(crate) settings: GameSettings,
    pub(crate) periods: Vec<Period>,
    pub(crate) roster: Vec<PlayerGameEntry>,
    pub(crate) substitutions: Vec<Substitution>,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) score: Score,
    pub(crate) next_substitution_id: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerTime {
    pub player_id: PlayerId,
    pub on_field: bool,
    pub total_on_field: GameSeconds,
    pub current_on_field: GameSeconds,
    pub current_off_field: GameSeconds,
}

impl Game {
    pub fn new(settings: GameSettings, roster: Vec<PlayerGameEntry>) -> Result<Self, GameError> {
        Self::restore(settings, Vec::new(), roster, Score::default(), None)
    }

    /// Rebuilds a game loaded from storage, possibly mid-game. `keeper` is
    /// the player last known to keep goal; without it the keeper is derived
    /// from the goalkeeper status.
    pub fn restore(
        settings: GameSettings,
        mut periods: Vec<Period>,
        roster: Vec<PlayerGameEntry>,
        score: Score,
        keeper: Option<PlayerId>,
    ) -> Result<Self, GameError> {
        if !settings.is_valid() {
            return GameError::violation(ConstraintViolation::InvalidSettings);
        }
        let mut seen = HashSet::new();
        for entry in &roster {
            if !seen.insert(entry.player_id) {
                return GameError::violation(ConstraintViolation::DuplicatePlayer(
                    entry.player_id,
                ));
            }
        }
        if lineup::lineup_counts(&roster).goalkeepers > 1 {
            return GameError::violation(ConstraintViolation::MultipleGoalkeepers);
        }
        periods.sort_by_key(|p| p.number);
        if periods.iter().filter(|p| p.is_running()).count() > 1 {
            return GameError::violation(ConstraintViolation::MultipleRunningPeriods);
        }
        let mut game = Game {
            settings,
            periods,
            roster,
            substitutions: Vec::new(),
            events: Vec::new(),
            score,
            next_substitution_id: 1,
        };
        if game.stage() != GameStage::BeforeStart {
            game.sync_field_statuses();
            if let Some(keeper) = keeper {
                game.restore_keeper(keeper)?;
            }
        }
        Ok(game)
    }

    /// Moves the on-field goalkeeper marker to `keeper`, who may have taken
    /// over goal through a substitution. A keeper off the field is ignored.
    fn restore_keeper(&mut self, keeper: PlayerId) -> Result<(), GameError> {
        let index = self.entry_index(keeper)?;
        if !self.roster[index].is_on_field() {
            return Ok(());
        }
        for (i, entry) in self.roster.iter_mut().enumerate() {
            entry.field_status = match entry.field_status {
                FieldStatus::OnField | FieldStatus::OnFieldGk if i == index => {
                    FieldStatus::OnFieldGk
                }
                FieldStatus::OnFieldGk => FieldStatus::OnField,
                other => other,
            };
        }
        Ok(())
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn roster(&self) -> &[PlayerGameEntry] {
        &self.roster
    }

    pub fn entry(&self, player: PlayerId) -> Option<&PlayerGameEntry> {
        self.roster.iter().find(|e| e.player_id == player)
    }

    pub(crate) fn entry_index(&self, player: PlayerId) -> Result<usize, GameError> {
        match self.roster.iter().position(|e| e.player_id == player) {
            Some(index) => Ok(index),
            None => GameError::player_not_found(player),
        }
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// The latest period that has been started, running or not.
    pub fn current_period(&self) -> Option<&Period> {
        self.periods.iter().rev().find(|p| p.started_at.is_some())
    }

    pub(crate) fn current_period_mut(&mut self) -> Option<&mut Period> {
        self.periods.iter_mut().rev().find(|p| p.started_at.is_some())
    }

    pub fn current_period_number(&self) -> u32 {
        self.current_period().map_or(0, |p| p.number)
    }

    pub fn lineup_counts(&self) -> LineupCounts {
        lineup::lineup_counts(&self.roster)
    }

    pub fn can_confirm_lineup(&self) -> bool {
        lineup::can_confirm_lineup(&self.roster, self.settings.players_on_field)
    }

    /// Lineup changes during a game may not move players into or out of the
    /// starting set, and the goalkeeper marker may only move to a player who
    /// is on the field.
    pub fn set_status(
        &mut self,
        player: PlayerId,
        action: LineupAction,
    ) -> Result<GameStatus, GameError> {
        let index = self.entry_index(player)?;
        if self.stage() == GameStage::BeforeStart {
            return lineup::set_status(&mut self.roster, player, action);
        }

        let entry = &self.roster[index];
        let next = lineup::target_status(entry.game_status, action)?;
        if next.is_starting() != entry.game_status.is_starting() {
            return GameError::violation(ConstraintViolation::StartingStatusLocked(player));
        }
        if next == GameStatus::Goalkeeper
            && !matches!(entry.field_status, FieldStatus::OnField | FieldStatus::OnFieldGk)
        {
            return GameError::violation(ConstraintViolation::GoalkeeperNotOnField(player));
        }

        let status = lineup::set_status(&mut self.roster, player, action)?;
        let promoted = status == GameStatus::Goalkeeper;
        for (i, entry) in self.roster.iter_mut().enumerate() {
            let touched = i == index || promoted;
            entry.field_status = match entry.field_status {
                FieldStatus::OnField if promoted && i == index => FieldStatus::OnFieldGk,
                FieldStatus::OnFieldGk if touched && !(promoted && i == index) => {
                    FieldStatus::OnField
                }
                other => other,
            };
        }
        Ok(status)
    }

    /// Derives settled field statuses from the ledger, used at kick-off and
    /// when a game is restored mid-way.
    pub(crate) fn sync_field_statuses(&mut self) {
        for entry in self.roster.iter_mut() {
            entry.field_status = match (entry.is_on_field(), entry.game_status) {
                (true, GameStatus::Goalkeeper) => FieldStatus::OnFieldGk,
                (true, _) => FieldStatus::OnField,
                (false, _) => FieldStatus::OnBench,
            };
        }
    }

    pub(crate) fn next_substitution_id(&mut self) -> SubstitutionId {
        let id = SubstitutionId(self.next_substitution_id);
        self.next_substitution_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, now: DateTime<Utc>, kind: GameEventKind) -> GameEvent {
        let game_time = self.current_game_time(now);
        self.push_event_at(now, game_time, kind)
    }

    pub(crate) fn push_event_at(
        &mut self,
        now: DateTime<Utc>,
        game_time: GameSeconds,
        kind: GameEventKind,
    ) -> GameEvent {
        let event = GameEvent {
            at: now,
            period: self.current_period_number(),
            game_time,
            kind,
        };
        self.events.push(event.clone());
        event
    }

    pub fn player_times(&self, now: DateTime<Utc>) -> Vec<PlayerTime> {
        let t = self.current_game_time(now);
        self.roster
            .iter()
            .map(|entry| PlayerTime {
                player_id: entry.player_id,
                on_field: entry.is_on_field(),
                total_on_field: entry.total_time_on_field(t),
                current_on_field: entry.current_time_on_field(t),
                current_off_field: entry.current_time_off_field(t),
            })
            .collect()
    }
}
