use chrono::{DateTime, Utc};

use crate::{
    FieldStatus, Game, GameSeconds, PlayerId, SubstitutionId,
    error::{ConstraintViolation, GameError, LedgerAppendError, NotFound, Operation},
    event::{GameEvent, GameEventKind},
    stage::GameStage,
};

/// A swap of one on-field player for one off-field player. `game_time` stays
/// `None` until the substitution is confirmed.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    pub id: SubstitutionId,
    pub outgoing: PlayerId,
    pub incoming: PlayerId,
    pub game_time: Option<GameSeconds>,
    pub period: u32,
    pub goalkeeper: bool,
    outgoing_previous: FieldStatus,
    incoming_previous: FieldStatus,
}

impl Substitution {
    pub fn is_pending(&self) -> bool {
        self.game_time.is_none()
    }
}

const SUBSTITUTION_STAGES: [GameStage; 3] = [
    GameStage::DuringPeriod,
    GameStage::InStoppage,
    GameStage::BetweenPeriods,
];

impl Game {
    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    pub fn pending_substitutions(&self) -> impl Iterator<Item = &Substitution> {
        self.substitutions.iter().filter(|s| s.is_pending())
    }

    pub fn confirmed_substitution_count(&self) -> u32 {
        self.substitutions.iter().filter(|s| !s.is_pending()).count() as u32
    }

    fn pending_index(&self, id: SubstitutionId) -> Result<usize, GameError> {
        self.substitutions
            .iter()
            .position(|s| s.id == id && s.is_pending())
            .ok_or(GameError::NotFound(NotFound::Substitution(id)))
    }

    pub fn initiate_sub(
        &mut self,
        outgoing: PlayerId,
        incoming: PlayerId,
    ) -> Result<SubstitutionId, GameError> {
        self.require_stage(&SUBSTITUTION_STAGES, Operation::InitiateSubstitution)?;
        if outgoing == incoming {
            return GameError::violation(ConstraintViolation::SamePlayer(outgoing));
        }
        let out_index = self.entry_index(outgoing)?;
        let in_index = self.entry_index(incoming)?;

        let (out_entry, in_entry) = (&self.roster[out_index], &self.roster[in_index]);
        for entry in [out_entry, in_entry] {
            if entry.pending_sub.is_some() {
                return GameError::violation(ConstraintViolation::PendingSubstitution(
                    entry.player_id,
                ));
            }
        }
        if !out_entry.is_on_field() {
            return GameError::violation(ConstraintViolation::NotOnField(outgoing));
        }
        if in_entry.is_on_field() {
            return GameError::violation(ConstraintViolation::AlreadyOnField(incoming));
        }
        if let Some(max) = self.settings.max_substitutions {
            if self.substitutions.len() as u32 >= max {
                return GameError::violation(ConstraintViolation::SubstitutionLimitReached(max));
            }
        }
        if !self.settings.allow_reentry && in_entry.has_left_field() {
            return GameError::violation(ConstraintViolation::ReentryNotAllowed(incoming));
        }

        let goalkeeper = out_entry.field_status == FieldStatus::OnFieldGk;
        let outgoing_previous = out_entry.field_status;
        let incoming_previous = in_entry.field_status;
        let id = self.next_substitution_id();
        let substitution = Substitution {
            id,
            outgoing,
            incoming,
            game_time: None,
            period: self.current_period_number(),
            goalkeeper,
            outgoing_previous,
            incoming_previous,
        };

        let out_entry = &mut self.roster[out_index];
        out_entry.field_status = if goalkeeper {
            FieldStatus::SubbingOutGk
        } else {
            FieldStatus::SubbingOut
        };
        out_entry.pending_sub = Some(id);
        let in_entry = &mut self.roster[in_index];
        in_entry.field_status = FieldStatus::SubbingIn;
        in_entry.pending_sub = Some(id);

        self.substitutions.push(substitution);
        Ok(id)
    }

    /// Writes both ledger marks at game time `t`, which may not lie past the
    /// game time at `now`. Both appends are checked before either is applied.
    pub fn confirm_sub(
        &mut self,
        id: SubstitutionId,
        t: GameSeconds,
        now: DateTime<Utc>,
    ) -> Result<GameEvent, GameError> {
        let index = self.pending_index(id)?;
        self.require_stage(&SUBSTITUTION_STAGES, Operation::ConfirmSubstitution)?;

        let (outgoing, incoming, goalkeeper) = {
            let sub = &self.substitutions[index];
            (sub.outgoing, sub.incoming, sub.goalkeeper)
        };
        let out_index = self.entry_index(outgoing)?;
        let in_index = self.entry_index(incoming)?;
        let game_time = self.current_game_time(now);
        if t > game_time {
            return Err(GameError::InvalidLedgerAppend {
                player: outgoing,
                reason: LedgerAppendError::MarkAfterGameTime { mark: t, game_time },
            });
        }
        self.roster[out_index].check_sub_out(t)?;
        self.roster[in_index].check_sub_in(t)?;

        let out_entry = &mut self.roster[out_index];
        out_entry.outs.push(t);
        out_entry.field_status = FieldStatus::OnBench;
        out_entry.pending_sub = None;
        let in_entry = &mut self.roster[in_index];
        in_entry.ins.push(t);
        in_entry.field_status = if goalkeeper {
            FieldStatus::OnFieldGk
        } else {
            FieldStatus::OnField
        };
        in_entry.pending_sub = None;

        let period = self.current_period_number();
        let sub = &mut self.substitutions[index];
        sub.game_time = Some(t);
        sub.period = period;

        Ok(self.push_event_at(
            now,
            t,
            GameEventKind::SubstitutionConfirmed {
                substitution: id,
                outgoing,
                incoming,
                goalkeeper,
            },
        ))
    }

    /// Restores both players' field status and forgets the substitution.
    pub fn cancel_sub(&mut self, id: SubstitutionId) -> Result<Substitution, GameError> {
        let index = self.pending_index(id)?;
        let substitution = self.substitutions.remove(index);
        for (player, previous) in [
            (substitution.outgoing, substitution.outgoing_previous),
            (substitution.incoming, substitution.incoming_previous),
        ] {
            if let Some(entry) = self.roster.iter_mut().find(|e| e.player_id == player) {
                entry.field_status = previous;
                entry.pending_sub = None;
            }
        }
        Ok(substitution)
    }

    pub fn record_sub_in(&mut self, player: PlayerId, t: GameSeconds) -> Result<(), GameError> {
        let index = self.entry_index(player)?;
        self.roster[index].record_sub_in(t)
    }

    pub fn record_sub_out(&mut self, player: PlayerId, t: GameSeconds) -> Result<(), GameError> {
        let index = self.entry_index(player)?;
        self.roster[index].record_sub_out(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameSettings;
    use crate::game::test_support::*;

    #[test]
    fn test_full_sub_cycle() {
        let mut game = started_game();
        let id = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        assert_eq!(
            game.entry(PlayerId(2)).unwrap().field_status,
            FieldStatus::SubbingOut
        );
        assert_eq!(
            game.entry(PlayerId(5)).unwrap().field_status,
            FieldStatus::SubbingIn
        );
        assert_eq!(game.pending_substitutions().count(), 1);

        let event = game.confirm_sub(id, 600, at(600)).unwrap();
        assert_eq!(event.game_time, 600);

        let starter = game.entry(PlayerId(2)).unwrap();
        assert_eq!(starter.outs(), &[600]);
        assert!(starter.ins().is_empty());
        assert_eq!(starter.field_status, FieldStatus::OnBench);
        assert_eq!(starter.total_time_on_field(900), 600);
        assert_eq!(starter.pending_sub(), None);

        let bench = game.entry(PlayerId(5)).unwrap();
        assert_eq!(bench.ins(), &[600]);
        assert_eq!(bench.field_status, FieldStatus::OnField);
        assert_eq!(bench.total_time_on_field(900), 300);

        assert_eq!(game.substitutions()[0].game_time, Some(600));
        assert_eq!(game.pending_substitutions().count(), 0);
    }

    #[test]
    fn test_cancel_reverts_cleanly() {
        let mut game = started_game();
        let id = game.initiate_sub(PlayerId(3), PlayerId(6)).unwrap();
        game.confirm_sub(id, 100, at(100)).unwrap();
        let before = game.roster().to_vec();

        let id = game.initiate_sub(PlayerId(6), PlayerId(3)).unwrap();
        let cancelled = game.cancel_sub(id).unwrap();
        assert_eq!(cancelled.outgoing, PlayerId(6));
        assert_eq!(game.roster(), before.as_slice());
        assert_eq!(game.substitutions().len(), 1);
        assert!(matches!(
            game.cancel_sub(id),
            Err(GameError::NotFound(NotFound::Substitution(_)))
        ));
    }

    #[test]
    fn test_goalkeeper_swap() {
        let mut game = started_game();
        let id = game.initiate_sub(PlayerId(1), PlayerId(6)).unwrap();
        assert_eq!(
            game.entry(PlayerId(1)).unwrap().field_status,
            FieldStatus::SubbingOutGk
        );
        assert!(game.substitutions()[0].goalkeeper);

        game.cancel_sub(id).unwrap();
        assert_eq!(
            game.entry(PlayerId(1)).unwrap().field_status,
            FieldStatus::OnFieldGk
        );

        let id = game.initiate_sub(PlayerId(1), PlayerId(6)).unwrap();
        game.confirm_sub(id, 300, at(300)).unwrap();
        assert_eq!(
            game.entry(PlayerId(6)).unwrap().field_status,
            FieldStatus::OnFieldGk
        );
        assert_eq!(
            game.entry(PlayerId(1)).unwrap().field_status,
            FieldStatus::OnBench
        );
    }

    #[test]
    fn test_one_open_substitution_per_player() {
        let mut game = started_game();
        game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        assert_eq!(
            game.initiate_sub(PlayerId(2), PlayerId(6)),
            Err(GameError::ConstraintViolation(
                ConstraintViolation::PendingSubstitution(PlayerId(2))
            ))
        );
        assert_eq!(
            game.initiate_sub(PlayerId(3), PlayerId(5)),
            Err(GameError::ConstraintViolation(
                ConstraintViolation::PendingSubstitution(PlayerId(5))
            ))
        );
    }

    #[test]
    fn test_initiate_checks_field_positions() {
        let mut game = started_game();
        assert_eq!(
            game.initiate_sub(PlayerId(5), PlayerId(6)),
            Err(GameError::ConstraintViolation(ConstraintViolation::NotOnField(
                PlayerId(5)
            )))
        );
        assert_eq!(
            game.initiate_sub(PlayerId(2), PlayerId(3)),
            Err(GameError::ConstraintViolation(
                ConstraintViolation::AlreadyOnField(PlayerId(3))
            ))
        );
        assert!(game.initiate_sub(PlayerId(2), PlayerId(2)).is_err());
        assert!(matches!(
            game.initiate_sub(PlayerId(2), PlayerId(99)),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn test_substitutions_need_a_running_game() {
        let mut game = game();
        assert_eq!(
            game.initiate_sub(PlayerId(2), PlayerId(5)),
            Err(GameError::InvalidStateTransition {
                stage: GameStage::BeforeStart,
                action: Operation::InitiateSubstitution
            })
        );

        let mut game = started_game();
        game.end_period(at(1200)).unwrap();
        let id = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        game.confirm_sub(id, 1200, at(1250)).unwrap();
        assert_eq!(game.entry(PlayerId(5)).unwrap().ins(), &[1200]);
    }

    #[test]
    fn test_failed_confirm_leaves_game_untouched() {
        let mut game = started_game();
        let first = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        game.confirm_sub(first, 600, at(600)).unwrap();

        let second = game.initiate_sub(PlayerId(5), PlayerId(2)).unwrap();
        let before = game.roster().to_vec();
        assert!(matches!(
            game.confirm_sub(second, 500, at(700)),
            Err(GameError::InvalidLedgerAppend { .. })
        ));
        assert_eq!(game.roster(), before.as_slice());
        assert!(game.substitutions()[1].is_pending());
    }

    #[test]
    fn test_confirm_rejects_marks_past_the_game_time() {
        let mut game = started_game();
        let id = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        let before = game.roster().to_vec();
        assert_eq!(
            game.confirm_sub(id, 99_999, at(600)),
            Err(GameError::InvalidLedgerAppend {
                player: PlayerId(2),
                reason: LedgerAppendError::MarkAfterGameTime {
                    mark: 99_999,
                    game_time: 600
                }
            })
        );
        assert_eq!(game.roster(), before.as_slice());
        assert!(game.substitutions()[0].is_pending());

        game.confirm_sub(id, 600, at(600)).unwrap();
        assert_eq!(game.entry(PlayerId(2)).unwrap().total_time_on_field(600), 600);
    }

    #[test]
    fn test_starter_subbed_out_and_back_in_during_a_stoppage() {
        let mut game = started_game();
        game.start_stoppage(at(300)).unwrap();
        let id = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        game.confirm_sub(id, 300, at(320)).unwrap();
        let id = game.initiate_sub(PlayerId(5), PlayerId(2)).unwrap();
        game.confirm_sub(id, 300, at(340)).unwrap();

        let starter = game.entry(PlayerId(2)).unwrap();
        assert_eq!(starter.ins(), &[300]);
        assert_eq!(starter.outs(), &[300]);
        assert!(starter.is_on_field());
        assert_eq!(starter.field_status, FieldStatus::OnField);
        assert_eq!(starter.total_time_on_field(300), 300);
        assert!(!game.entry(PlayerId(5)).unwrap().is_on_field());

        game.end_stoppage(at(360)).unwrap();
        assert!(game.initiate_sub(PlayerId(2), PlayerId(6)).is_ok());
    }

    #[test]
    fn test_substitution_limit_and_reentry() {
        let limited = GameSettings {
            max_substitutions: Some(1),
            allow_reentry: false,
            ..settings()
        };
        let mut game = Game::new(limited, roster()).unwrap();
        game.start_game(t0()).unwrap();
        let id = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        game.confirm_sub(id, 60, at(60)).unwrap();
        assert_eq!(
            game.initiate_sub(PlayerId(3), PlayerId(6)),
            Err(GameError::ConstraintViolation(
                ConstraintViolation::SubstitutionLimitReached(1)
            ))
        );

        let no_reentry = GameSettings {
            allow_reentry: false,
            ..settings()
        };
        let mut game = Game::new(no_reentry, roster()).unwrap();
        game.start_game(t0()).unwrap();
        let id = game.initiate_sub(PlayerId(2), PlayerId(5)).unwrap();
        game.confirm_sub(id, 60, at(60)).unwrap();
        assert_eq!(
            game.initiate_sub(PlayerId(5), PlayerId(2)),
            Err(GameError::ConstraintViolation(
                ConstraintViolation::ReentryNotAllowed(PlayerId(2))
            ))
        );
    }

    #[test]
    fn test_direct_ledger_wrappers_reject_unknown_players() {
        let mut game = started_game();
        assert!(matches!(
            game.record_sub_in(PlayerId(404), 10),
            Err(GameError::NotFound(NotFound::Player(_)))
        ));
        game.record_sub_in(PlayerId(5), 10).unwrap();
        assert!(game.entry(PlayerId(5)).unwrap().is_on_field());
    }
}
