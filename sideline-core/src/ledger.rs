use crate::{
    FieldStatus, GameSeconds, GameStatus, PlayerId, SubstitutionId,
    error::{ConstraintViolation, GameError, LedgerAppendError},
};

/// One rostered player in one game. `ins` and `outs` hold the game-time
/// marks at which the player entered and left the field.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerGameEntry {
    pub player_id: PlayerId,
    pub jersey_number: Option<u32>,
    pub display_name: String,
    pub game_status: GameStatus,
    pub field_status: FieldStatus,
    pub(crate) ins: Vec<GameSeconds>,
    pub(crate) outs: Vec<GameSeconds>,
    pub(crate) pending_sub: Option<SubstitutionId>,
}

impl PlayerGameEntry {
    pub fn new(
        player_id: PlayerId,
        jersey_number: Option<u32>,
        display_name: impl Into<String>,
        game_status: GameStatus,
    ) -> Self {
        PlayerGameEntry {
            player_id,
            jersey_number,
            display_name: display_name.into(),
            game_status,
            field_status: FieldStatus::OnBench,
            ins: Vec::new(),
            outs: Vec::new(),
            pending_sub: None,
        }
    }

    /// Rebuilds an entry from stored marks, rejecting ledgers that could not
    /// have been produced by alternating sub-ins and sub-outs. A starter's
    /// kick-off entry may be stored explicitly as a leading `0` in `ins`.
    pub fn restore(
        mut entry: PlayerGameEntry,
        ins: Vec<GameSeconds>,
        outs: Vec<GameSeconds>,
    ) -> Result<Self, GameError> {
        entry.ins = ins;
        entry.outs = outs;
        entry.pending_sub = None;
        if !entry.is_consistent() && entry.has_implicit_start() && entry.ins.first() == Some(&0) {
            entry.ins.remove(0);
        }
        if !entry.is_consistent() {
            return GameError::violation(ConstraintViolation::InconsistentLedger(
                entry.player_id,
            ));
        }
        Ok(entry)
    }

    pub fn ins(&self) -> &[GameSeconds] {
        &self.ins
    }

    pub fn outs(&self) -> &[GameSeconds] {
        &self.outs
    }

    pub fn pending_sub(&self) -> Option<SubstitutionId> {
        self.pending_sub
    }

    /// Starters are on the field from kick-off without a recorded sub-in, so
    /// their ledger opens with an unrecorded entry at game time zero. The
    /// starting set is locked once the game is under way.
    fn has_implicit_start(&self) -> bool {
        self.game_status.is_starting()
    }

    fn effective_ins(&self) -> impl Iterator<Item = GameSeconds> + '_ {
        self.has_implicit_start()
            .then_some(0)
            .into_iter()
            .chain(self.ins.iter().copied())
    }

    fn effective_in_count(&self) -> usize {
        self.ins.len() + usize::from(self.has_implicit_start())
    }

    fn last_effective_in(&self) -> Option<GameSeconds> {
        self.ins
            .last()
            .copied()
            .or_else(|| self.has_implicit_start().then_some(0))
    }

    fn last_mark(&self) -> Option<GameSeconds> {
        let last_in = self.ins.last().copied();
        let last_out = self.outs.last().copied();
        last_in.max(last_out)
    }

    fn is_consistent(&self) -> bool {
        let ins = self.effective_in_count();
        let outs = self.outs.len();
        if ins < outs || ins > outs + 1 {
            return false;
        }
        let mut marks: Vec<GameSeconds> = Vec::with_capacity(ins + outs);
        let mut eff_ins = self.effective_ins();
        let mut outs_iter = self.outs.iter().copied();
        loop {
            match eff_ins.next() {
                Some(i) => marks.push(i),
                None => break,
            }
            match outs_iter.next() {
                Some(o) => marks.push(o),
                None => break,
            }
        }
        marks.windows(2).all(|w| w[0] <= w[1])
    }

    pub fn is_on_field(&self) -> bool {
        self.effective_in_count() > self.outs.len()
    }

    pub fn has_left_field(&self) -> bool {
        !self.outs.is_empty()
    }

    pub fn total_time_on_field(&self, t: GameSeconds) -> GameSeconds {
        let completed: GameSeconds = self
            .effective_ins()
            .zip(self.outs.iter().copied())
            .map(|(i, o)| o.saturating_sub(i))
            .sum();
        let open = if self.is_on_field() {
            self.last_effective_in()
                .map_or(0, |last_in| t.saturating_sub(last_in))
        } else {
            0
        };
        completed.saturating_add(open)
    }

    pub fn current_time_on_field(&self, t: GameSeconds) -> GameSeconds {
        if !self.is_on_field() {
            return 0;
        }
        self.last_effective_in()
            .map_or(0, |last_in| t.saturating_sub(last_in))
    }

    pub fn current_time_off_field(&self, t: GameSeconds) -> GameSeconds {
        if self.is_on_field() {
            return 0;
        }
        self.outs
            .last()
            .map_or(0, |last_out| t.saturating_sub(*last_out))
    }

    pub(crate) fn check_sub_in(&self, t: GameSeconds) -> Result<(), GameError> {
        if self.is_on_field() {
            return self.append_error(LedgerAppendError::AlreadyOnField);
        }
        self.check_monotonic(t)
    }

    pub(crate) fn check_sub_out(&self, t: GameSeconds) -> Result<(), GameError> {
        if !self.is_on_field() {
            return self.append_error(LedgerAppendError::NotOnField);
        }
        self.check_monotonic(t)
    }

    fn check_monotonic(&self, t: GameSeconds) -> Result<(), GameError> {
        match self.last_mark() {
            Some(last) if t < last => {
                self.append_error(LedgerAppendError::MarkBeforeLastMark { mark: t, last })
            }
            _ => Ok(()),
        }
    }

    fn append_error(&self, reason: LedgerAppendError) -> Result<(), GameError> {
        Err(GameError::InvalidLedgerAppend {
            player: self.player_id,
            reason,
        })
    }

    pub fn record_sub_in(&mut self, t: GameSeconds) -> Result<(), GameError> {
        self.check_sub_in(t)?;
        self.ins.push(t);
        Ok(())
    }

    pub fn record_sub_out(&mut self, t: GameSeconds) -> Result<(), GameError> {
        self.check_sub_out(t)?;
        self.outs.push(t);
        Ok(())
    }
}
