use chrono::{DateTime, Utc};

use crate::{ClockDirection, Game, GameSeconds, Period};

fn whole_seconds(period: &Period, now: DateTime<Utc>) -> GameSeconds {
    period.elapsed(now).as_secs().min(GameSeconds::MAX as u64) as GameSeconds
}

impl Game {
    /// Seconds of play since kick-off, summed over every started period.
    /// Pure in `now`: repeated calls without a mutation agree.
    pub fn current_game_time(&self, now: DateTime<Utc>) -> GameSeconds {
        self.periods
            .iter()
            .map(|period| whole_seconds(period, now))
            .fold(0, GameSeconds::saturating_add)
    }

    pub fn current_period_time(&self, now: DateTime<Utc>) -> GameSeconds {
        self.current_period()
            .map_or(0, |period| whole_seconds(period, now))
    }

    /// Period clock as shown to people: counting down from the period length
    /// when the game is configured that way.
    pub fn display_period_time(&self, now: DateTime<Utc>) -> GameSeconds {
        let elapsed = self.current_period_time(now);
        match self.settings.clock_direction {
            ClockDirection::Up => elapsed,
            ClockDirection::Down => {
                let duration = self
                    .settings
                    .period_duration_of(self.current_period_number().max(1));
                duration.saturating_sub(elapsed)
            }
        }
    }
}
