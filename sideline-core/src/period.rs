use std::time::Duration;

use chrono::{DateTime, Utc};

/// One timed segment of play. A period with a start and no end is running;
/// while `stoppage_started_at` is set its clock is frozen.
#[derive(Clone, Debug, PartialEq)]
pub struct Period {
    pub number: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub added_time: Duration,
    pub stoppage_started_at: Option<DateTime<Utc>>,
}

impl Period {
    pub(crate) fn start(number: u32, now: DateTime<Utc>) -> Self {
        Period {
            number,
            started_at: Some(now),
            ended_at: None,
            added_time: Duration::ZERO,
            stoppage_started_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.ended_at.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.started_at.is_some() && self.ended_at.is_some()
    }

    pub fn in_stoppage(&self) -> bool {
        self.is_running() && self.stoppage_started_at.is_some()
    }

    /// Play time of this period, excluding credited stoppage time and any
    /// stoppage still in progress.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(start) = self.started_at else {
            return Duration::ZERO;
        };
        let until = self
            .ended_at
            .or(self.stoppage_started_at)
            .unwrap_or(now)
            .max(start);
        (until - start)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .saturating_sub(self.added_time)
    }

    pub(crate) fn begin_stoppage(&mut self, now: DateTime<Utc>) {
        self.stoppage_started_at = Some(now);
    }

    /// Clears the stoppage flag and returns the credited pause.
    pub(crate) fn finish_stoppage(&mut self, now: DateTime<Utc>) -> Duration {
        let Some(stoppage_start) = self.stoppage_started_at.take() else {
            return Duration::ZERO;
        };
        let paused = (now.max(stoppage_start) - stoppage_start)
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.added_time = self.added_time.saturating_add(paused);
        paused
    }

    pub(crate) fn finish(&mut self, now: DateTime<Utc>) {
        let start = self.started_at.unwrap_or(now);
        self.ended_at = Some(now.max(start));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_unstarted_period_has_no_elapsed_time() {
        let period = Period {
            number: 1,
            started_at: None,
            ended_at: None,
            added_time: Duration::ZERO,
            stoppage_started_at: None,
        };
        assert_eq!(period.elapsed(t0()), Duration::ZERO);
        assert!(!period.is_running());
    }

    #[test]
    fn test_elapsed_excludes_stoppage() {
        let mut period = Period::start(1, t0());
        let stoppage = t0() + TimeDelta::seconds(500);
        period.begin_stoppage(stoppage);
        assert!(period.in_stoppage());

        // frozen while stopped
        let during = stoppage + TimeDelta::seconds(30);
        assert_eq!(period.elapsed(during), Duration::from_secs(500));

        let resume = stoppage + TimeDelta::seconds(50);
        assert_eq!(period.finish_stoppage(resume), Duration::from_secs(50));
        assert_eq!(period.elapsed(resume), Duration::from_secs(500));
        assert_eq!(
            period.elapsed(resume + TimeDelta::seconds(10)),
            Duration::from_secs(510)
        );
    }

    #[test]
    fn test_finished_period_ignores_now() {
        let mut period = Period::start(1, t0());
        period.finish(t0() + TimeDelta::seconds(1200));
        assert!(period.is_finished());
        assert_eq!(
            period.elapsed(t0() + TimeDelta::seconds(5000)),
            Duration::from_secs(1200)
        );
    }

    #[test]
    fn test_now_before_start_is_clamped() {
        let period = Period::start(1, t0());
        assert_eq!(
            period.elapsed(t0() - TimeDelta::seconds(10)),
            Duration::ZERO
        );
    }
}
