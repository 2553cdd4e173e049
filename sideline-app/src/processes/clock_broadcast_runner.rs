use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    domain::{GameId, live_game::SessionId},
    workflow::clock::{ObserveClockUseCase, ObserveOutcome},
};

pub trait ClockBroadcastRunner {
    fn schedule_clock_broadcast(this: Arc<Self>, game_id: GameId, session: SessionId);
}

/// Pushes clock updates for one live session of a game until the game ends,
/// that session is closed or the server shuts down.
pub struct ClockBroadcastRunnerImpl<O: ObserveClockUseCase + Send + Sync + 'static> {
    observer: Arc<O>,
    shutdown: CancellationToken,
}

impl<O: ObserveClockUseCase + Send + Sync + 'static> ClockBroadcastRunner
    for ClockBroadcastRunnerImpl<O>
{
    fn schedule_clock_broadcast(this: Arc<Self>, game_id: GameId, session: SessionId) {
        tokio::spawn(async move {
            Self::run(this, game_id, session).await;
        });
    }
}

impl<O: ObserveClockUseCase + Send + Sync + 'static> ClockBroadcastRunnerImpl<O> {
    pub fn new(observer: Arc<O>, shutdown: CancellationToken) -> Self {
        Self { observer, shutdown }
    }

    async fn run(this: Arc<Self>, game_id: GameId, session: SessionId) {
        loop {
            let now = chrono::Utc::now();
            match this.observer.tick(game_id, session, now).await {
                ObserveOutcome::Finished => return,
                ObserveOutcome::Continue(delay) => {
                    tokio::select! {
                        _ = this.shutdown.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use chrono::{DateTime, Utc};

    use super::*;

    struct CountingObserver {
        ticks: AtomicU32,
        stop_after: u32,
    }

    #[async_trait::async_trait]
    impl ObserveClockUseCase for CountingObserver {
        async fn tick(
            &self,
            _game_id: GameId,
            _session: SessionId,
            _now: DateTime<Utc>,
        ) -> ObserveOutcome {
            let ticks = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if ticks >= self.stop_after {
                ObserveOutcome::Finished
            } else {
                ObserveOutcome::Continue(Duration::from_millis(1))
            }
        }
    }

    #[tokio::test]
    async fn test_runs_until_finished() {
        let observer = Arc::new(CountingObserver {
            ticks: AtomicU32::new(0),
            stop_after: 3,
        });
        let runner = Arc::new(ClockBroadcastRunnerImpl::new(
            observer.clone(),
            CancellationToken::new(),
        ));
        ClockBroadcastRunnerImpl::run(runner, GameId(1), SessionId(1)).await;
        assert_eq!(observer.ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let observer = Arc::new(CountingObserver {
            ticks: AtomicU32::new(0),
            stop_after: u32::MAX,
        });
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let runner = Arc::new(ClockBroadcastRunnerImpl::new(observer.clone(), shutdown));
        ClockBroadcastRunnerImpl::run(runner, GameId(1), SessionId(1)).await;
        assert_eq!(observer.ticks.load(Ordering::SeqCst), 1);
    }
}
