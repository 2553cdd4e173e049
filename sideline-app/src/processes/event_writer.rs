use std::{sync::Arc, time::Duration};

use sideline_core::{GameEvent, GameStatus, PlayerId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{GameId, RepoError},
    ports::event::GameEventRepository,
};

#[derive(Clone, Debug, PartialEq)]
pub enum PendingWrite {
    Event(GameEvent),
    PlayerStatus {
        player_id: PlayerId,
        game_status: GameStatus,
    },
}

pub trait EventQueue {
    fn enqueue(&self, game_id: GameId, write: PendingWrite);
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Clone)]
pub struct EventWriterHandle {
    sender: mpsc::UnboundedSender<(GameId, PendingWrite)>,
}

impl EventQueue for EventWriterHandle {
    fn enqueue(&self, game_id: GameId, write: PendingWrite) {
        if self.sender.send((game_id, write)).is_err() {
            log::error!("Event writer stopped, dropping write for game {}", game_id);
        }
    }
}

/// Persists game writes in the order they were queued, retrying failed
/// writes with exponential backoff before giving up on them.
pub struct EventWriter<R: GameEventRepository> {
    repository: Arc<R>,
    retry: RetryPolicy,
    receiver: mpsc::UnboundedReceiver<(GameId, PendingWrite)>,
}

impl<R: GameEventRepository + Send + Sync + 'static> EventWriter<R> {
    pub fn new(repository: Arc<R>, retry: RetryPolicy) -> (Self, EventWriterHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let writer = Self {
            repository,
            retry,
            receiver,
        };
        (writer, EventWriterHandle { sender })
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                item = self.receiver.recv() => match item {
                    Some((game_id, write)) => self.write_with_retry(game_id, write).await,
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    self.drain().await;
                    break;
                }
            }
        }
        log::info!("Event writer stopped");
    }

    async fn drain(&mut self) {
        while let Ok((game_id, write)) = self.receiver.try_recv() {
            self.write_with_retry(game_id, write).await;
        }
    }

    async fn write_once(&self, game_id: GameId, write: &PendingWrite) -> Result<(), RepoError> {
        match write {
            PendingWrite::Event(event) => self.repository.append_event(game_id, event).await,
            PendingWrite::PlayerStatus {
                player_id,
                game_status,
            } => {
                self.repository
                    .update_player_status(game_id, *player_id, *game_status)
                    .await
            }
        }
    }

    async fn write_with_retry(&self, game_id: GameId, write: PendingWrite) {
        let mut attempt = 1;
        loop {
            match self.write_once(game_id, &write).await {
                Ok(()) => return,
                Err(e) if attempt >= self.retry.max_attempts => {
                    log::error!(
                        "Giving up on write {:?} for game {} after {} attempts: {}",
                        write,
                        game_id,
                        attempt,
                        e
                    );
                    return;
                }
                Err(e) => {
                    let delay = self.retry.backoff(attempt);
                    log::warn!(
                        "Write for game {} failed (attempt {}), retrying in {:?}: {}",
                        game_id,
                        attempt,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    };

    use chrono::Utc;
    use sideline_core::GameEventKind;

    use super::*;

    #[derive(Default)]
    struct FlakyRepository {
        failures_left: AtomicU32,
        written: Mutex<Vec<(GameId, GameEvent)>>,
        statuses: Mutex<Vec<(PlayerId, GameStatus)>>,
    }

    #[async_trait::async_trait]
    impl GameEventRepository for FlakyRepository {
        async fn append_event(&self, game_id: GameId, event: &GameEvent) -> Result<(), RepoError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(RepoError::StorageError("database is locked".to_string()));
            }
            self.written.lock().unwrap().push((game_id, event.clone()));
            Ok(())
        }

        async fn update_player_status(
            &self,
            _game_id: GameId,
            player_id: PlayerId,
            game_status: GameStatus,
        ) -> Result<(), RepoError> {
            self.statuses.lock().unwrap().push((player_id, game_status));
            Ok(())
        }
    }

    fn event(game_time: u32) -> GameEvent {
        GameEvent {
            at: Utc::now(),
            period: 1,
            game_time,
            kind: GameEventKind::StoppageStarted,
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1000),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
        assert_eq!(policy.backoff(5), Duration::from_millis(1000));
        assert_eq!(policy.backoff(40), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_retries_until_written_in_order() {
        let repository = Arc::new(FlakyRepository {
            failures_left: AtomicU32::new(2),
            ..Default::default()
        });
        let (writer, handle) = EventWriter::new(repository.clone(), fast_retry(5));
        handle.enqueue(GameId(1), PendingWrite::Event(event(10)));
        handle.enqueue(GameId(1), PendingWrite::Event(event(20)));
        handle.enqueue(
            GameId(1),
            PendingWrite::PlayerStatus {
                player_id: PlayerId(4),
                game_status: GameStatus::Injured,
            },
        );
        drop(handle);
        writer.run(CancellationToken::new()).await;

        let written = repository.written.lock().unwrap();
        let times: Vec<u32> = written.iter().map(|(_, e)| e.game_time).collect();
        assert_eq!(times, vec![10, 20]);
        assert_eq!(
            *repository.statuses.lock().unwrap(),
            vec![(PlayerId(4), GameStatus::Injured)]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let repository = Arc::new(FlakyRepository {
            failures_left: AtomicU32::new(3),
            ..Default::default()
        });
        let (writer, handle) = EventWriter::new(repository.clone(), fast_retry(3));
        handle.enqueue(GameId(1), PendingWrite::Event(event(10)));
        handle.enqueue(GameId(1), PendingWrite::Event(event(20)));
        drop(handle);
        writer.run(CancellationToken::new()).await;

        let written = repository.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].1.game_time, 20);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let repository = Arc::new(FlakyRepository::default());
        let (writer, handle) = EventWriter::new(repository.clone(), fast_retry(1));
        handle.enqueue(GameId(2), PendingWrite::Event(event(5)));
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        writer.run(shutdown).await;
        assert_eq!(repository.written.lock().unwrap().len(), 1);
    }
}
