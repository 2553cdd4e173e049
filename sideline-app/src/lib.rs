use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{access::ScopedRolePolicy, live_game::LiveGameServiceImpl},
    ports::{
        authorization::RoleLookupPort, event::GameEventRepository,
        game_repository::GameRepository, notification::ListenerNotificationPort,
    },
    processes::{
        clock_broadcast_runner::ClockBroadcastRunnerImpl,
        event_writer::{EventWriter, RetryPolicy},
    },
    services::access_guard::AccessGuardServiceImpl,
    workflow::{
        clock::ObserveClockUseCaseImpl,
        lineup::{SetLineupStatusUseCase, SetLineupStatusUseCaseImpl},
        publish::PublishGameEventsWorkflowImpl,
        session::{LiveSessionUseCase, LiveSessionUseCaseImpl},
        stage::{ChangeStageUseCase, ChangeStageUseCaseImpl},
        stats::{RecordStatsUseCase, RecordStatsUseCaseImpl},
        substitution::{SubstitutionUseCase, SubstitutionUseCaseImpl},
        view::{GetLiveGameUseCase, GetLiveGameUseCaseImpl},
    },
};

pub mod domain;
pub mod ports;
pub mod processes;
pub mod services;
pub mod workflow;

#[derive(Clone, Debug)]
pub struct ApplicationConfig {
    pub clock_broadcast_interval: Duration,
    pub event_retry: RetryPolicy,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            clock_broadcast_interval: Duration::from_secs(1),
            event_retry: RetryPolicy::default(),
        }
    }
}

pub struct Application {
    pub jobs: JoinHandle<()>,
    /// Cancelling stops clock broadcasts and lets the event writer drain.
    pub shutdown: CancellationToken,

    pub session_use_case: Box<dyn LiveSessionUseCase + Send + Sync + 'static>,
    pub get_live_game_use_case: Box<dyn GetLiveGameUseCase + Send + Sync + 'static>,
    pub set_lineup_status_use_case: Box<dyn SetLineupStatusUseCase + Send + Sync + 'static>,
    pub change_stage_use_case: Box<dyn ChangeStageUseCase + Send + Sync + 'static>,
    pub substitution_use_case: Box<dyn SubstitutionUseCase + Send + Sync + 'static>,
    pub record_stats_use_case: Box<dyn RecordStatsUseCase + Send + Sync + 'static>,
}

pub fn build_application<
    G: GameRepository + Send + Sync + 'static,
    ER: GameEventRepository + Send + Sync + 'static,
    RL: RoleLookupPort + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
>(
    game_repository: Arc<G>,
    event_repository: Arc<ER>,
    role_lookup: Arc<RL>,
    listener_notification_port: Arc<L>,
    config: ApplicationConfig,
) -> Application {
    let shutdown = CancellationToken::new();

    let live_game_service = Arc::new(LiveGameServiceImpl::new());
    let access_guard = Arc::new(AccessGuardServiceImpl::new(
        role_lookup.clone(),
        Arc::new(ScopedRolePolicy),
    ));

    let (event_writer, event_queue) = EventWriter::new(event_repository, config.event_retry);
    let publish_workflow = Arc::new(PublishGameEventsWorkflowImpl::new(
        Arc::new(event_queue),
        listener_notification_port.clone(),
    ));

    let observe_clock_use_case = Arc::new(ObserveClockUseCaseImpl::new(
        live_game_service.clone(),
        listener_notification_port.clone(),
        config.clock_broadcast_interval,
    ));
    let clock_broadcast_runner = Arc::new(ClockBroadcastRunnerImpl::new(
        observe_clock_use_case,
        shutdown.clone(),
    ));

    let writer_shutdown = shutdown.clone();
    let jobs = tokio::spawn(async move {
        event_writer.run(writer_shutdown).await;
    });

    Application {
        jobs,
        shutdown,
        session_use_case: Box::new(LiveSessionUseCaseImpl::new(
            live_game_service.clone(),
            game_repository.clone(),
            access_guard.clone(),
            clock_broadcast_runner.clone(),
            listener_notification_port.clone(),
        )),
        get_live_game_use_case: Box::new(GetLiveGameUseCaseImpl::new(
            live_game_service.clone(),
            access_guard.clone(),
        )),
        set_lineup_status_use_case: Box::new(SetLineupStatusUseCaseImpl::new(
            live_game_service.clone(),
            access_guard.clone(),
            publish_workflow.clone(),
        )),
        change_stage_use_case: Box::new(ChangeStageUseCaseImpl::new(
            live_game_service.clone(),
            access_guard.clone(),
            publish_workflow.clone(),
        )),
        substitution_use_case: Box::new(SubstitutionUseCaseImpl::new(
            live_game_service.clone(),
            access_guard.clone(),
            publish_workflow.clone(),
            listener_notification_port.clone(),
        )),
        record_stats_use_case: Box::new(RecordStatsUseCaseImpl::new(
            live_game_service,
            access_guard,
            publish_workflow,
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sideline_core::{GameEvent, GameEventKind, GameStatus, PlayerId, StageAction};

    use crate::{
        domain::{GameId, RepoError},
        workflow::test_support::*,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct MemoryEventRepository {
        events: Arc<Mutex<Vec<(GameId, GameEvent)>>>,
    }

    #[async_trait::async_trait]
    impl GameEventRepository for MemoryEventRepository {
        async fn append_event(&self, game_id: GameId, event: &GameEvent) -> Result<(), RepoError> {
            self.events.lock().unwrap().push((game_id, event.clone()));
            Ok(())
        }

        async fn update_player_status(
            &self,
            _game_id: GameId,
            _player_id: PlayerId,
            _game_status: GameStatus,
        ) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_session_to_persisted_event() {
        let events = MemoryEventRepository::default();
        let application = build_application(
            Arc::new(MockGameRepository),
            Arc::new(events.clone()),
            Arc::new(MockRoleLookup),
            Arc::new(MockNotificationPort::default()),
            ApplicationConfig::default(),
        );

        application
            .session_use_case
            .open_session(COACH, GAME)
            .await
            .unwrap();
        application
            .change_stage_use_case
            .change_stage(COACH, GAME, StageAction::StartGame)
            .await
            .unwrap();

        application.shutdown.cancel();
        application.jobs.await.unwrap();

        let persisted = events.events.lock().unwrap().clone();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].0, GAME);
        assert_eq!(persisted[0].1.kind, GameEventKind::PeriodStarted);
    }
}
