use std::sync::Arc;

use sideline_core::Game;

use crate::{
    domain::{
        AccountId, GameId, RepoRetrieveError, access::Permission, live_game::LiveGameService,
    },
    ports::{
        game_repository::GameRepository,
        notification::{ListenerMessage, ListenerNotificationPort},
    },
    processes::clock_broadcast_runner::ClockBroadcastRunner,
    services::access_guard::{AccessGuardService, authorize_live_game},
    workflow::{LiveGameError, LiveGameView},
};

#[async_trait::async_trait]
pub trait LiveSessionUseCase {
    async fn open_session(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<LiveGameView, LiveGameError>;
    async fn close_session(&self, account_id: AccountId, game_id: GameId)
    -> Result<(), LiveGameError>;
}

pub struct LiveSessionUseCaseImpl<
    S: LiveGameService,
    G: GameRepository,
    A: AccessGuardService,
    C: ClockBroadcastRunner,
    L: ListenerNotificationPort,
> {
    live_game_service: Arc<S>,
    game_repository: Arc<G>,
    access_guard: Arc<A>,
    clock_broadcast_runner: Arc<C>,
    listener_notification_port: Arc<L>,
}

impl<
    S: LiveGameService,
    G: GameRepository,
    A: AccessGuardService,
    C: ClockBroadcastRunner,
    L: ListenerNotificationPort,
> LiveSessionUseCaseImpl<S, G, A, C, L>
{
    pub fn new(
        live_game_service: Arc<S>,
        game_repository: Arc<G>,
        access_guard: Arc<A>,
        clock_broadcast_runner: Arc<C>,
        listener_notification_port: Arc<L>,
    ) -> Self {
        Self {
            live_game_service,
            game_repository,
            access_guard,
            clock_broadcast_runner,
            listener_notification_port,
        }
    }
}

fn retrieve_error(game_id: GameId, error: RepoRetrieveError) -> LiveGameError {
    match error {
        RepoRetrieveError::NotFound => LiveGameError::GameNotFound(game_id),
        RepoRetrieveError::StorageError(e) => LiveGameError::Storage(e),
    }
}

#[async_trait::async_trait]
impl<S, G, A, C, L> LiveSessionUseCase for LiveSessionUseCaseImpl<S, G, A, C, L>
where
    S: LiveGameService + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
    C: ClockBroadcastRunner + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
{
    async fn open_session(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<LiveGameView, LiveGameError> {
        log::debug!("Account {} is opening game {}", account_id, game_id);
        let stored = self
            .game_repository
            .load_game(game_id)
            .await
            .map_err(|e| retrieve_error(game_id, e))?;
        self.access_guard
            .authorize(account_id, &stored.metadata, Permission::ManageSession)
            .await?;
        if self.live_game_service.is_open(game_id) {
            return Err(LiveGameError::AlreadyOpen(game_id));
        }

        let roster = self
            .game_repository
            .load_roster(game_id)
            .await
            .map_err(|e| retrieve_error(game_id, e))?;
        let game = Game::restore(
            stored.settings,
            stored.periods,
            roster,
            stored.score,
            stored.keeper,
        )?;
        let live_game = self
            .live_game_service
            .open_game(stored.metadata, game)
            .ok_or(LiveGameError::AlreadyOpen(game_id))?;

        C::schedule_clock_broadcast(
            self.clock_broadcast_runner.clone(),
            game_id,
            live_game.session,
        );
        log::info!(
            "Live session for game {} opened at stage {}",
            game_id,
            live_game.game.stage()
        );
        Ok(LiveGameView::from(&live_game, chrono::Utc::now()))
    }

    async fn close_session(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<(), LiveGameError> {
        authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::ManageSession,
        )
        .await?;
        if self.live_game_service.close_game(game_id).is_none() {
            return Err(LiveGameError::GameNotOpen(game_id));
        }
        self.listener_notification_port
            .notify_game_listeners(game_id, ListenerMessage::SessionClosed { game_id });
        log::info!("Live session for game {} closed", game_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::{
        domain::{
            access::ScopedRolePolicy,
            live_game::{LiveGameServiceImpl, SessionId},
        },
        services::access_guard::AccessGuardServiceImpl,
        workflow::test_support::*,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingRunner {
        scheduled: Mutex<Vec<(GameId, SessionId)>>,
    }

    impl ClockBroadcastRunner for RecordingRunner {
        fn schedule_clock_broadcast(this: Arc<Self>, game_id: GameId, session: SessionId) {
            this.scheduled.lock().unwrap().push((game_id, session));
        }
    }

    struct Fixture {
        service: Arc<LiveGameServiceImpl>,
        runner: Arc<RecordingRunner>,
        notifier: MockNotificationPort,
        use_case: LiveSessionUseCaseImpl<
            LiveGameServiceImpl,
            MockGameRepository,
            AccessGuardServiceImpl<MockRoleLookup, ScopedRolePolicy>,
            RecordingRunner,
            MockNotificationPort,
        >,
    }

    fn fixture() -> Fixture {
        let service = Arc::new(LiveGameServiceImpl::new());
        let runner = Arc::new(RecordingRunner::default());
        let notifier = MockNotificationPort::default();
        let use_case = LiveSessionUseCaseImpl::new(
            service.clone(),
            Arc::new(MockGameRepository),
            Arc::new(AccessGuardServiceImpl::new(
                Arc::new(MockRoleLookup),
                Arc::new(ScopedRolePolicy),
            )),
            runner.clone(),
            Arc::new(notifier.clone()),
        );
        Fixture {
            service,
            runner,
            notifier,
            use_case,
        }
    }

    #[tokio::test]
    async fn test_open_and_close_session() {
        let f = fixture();
        let view = f.use_case.open_session(COACH, GAME).await.unwrap();
        assert_eq!(view.players.len(), 5);
        assert!(f.service.is_open(GAME));
        let first = f.service.get_game_by_id(GAME).unwrap().session;
        assert_eq!(*f.runner.scheduled.lock().unwrap(), vec![(GAME, first)]);

        assert_eq!(
            f.use_case.open_session(COACH, GAME).await.unwrap_err(),
            LiveGameError::AlreadyOpen(GAME)
        );

        f.use_case.close_session(COACH, GAME).await.unwrap();
        assert!(!f.service.is_open(GAME));
        assert!(matches!(
            f.notifier.get_messages().last(),
            Some((_, ListenerMessage::SessionClosed { .. }))
        ));
        assert_eq!(
            f.use_case.close_session(COACH, GAME).await,
            Err(LiveGameError::GameNotOpen(GAME))
        );

        f.use_case.open_session(COACH, GAME).await.unwrap();
        let scheduled = f.runner.scheduled.lock().unwrap().clone();
        assert_eq!(scheduled.len(), 2);
        assert_ne!(scheduled[1].1, first);
    }

    #[tokio::test]
    async fn test_open_session_requires_permission() {
        let f = fixture();
        assert_eq!(
            f.use_case.open_session(KEEPER, GAME).await.unwrap_err(),
            LiveGameError::Forbidden(Permission::ManageSession)
        );
        assert!(!f.service.is_open(GAME));
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let f = fixture();
        assert_eq!(
            f.use_case.open_session(COACH, GameId(404)).await.unwrap_err(),
            LiveGameError::GameNotFound(GameId(404))
        );
    }
}
