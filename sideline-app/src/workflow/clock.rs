use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        GameId,
        live_game::{LiveGameService, SessionId},
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::ClockView,
};

pub enum ObserveOutcome {
    Continue(Duration),
    Finished,
}

#[async_trait::async_trait]
pub trait ObserveClockUseCase {
    /// Broadcasts the clock of `session`. Finishes once the game is over or
    /// that session is no longer the open one.
    async fn tick(&self, game_id: GameId, session: SessionId, now: DateTime<Utc>)
    -> ObserveOutcome;
}

pub struct ObserveClockUseCaseImpl<S: LiveGameService, L: ListenerNotificationPort> {
    live_game_service: Arc<S>,
    listener_notification_port: Arc<L>,
    interval: Duration,
}

impl<S: LiveGameService, L: ListenerNotificationPort> ObserveClockUseCaseImpl<S, L> {
    pub fn new(
        live_game_service: Arc<S>,
        listener_notification_port: Arc<L>,
        interval: Duration,
    ) -> Self {
        Self {
            live_game_service,
            listener_notification_port,
            interval,
        }
    }
}

#[async_trait::async_trait]
impl<S, L> ObserveClockUseCase for ObserveClockUseCaseImpl<S, L>
where
    S: LiveGameService + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
{
    async fn tick(
        &self,
        game_id: GameId,
        session: SessionId,
        now: DateTime<Utc>,
    ) -> ObserveOutcome {
        let Some(live_game) = self
            .live_game_service
            .get_game_by_id(game_id)
            .filter(|live_game| live_game.session == session)
        else {
            log::debug!(
                "Session {:?} of game {} ended, stopping clock broadcast",
                session,
                game_id
            );
            return ObserveOutcome::Finished;
        };
        let clock = ClockView::from_game(&live_game.game, now);
        self.listener_notification_port
            .notify_game_listeners(game_id, ListenerMessage::ClockUpdate { game_id, clock });

        if live_game.game.is_over() {
            log::debug!("Game {} is over, stopping clock broadcast", game_id);
            ObserveOutcome::Finished
        } else {
            ObserveOutcome::Continue(self.interval)
        }
    }
}
