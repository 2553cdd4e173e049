use std::sync::Arc;

use chrono::Utc;
use sideline_core::{GameError, GameEvent, GameSeconds, NotFound, PlayerId, SubstitutionId};

use crate::{
    domain::{AccountId, GameId, access::Permission, live_game::LiveGameService},
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    services::access_guard::{AccessGuardService, authorize_live_game},
    workflow::{
        LiveGameError, SubstitutionView, mutation_result, publish::PublishGameEventsWorkflow,
    },
};

#[async_trait::async_trait]
pub trait SubstitutionUseCase {
    async fn initiate(
        &self,
        account_id: AccountId,
        game_id: GameId,
        outgoing: PlayerId,
        incoming: PlayerId,
    ) -> Result<SubstitutionView, LiveGameError>;

    /// Confirms at `game_time`, or at the current game time if none is given.
    async fn confirm(
        &self,
        account_id: AccountId,
        game_id: GameId,
        substitution_id: SubstitutionId,
        game_time: Option<GameSeconds>,
    ) -> Result<GameEvent, LiveGameError>;

    async fn cancel(
        &self,
        account_id: AccountId,
        game_id: GameId,
        substitution_id: SubstitutionId,
    ) -> Result<SubstitutionView, LiveGameError>;
}

pub struct SubstitutionUseCaseImpl<
    S: LiveGameService,
    A: AccessGuardService,
    P: PublishGameEventsWorkflow,
    L: ListenerNotificationPort,
> {
    live_game_service: Arc<S>,
    access_guard: Arc<A>,
    publish_workflow: Arc<P>,
    listener_notification_port: Arc<L>,
}

impl<S, A, P, L> SubstitutionUseCaseImpl<S, A, P, L>
where
    S: LiveGameService,
    A: AccessGuardService,
    P: PublishGameEventsWorkflow,
    L: ListenerNotificationPort,
{
    pub fn new(
        live_game_service: Arc<S>,
        access_guard: Arc<A>,
        publish_workflow: Arc<P>,
        listener_notification_port: Arc<L>,
    ) -> Self {
        Self {
            live_game_service,
            access_guard,
            publish_workflow,
            listener_notification_port,
        }
    }
}

impl<S, A, P, L> SubstitutionUseCaseImpl<S, A, P, L>
where
    S: LiveGameService + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
    P: PublishGameEventsWorkflow,
    L: ListenerNotificationPort,
{
    async fn authorize(&self, account_id: AccountId, game_id: GameId) -> Result<(), LiveGameError> {
        authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::ManageSubstitutions,
        )
        .await
        .map(|_| ())
    }
}

#[async_trait::async_trait]
impl<S, A, P, L> SubstitutionUseCase for SubstitutionUseCaseImpl<S, A, P, L>
where
    S: LiveGameService + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
    P: PublishGameEventsWorkflow + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
{
    async fn initiate(
        &self,
        account_id: AccountId,
        game_id: GameId,
        outgoing: PlayerId,
        incoming: PlayerId,
    ) -> Result<SubstitutionView, LiveGameError> {
        self.authorize(account_id, game_id).await?;
        let substitution = mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| {
                    let id = game.initiate_sub(outgoing, incoming)?;
                    game.pending_substitutions()
                        .find(|s| s.id == id)
                        .map(SubstitutionView::from)
                        .ok_or(GameError::NotFound(NotFound::Substitution(id)))
                },
                |substitution| {
                    self.listener_notification_port.notify_game_listeners(
                        game_id,
                        ListenerMessage::SubstitutionInitiated {
                            game_id,
                            substitution: substitution.clone(),
                        },
                    )
                },
            ),
        )?;

        log::debug!(
            "Game {}: substitution {} initiated, {} for {}",
            game_id,
            substitution.id,
            incoming,
            outgoing
        );
        Ok(substitution)
    }

    async fn confirm(
        &self,
        account_id: AccountId,
        game_id: GameId,
        substitution_id: SubstitutionId,
        game_time: Option<GameSeconds>,
    ) -> Result<GameEvent, LiveGameError> {
        self.authorize(account_id, game_id).await?;
        let event = mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| {
                    let now = Utc::now();
                    let t = game_time.unwrap_or_else(|| game.current_game_time(now));
                    game.confirm_sub(substitution_id, t, now)
                },
                |event| {
                    self.publish_workflow
                        .publish(game_id, std::slice::from_ref(event))
                },
            ),
        )?;
        log::debug!(
            "Game {}: substitution {} confirmed at {}s",
            game_id,
            substitution_id,
            event.game_time
        );
        Ok(event)
    }

    async fn cancel(
        &self,
        account_id: AccountId,
        game_id: GameId,
        substitution_id: SubstitutionId,
    ) -> Result<SubstitutionView, LiveGameError> {
        self.authorize(account_id, game_id).await?;
        let substitution = mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| game.cancel_sub(substitution_id),
                |_| {
                    self.listener_notification_port.notify_game_listeners(
                        game_id,
                        ListenerMessage::SubstitutionCancelled {
                            game_id,
                            substitution_id,
                        },
                    )
                },
            ),
        )?;
        log::debug!("Game {}: substitution {} cancelled", game_id, substitution_id);
        Ok(SubstitutionView::from(&substitution))
    }
}
