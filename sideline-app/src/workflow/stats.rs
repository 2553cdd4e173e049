use std::sync::Arc;

use chrono::Utc;
use sideline_core::{CardKind, GameEvent, PlayerId, TeamSide};

use crate::{
    domain::{AccountId, GameId, access::Permission, live_game::LiveGameService},
    services::access_guard::{AccessGuardService, authorize_live_game},
    workflow::{LiveGameError, mutation_result, publish::PublishGameEventsWorkflow},
};

#[async_trait::async_trait]
pub trait RecordStatsUseCase {
    async fn record_goal(
        &self,
        account_id: AccountId,
        game_id: GameId,
        side: TeamSide,
        scorer: Option<PlayerId>,
        assist: Option<PlayerId>,
    ) -> Result<GameEvent, LiveGameError>;

    async fn record_card(
        &self,
        account_id: AccountId,
        game_id: GameId,
        player_id: PlayerId,
        card: CardKind,
    ) -> Result<GameEvent, LiveGameError>;
}

pub struct RecordStatsUseCaseImpl<
    S: LiveGameService,
    A: AccessGuardService,
    P: PublishGameEventsWorkflow,
> {
    live_game_service: Arc<S>,
    access_guard: Arc<A>,
    publish_workflow: Arc<P>,
}

impl<S: LiveGameService, A: AccessGuardService, P: PublishGameEventsWorkflow>
    RecordStatsUseCaseImpl<S, A, P>
{
    pub fn new(live_game_service: Arc<S>, access_guard: Arc<A>, publish_workflow: Arc<P>) -> Self {
        Self {
            live_game_service,
            access_guard,
            publish_workflow,
        }
    }
}

#[async_trait::async_trait]
impl<S, A, P> RecordStatsUseCase for RecordStatsUseCaseImpl<S, A, P>
where
    S: LiveGameService + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
    P: PublishGameEventsWorkflow + Send + Sync + 'static,
{
    async fn record_goal(
        &self,
        account_id: AccountId,
        game_id: GameId,
        side: TeamSide,
        scorer: Option<PlayerId>,
        assist: Option<PlayerId>,
    ) -> Result<GameEvent, LiveGameError> {
        authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::RecordStats,
        )
        .await?;

        mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| game.record_goal(side, scorer, assist, Utc::now()),
                |event| {
                    self.publish_workflow
                        .publish(game_id, std::slice::from_ref(event))
                },
            ),
        )
    }

    async fn record_card(
        &self,
        account_id: AccountId,
        game_id: GameId,
        player_id: PlayerId,
        card: CardKind,
    ) -> Result<GameEvent, LiveGameError> {
        authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::RecordStats,
        )
        .await?;

        mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| game.record_card(player_id, card, Utc::now()),
                |event| {
                    self.publish_workflow
                        .publish(game_id, std::slice::from_ref(event))
                },
            ),
        )
    }
}
