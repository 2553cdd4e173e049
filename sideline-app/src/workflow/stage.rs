use std::sync::Arc;

use chrono::Utc;
use sideline_core::{GameStage, StageAction, StageTransition};

use crate::{
    domain::{AccountId, GameId, access::Permission, live_game::LiveGameService},
    services::access_guard::{AccessGuardService, authorize_live_game},
    workflow::{LiveGameError, mutation_result, publish::PublishGameEventsWorkflow},
};

#[async_trait::async_trait]
pub trait ChangeStageUseCase {
    async fn change_stage(
        &self,
        account_id: AccountId,
        game_id: GameId,
        action: StageAction,
    ) -> Result<StageTransition, LiveGameError>;
}

pub struct ChangeStageUseCaseImpl<S: LiveGameService, A: AccessGuardService, P: PublishGameEventsWorkflow>
{
    live_game_service: Arc<S>,
    access_guard: Arc<A>,
    publish_workflow: Arc<P>,
}

impl<S: LiveGameService, A: AccessGuardService, P: PublishGameEventsWorkflow>
    ChangeStageUseCaseImpl<S, A, P>
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
impl<S, A, P> ChangeStageUseCase for ChangeStageUseCaseImpl<S, A, P>
where
    S: LiveGameService + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
    P: PublishGameEventsWorkflow + Send + Sync + 'static,
{
    async fn change_stage(
        &self,
        account_id: AccountId,
        game_id: GameId,
        action: StageAction,
    ) -> Result<StageTransition, LiveGameError> {
        authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::RunClock,
        )
        .await?;

        let transition = mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| game.apply(action, Utc::now()),
                |transition| self.publish_workflow.publish(game_id, &transition.events),
            ),
        )?;
        log::debug!(
            "Game {} moved from {} to {} ({:?})",
            game_id,
            transition.from,
            transition.to,
            action
        );
        if transition.to == GameStage::EndGame {
            log::info!("Game {} is over", game_id);
        }
        Ok(transition)
    }
}
