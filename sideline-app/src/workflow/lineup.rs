use std::sync::Arc;

use sideline_core::{GameStatus, LineupAction, PlayerId};

use crate::{
    domain::{AccountId, GameId, access::Permission, live_game::LiveGameService},
    ports::notification::ListenerMessage,
    processes::event_writer::PendingWrite,
    services::access_guard::{AccessGuardService, authorize_live_game},
    workflow::{LiveGameError, mutation_result, publish::PublishGameEventsWorkflow},
};

#[async_trait::async_trait]
pub trait SetLineupStatusUseCase {
    async fn set_status(
        &self,
        account_id: AccountId,
        game_id: GameId,
        player_id: PlayerId,
        action: LineupAction,
    ) -> Result<GameStatus, LiveGameError>;
}

pub struct SetLineupStatusUseCaseImpl<
    S: LiveGameService,
    A: AccessGuardService,
    P: PublishGameEventsWorkflow,
> {
    live_game_service: Arc<S>,
    access_guard: Arc<A>,
    publish_workflow: Arc<P>,
}

impl<S: LiveGameService, A: AccessGuardService, P: PublishGameEventsWorkflow>
    SetLineupStatusUseCaseImpl<S, A, P>
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
impl<S, A, P> SetLineupStatusUseCase for SetLineupStatusUseCaseImpl<S, A, P>
where
    S: LiveGameService + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
    P: PublishGameEventsWorkflow + Send + Sync + 'static,
{
    async fn set_status(
        &self,
        account_id: AccountId,
        game_id: GameId,
        player_id: PlayerId,
        action: LineupAction,
    ) -> Result<GameStatus, LiveGameError> {
        authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::ManageLineup,
        )
        .await?;
        log::debug!(
            "Account {} sets {:?} for player {} in game {}",
            account_id,
            action,
            player_id,
            game_id
        );

        // a goalkeeper promotion can demote another player
        let (status, _) = mutation_result(
            game_id,
            self.live_game_service.mutate_game_then(
                game_id,
                |game| {
                    let before: Vec<_> = game
                        .roster()
                        .iter()
                        .map(|e| (e.player_id, e.game_status))
                        .collect();
                    let status = game.set_status(player_id, action)?;
                    let changed: Vec<_> = game
                        .roster()
                        .iter()
                        .zip(before)
                        .filter(|(entry, (_, previous))| entry.game_status != *previous)
                        .map(|(entry, _)| (entry.player_id, entry.game_status))
                        .collect();
                    Ok((status, changed))
                },
                |(_, changed)| {
                    for &(changed_player, game_status) in changed {
                        self.publish_workflow.publish_write(
                            game_id,
                            PendingWrite::PlayerStatus {
                                player_id: changed_player,
                                game_status,
                            },
                            ListenerMessage::LineupChanged {
                                game_id,
                                player_id: changed_player,
                                game_status,
                            },
                        );
                    }
                },
            ),
        )?;
        Ok(status)
    }
}
