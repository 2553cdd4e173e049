use std::sync::Arc;

use chrono::Utc;

use crate::{
    domain::{AccountId, GameId, access::Permission, live_game::LiveGameService},
    services::access_guard::{AccessGuardService, authorize_live_game},
    workflow::{ClockView, LineupView, LiveGameError, LiveGameView},
};

#[async_trait::async_trait]
pub trait GetLiveGameUseCase {
    async fn get_game(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<LiveGameView, LiveGameError>;
    async fn get_clock(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<ClockView, LiveGameError>;
    async fn get_lineup(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<LineupView, LiveGameError>;
}

pub struct GetLiveGameUseCaseImpl<S: LiveGameService, A: AccessGuardService> {
    live_game_service: Arc<S>,
    access_guard: Arc<A>,
}

impl<S: LiveGameService, A: AccessGuardService> GetLiveGameUseCaseImpl<S, A> {
    pub fn new(live_game_service: Arc<S>, access_guard: Arc<A>) -> Self {
        Self {
            live_game_service,
            access_guard,
        }
    }
}

#[async_trait::async_trait]
impl<S, A> GetLiveGameUseCase for GetLiveGameUseCaseImpl<S, A>
where
    S: LiveGameService + Send + Sync + 'static,
    A: AccessGuardService + Send + Sync + 'static,
{
    async fn get_game(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<LiveGameView, LiveGameError> {
        let live_game = authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::ViewGame,
        )
        .await?;
        Ok(LiveGameView::from(&live_game, Utc::now()))
    }

    async fn get_clock(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<ClockView, LiveGameError> {
        let live_game = authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::ViewGame,
        )
        .await?;
        Ok(ClockView::from_game(&live_game.game, Utc::now()))
    }

    async fn get_lineup(
        &self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<LineupView, LiveGameError> {
        let live_game = authorize_live_game(
            self.live_game_service.as_ref(),
            self.access_guard.as_ref(),
            account_id,
            game_id,
            Permission::ViewGame,
        )
        .await?;
        Ok(LineupView::from(&live_game.game, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use sideline_core::GameStage;

    use crate::workflow::test_support::*;

    use super::*;

    #[tokio::test]
    async fn test_fan_can_view() {
        let use_case = GetLiveGameUseCaseImpl::new(live_game_service(), access_guard());

        let view = use_case.get_game(FAN, GAME).await.unwrap();
        assert_eq!(view.metadata.opponent, "Rovers");
        assert_eq!(view.clock.stage, GameStage::BeforeStart);
        assert_eq!(view.clock.game_time, 0);

        let lineup = use_case.get_lineup(FAN, GAME).await.unwrap();
        assert!(lineup.can_confirm);
        assert_eq!(lineup.counts.starters, 2);
        assert_eq!(lineup.counts.goalkeepers, 1);
    }

    #[tokio::test]
    async fn test_unassigned_account_is_forbidden() {
        let use_case = GetLiveGameUseCaseImpl::new(live_game_service(), access_guard());
        let stranger = AccountId(uuid::Uuid::new_v4());
        assert_eq!(
            use_case.get_clock(stranger, GAME).await.unwrap_err(),
            LiveGameError::Forbidden(Permission::ViewGame)
        );
        assert_eq!(
            use_case.get_clock(FAN, GameId(99)).await.unwrap_err(),
            LiveGameError::GameNotOpen(GameId(99))
        );
    }
}
