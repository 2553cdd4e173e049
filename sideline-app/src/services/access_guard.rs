use std::sync::Arc;

use crate::{
    domain::{
        AccountId, GameId,
        access::{Permission, PermissionPolicy},
        live_game::{GameMetadata, LiveGame, LiveGameService},
    },
    ports::authorization::RoleLookupPort,
    workflow::LiveGameError,
};

#[async_trait::async_trait]
pub trait AccessGuardService {
    async fn authorize(
        &self,
        account_id: AccountId,
        game: &GameMetadata,
        permission: Permission,
    ) -> Result<(), LiveGameError>;
}

pub struct AccessGuardServiceImpl<R: RoleLookupPort, P: PermissionPolicy> {
    role_lookup: Arc<R>,
    policy: Arc<P>,
}

impl<R: RoleLookupPort, P: PermissionPolicy> AccessGuardServiceImpl<R, P> {
    pub fn new(role_lookup: Arc<R>, policy: Arc<P>) -> Self {
        Self {
            role_lookup,
            policy,
        }
    }
}

#[async_trait::async_trait]
impl<R, P> AccessGuardService for AccessGuardServiceImpl<R, P>
where
    R: RoleLookupPort + Send + Sync + 'static,
    P: PermissionPolicy + Send + Sync + 'static,
{
    async fn authorize(
        &self,
        account_id: AccountId,
        game: &GameMetadata,
        permission: Permission,
    ) -> Result<(), LiveGameError> {
        let assignments = self
            .role_lookup
            .get_role_assignments(account_id)
            .await
            .map_err(|e| LiveGameError::Storage(e.to_string()))?;
        if self.policy.has_permission(&assignments, game, permission) {
            Ok(())
        } else {
            log::debug!(
                "Account {} denied permission to {} in game {}",
                account_id,
                permission,
                game.game_id
            );
            Err(LiveGameError::Forbidden(permission))
        }
    }
}

/// Looks up an open game and checks `permission` against its metadata,
/// returning the snapshot the check was made on.
pub async fn authorize_live_game<S, A>(
    live_game_service: &S,
    access_guard: &A,
    account_id: AccountId,
    game_id: GameId,
    permission: Permission,
) -> Result<LiveGame, LiveGameError>
where
    S: LiveGameService,
    A: AccessGuardService + ?Sized,
{
    let live_game = live_game_service
        .get_game_by_id(game_id)
        .ok_or(LiveGameError::GameNotOpen(game_id))?;
    access_guard
        .authorize(account_id, &live_game.metadata, permission)
        .await?;
    Ok(live_game)
}
