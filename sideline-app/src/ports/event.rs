use sideline_core::{GameEvent, GameStatus, PlayerId};

use crate::domain::{GameId, RepoError};

/// Write side of game storage. Implementations should apply an event's
/// effect on stored game state together with the event itself.
#[async_trait::async_trait]
pub trait GameEventRepository {
    async fn append_event(&self, game_id: GameId, event: &GameEvent) -> Result<(), RepoError>;
    async fn update_player_status(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        game_status: GameStatus,
    ) -> Result<(), RepoError>;
}
