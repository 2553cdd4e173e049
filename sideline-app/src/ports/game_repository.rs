use sideline_core::{GameSettings, Period, PlayerGameEntry, PlayerId, Score};

use crate::domain::{GameId, RepoRetrieveError, live_game::GameMetadata};

/// A game as stored: enough to rebuild the live aggregate, including one
/// that was interrupted mid-game.
#[derive(Clone, Debug)]
pub struct StoredGame {
    pub metadata: GameMetadata,
    pub settings: GameSettings,
    pub periods: Vec<Period>,
    pub score: Score,
    /// Who kept goal when the game was last stored.
    pub keeper: Option<PlayerId>,
}

#[async_trait::async_trait]
pub trait GameRepository {
    async fn load_game(&self, game_id: GameId) -> Result<StoredGame, RepoRetrieveError>;
    async fn load_roster(&self, game_id: GameId)
    -> Result<Vec<PlayerGameEntry>, RepoRetrieveError>;
}
