use std::time::Duration;

use sideline_app::{
    domain::{ClubId, GameId, RepoRetrieveError, TeamId, live_game::GameMetadata},
    ports::game_repository::{GameRepository, StoredGame},
};
use sideline_core::{
    GameSettings, OvertimeSettings, Period, PlayerGameEntry, PlayerId, Score,
};
use sqlx::{Pool, Row, Sqlite};

use crate::codec::{
    clock_direction_from_str, game_status_from_str, marks_from_json, millis_to_datetime,
};

pub struct SqliteGameRepository {
    pool: Pool<Sqlite>,
}

impl SqliteGameRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn load_periods(&self, game_id: GameId) -> Result<Vec<Period>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT number, started_at, ended_at, added_time_ms, stoppage_started_at FROM periods WHERE game_id = ? ORDER BY number",
        )
        .bind(game_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Period {
                    number: row.try_get::<i64, _>("number")? as u32,
                    started_at: millis_to_datetime(row.try_get("started_at")?),
                    ended_at: millis_to_datetime(row.try_get("ended_at")?),
                    added_time: Duration::from_millis(
                        row.try_get::<i64, _>("added_time_ms")?.max(0) as u64,
                    ),
                    stoppage_started_at: millis_to_datetime(row.try_get("stoppage_started_at")?),
                })
            })
            .collect()
    }
}

fn storage_error(e: impl std::fmt::Display) -> RepoRetrieveError {
    RepoRetrieveError::StorageError(e.to_string())
}

#[async_trait::async_trait]
impl GameRepository for SqliteGameRepository {
    async fn load_game(&self, game_id: GameId) -> Result<StoredGame, RepoRetrieveError> {
        let row = sqlx::query("SELECT * FROM games WHERE id = ?")
            .bind(game_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(RepoRetrieveError::NotFound)?;

        let direction: String = row.try_get("clock_direction").map_err(storage_error)?;
        let clock_direction = clock_direction_from_str(&direction)
            .ok_or_else(|| storage_error(format!("unknown clock direction '{}'", direction)))?;
        let overtime_periods: i64 = row.try_get("overtime_periods").map_err(storage_error)?;
        let overtime_duration: i64 = row.try_get("overtime_duration").map_err(storage_error)?;
        let max_substitutions: Option<i64> =
            row.try_get("max_substitutions").map_err(storage_error)?;

        let settings = GameSettings {
            period_count: row
                .try_get::<i64, _>("period_count")
                .map_err(storage_error)? as u32,
            period_duration: row
                .try_get::<i64, _>("period_duration")
                .map_err(storage_error)? as u32,
            clock_direction,
            overtime: (overtime_periods > 0).then(|| OvertimeSettings {
                periods: overtime_periods as u32,
                period_duration: overtime_duration as u32,
            }),
            players_on_field: row
                .try_get::<i64, _>("players_on_field")
                .map_err(storage_error)? as u32,
            max_substitutions: max_substitutions.map(|m| m as u32),
            allow_reentry: row.try_get("allow_reentry").map_err(storage_error)?,
        };

        let metadata = GameMetadata {
            game_id,
            club_id: ClubId(row.try_get("club_id").map_err(storage_error)?),
            team_id: TeamId(row.try_get("team_id").map_err(storage_error)?),
            opponent: row.try_get("opponent").map_err(storage_error)?,
            scheduled_at: millis_to_datetime(row.try_get("scheduled_at").map_err(storage_error)?),
        };
        let score = Score {
            team: row.try_get::<i64, _>("score_team").map_err(storage_error)? as u32,
            opponent: row
                .try_get::<i64, _>("score_opponent")
                .map_err(storage_error)? as u32,
        };
        let keeper: Option<i64> = row.try_get("keeper_id").map_err(storage_error)?;
        let periods = self.load_periods(game_id).await.map_err(storage_error)?;

        Ok(StoredGame {
            metadata,
            settings,
            periods,
            score,
            keeper: keeper.map(PlayerId),
        })
    }

    async fn load_roster(&self, game_id: GameId) -> Result<Vec<PlayerGameEntry>, RepoRetrieveError> {
        let rows = sqlx::query(
            "SELECT player_id, jersey_number, display_name, game_status, ins, outs FROM game_players WHERE game_id = ? ORDER BY player_id",
        )
        .bind(game_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let mut roster = Vec::with_capacity(rows.len());
        for row in rows {
            let player_id = PlayerId(row.try_get("player_id").map_err(storage_error)?);
            let status: String = row.try_get("game_status").map_err(storage_error)?;
            let game_status = game_status_from_str(&status).ok_or_else(|| {
                storage_error(format!("player {} has unknown status '{}'", player_id, status))
            })?;
            let jersey_number: Option<i64> = row.try_get("jersey_number").map_err(storage_error)?;
            let entry = PlayerGameEntry::new(
                player_id,
                jersey_number.map(|n| n as u32),
                row.try_get::<String, _>("display_name")
                    .map_err(storage_error)?,
                game_status,
            );
            let ins = marks_from_json(&row.try_get::<String, _>("ins").map_err(storage_error)?)
                .map_err(storage_error)?;
            let outs = marks_from_json(&row.try_get::<String, _>("outs").map_err(storage_error)?)
                .map_err(storage_error)?;
            roster.push(PlayerGameEntry::restore(entry, ins, outs).map_err(storage_error)?);
        }
        Ok(roster)
    }
}
