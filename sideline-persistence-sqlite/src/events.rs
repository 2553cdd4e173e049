use sideline_app::{
    domain::{GameId, RepoError},
    ports::event::GameEventRepository,
};
use sideline_core::{
    CardKind, GameEvent, GameEventKind, GameStatus, PlayerId, Score, TeamSide,
};
use sqlx::{Pool, Row, Sqlite, Transaction};

use crate::codec::{game_status_to_str, marks_from_json, marks_to_json};

/// Appends game events and folds them into the stored game state, so a
/// game loaded later resumes with the same periods, score and ledgers.
pub struct SqliteGameEventRepository {
    pool: Pool<Sqlite>,
}

impl SqliteGameEventRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn storage_error(e: impl std::fmt::Display) -> RepoError {
    RepoError::StorageError(e.to_string())
}

fn side_name(side: TeamSide) -> &'static str {
    match side {
        TeamSide::Team => "team",
        TeamSide::Opponent => "opponent",
    }
}

fn card_name(card: CardKind) -> &'static str {
    match card {
        CardKind::Yellow => "yellow",
        CardKind::Red => "red",
    }
}

fn payload(kind: &GameEventKind) -> serde_json::Value {
    match kind {
        GameEventKind::PeriodStarted
        | GameEventKind::PeriodEnded
        | GameEventKind::StoppageStarted => serde_json::json!({}),
        GameEventKind::StoppageEnded { duration } => {
            serde_json::json!({ "duration_ms": duration.as_millis() as u64 })
        }
        GameEventKind::SubstitutionConfirmed {
            substitution,
            outgoing,
            incoming,
            goalkeeper,
        } => serde_json::json!({
            "substitution_id": substitution.0,
            "outgoing": outgoing.0,
            "incoming": incoming.0,
            "goalkeeper": goalkeeper,
        }),
        GameEventKind::Goal {
            side,
            scorer,
            assist,
            score,
        } => serde_json::json!({
            "side": side_name(*side),
            "scorer": scorer.map(|p| p.0),
            "assist": assist.map(|p| p.0),
            "score_team": score.team,
            "score_opponent": score.opponent,
        }),
        GameEventKind::Card { player, card } => serde_json::json!({
            "player_id": player.0,
            "card": card_name(*card),
        }),
        GameEventKind::GameEnded { score } => serde_json::json!({
            "score_team": score.team,
            "score_opponent": score.opponent,
        }),
    }
}

async fn push_mark(
    tx: &mut Transaction<'_, Sqlite>,
    game_id: GameId,
    player_id: PlayerId,
    column: &str,
    t: u32,
) -> Result<(), sqlx::Error> {
    let select = format!(
        "SELECT {} FROM game_players WHERE game_id = ? AND player_id = ?",
        column
    );
    let row = sqlx::query(&select)
        .bind(game_id.0)
        .bind(player_id.0)
        .fetch_one(&mut **tx)
        .await?;
    let mut marks = marks_from_json(&row.try_get::<String, _>(column)?)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    marks.push(t);

    let update = format!(
        "UPDATE game_players SET {} = ? WHERE game_id = ? AND player_id = ?",
        column
    );
    sqlx::query(&update)
        .bind(marks_to_json(&marks))
        .bind(game_id.0)
        .bind(player_id.0)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn store_score(
    tx: &mut Transaction<'_, Sqlite>,
    game_id: GameId,
    score: &Score,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE games SET score_team = ?, score_opponent = ? WHERE id = ?")
        .bind(score.team as i64)
        .bind(score.opponent as i64)
        .bind(game_id.0)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn store_keeper(
    tx: &mut Transaction<'_, Sqlite>,
    game_id: GameId,
    keeper: PlayerId,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE games SET keeper_id = ? WHERE id = ?")
        .bind(keeper.0)
        .bind(game_id.0)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn project(
    tx: &mut Transaction<'_, Sqlite>,
    game_id: GameId,
    event: &GameEvent,
) -> Result<(), sqlx::Error> {
    let at = event.at.timestamp_millis();
    let period = event.period as i64;
    match &event.kind {
        GameEventKind::PeriodStarted => {
            if event.period == 1 {
                // kick-off starts every ledger afresh, with the lineup's keeper in goal
                sqlx::query("UPDATE game_players SET ins = '[]', outs = '[]' WHERE game_id = ?")
                    .bind(game_id.0)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query(
                    "UPDATE games SET keeper_id = (SELECT player_id FROM game_players WHERE game_id = ? AND game_status = ?) WHERE id = ?",
                )
                .bind(game_id.0)
                .bind(game_status_to_str(GameStatus::Goalkeeper))
                .bind(game_id.0)
                .execute(&mut **tx)
                .await?;
            }
            sqlx::query(
                "INSERT OR REPLACE INTO periods (game_id, number, started_at, ended_at, added_time_ms, stoppage_started_at) VALUES (?, ?, ?, NULL, 0, NULL)",
            )
            .bind(game_id.0)
            .bind(period)
            .bind(at)
            .execute(&mut **tx)
            .await?;
        }
        GameEventKind::StoppageStarted => {
            sqlx::query(
                "UPDATE periods SET stoppage_started_at = ? WHERE game_id = ? AND number = ?",
            )
            .bind(at)
            .bind(game_id.0)
            .bind(period)
            .execute(&mut **tx)
            .await?;
        }
        GameEventKind::StoppageEnded { duration } => {
            sqlx::query(
                "UPDATE periods SET stoppage_started_at = NULL, added_time_ms = added_time_ms + ? WHERE game_id = ? AND number = ?",
            )
            .bind(duration.as_millis() as i64)
            .bind(game_id.0)
            .bind(period)
            .execute(&mut **tx)
            .await?;
        }
        GameEventKind::PeriodEnded => {
            sqlx::query("UPDATE periods SET ended_at = ? WHERE game_id = ? AND number = ?")
                .bind(at)
                .bind(game_id.0)
                .bind(period)
                .execute(&mut **tx)
                .await?;
        }
        GameEventKind::SubstitutionConfirmed {
            outgoing,
            incoming,
            goalkeeper,
            ..
        } => {
            push_mark(tx, game_id, *outgoing, "outs", event.game_time).await?;
            push_mark(tx, game_id, *incoming, "ins", event.game_time).await?;
            if *goalkeeper {
                store_keeper(tx, game_id, *incoming).await?;
            }
        }
        GameEventKind::Goal { score, .. } | GameEventKind::GameEnded { score } => {
            store_score(tx, game_id, score).await?;
        }
        GameEventKind::Card { .. } => {}
    }
    Ok(())
}

#[async_trait::async_trait]
impl GameEventRepository for SqliteGameEventRepository {
    async fn append_event(&self, game_id: GameId, event: &GameEvent) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query(
            "INSERT INTO game_events (game_id, kind, at, period, game_time, payload) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(game_id.0)
        .bind(event.kind.name())
        .bind(event.at.timestamp_millis())
        .bind(event.period as i64)
        .bind(event.game_time as i64)
        .bind(payload(&event.kind).to_string())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        project(&mut tx, game_id, event)
            .await
            .map_err(storage_error)?;
        tx.commit().await.map_err(storage_error)?;
        log::debug!("Stored {} for game {}", event.kind.name(), game_id);
        Ok(())
    }

    async fn update_player_status(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        game_status: GameStatus,
    ) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let result = sqlx::query(
            "UPDATE game_players SET game_status = ? WHERE game_id = ? AND player_id = ?",
        )
        .bind(game_status_to_str(game_status))
        .bind(game_id.0)
        .bind(player_id.0)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::StorageError(format!(
                "player {} is not on the roster of game {}",
                player_id, game_id
            )));
        }

        // the goalkeeper marker follows lineup changes made during play
        if game_status == GameStatus::Goalkeeper {
            store_keeper(&mut tx, game_id, player_id)
                .await
                .map_err(storage_error)?;
        } else {
            sqlx::query("UPDATE games SET keeper_id = NULL WHERE id = ? AND keeper_id = ?")
                .bind(game_id.0)
                .bind(player_id.0)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }
        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }
}
