use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

mod codec;
pub mod events;
pub mod games;
pub mod roles;

pub use events::SqliteGameEventRepository;
pub use games::SqliteGameRepository;
pub use roles::SqliteRoleRepository;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY,
    club_id INTEGER NOT NULL,
    team_id INTEGER NOT NULL,
    opponent TEXT NOT NULL,
    scheduled_at INTEGER,
    period_count INTEGER NOT NULL,
    period_duration INTEGER NOT NULL,
    clock_direction TEXT NOT NULL DEFAULT 'up',
    overtime_periods INTEGER NOT NULL DEFAULT 0,
    overtime_duration INTEGER NOT NULL DEFAULT 0,
    players_on_field INTEGER NOT NULL,
    max_substitutions INTEGER,
    allow_reentry INTEGER NOT NULL DEFAULT 1,
    score_team INTEGER NOT NULL DEFAULT 0,
    score_opponent INTEGER NOT NULL DEFAULT 0,
    keeper_id INTEGER
);
CREATE TABLE IF NOT EXISTS periods (
    game_id INTEGER NOT NULL,
    number INTEGER NOT NULL,
    started_at INTEGER,
    ended_at INTEGER,
    added_time_ms INTEGER NOT NULL DEFAULT 0,
    stoppage_started_at INTEGER,
    PRIMARY KEY (game_id, number)
);
CREATE TABLE IF NOT EXISTS game_players (
    game_id INTEGER NOT NULL,
    player_id INTEGER NOT NULL,
    jersey_number INTEGER,
    display_name TEXT NOT NULL,
    game_status TEXT NOT NULL,
    ins TEXT NOT NULL DEFAULT '[]',
    outs TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (game_id, player_id)
);
CREATE TABLE IF NOT EXISTS game_events (
    id INTEGER PRIMARY KEY,
    game_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    at INTEGER NOT NULL,
    period INTEGER NOT NULL,
    game_time INTEGER NOT NULL,
    payload TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS role_assignments (
    account_id TEXT NOT NULL,
    role TEXT NOT NULL,
    scope_kind TEXT NOT NULL,
    scope_id INTEGER
);
"#;

/// Timestamps are stored as milliseconds since the epoch.
pub fn create_pool(db_path: &str) -> Pool<Sqlite> {
    let conn_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(false);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(conn_options)
}

pub async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
