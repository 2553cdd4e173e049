use std::{sync::Arc, time::Duration};

use log::info;
use sideline_app::{ApplicationConfig, build_application};
use sideline_http_api::{AppState, auth::JwtKeys, broadcast::GameBroadcastService};
use sideline_persistence_sqlite::{
    SqliteGameEventRepository, SqliteGameRepository, SqliteRoleRepository, create_pool,
};

mod logs;

const BROADCAST_CAPACITY: usize = 64;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

fn clock_broadcast_interval() -> Duration {
    let millis = std::env::var("SIDELINE_CLOCK_BROADCAST_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(1000);
    Duration::from_millis(millis)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    logs::init_logger();

    let db_path = std::env::var("SIDELINE_DB").expect("SIDELINE_DB must be set");
    let host = std::env::var("SIDELINE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SIDELINE_HTTP_API_PORT").expect("SIDELINE_HTTP_API_PORT must be set");

    let pool = create_pool(&db_path);
    let game_repo = Arc::new(SqliteGameRepository::new(pool.clone()));
    let event_repo = Arc::new(SqliteGameEventRepository::new(pool.clone()));
    let role_repo = Arc::new(SqliteRoleRepository::new(pool));
    let broadcast = Arc::new(GameBroadcastService::new(BROADCAST_CAPACITY));

    let config = ApplicationConfig {
        clock_broadcast_interval: clock_broadcast_interval(),
        ..ApplicationConfig::default()
    };
    let app = Arc::new(build_application(
        game_repo,
        event_repo,
        role_repo,
        broadcast.clone(),
        config,
    ));
    let shutdown = app.shutdown.clone();

    let state = AppState {
        app: app.clone(),
        broadcast,
        keys: Arc::new(JwtKeys::from_env()),
    };

    info!("Starting application");

    let address = format!("{}:{}", host, port);
    if let Err(e) = sideline_http_api::serve(state, &address, shutdown_signal()).await {
        log::error!("HTTP API failed: {}", e);
    }

    shutdown.cancel();
    match Arc::try_unwrap(app) {
        Ok(app) => {
            if let Err(e) = app.jobs.await {
                log::error!("Background jobs failed: {}", e);
            }
        }
        Err(_) => log::warn!("Live connections still open, not waiting for pending event writes"),
    }
    info!("Shut down");
}
