use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use sideline_app::Application;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{auth::JwtKeys, broadcast::GameBroadcastService};

pub mod auth;
pub mod broadcast;
mod dto;
pub mod error;
mod game;
mod ws;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
    pub broadcast: Arc<GameBroadcastService>,
    pub keys: Arc<JwtKeys>,
}

pub fn router(state: AppState) -> Router {
    let router: Router<AppState> = Router::new().nest(
        "/v1",
        Router::new()
            .route(
                "/games/{id}/session",
                post(game::open_session).delete(game::close_session),
            )
            .route("/games/{id}", get(game::get_game))
            .route("/games/{id}/clock", get(game::get_clock))
            .route("/games/{id}/stage", post(game::change_stage))
            .route("/games/{id}/lineup", get(game::get_lineup))
            .route(
                "/games/{id}/lineup/{player_id}",
                put(game::set_lineup_status),
            )
            .route(
                "/games/{id}/substitutions",
                post(game::initiate_substitution),
            )
            .route(
                "/games/{id}/substitutions/{sub}/confirm",
                post(game::confirm_substitution),
            )
            .route(
                "/games/{id}/substitutions/{sub}",
                delete(game::cancel_substitution),
            )
            .route("/games/{id}/goals", post(game::record_goal))
            .route("/games/{id}/cards", post(game::record_card))
            .route("/games/{id}/live", get(ws::live_handler)),
    );
    router.layer(CatchPanicLayer::new()).with_state(state)
}

pub async fn serve(
    state: AppState,
    address: &str,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    log::info!("HTTP API listening on {}", address);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;
    log::info!("HTTP API shut down gracefully");
    Ok(())
}
