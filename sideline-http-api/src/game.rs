use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sideline_app::domain::GameId;
use sideline_core::{PlayerId, SubstitutionId};

use crate::{
    AppState,
    auth::Auth,
    dto::{
        CardRequest, ConfirmSubstitutionRequest, GoalRequest, InitiateSubstitutionRequest,
        JsonClock, JsonGameEvent, JsonLineup, JsonLineupStatus, JsonLiveGame,
        JsonStageTransition, JsonSubstitution, LineupRequest, StageRequest,
    },
    error::ServiceError,
};

pub async fn open_session(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonLiveGame>, ServiceError> {
    let view = app
        .app
        .session_use_case
        .open_session(account, GameId(game_id))
        .await?;
    Ok(Json(JsonLiveGame::from(&view)))
}

pub async fn close_session(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    app.app
        .session_use_case
        .close_session(account, GameId(game_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_game(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonLiveGame>, ServiceError> {
    let view = app
        .app
        .get_live_game_use_case
        .get_game(account, GameId(game_id))
        .await?;
    Ok(Json(JsonLiveGame::from(&view)))
}

pub async fn get_clock(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonClock>, ServiceError> {
    let clock = app
        .app
        .get_live_game_use_case
        .get_clock(account, GameId(game_id))
        .await?;
    Ok(Json(JsonClock::from(&clock)))
}

pub async fn change_stage(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
    Json(request): Json<StageRequest>,
) -> Result<Json<JsonStageTransition>, ServiceError> {
    let transition = app
        .app
        .change_stage_use_case
        .change_stage(account, GameId(game_id), request.action.into())
        .await?;
    Ok(Json(JsonStageTransition::from(&transition)))
}

pub async fn get_lineup(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonLineup>, ServiceError> {
    let lineup = app
        .app
        .get_live_game_use_case
        .get_lineup(account, GameId(game_id))
        .await?;
    Ok(Json(JsonLineup::from(&lineup)))
}

pub async fn set_lineup_status(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path((game_id, player_id)): Path<(i64, i64)>,
    Json(request): Json<LineupRequest>,
) -> Result<Json<JsonLineupStatus>, ServiceError> {
    let status = app
        .app
        .set_lineup_status_use_case
        .set_status(
            account,
            GameId(game_id),
            PlayerId(player_id),
            request.action.into(),
        )
        .await?;
    Ok(Json(JsonLineupStatus {
        player_id,
        game_status: status.into(),
    }))
}

pub async fn initiate_substitution(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
    Json(request): Json<InitiateSubstitutionRequest>,
) -> Result<(StatusCode, Json<JsonSubstitution>), ServiceError> {
    let substitution = app
        .app
        .substitution_use_case
        .initiate(
            account,
            GameId(game_id),
            PlayerId(request.outgoing),
            PlayerId(request.incoming),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(JsonSubstitution::from(&substitution)),
    ))
}

pub async fn confirm_substitution(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path((game_id, substitution_id)): Path<(i64, u32)>,
    Json(request): Json<ConfirmSubstitutionRequest>,
) -> Result<Json<JsonGameEvent>, ServiceError> {
    let event = app
        .app
        .substitution_use_case
        .confirm(
            account,
            GameId(game_id),
            SubstitutionId(substitution_id),
            request.game_time,
        )
        .await?;
    Ok(Json(JsonGameEvent::from(&event)))
}

pub async fn cancel_substitution(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path((game_id, substitution_id)): Path<(i64, u32)>,
) -> Result<Json<JsonSubstitution>, ServiceError> {
    let substitution = app
        .app
        .substitution_use_case
        .cancel(account, GameId(game_id), SubstitutionId(substitution_id))
        .await?;
    Ok(Json(JsonSubstitution::from(&substitution)))
}

pub async fn record_goal(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
    Json(request): Json<GoalRequest>,
) -> Result<(StatusCode, Json<JsonGameEvent>), ServiceError> {
    let event = app
        .app
        .record_stats_use_case
        .record_goal(
            account,
            GameId(game_id),
            request.side.into(),
            request.scorer.map(PlayerId),
            request.assist.map(PlayerId),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(JsonGameEvent::from(&event))))
}

pub async fn record_card(
    Auth(account): Auth,
    State(app): State<AppState>,
    Path(game_id): Path<i64>,
    Json(request): Json<CardRequest>,
) -> Result<(StatusCode, Json<JsonGameEvent>), ServiceError> {
    let event = app
        .app
        .record_stats_use_case
        .record_card(
            account,
            GameId(game_id),
            PlayerId(request.player_id),
            request.card.into(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(JsonGameEvent::from(&event))))
}
