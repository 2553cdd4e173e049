use axum::{http::StatusCode, response::IntoResponse};
use sideline_app::workflow::LiveGameError;
use sideline_core::GameError;

#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    Unauthorized(String),
    BadRequest(String),
    NotPossible(String),
    Conflict(String),
    Internal(String),
    Forbidden(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotPossible(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ServiceError::NotPossible(msg) => write!(f, "Not possible: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::http::Response<axum::body::Body> {
        let status = self.status_code();
        let msg = match self {
            ServiceError::NotFound(msg)
            | ServiceError::Unauthorized(msg)
            | ServiceError::BadRequest(msg)
            | ServiceError::NotPossible(msg)
            | ServiceError::Conflict(msg)
            | ServiceError::Internal(msg)
            | ServiceError::Forbidden(msg) => msg,
        };
        let body = serde_json::json!({ "error": msg });
        (status, axum::Json(body)).into_response()
    }
}

impl From<LiveGameError> for ServiceError {
    fn from(error: LiveGameError) -> Self {
        let msg = error.to_string();
        match error {
            LiveGameError::GameNotFound(_) | LiveGameError::GameNotOpen(_) => {
                ServiceError::NotFound(msg)
            }
            LiveGameError::AlreadyOpen(_) => ServiceError::Conflict(msg),
            LiveGameError::Forbidden(_) => ServiceError::Forbidden(msg),
            LiveGameError::Game(GameError::InvalidStateTransition { .. }) => {
                ServiceError::Conflict(msg)
            }
            LiveGameError::Game(GameError::NotFound(_)) => ServiceError::NotFound(msg),
            LiveGameError::Game(GameError::InvalidLedgerAppend { .. }) => {
                ServiceError::BadRequest(msg)
            }
            LiveGameError::Game(GameError::ConstraintViolation(_)) => {
                ServiceError::NotPossible(msg)
            }
            LiveGameError::Storage(e) => {
                log::error!("Storage failure: {}", e);
                ServiceError::Internal("Storage unavailable".to_string())
            }
        }
    }
}
