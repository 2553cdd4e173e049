use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use sideline_app::domain::AccountId;
use uuid::Uuid;

use crate::{AppState, error::ServiceError};

/// Tokens are issued elsewhere; `sub` carries the account id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub struct JwtKeys {
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn from_env() -> Self {
        if let Ok(secret) = std::env::var("SIDELINE_JWT_SECRET") {
            Self::new(secret.as_bytes())
        } else {
            log::warn!("SIDELINE_JWT_SECRET not set, no externally issued token will verify");
            Self::new(Uuid::new_v4().as_bytes())
        }
    }

    pub fn verify(&self, token: &str) -> Option<AccountId> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        let uuid = Uuid::parse_str(&data.claims.sub).ok()?;
        Some(AccountId(uuid))
    }
}

pub struct Auth(pub AccountId);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ServiceError::Unauthorized("Missing bearer token".to_string()))?;
        let account_id = state
            .keys
            .verify(bearer.token())
            .ok_or_else(|| ServiceError::Unauthorized("Invalid token".to_string()))?;
        Ok(Auth(account_id))
    }
}
