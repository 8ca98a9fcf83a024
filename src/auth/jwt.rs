use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub exp: i64,
}

/// Create a session token valid for `ttl_hours` from `now`
pub fn create_session_token(
    user_id: Uuid,
    username: &str,
    secret: &str,
    ttl_hours: i64,
    now: DateTime<Utc>,
) -> Result<String> {
    let expiration = now
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or(AppError::InternalError)?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::InternalError)
}

/// Verify session token and extract claims. Expiry is checked against the
/// application clock rather than the OS clock.
pub fn verify_session_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = false;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthenticated("Invalid session".to_string()))?;

    if claims.exp <= now.timestamp() {
        return Err(AppError::Unauthenticated("Session expired".to_string()));
    }

    Ok(claims)
}
