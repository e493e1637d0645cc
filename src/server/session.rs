use super::error::ApiError;
use super::state::ServerState;
use crate::user::UserRole;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::convert::Infallible;
use tracing::debug;

/// The identity a verified token resolves to. This is trusted as-is for the
/// rest of the request; the user store is not consulted again.
#[derive(Debug)]
pub struct Session {
    pub user_id: i64,
    pub role: UserRole,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

fn extract_token_from_headers(parts: &mut Parts) -> Option<String> {
    // The header value is the raw signed token, no Bearer prefix.
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

async fn extract_token_from_cookies(parts: &mut Parts, ctx: &ServerState) -> Option<String> {
    CookieJar::from_request_parts(parts, ctx)
        .await
        .ok()?
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .map(|s| s.to_string())
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Session, ApiError> {
    let token = match extract_token_from_headers(parts) {
        Some(token) => token,
        None => match extract_token_from_cookies(parts, ctx).await {
            Some(token) => token,
            None => {
                debug!("No token in headers nor cookies");
                return Err(ApiError::Unauthenticated);
            }
        },
    };

    let claims = ctx.token_service.verify(&token).map_err(|err| {
        debug!("Token verification failed: {}", err);
        ApiError::InvalidToken
    })?;

    Ok(Session {
        user_id: claims.user_id,
        role: claims.role,
        token,
    })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx).await.ok())
    }
}
