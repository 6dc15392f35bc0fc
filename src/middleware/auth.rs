// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

/// Cookie carrying the provider's access token.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Cookie carrying the provider's refresh token (when one was issued).
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Authenticated, email-verified user.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Middleware that requires a valid session for a verified user.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, request.headers())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let auth_user = state.auth_service.resolve_user(&token).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Token from the session cookie, else from an `Authorization: Bearer` header.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
