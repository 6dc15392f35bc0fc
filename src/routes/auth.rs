// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: signup, verification, login/logout, password reset.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::Result;
use crate::middleware::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::routes::{pages, validate_payload};
use crate::services::identity::{SignUpOutcome, VerifyOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/verify", get(verify))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route(
            "/auth/forgot-password",
            get(forgot_password_page).post(forgot_password_submit),
        )
        .route("/auth/reset", get(reset_password_page))
        .route("/static/js/reset_password.js", get(reset_password_script))
}

/// Simple message response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Signup/login form fields.
#[derive(Deserialize, Validate)]
pub struct CredentialsForm {
    #[validate(length(min = 1, max = 320, message = "email is required"))]
    email: String,
    #[validate(length(min = 1, max = 1024, message = "password is required"))]
    password: String,
}

/// Create an unverified account.
async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<MessageResponse>> {
    validate_payload(&form)?;

    let outcome = state
        .auth_service
        .sign_up(form.email.trim(), &form.password)
        .await?;

    Ok(match outcome {
        SignUpOutcome::VerificationEmailSent => MessageResponse::new(
            "User created. Please check your email to verify your account.",
        ),
        SignUpOutcome::VerificationPending => {
            MessageResponse::new("User created. Please verify your email.")
        }
    })
}

#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(default)]
    email: Option<String>,
}

/// Verify an account (in-memory provider) or explain the email link.
async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<MessageResponse>> {
    let outcome = state
        .auth_service
        .verify_email(params.email.as_deref())
        .await?;

    Ok(match outcome {
        VerifyOutcome::Verified => MessageResponse::new("Email verified."),
        VerifyOutcome::AwaitingEmailLink => MessageResponse::new(
            "Check your email and click the verification link to activate your account.",
        ),
    })
}

/// Build a session cookie: HttpOnly, Secure, SameSite=Lax, whole site.
fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Log in and set session cookies.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    validate_payload(&form)?;

    let session = state
        .auth_service
        .log_in(form.email.trim(), &form.password)
        .await?;

    let mut jar = jar.add(session_cookie(ACCESS_TOKEN_COOKIE, session.access_token));
    if let Some(refresh_token) = session.refresh_token {
        jar = jar.add(session_cookie(REFRESH_TOKEN_COOKIE, refresh_token));
    }

    Ok((jar, MessageResponse::new("Login successful")))
}

/// Clear session cookies.
async fn logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    let jar = jar
        .remove(session_cookie(ACCESS_TOKEN_COOKIE, String::new()))
        .remove(session_cookie(REFRESH_TOKEN_COOKIE, String::new()));

    (StatusCode::NO_CONTENT, jar)
}

#[derive(Deserialize)]
pub struct EmailForm {
    email: String,
}

async fn forgot_password_page() -> Response {
    pages::forgot_password(None, None)
}

/// Request a reset email. The answer never reveals whether the account exists.
async fn forgot_password_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<EmailForm>,
) -> Response {
    let email = form.email.trim();
    if email.is_empty() {
        return pages::forgot_password(None, Some("Please enter your email address."));
    }

    match state.auth_service.send_password_reset(email).await {
        Ok(()) => pages::forgot_password(Some("If that email exists, we sent a reset link."), None),
        Err(_) => {
            pages::forgot_password(None, Some("Could not send reset email. Please try again."))
        }
    }
}

async fn reset_password_page(State(state): State<Arc<AppState>>) -> Response {
    let anon_key = state.config.supabase_anon_key.as_deref();
    pages::reset_password(&state.config.supabase_url, anon_key)
}

async fn reset_password_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        pages::RESET_PASSWORD_JS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let rendered = session_cookie(ACCESS_TOKEN_COOKIE, "tok".to_string()).to_string();

        assert!(rendered.starts_with("sb-access-token=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn test_credentials_validation() {
        let form = CredentialsForm {
            email: String::new(),
            password: "pw".to_string(),
        };
        assert!(form.validate().is_err());

        let form = CredentialsForm {
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(form.validate().is_ok());
    }
}
