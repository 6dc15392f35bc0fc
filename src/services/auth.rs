// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/auth gate over an injected identity provider.
//!
//! Every account operation goes through here so that the "email verified"
//! rule is enforced the same way whichever provider is configured.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Session;
use crate::services::identity::{IdentityError, IdentityProvider, SignUpOutcome, VerifyOutcome};
use std::sync::Arc;

/// Auth gate service.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    /// Where password-reset emails send the user
    reset_redirect_url: String,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, app_base_url: &str) -> Self {
        Self {
            identity,
            reset_redirect_url: format!("{}/auth/reset", app_base_url),
        }
    }

    /// Register a new account; it stays unusable until verified.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let outcome = self.identity.sign_up(email, password).await?;
        tracing::info!(outcome = ?outcome, "Account created");
        Ok(outcome)
    }

    pub async fn verify_email(&self, email: Option<&str>) -> Result<VerifyOutcome> {
        Ok(self.identity.verify_email(email).await?)
    }

    /// Log in and confirm the account is verified before handing out a session.
    ///
    /// Two provider calls: the password grant, then a user fetch with the new
    /// token to read the verification state.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.identity.password_grant(email, password).await?;

        let user = self
            .identity
            .get_user(&session.access_token)
            .await
            .map_err(|err| match err {
                IdentityError::InvalidToken => AppError::Unauthorized("Login failed.".to_string()),
                other => other.into(),
            })?;

        if !user.email_confirmed {
            tracing::info!(user_id = %user.id, "Login blocked: email not verified");
            return Err(IdentityError::EmailNotConfirmed.into());
        }

        tracing::info!(user_id = %user.id, "Login successful");
        Ok(session)
    }

    /// Resolve a session token to a verified user.
    pub async fn resolve_user(&self, access_token: &str) -> Result<AuthUser> {
        let user = self.identity.get_user(access_token).await?;

        if !user.email_confirmed {
            return Err(IdentityError::EmailNotConfirmed.into());
        }

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }

    /// Ask the provider to send a reset link.
    ///
    /// Callers must answer the same way whether or not the email exists;
    /// the error only tells them the provider could not be reached.
    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        self.identity
            .send_recovery(email, &self.reset_redirect_url)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "Password reset request failed");
                AppError::Internal(anyhow::anyhow!("password reset failed: {}", err))
            })
    }
}
