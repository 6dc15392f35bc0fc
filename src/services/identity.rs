// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider abstraction.
//!
//! The auth gate talks to accounts only through [`IdentityProvider`]. Two
//! implementations exist: [`SupabaseAuth`](super::SupabaseAuth) for the
//! hosted provider and [`MemoryIdentity`](super::MemoryIdentity) for test mode.

use crate::error::AppError;
use crate::models::{ProviderUser, Session};
use async_trait::async_trait;
use axum::http::StatusCode;

/// What happened after a successful signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider emailed a verification link.
    VerificationEmailSent,
    /// Account exists but must be verified through `/auth/verify`.
    VerificationPending,
}

/// What happened on a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The account is now verified.
    Verified,
    /// Verification happens through the emailed link; nothing was changed.
    AwaitingEmailLink,
}

/// Identity provider failures.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("email already registered")]
    AlreadyRegistered,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email not confirmed")]
    EmailNotConfirmed,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("unknown user")]
    UnknownUser,

    #[error("email is required")]
    MissingEmail,

    /// The provider refused a request with a status worth surfacing.
    #[error("provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity internal error: {0}")]
    Internal(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::AlreadyRegistered => {
                AppError::Conflict("Email already exists".to_string())
            }
            IdentityError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            IdentityError::EmailNotConfirmed => {
                AppError::BadRequest("Please verify your email first.".to_string())
            }
            IdentityError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            IdentityError::UnknownUser => AppError::NotFound("User not found".to_string()),
            IdentityError::MissingEmail => AppError::BadRequest("Email is required".to_string()),
            IdentityError::Rejected { status, message } => AppError::Provider {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            },
            IdentityError::Unavailable(msg) => {
                AppError::Internal(anyhow::anyhow!("Identity provider unavailable: {}", msg))
            }
            IdentityError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Account operations backed by an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new, unverified account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, IdentityError>;

    /// Handle a verification request. Only the in-memory provider uses `email`.
    async fn verify_email(&self, email: Option<&str>) -> Result<VerifyOutcome, IdentityError>;

    /// Exchange email and password for a session.
    async fn password_grant(&self, email: &str, password: &str)
        -> Result<Session, IdentityError>;

    /// Resolve an access token to the user it belongs to.
    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, IdentityError>;

    /// Ask the provider to email a password-reset link pointing at `redirect_to`.
    async fn send_recovery(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError>;
}
