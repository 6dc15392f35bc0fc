// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase GoTrue client for account operations.
//!
//! Handles:
//! - Signup (provider sends the verification email)
//! - Password grant login
//! - Access token → user resolution
//! - Password recovery emails

use crate::config::Config;
use crate::models::{ProviderUser, Session};
use crate::services::identity::{IdentityError, IdentityProvider, SignUpOutcome, VerifyOutcome};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// GoTrue API client.
#[derive(Clone)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    auth_url: String,
    api_key: String,
}

impl SupabaseAuth {
    /// Create a client for the project in `config`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building GoTrue HTTP client")?;

        Ok(Self {
            http,
            auth_url: format!("{}/auth/v1", config.supabase_url),
            api_key: config.supabase_key.clone(),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.auth_url, path))
            .header("apikey", &self.api_key)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, IdentityError> {
        let response = self
            .post("/signup")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let error = GoTrueError::parse(&body);
            if error.is_already_registered() {
                return Err(IdentityError::AlreadyRegistered);
            }
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: format!("Signup failed. {}", error.message().unwrap_or(&body)),
            });
        }

        // With email confirmation on, GoTrue answers a repeat signup with a
        // user object that has no identities instead of an error.
        let created: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let identities = created
            .get("user")
            .unwrap_or(&created)
            .get("identities")
            .and_then(Value::as_array);
        if identities.is_some_and(|ids| ids.is_empty()) {
            return Err(IdentityError::AlreadyRegistered);
        }

        tracing::info!("Signup accepted, verification email sent");
        Ok(SignUpOutcome::VerificationEmailSent)
    }

    async fn verify_email(&self, _email: Option<&str>) -> Result<VerifyOutcome, IdentityError> {
        Ok(VerifyOutcome::AwaitingEmailLink)
    }

    async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response = self
            .post("/token")
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            if GoTrueError::parse(&body).is_email_not_confirmed() {
                return Err(IdentityError::EmailNotConfirmed);
            }
            return Err(IdentityError::InvalidCredentials);
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("JSON parse error: {}", e)))?;

        let access_token = tokens
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::InvalidCredentials)?;

        Ok(Session {
            access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, IdentityError> {
        let response = self
            .http
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::InvalidToken);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| IdentityError::InvalidToken)?;

        parse_user(&body).ok_or(IdentityError::InvalidToken)
    }

    async fn send_recovery(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        let response = self
            .post("/recover")
            .json(&serde_json::json!({ "email": email, "redirect_to": redirect_to }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }
}

/// Token grant response from GoTrue.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// GoTrue error payload. Field names vary across GoTrue versions.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl GoTrueError {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
    }

    fn is_already_registered(&self) -> bool {
        self.error_code.as_deref() == Some("user_already_exists")
            || self
                .message()
                .is_some_and(|m| m.to_lowercase().contains("already registered"))
    }

    fn is_email_not_confirmed(&self) -> bool {
        self.error_code.as_deref() == Some("email_not_confirmed")
            || self
                .message()
                .is_some_and(|m| m.to_lowercase().contains("email not confirmed"))
    }
}

/// Extract the user from a `/user` response, which may or may not wrap it in `user`.
fn parse_user(body: &Value) -> Option<ProviderUser> {
    let user = body.get("user").filter(|u| u.is_object()).unwrap_or(body);

    let id = user.get("id")?.as_str()?.to_string();
    let email = user
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let is_set = |field: &str| {
        user.get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.is_empty())
    };

    Some(ProviderUser {
        id,
        email,
        email_confirmed: is_set("email_confirmed_at") || is_set("confirmed_at"),
    })
}
