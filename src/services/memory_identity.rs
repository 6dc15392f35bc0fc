// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory identity provider for test mode.
//!
//! Accounts and sessions live for the process lifetime. No email is ever
//! sent: accounts are verified by calling `/auth/verify?email=...`.

use crate::models::{ProviderUser, Session};
use crate::services::identity::{IdentityError, IdentityProvider, SignUpOutcome, VerifyOutcome};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;
const USER_ID_LEN: usize = 16;

struct Account {
    id: String,
    email: String,
    salt: [u8; SALT_LEN],
    password_hash: [u8; 32],
    verified: bool,
}

/// In-memory accounts keyed by normalized email.
pub struct MemoryIdentity {
    accounts: DashMap<String, Account>,
    /// Access token → normalized email
    sessions: DashMap<String, String>,
    rng: SystemRandom,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            sessions: DashMap::new(),
            rng: SystemRandom::new(),
        }
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], IdentityError> {
        let mut buf = [0u8; N];
        self.rng
            .fill(&mut buf)
            .map_err(|_| IdentityError::Internal("system RNG failure".to_string()))?;
        Ok(buf)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, IdentityError> {
        let key = normalize(email);
        if key.is_empty() {
            return Err(IdentityError::MissingEmail);
        }

        let salt = self.random_bytes::<SALT_LEN>()?;
        let id = hex::encode(self.random_bytes::<USER_ID_LEN>()?);

        match self.accounts.entry(key.clone()) {
            Entry::Occupied(_) => Err(IdentityError::AlreadyRegistered),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    id,
                    email: key,
                    salt,
                    password_hash: hash_password(&salt, password),
                    verified: false,
                });
                Ok(SignUpOutcome::VerificationPending)
            }
        }
    }

    async fn verify_email(&self, email: Option<&str>) -> Result<VerifyOutcome, IdentityError> {
        let key = email.map(normalize).filter(|e| !e.is_empty());
        let key = key.ok_or(IdentityError::MissingEmail)?;

        let mut account = self
            .accounts
            .get_mut(&key)
            .ok_or(IdentityError::UnknownUser)?;
        account.verified = true;
        Ok(VerifyOutcome::Verified)
    }

    async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let key = normalize(email);
        let verified = {
            let account = self
                .accounts
                .get(&key)
                .ok_or(IdentityError::InvalidCredentials)?;

            let candidate = hash_password(&account.salt, password);
            if !bool::from(candidate[..].ct_eq(&account.password_hash[..])) {
                return Err(IdentityError::InvalidCredentials);
            }
            account.verified
        };

        if !verified {
            return Err(IdentityError::EmailNotConfirmed);
        }

        let token = URL_SAFE_NO_PAD.encode(self.random_bytes::<TOKEN_LEN>()?);
        self.sessions.insert(token.clone(), key);

        Ok(Session {
            access_token: token,
            refresh_token: None,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, IdentityError> {
        let key = self
            .sessions
            .get(access_token)
            .map(|k| k.clone())
            .ok_or(IdentityError::InvalidToken)?;

        let account = self.accounts.get(&key).ok_or(IdentityError::InvalidToken)?;

        Ok(ProviderUser {
            id: account.id.clone(),
            email: account.email.clone(),
            email_confirmed: account.verified,
        })
    }

    async fn send_recovery(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        tracing::debug!(
            known = self.accounts.contains_key(&normalize(email)),
            redirect_to,
            "Test mode: skipping password reset email"
        );
        Ok(())
    }
}
