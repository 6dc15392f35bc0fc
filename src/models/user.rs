//! User models: provider identities and the public member projection.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
    /// Whether the email address has been confirmed
    pub email_confirmed: bool,
}

/// Access and refresh tokens issued by the identity provider on login.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    /// Not every provider issues one (the in-memory provider does not)
    pub refresh_token: Option<String>,
}

/// Public member fields read from the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Member {
    #[serde(deserialize_with = "crate::models::group::deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Columns selected for [`Member`].
pub const MEMBER_COLUMNS: &str = "id,name,full_name,username,email";
