// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase PostgREST client with typed operations.
//!
//! Provides the operations the group service needs over:
//! - Groups (create, fetch, list by member)
//! - Friend links (resolve link id to friend user id)
//! - Users (public member projection)

use crate::config::Config;
use crate::db::{tables, DbError, GroupRepository};
use crate::models::user::MEMBER_COLUMNS;
use crate::models::{FriendLink, Group, Member, NewGroup};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Media type asking PostgREST for exactly one object (406 otherwise).
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST database client.
#[derive(Clone)]
pub struct PostgrestDb {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl PostgrestDb {
    /// Create a client for the project in `config`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building PostgREST HTTP client")?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.supabase_url),
            api_key: config.supabase_key.clone(),
        })
    }

    fn table(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Run a query expected to match exactly one row.
    async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<T, DbError> {
        let response = self
            .table(reqwest::Method::GET, table)
            .header(ACCEPT, SINGLE_OBJECT)
            .query(query)
            .send()
            .await
            .map_err(|e| DbError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_ACCEPTABLE {
            return Err(DbError::NotSingle);
        }

        check_response_json(response).await
    }

    async fn select_many<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DbError> {
        let response = self
            .table(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(|e| DbError::Transport(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl GroupRepository for PostgrestDb {
    async fn find_group(&self, group_id: &str) -> Result<Option<Group>, DbError> {
        self.select_single(
            tables::GROUPS,
            &[("select", "*".to_string()), ("id", eq_filter(group_id))],
        )
        .await
        .map(Some)
    }

    async fn find_groups_with_member(&self, user_id: &str) -> Result<Vec<Group>, DbError> {
        self.select_many(
            tables::GROUPS,
            &[
                ("select", "*".to_string()),
                ("members", contains_filter(&[user_id])),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_group(&self, group: &NewGroup) -> Result<Option<Group>, DbError> {
        let response = self
            .table(reqwest::Method::POST, tables::GROUPS)
            .header("Prefer", "return=representation")
            .json(group)
            .send()
            .await
            .map_err(|e| DbError::Transport(e.to_string()))?;

        let rows: Vec<Group> = check_response_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_friend_link(&self, link_id: &str) -> Result<Option<FriendLink>, DbError> {
        self.select_single(
            tables::FRIEND_LINKS,
            &[
                ("select", "id,friend_id".to_string()),
                ("id", eq_filter(link_id)),
            ],
        )
        .await
        .map(Some)
    }

    async fn find_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<Member>, DbError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.select_many(
            tables::USERS,
            &[
                ("select", MEMBER_COLUMNS.to_string()),
                ("id", in_filter(user_ids)),
            ],
        )
        .await
    }
}

/// PostgREST error payload.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
}

/// Check response status and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DbError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PostgrestErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);
        return Err(DbError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| DbError::Transport(format!("JSON parse error: {}", e)))
}

// ─── Filter Formatting ───────────────────────────────────────

fn eq_filter(value: &str) -> String {
    format!("eq.{}", value)
}

fn in_filter(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("in.({})", items.join(","))
}

fn contains_filter(values: &[&str]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("cs.{{{}}}", items.join(","))
}

/// Double-quote a value so commas and parentheses inside it stay literal.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters() {
        assert_eq!(eq_filter("17"), "eq.17");
        assert_eq!(
            in_filter(&["u1".to_string(), "u,2".to_string()]),
            r#"in.("u1","u,2")"#
        );
        assert_eq!(contains_filter(&["u1"]), r#"cs.{"u1"}"#);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn test_new_strips_to_rest_url() {
        let mut config = Config::test_default();
        config.supabase_url = "https://project.supabase.co".to_string();
        config.supabase_key = "key".to_string();

        let db = PostgrestDb::new(&config).unwrap();
        assert_eq!(db.rest_url, "https://project.supabase.co/rest/v1");
    }
}
