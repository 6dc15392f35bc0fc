// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Group;
use crate::routes::validate_payload;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require an authenticated session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/groups", get(list_my_groups).post(create_group))
}

/// Current user.
async fn get_me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

// ─── Groups ──────────────────────────────────────────────────

/// Body of `POST /api/groups`. `member_ids` are friend link row ids.
#[derive(Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateGroupRequest {
    #[validate(length(max = 120, message = "name is too long"))]
    pub name: String,
    #[validate(length(max = 2000, message = "description is too long"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "too many members"))]
    pub member_ids: Vec<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateGroupResponse {
    pub ok: bool,
    pub group: Group,
}

/// Create a group with the caller as a member.
async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<Json<CreateGroupResponse>> {
    validate_payload(&body)?;

    let group = state
        .group_service
        .create_group(&body.name, body.description, &body.member_ids, &user)
        .await?;

    Ok(Json(CreateGroupResponse { ok: true, group }))
}

/// Groups the caller belongs to, newest first.
async fn list_my_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Group>>> {
    let groups = state.group_service.list_groups_for(&user.id).await?;
    Ok(Json(groups))
}
