// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public group routes: lookups by id and AI summaries.

use crate::error::Result;
use crate::models::{Group, Member};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/groups/user/{user_id}", get(groups_for_user))
        .route("/api/groups/{group_id}", get(get_group))
        .route("/api/groups/{group_id}/members", get(group_members))
        .route(
            "/api/groups/{group_id}/generate-summary",
            post(generate_summary),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupListResponse {
    pub ok: bool,
    pub groups: Vec<Group>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MemberListResponse {
    pub ok: bool,
    pub members: Vec<Member>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SummaryResponse {
    pub summary: String,
}

async fn groups_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<GroupListResponse>> {
    let groups = state.group_service.list_groups_for(&user_id).await?;
    Ok(Json(GroupListResponse { ok: true, groups }))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>> {
    Ok(Json(state.group_service.get_group(&group_id).await?))
}

async fn group_members(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<MemberListResponse>> {
    let members = state.group_service.list_group_members(&group_id).await?;
    Ok(Json(MemberListResponse { ok: true, members }))
}

/// Ask the completion API for a short summary of the group's description.
async fn generate_summary(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<SummaryResponse>> {
    let summary = state.summary_service.generate_summary(&group_id).await?;
    Ok(Json(SummaryResponse { summary }))
}
