// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tripmate: trip groups with AI-written summaries
//!
//! This crate provides the backend API for signing users in through a hosted
//! identity provider, organizing them into trip groups, and asking an LLM to
//! summarize a group's plans.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{AuthService, GroupService, SummaryService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub group_service: GroupService,
    pub summary_service: SummaryService,
}
