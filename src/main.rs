// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tripmate API Server
//!
//! Serves account pages, trip groups and AI trip summaries on top of a
//! hosted identity provider and a PostgREST data store.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripmate::{
    config::Config,
    db::{GroupRepository, MemoryDb, PostgrestDb},
    services::{
        AuthService, CompletionClient, GroupService, IdentityProvider, MemoryIdentity,
        OpenAiClient, SummaryService, SupabaseAuth,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        test_mode = config.test_mode,
        "Starting Tripmate API"
    );

    let identity: Arc<dyn IdentityProvider> = if config.test_mode {
        tracing::warn!("TESTING=1: using in-memory identity provider");
        Arc::new(MemoryIdentity::new())
    } else {
        Arc::new(SupabaseAuth::new(&config)?)
    };

    let repo: Arc<dyn GroupRepository> = if config.has_supabase() {
        Arc::new(PostgrestDb::new(&config)?)
    } else {
        tracing::warn!("No Supabase project configured: using in-memory group store");
        Arc::new(MemoryDb::new())
    };

    let completion: Option<Arc<dyn CompletionClient>> = match &config.openai_api_key {
        Some(key) => Some(Arc::new(OpenAiClient::new(key.clone())?)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set: trip summaries are disabled");
            None
        }
    };

    let group_service = GroupService::new(repo);

    // Build shared state
    let state = Arc::new(AppState {
        auth_service: AuthService::new(identity, &config.app_base_url),
        summary_service: SummaryService::new(group_service.clone(), completion),
        group_service,
        config: config.clone(),
    });

    // Build router
    let app = tripmate::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tripmate=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
