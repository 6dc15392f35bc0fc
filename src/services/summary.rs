// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI trip summaries built from a group's description.

use crate::error::{AppError, Result};
use crate::services::completion::{CompletionClient, CompletionRequest};
use crate::services::GroupService;
use std::sync::Arc;

pub const SUMMARY_MODEL: &str = "gpt-4o-mini";
const SUMMARY_MAX_TOKENS: u32 = 300;
const SYSTEM_INSTRUCTION: &str =
    "You are a helpful travel assistant who writes short, upbeat trip summaries.";

/// Summary generator. Without a completion client every request fails.
#[derive(Clone)]
pub struct SummaryService {
    groups: GroupService,
    client: Option<Arc<dyn CompletionClient>>,
}

impl SummaryService {
    pub fn new(groups: GroupService, client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { groups, client }
    }

    /// Generate a summary for `group_id` from its description.
    pub async fn generate_summary(&self, group_id: &str) -> Result<String> {
        let group = self.groups.get_group(group_id).await?;

        let description = group.description.as_deref().unwrap_or_default().trim();
        if description.is_empty() {
            return Err(AppError::BadRequest(
                "This group has no description to summarize.".to_string(),
            ));
        }

        let client = self.client.as_ref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "AI service is not configured (OPENAI_API_KEY unset)"
            ))
        })?;

        let request = CompletionRequest {
            model: SUMMARY_MODEL.to_string(),
            system: Some(SYSTEM_INSTRUCTION.to_string()),
            prompt: build_prompt(description),
            max_tokens: Some(SUMMARY_MAX_TOKENS),
        };

        tracing::debug!(group_id, model = SUMMARY_MODEL, "Requesting trip summary");

        let text = client
            .complete(&request)
            .await
            .map_err(|e| AppError::AiService(e.to_string()))?;

        let summary = text.trim();
        if summary.is_empty() {
            return Err(AppError::AiService("completion was blank".to_string()));
        }

        Ok(summary.to_string())
    }
}

fn build_prompt(description: &str) -> String {
    format!(
        "Write a concise and friendly trip summary (3–5 sentences) based on the \
         following description:\n\n{}",
        description
    )
}
