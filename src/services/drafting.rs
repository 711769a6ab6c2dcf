// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drafting service: generates pitch text via the OpenAI chat API.
//!
//! Treated as an opaque collaborator: skills + gig details in, prose out.
//! Any failure (HTTP error, timeout, empty completion) surfaces as
//! `GenerationFailed` and nothing is persisted by the caller.

use crate::error::AppError;
use crate::models::GigDetails;
use serde::Deserialize;

const OPENAI_MODEL: &str = "gpt-4";
const MAX_TOKENS: u32 = 500;
const REQUEST_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are an expert freelance pitch writer who creates compelling, \
     personalized pitches for freelancers to help them win projects.";

/// OpenAI-backed pitch text generator.
#[derive(Clone)]
pub struct DraftingService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Offline mode for tests: return canned text without network I/O.
    offline: bool,
}

impl DraftingService {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key,
            offline: false,
        }
    }

    /// Create a mock drafting service for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: String::new(),
            api_key: String::new(),
            offline: true,
        }
    }

    /// Generate pitch prose for the given skills and gig details.
    pub async fn generate_pitch(
        &self,
        skills: &[String],
        gig_details: &GigDetails,
    ) -> Result<String, AppError> {
        if self.offline {
            return Ok(format!(
                "Offline draft pitch for a {} project on {}.",
                gig_details.project_type, gig_details.platform
            ));
        }

        let prompt = build_prompt(skills, gig_details);

        let body = serde_json::json!({
            "model": OPENAI_MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.7,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::GenerationFailed(format!("JSON parse error: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::GenerationFailed(
                "Model returned empty completion".to_string(),
            ));
        }

        tracing::debug!(chars = text.len(), "Pitch text generated");

        Ok(text)
    }
}

/// Build the user prompt from the request fields.
fn build_prompt(skills: &[String], gig_details: &GigDetails) -> String {
    let mut prompt = format!(
        "Generate a professional freelance pitch for a {} project with a budget of ${}.\n\n\
         Skills: {}\nTimeline: {}\nPlatform: {}\n",
        gig_details.project_type,
        gig_details.budget,
        skills.join(", "),
        gig_details.timeline,
        gig_details.platform,
    );

    if let Some(info) = &gig_details.additional_info {
        prompt.push_str(&format!("Additional Information: {}\n", info));
    }

    prompt.push_str(&format!(
        "\nThe pitch should be concise, professional, and highlight relevant experience and \
         skills. It should be tailored for the {} platform and follow best practices for \
         freelance proposals.",
        gig_details.platform
    ));

    prompt
}

/// Chat completion response (the subset we read).
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
