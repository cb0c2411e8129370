//! Client for an OpenAI-compatible chat completion server

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::{config::NarrativeConfig, goals::AiGoal};

use super::{NarrativeContext, NarrativeError, NarrativeFuture, NarrativeService, NewsDraft};

const GOAL_PROMPT: &str = "You are the governing council of a young Mars colony. \
Reply with a single JSON object describing the next directive for the colonists: \
{\"description\": string, \"target_type\": \"population\" | \"money\" | \"science\" | \"building_count\", \
\"target_value\": integer, \"building_kind\": string or null, \"reward\": integer}. \
building_kind is required for building_count and must be one of the unlocked kinds. \
Pick a target that is reachable within a few weeks from the current numbers.";

const NEWS_PROMPT: &str = "You write one-line headlines for a Mars colony news ticker. \
Reply with a single JSON object: {\"text\": string, \"sentiment\": \"positive\" | \"negative\" | \"neutral\"}. \
Base the headline on the colony numbers you are given.";

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpNarrator {
    client: reqwest::Client,
    endpoint: String,
    model: Option<String>,
}

impl HttpNarrator {
    pub fn new(base_url: &str, settings: &NarrativeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("Failed to build narrative HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            model: settings.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn ask<T: DeserializeOwned>(
        &self,
        system: &str,
        context: &NarrativeContext,
    ) -> Result<Option<T>, NarrativeError> {
        let state = serde_json::to_string(context)
            .map_err(|err| NarrativeError::Malformed(err.to_string()))?;
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: state,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.8,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| NarrativeError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| NarrativeError::Malformed(err.to_string()))?;
        let Some(content) = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        else {
            return Ok(None);
        };
        parse_content(&content)
    }
}

impl NarrativeService for HttpNarrator {
    fn generate_goal(&self, context: NarrativeContext) -> NarrativeFuture<'_, AiGoal> {
        Box::pin(async move {
            let reply = self.ask::<AiGoal>(GOAL_PROMPT, &context).await;
            reply.map(|goal| {
                goal.map(|goal| AiGoal {
                    completed: false,
                    ..goal
                })
            })
        })
    }

    fn generate_news(&self, context: NarrativeContext) -> NarrativeFuture<'_, NewsDraft> {
        Box::pin(async move { self.ask::<NewsDraft>(NEWS_PROMPT, &context).await })
    }
}

fn classify_status(status: StatusCode) -> NarrativeError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        NarrativeError::RateLimited
    } else if status.is_server_error() {
        NarrativeError::Server(status.as_u16())
    } else {
        NarrativeError::Http(status.as_u16())
    }
}

/// Models often wrap JSON in a markdown fence; strip it before parsing.
fn parse_content<T: DeserializeOwned>(content: &str) -> Result<Option<T>, NarrativeError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    debug!(len = body.len(), "parsing narrative reply");
    serde_json::from_str(body)
        .map(Some)
        .map_err(|err| NarrativeError::Malformed(err.to_string()))
}
