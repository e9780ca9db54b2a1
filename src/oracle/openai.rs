//! OpenAI-compatible chat completions oracle
//!
//! Sends the caller's question with a front-desk system prompt and the most
//! recent known Q/A pairs as context. Any provider that speaks the
//! `/chat/completions` protocol works (OpenAI, OpenRouter, local servers).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{Oracle, OracleError};
use crate::config::OracleConfig;
use crate::types::KnowledgeEntry;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

/// Chat completions client used as the desk's oracle
#[derive(Clone)]
pub struct ChatCompletionOracle {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_context_entries: usize,
}

impl ChatCompletionOracle {
    /// Build from config; the API key is read from the configured env var
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &OracleConfig, api_key: Option<String>) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_context_entries: config.max_context_entries,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// System prompt plus the tail of the knowledge base as reference answers
    fn build_messages(&self, question: &str, context: &[KnowledgeEntry]) -> Vec<ChatMessage> {
        let mut system = self.system_prompt.clone();

        let skip = context.len().saturating_sub(self.max_context_entries);
        let known: Vec<&KnowledgeEntry> = context.iter().skip(skip).collect();
        if !known.is_empty() {
            system.push_str("\n\nConfirmed answers you may rely on:\n");
            for entry in known {
                system.push_str(&format!("Q: {}\nA: {}\n", entry.question, entry.answer));
            }
        }

        vec![ChatMessage::system(system), ChatMessage::user(question)]
    }
}

#[async_trait]
impl Oracle for ChatCompletionOracle {
    async fn query(&self, question: &str, context: &[KnowledgeEntry]) -> Result<String, OracleError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OracleError::NotConfigured("no API key set for the chat completions oracle".to_string())
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: self.build_messages(question, context),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let body: Value = response.json().await?;
        extract_content(&body)
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}

/// Pull the first choice's text out of a chat completions response.
/// Handles both plain string content and arrays of content parts.
fn extract_content(body: &Value) -> Result<String, OracleError> {
    let content = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    match content {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Array(parts)) => Ok(parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string()),
        Some(Value::Null) => Ok(String::new()),
        _ => Err(OracleError::Malformed("response has no choices[0].message.content".to_string())),
    }
}
