//! Chat-completion oracle over HTTP.
//!
//! Request bodies and response parsing are plain functions over
//! `serde_json::Value` so they can be checked without a network. The oracle
//! owns a small current-thread runtime and blocks on each call, keeping the
//! [`AnsweringOracle`] seam synchronous.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tokio::runtime::Runtime;

use ragprobe_core::config::OracleSettings;
use ragprobe_core::error::OracleError;
use ragprobe_core::traits::{AnsweringOracle, OracleRequest};
use ragprobe_core::types::AnswerResult;

use crate::grounding::{finalize, system_prompt, user_prompt};
use crate::provider::Provider;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_ERROR_BODY: usize = 500;

/// A fully described outgoing call.
#[derive(Debug, Clone)]
pub struct ChatCall {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

pub struct ChatOracle {
    provider: Provider,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
    runtime: Runtime,
}

impl ChatOracle {
    pub fn new(provider: Provider, api_key: String, settings: &OracleSettings) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        let model = settings.model.clone().unwrap_or_else(|| provider.default_model().to_string());
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client,
            runtime,
        })
    }

    pub fn provider(&self) -> Provider { self.provider }

    pub fn model(&self) -> &str { &self.model }

    pub fn build_call(&self, system: &str, user: &str) -> ChatCall {
        match self.provider {
            Provider::Groq | Provider::OpenAi => ChatCall {
                url: format!("{}/chat/completions", self.base_url),
                headers: vec![("Authorization", format!("Bearer {}", self.api_key))],
                body: json!({
                    "model": self.model,
                    "messages": [
                        { "role": "system", "content": system },
                        { "role": "user", "content": user },
                    ],
                    "temperature": self.temperature,
                    "max_tokens": self.max_tokens,
                }),
            },
            Provider::Anthropic => ChatCall {
                url: format!("{}/messages", self.base_url),
                headers: vec![
                    ("x-api-key", self.api_key.clone()),
                    ("anthropic-version", ANTHROPIC_VERSION.to_string()),
                ],
                body: json!({
                    "model": self.model,
                    "system": system,
                    "messages": [{ "role": "user", "content": user }],
                    "temperature": self.temperature,
                    "max_tokens": self.max_tokens,
                }),
            },
            Provider::Gemini => ChatCall {
                url: format!("{}/models/{}:generateContent?key={}", self.base_url, self.model, self.api_key),
                headers: Vec::new(),
                body: json!({
                    "contents": [{ "role": "user", "parts": [{ "text": format!("{system}\n\n{user}") }] }],
                    "generationConfig": {
                        "temperature": self.temperature,
                        "maxOutputTokens": self.max_tokens,
                    },
                }),
            },
        }
    }

    async fn send(&self, call: ChatCall) -> Result<String, OracleError> {
        let mut builder = self.client.post(&call.url).json(&call.body);
        for (name, value) in &call.headers {
            builder = builder.header(*name, value);
        }
        let response = builder.send().await.map_err(|e| OracleError::Request(e.without_url().to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| OracleError::Request(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(OracleError::Status {
                provider: self.provider.name().to_string(),
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| OracleError::ResponseParse(e.to_string()))?;
        parse_completion(self.provider, &json)
    }
}

impl AnsweringOracle for ChatOracle {
    fn name(&self) -> &str { self.provider.name() }

    fn answer(&self, request: &OracleRequest<'_>) -> Result<AnswerResult, OracleError> {
        let call = self.build_call(&system_prompt(request.strict_citations), &user_prompt(request.question, request.chunks));
        let raw = self.runtime.block_on(self.send(call))?;
        tracing::debug!(provider = %self.provider, chars = raw.len(), "completion received");
        Ok(finalize(&raw, request.chunks, request.abstain_threshold))
    }
}

/// Pull the answer text out of a provider's JSON. A well-formed envelope
/// without any text yields an empty answer.
pub fn parse_completion(provider: Provider, json: &Value) -> Result<String, OracleError> {
    let text = match provider {
        Provider::Groq | Provider::OpenAi => {
            let choices = json
                .get("choices")
                .and_then(Value::as_array)
                .ok_or_else(|| OracleError::ResponseParse("missing 'choices'".into()))?;
            choices
                .first()
                .and_then(|c| c.pointer("/message/content"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        }
        Provider::Anthropic => {
            let content = json
                .get("content")
                .and_then(Value::as_array)
                .ok_or_else(|| OracleError::ResponseParse("missing 'content'".into()))?;
            content
                .iter()
                .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        }
        Provider::Gemini => {
            let candidates = json
                .get("candidates")
                .and_then(Value::as_array)
                .ok_or_else(|| OracleError::ResponseParse("missing 'candidates'".into()))?;
            candidates
                .first()
                .and_then(|c| c.pointer("/content/parts"))
                .and_then(Value::as_array)
                .map(|parts| parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect::<Vec<_>>().join(""))
                .unwrap_or_default()
        }
    };
    Ok(text)
}
