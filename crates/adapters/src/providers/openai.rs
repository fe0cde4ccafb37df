//! OpenAI chat-completions client shared by the generative adapters.

use super::http::{build_client, malformed, normalize_base_url, send};
use cinedex_config::OpenAiConfig;
use cinedex_shared::{ErrorEnvelope, RequestContext, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) const PROVIDER: &str = "openai";

/// One chat completion request.
#[derive(Debug, Clone)]
pub(crate) struct ChatPrompt {
    pub system: &'static str,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Minimal OpenAI chat client.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: reqwest::Client,
    endpoint: Box<str>,
    model: Box<str>,
    generation_timeout: Duration,
    translation_timeout: Duration,
}

impl OpenAiChatClient {
    /// Build a client from config; `None` when no API key is configured.
    pub fn from_config(config: &OpenAiConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_ref() else {
            return Ok(None);
        };
        let base_url = normalize_base_url(PROVIDER, &config.base_url)?;

        let mut auth_header = HeaderValue::from_str(&format!("Bearer {}", api_key.expose()))
            .map_err(|_| {
                ErrorEnvelope::invalid_input("openai api key contains invalid header characters")
            })?;
        auth_header.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_header);

        let generation_timeout = Duration::from_millis(config.generation_timeout_ms);
        let client = build_client(PROVIDER, config.generation_timeout_ms, headers)?;

        Ok(Some(Self {
            client,
            endpoint: format!("{base_url}/chat/completions").into_boxed_str(),
            model: config.model.clone(),
            generation_timeout,
            translation_timeout: Duration::from_millis(config.translation_timeout_ms),
        }))
    }

    pub(crate) const fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }

    pub(crate) const fn translation_timeout(&self) -> Duration {
        self.translation_timeout
    }

    /// Run one completion and return the trimmed text of the first choice.
    pub(crate) async fn complete(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        prompt: ChatPrompt,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        };
        let request = self
            .client
            .post(&*self.endpoint)
            .timeout(prompt.timeout)
            .json(&body);

        let (status, payload) = send(ctx, PROVIDER, operation, request).await?;
        if !status.is_success() {
            return Err(map_openai_error(status, &payload));
        }

        let response: ChatResponse = serde_json::from_slice(&payload)
            .map_err(|error| malformed(PROVIDER, &error.to_string()))?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(malformed(PROVIDER, "completion has no content"));
        }
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

fn map_openai_error(status: reqwest::StatusCode, payload: &[u8]) -> ErrorEnvelope {
    let mut envelope = super::http::map_http_status(PROVIDER, status);
    if let Ok(parsed) = serde_json::from_slice::<OpenAiErrorResponse>(payload) {
        if let Some(error_type) = parsed.error.error_type {
            envelope = envelope.with_metadata("errorType", error_type);
        }
        if let Some(code) = parsed.error.code {
            envelope = envelope.with_metadata("errorCode", code);
        }
    }
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_serializes_two_messages() -> std::result::Result<(), serde_json::Error> {
        let body = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "You are a professional translator.",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            max_tokens: 150,
            temperature: 0.5,
        };
        let value = serde_json::to_value(&body)?;
        assert_eq!(value["messages"][1], json!({ "role": "user", "content": "hello" }));
        assert_eq!(value["max_tokens"], json!(150));
        Ok(())
    }

    #[test]
    fn missing_key_yields_no_client() -> Result<()> {
        assert!(OpenAiChatClient::from_config(&OpenAiConfig::default())?.is_none());
        Ok(())
    }

    #[test]
    fn error_payload_details_become_metadata() {
        let payload = br#"{"error":{"message":"slow","type":"requests","code":"rate_limit_exceeded"}}"#;
        let error = map_openai_error(reqwest::StatusCode::TOO_MANY_REQUESTS, payload);
        assert_eq!(
            error.metadata.get("errorCode").map(String::as_str),
            Some("rate_limit_exceeded")
        );
    }
}
