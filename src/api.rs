//! Completion client adapter for the chat-completions API.
//!
//! One outbound request per call, no caching, no automatic retries: a failed
//! generation is always re-attempted by the user. The `schema` argument
//! decides once whether the reply is plain text or a validated structured
//! payload; there is no post-hoc parse guessing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{PredicaError, Result};
use crate::session::Language;

/// Structured shapes the adapter knows how to request and validate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    /// `{"key_messages": ["...", ...]}`
    KeyMessages,
}

/// Tagged reply: plain text or a validated structured payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    KeyMessages(Vec<String>),
}

/// The opaque model call the workflow talks to. Mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        language: Language,
        schema: Option<ResponseSchema>,
    ) -> Result<Reply>;
}

/// System instruction per language: reply only in that language, no
/// conversational openers, just the requested content.
pub fn system_instruction(language: Language) -> &'static str {
    match language {
        Language::English => {
            "You are an assistant that helps preachers find inspiration. Please ALWAYS reply \
             in ENGLISH. Only produce the requested text and avoid openers like 'Certainly! \
             Here’s what you asked {sermon}'. Instead, just output what the sermon is."
        }
        Language::French => {
            "Vous aidez les prédicateurs à trouver l'inspiration. Répondez TOUJOURS en \
             FRANÇAIS. Donnez uniquement le sermon demandé et évitez les introductions comme \
             'Voici ce que vous avez demandé {sermon}'. Juste le sermon demandé."
        }
        Language::Spanish => {
            "Ayudas a los predicadores a encontrar inspiración. Responde SIEMPRE en ESPAÑOL. \
             Solo da el texto solicitado y evita introducciones como 'Aquí tienes lo que \
             pediste {sermón}'. Solo el sermón pedido."
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Wire shape of a structured key-message reply
#[derive(Debug, Deserialize)]
struct KeyMessagesPayload {
    key_messages: Vec<String>,
}

fn key_messages_response_format() -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "key_messages",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "key_messages": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                },
                "required": ["key_messages"],
                "additionalProperties": false
            }
        }
    })
}

/// Adapter over an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("predica-cli/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut request_builder = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .json(request);

        if !self.api_key.is_empty() {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request_builder.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out"
            } else if e.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            PredicaError::upstream(format!("{reason}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PredicaError::upstream(format!(
                "API request failed with {status}: {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PredicaError::upstream(format!("could not read API reply: {e}")))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        language: Language,
        schema: Option<ResponseSchema>,
    ) -> Result<Reply> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_instruction(language).to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.7,
            max_tokens: self.max_tokens,
            response_format: schema.map(|s| match s {
                ResponseSchema::KeyMessages => key_messages_response_format(),
            }),
        };

        debug!(model = %self.model, structured = schema.is_some(), "sending completion request");
        let response = self.send_request(&request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PredicaError::upstream("API returned no content in the reply"))?;

        match schema {
            None => Ok(Reply::Text(content.trim().to_string())),
            Some(ResponseSchema::KeyMessages) => {
                let payload: KeyMessagesPayload = serde_json::from_str(&content)
                    .map_err(|e| PredicaError::schema(format!("not a key message list: {e}")))?;
                if payload.key_messages.is_empty() {
                    return Err(PredicaError::schema("the key message list came back empty"));
                }
                Ok(Reply::KeyMessages(payload.key_messages))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_system_instruction_is_language_dedicated() {
        assert!(system_instruction(Language::French).contains("FRANÇAIS"));
        assert!(system_instruction(Language::English).contains("ENGLISH"));
        assert!(system_instruction(Language::Spanish).contains("ESPAÑOL"));
        // No cross-language leakage between the three instruction texts
        assert!(!system_instruction(Language::French).contains("ENGLISH"));
        assert!(!system_instruction(Language::English).contains("FRANÇAIS"));
    }

    #[test]
    fn test_key_messages_response_format_shape() {
        let format = key_messages_response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(
            format["json_schema"]["schema"]["properties"]["key_messages"]["type"],
            "array"
        );
    }

    #[test]
    fn test_request_serialization_omits_absent_fields() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![],
            temperature: 0.7,
            max_tokens: None,
            response_format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_key_messages_payload_rejects_non_list() {
        let bad = serde_json::from_str::<KeyMessagesPayload>("{\"key_messages\": \"one\"}");
        assert!(bad.is_err());
        let good =
            serde_json::from_str::<KeyMessagesPayload>("{\"key_messages\": [\"a\", \"b\"]}")
                .unwrap();
        assert_eq!(good.key_messages, vec!["a", "b"]);
    }
}
