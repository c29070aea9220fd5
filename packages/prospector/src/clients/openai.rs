//! OpenAI-compatible inference client.
//!
//! Speaks the chat-completions wire format, so it works against OpenAI
//! itself or any compatible gateway via `with_base_url`. JSON output is
//! requested through `response_format`, but callers must still treat the
//! reply as untrusted text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult, PipelineError};
use crate::security::ApiCredentials;
use crate::traits::analyst::ListingAnalyst;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible chat-completions analyst.
pub struct OpenAiAnalyst {
    client: Client,
    credentials: ApiCredentials,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiAnalyst {
    /// Create an analyst with the given API key.
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        Self::with_credentials(ApiCredentials::new(api_key))
    }

    /// Create an analyst from explicit credentials.
    pub fn with_credentials(credentials: ApiCredentials) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ClientError::Http(Box::new(e)))?;

        let base_url = credentials
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_API_URL.to_string());

        Ok(Self {
            client,
            credentials,
            base_url,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
        })
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, PipelineError> {
        let credentials = ApiCredentials::from_env("OPENAI_API_KEY")?;
        Self::with_credentials(credentials)
            .map_err(|e| PipelineError::Config(format!("inference client: {e}")))
    }

    /// Set the model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ListingAnalyst for OpenAiAnalyst {
    async fn analyze(&self, prompt: &str) -> ClientResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.api_key.expose()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout { url: url.clone() }
                } else {
                    ClientError::Http(Box::new(e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Http(Box::new(e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ClientError::MissingContent { url })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
