use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::error::ServiceError;
use crate::schema;

// OpenRouter API 响应结构
#[derive(Debug, Deserialize)]
pub struct OpenRouterResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: Option<String>,
}

impl OpenRouterResponse {
    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[derive(Debug, Serialize)]
pub struct OpenRouterRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn flashcard_deck() -> Self {
        ResponseFormat {
            kind: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: schema::schema_name(),
                strict: true,
                schema: schema::response_schema(),
            },
        }
    }
}

/// What the generator asks of a completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    pub system: String,
    pub user: String,
}

/// One request/response exchange with a content-generation service.
/// `Ok(None)` means the service answered without any content.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<Option<String>, ServiceError>;
}

pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ServiceError> {
        let mut builder = ClientBuilder::new();
        if let Some(secs) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(ApiClient { client, config })
    }

    pub fn build_request(&self, prompt: &CompletionPrompt) -> OpenRouterRequest {
        OpenRouterRequest {
            model: self.config.model.clone(),
            messages: vec![
                RequestMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                RequestMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: ResponseFormat::flashcard_deck(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    // 单次请求，不重试
    pub async fn make_request(&self, request: &OpenRouterRequest) -> Result<OpenRouterResponse, ServiceError> {
        let url = self.completions_url();
        debug!(%url, model = %request.model, "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("network request failed: {}", e);
                ServiceError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "API request failed: {}", body);
            return Err(ServiceError::HttpStatus { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            error!("failed to parse API response: {}. Body: {}", e, String::from_utf8_lossy(&bytes));
            ServiceError::Decode(e)
        })
    }
}

#[async_trait]
impl CompletionService for ApiClient {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<Option<String>, ServiceError> {
        let request = self.build_request(prompt);
        let response = self.make_request(&request).await?;
        Ok(response.into_first_content())
    }
}
