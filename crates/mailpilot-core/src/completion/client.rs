use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{CompletionError, CompletionProvider};
use crate::config::CompletionConfig;

/// Client for an OpenAI-compatible chat-completions endpoint (Groq in the
/// default configuration). One request per `complete` call, no retries, no
/// streaming.
pub struct HttpCompletionClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

impl HttpCompletionClient {
    pub fn new(http: Client, config: &CompletionConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": self.temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The provider wraps failures as {"error": {"message": ...}}; fall
            // back to the raw body when it doesn't.
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CompletionError::Provider { message });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|_| CompletionError::MalformedResponse)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::MalformedResponse)?;
        Ok(choice.message.content)
    }
}
