use super::chat_repository::{ChatByteStream, ChatRepository};
use crate::domain::chat::{ChatMessage, ChatRequest};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Upstream body for an OpenAI-compatible `/chat/completions` call
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// OpenAI-compatible implementation of the chat repository
pub struct OpenAiChatRepository {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl OpenAiChatRepository {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, default_model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            default_model,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatRepository for OpenAiChatRepository {
    async fn stream_completion(&self, request: &ChatRequest) -> Result<ChatByteStream, String> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);

        tracing::info!(
            model = %model,
            messages = request.messages.len(),
            "Calling chat completions API"
        );

        let body = CompletionRequest {
            model,
            messages: &request.messages,
            stream: true,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Chat provider request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);

            tracing::error!(
                status = %status,
                error = %message,
                "Chat provider rejected request"
            );

            return Err(format!("Chat provider returned {}: {}", status, message));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| format!("Chat provider stream error: {}", e)))
            .boxed())
    }
}
