use super::dto::{Caller, ChatRequest};
use super::error::ChatServiceError;
use super::relay::{RelayStream, StreamingUsageRelay};
use crate::domain::usage::UsageServiceApi;
use crate::infrastructure::repositories::ChatRepository;
use async_trait::async_trait;
use std::sync::Arc;

const ALLOWED_ROLES: [&str; 3] = ["system", "user", "assistant"];

pub struct ChatService {
    chat_repo: Arc<dyn ChatRepository>,
    usage_service: Arc<dyn UsageServiceApi>,
    relay: StreamingUsageRelay,
}

impl ChatService {
    pub fn new(chat_repo: Arc<dyn ChatRepository>, usage_service: Arc<dyn UsageServiceApi>) -> Self {
        let relay = StreamingUsageRelay::new(usage_service.clone());
        Self {
            chat_repo,
            usage_service,
            relay,
        }
    }
}

#[async_trait]
pub trait ChatServiceApi: Send + Sync {
    /// Stream a chat completion for the caller
    ///
    /// This operation:
    /// - Validates the conversation
    /// - Refuses callers whose daily quota is used up
    /// - Opens the upstream stream and relays it, recording usage when it ends
    async fn stream_chat(
        &self,
        caller: Caller,
        request: ChatRequest,
    ) -> Result<RelayStream, ChatServiceError>;
}

#[async_trait]
impl ChatServiceApi for ChatService {
    async fn stream_chat(
        &self,
        caller: Caller,
        request: ChatRequest,
    ) -> Result<RelayStream, ChatServiceError> {
        validate(&request)?;

        let snapshot = self
            .usage_service
            .get_usage_snapshot(caller.user_id, Some(caller.ip_address.as_str()))
            .await?;

        if !snapshot.can_use {
            tracing::info!(
                caller = %caller,
                used = snapshot.used,
                limit = snapshot.limit,
                "Chat refused, daily limit reached"
            );
            return Err(ChatServiceError::QuotaExceeded(format!(
                "Daily limit of {} requests reached for {} tier",
                snapshot.limit, snapshot.user_type
            )));
        }

        tracing::info!(
            caller = %caller,
            messages = request.messages.len(),
            remaining = snapshot.remaining,
            "Chat request accepted"
        );

        let upstream = self
            .chat_repo
            .stream_completion(&request)
            .await
            .map_err(ChatServiceError::Dependency)?;

        Ok(self.relay.relay(upstream, caller))
    }
}

fn validate(request: &ChatRequest) -> Result<(), ChatServiceError> {
    if request.messages.is_empty() {
        return Err(ChatServiceError::Invalid(
            "At least one message is required".to_string(),
        ));
    }

    if let Some(message) = request
        .messages
        .iter()
        .find(|m| !ALLOWED_ROLES.contains(&m.role.as_str()))
    {
        return Err(ChatServiceError::Invalid(format!(
            "Invalid role: {}",
            message.role
        )));
    }

    Ok(())
}
