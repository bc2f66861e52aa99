use crate::domain::usage::UsageServiceError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ChatServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl From<UsageServiceError> for ChatServiceError {
    fn from(err: UsageServiceError) -> Self {
        ChatServiceError::Dependency(err.to_string())
    }
}

impl From<ChatServiceError> for AppError {
    fn from(err: ChatServiceError) -> Self {
        match err {
            ChatServiceError::Invalid(msg) => AppError::BadRequest(msg),
            ChatServiceError::QuotaExceeded(msg) => AppError::RateLimitExceeded(msg),
            ChatServiceError::Dependency(msg) => AppError::ExternalService(msg),
        }
    }
}
