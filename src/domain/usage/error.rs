use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum UsageServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
}

/// Repository failures surface as `AppError` and become dependency errors here
impl From<AppError> for UsageServiceError {
    fn from(err: AppError) -> Self {
        UsageServiceError::Dependency(err.to_string())
    }
}

impl From<UsageServiceError> for AppError {
    fn from(err: UsageServiceError) -> Self {
        match err {
            UsageServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
