use crate::domain::chat::ChatRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Raw bytes of an upstream server-sent event stream
pub type ChatByteStream = BoxStream<'static, Result<Bytes, String>>;

/// Repository for streaming chat completions.
/// Abstracts the upstream generative AI provider.
///
/// Implementations return the provider's body untouched; decoding the event
/// frames is the relay's job.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Open a streaming completion for the conversation
    ///
    /// # Errors
    /// Returns error if the provider cannot be reached or rejects the request
    async fn stream_completion(&self, request: &ChatRequest) -> Result<ChatByteStream, String>;
}
