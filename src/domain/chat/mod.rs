pub mod dto;
pub mod error;
pub mod relay;
pub mod service;

pub use dto::{Caller, ChatMessage, ChatRequest};
pub use error::ChatServiceError;
pub use relay::{
    usage_marker, RelayStream, SseDecoder, StreamingUsageRelay, USAGE_UPDATE_END,
    USAGE_UPDATE_START,
};
pub use service::{ChatService, ChatServiceApi};
