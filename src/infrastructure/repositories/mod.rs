pub mod chat_repository;
pub mod openai_chat_repository;
pub mod usage_repository;
pub mod user_repository;

pub use chat_repository::{ChatByteStream, ChatRepository};
pub use openai_chat_repository::OpenAiChatRepository;
pub use usage_repository::{UsageRepository, UsageStore};
pub use user_repository::{UserLookup, UserRepository};
