pub mod auth;
pub mod chat;
pub mod usage;
pub mod user;
