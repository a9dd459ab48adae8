//! SQLite persistence: split reader/writer pools and the chat repository.

pub mod chat;
pub mod pool;
