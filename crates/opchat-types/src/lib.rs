//! Shared domain types for opchat.
//!
//! This crate contains the core domain types used across the relay:
//! chat sessions, messages, operator-channel events, config, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod relay;
