//! Business logic and trait definitions for opchat.
//!
//! This crate defines the "ports" (the chat repository and the operator
//! channel) that the infrastructure layer implements. It depends only on
//! `opchat-types` -- never on `opchat-infra` or any database/IO crate.

pub mod answer;
pub mod chat;
pub mod relay;

#[cfg(test)]
pub(crate) mod testutil;
