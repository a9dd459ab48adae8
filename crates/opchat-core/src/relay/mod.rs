//! Operator relay: outbound notification, inbound ingestion, and reply
//! correlation against the external operator channel.

pub mod adapter;
pub mod cache;
pub mod channel;
pub mod correlate;
