//! Shared domain types for the help-desk chat service.
//!
//! Identity, Organization, chat sessions and messages, Answer Oracle wire
//! types, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod oracle;
pub mod organization;
