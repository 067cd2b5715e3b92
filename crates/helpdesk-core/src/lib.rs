//! Business logic and port definitions for the help desk chat service.
//!
//! This crate defines the "ports" (repository, oracle and credential traits)
//! that the infrastructure layer implements. It depends only on
//! `helpdesk-types` -- never on `helpdesk-infra` or any database/IO crate.

pub mod chat;
pub mod identity;
pub mod oracle;
