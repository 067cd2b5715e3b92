//! Infrastructure layer for the help desk service.
//!
//! Contains implementations of the ports defined in `helpdesk-core`:
//! SQLite storage, the HTTP answer oracle client, bearer credential
//! verification, and the configuration loader.

pub mod config;
pub mod credential;
pub mod oracle;
pub mod sqlite;
