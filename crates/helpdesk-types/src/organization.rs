//! Organizations that scope chat sessions.
//!
//! Organizations are supplied from outside the chat subsystem (seeded by an
//! operator) and are read-only to it.

use serde::{Deserialize, Serialize};

/// An organization a visitor can open a help-desk chat with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    /// Display name, also used to template the welcome message.
    #[serde(rename = "name")]
    pub display_name: String,
}

/// Reference to an organization inside a request body: `{"id": 3, ...}`.
///
/// Extra fields the client echoes back (name, etc.) are ignored; only the
/// id is trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationRef {
    pub id: i64,
}
