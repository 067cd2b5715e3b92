//! Service configuration types.
//!
//! `ServiceConfig` represents the top-level `config.toml`. Every field has
//! a default, so an empty or missing file yields a runnable local setup.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the help-desk service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of a built web client to serve for non-API paths.
    #[serde(default)]
    pub web_dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_dir: None,
        }
    }
}

/// Database location. `None` means `{data_dir}/helpdesk.db`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_url")]
    pub base_url: String,
    /// Upper bound on a single oracle call, in seconds.
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

fn default_oracle_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_oracle_timeout() -> u64 {
    30
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            timeout_secs: default_oracle_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 key shared with the identity provider. Unset means no bearer
    /// credential can verify and every caller is a guest.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Cookie that may carry the bearer credential when no header is sent.
    #[serde(default = "default_credential_cookie")]
    pub credential_cookie: String,
    /// Cookie that carries the guest token.
    #[serde(default = "default_guest_cookie")]
    pub guest_cookie: String,
    #[serde(default = "default_guest_ttl")]
    pub guest_token_ttl_minutes: u64,
    /// Add `Secure` to issued cookies (enable behind TLS).
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_credential_cookie() -> String {
    "access_token".to_string()
}

fn default_guest_cookie() -> String {
    "guest_id".to_string()
}

fn default_guest_ttl() -> u64 {
    60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            credential_cookie: default_credential_cookie(),
            guest_cookie: default_guest_cookie(),
            guest_token_ttl_minutes: default_guest_ttl(),
            secure_cookies: false,
        }
    }
}

/// Behavior knobs for the chat core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Welcome message template; `{org}` is replaced by the organization's
    /// display name.
    #[serde(default = "default_welcome_template")]
    pub welcome_template: String,
    /// Reply used whenever the oracle fails.
    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
    /// Session id allocation attempts before giving up.
    #[serde(default = "default_id_retry_limit")]
    pub id_retry_limit: u32,
    /// Append oracle citations to the reply text.
    #[serde(default = "default_append_citations")]
    pub append_citations: bool,
}

fn default_welcome_template() -> String {
    "Hello, I am the {org} assistant. How can I help?".to_string()
}

fn default_fallback_answer() -> String {
    "Sorry, I can't answer right now. Please try again in a moment.".to_string()
}

fn default_id_retry_limit() -> u32 {
    5
}

fn default_append_citations() -> bool {
    true
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            welcome_template: default_welcome_template(),
            fallback_answer: default_fallback_answer(),
            id_retry_limit: default_id_retry_limit(),
            append_citations: default_append_citations(),
        }
    }
}

impl ChatSettings {
    /// Render the welcome message for an organization.
    pub fn welcome_for(&self, organization_name: &str) -> String {
        self.welcome_template.replace("{org}", organization_name)
    }
}
