//! Service configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.helpdesk/` by default)
//! and deserializes it into [`ServiceConfig`]. Falls back to defaults when
//! the file is missing or malformed, then applies `HELPDESK_*` environment
//! overrides.

use std::path::{Path, PathBuf};

use helpdesk_types::config::ServiceConfig;

use crate::sqlite::pool::default_database_url;

pub const DATA_DIR_ENV: &str = "HELPDESK_DATA_DIR";
pub const DATABASE_URL_ENV: &str = "HELPDESK_DATABASE_URL";
pub const ORACLE_URL_ENV: &str = "HELPDESK_ORACLE_URL";
pub const JWT_SECRET_ENV: &str = "HELPDESK_JWT_SECRET";
pub const WEB_DIR_ENV: &str = "HELPDESK_WEB_DIR";

/// Resolve the data directory.
///
/// Checks `HELPDESK_DATA_DIR`, then `~/.helpdesk`, then `./.helpdesk`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".helpdesk");
    }

    PathBuf::from(".helpdesk")
}

/// Load configuration from `{data_dir}/config.toml` plus environment overrides.
pub async fn load_service_config(data_dir: &Path) -> ServiceConfig {
    let mut config = read_config_file(data_dir).await;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

/// Apply environment overrides. Empty values are ignored.
pub fn apply_overrides(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(DATABASE_URL_ENV) {
        config.database.url = Some(url);
    }
    if let Some(url) = get(ORACLE_URL_ENV) {
        config.oracle.base_url = url;
    }
    if let Some(secret) = get(JWT_SECRET_ENV) {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(dir) = get(WEB_DIR_ENV) {
        config.server.web_dir = Some(dir);
    }
}

/// Configured database URL, or `{data_dir}/helpdesk.db`.
pub fn database_url(config: &ServiceConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
