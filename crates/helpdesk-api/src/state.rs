//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over the core ports, but AppState pins them to
//! the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use helpdesk_core::chat::service::ChatService;
use helpdesk_core::identity::resolver::IdentityResolver;
use helpdesk_infra::config::{database_url, load_service_config, resolve_data_dir};
use helpdesk_infra::credential::JwtCredentialVerifier;
use helpdesk_infra::oracle::HttpAnswerOracle;
use helpdesk_infra::sqlite::chat::SqliteChatRepository;
use helpdesk_infra::sqlite::organization::SqliteOrganizationRepository;
use helpdesk_infra::sqlite::pool::DatabasePool;
use helpdesk_types::config::ServiceConfig;
use secrecy::SecretString;

use crate::http::extractors::identity::CookiePolicy;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteChatRepository, SqliteOrganizationRepository, HttpAnswerOracle>;

pub type ConcreteResolver = IdentityResolver<JwtCredentialVerifier>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub organizations: Arc<SqliteOrganizationRepository>,
    pub resolver: ConcreteResolver,
    pub credentials: Arc<JwtCredentialVerifier>,
    pub cookies: Arc<CookiePolicy>,
    pub config: Arc<ServiceConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize from the data directory: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_service_config(&data_dir).await;
        Self::from_config(config, data_dir).await
    }

    pub async fn from_config(config: ServiceConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&config, &data_dir)).await?;

        let oracle_timeout = Duration::from_secs(config.oracle.timeout_secs.max(1));
        let oracle = HttpAnswerOracle::new(config.oracle.base_url.clone(), oracle_timeout)?;

        let secret = match &config.auth.jwt_secret {
            Some(secret) => SecretString::from(secret.clone()),
            None => {
                // Random per-process key: no presented credential can verify.
                tracing::warn!("No JWT secret configured; every caller will be treated as a guest");
                SecretString::from(format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4()))
            }
        };
        let credentials = Arc::new(JwtCredentialVerifier::new(&secret));
        let resolver = IdentityResolver::new(
            Arc::clone(&credentials),
            Duration::from_secs(config.auth.guest_token_ttl_minutes * 60),
        );

        let organizations = Arc::new(SqliteOrganizationRepository::new(db_pool.clone()));
        let chat_service = ChatService::new(
            Arc::new(SqliteChatRepository::new(db_pool)),
            Arc::clone(&organizations),
            Arc::new(oracle),
            config.chat.clone(),
            oracle_timeout,
        );

        tracing::debug!(
            oracle = %config.oracle.base_url,
            data_dir = %data_dir.display(),
            "Application state initialized"
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            organizations,
            resolver,
            credentials,
            cookies: Arc::new(CookiePolicy::from(&config.auth)),
            config: Arc::new(config),
            data_dir,
        })
    }
}
