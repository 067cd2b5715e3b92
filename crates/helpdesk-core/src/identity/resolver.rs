//! Identity Resolver.
//!
//! Turns the credential signals of a request into exactly one [`Identity`].
//! The authenticated credential always wins over a guest token. When neither
//! is usable a new guest id is minted and handed back so the transport layer
//! can ask the client to keep it.

use std::sync::Arc;
use std::time::Duration;

use helpdesk_types::error::{ChatError, CredentialError};
use helpdesk_types::identity::{GuestId, Identity};
use tracing::debug;

use super::CredentialVerifier;

/// Raw credential material pulled from a request.
#[derive(Debug, Clone, Default)]
pub struct CredentialSignals {
    pub bearer: Option<String>,
    pub guest_token: Option<String>,
}

/// A freshly minted guest id the client must store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestTokenIssue {
    pub guest_id: GuestId,
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: Identity,
    pub issued_guest: Option<GuestTokenIssue>,
}

pub struct IdentityResolver<V: CredentialVerifier> {
    verifier: Arc<V>,
    guest_ttl: Duration,
}

impl<V: CredentialVerifier> Clone for IdentityResolver<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            guest_ttl: self.guest_ttl,
        }
    }
}

impl<V: CredentialVerifier> IdentityResolver<V> {
    pub fn new(verifier: Arc<V>, guest_ttl: Duration) -> Self {
        Self {
            verifier,
            guest_ttl,
        }
    }

    /// Resolve the caller.
    ///
    /// A presented but unusable credential is an error rather than a silent
    /// downgrade to guest: expired or forged tokens yield
    /// `AuthenticationRequired`, a token whose subject cannot be read
    /// yields `AuthenticationInvalid`.
    pub fn resolve(&self, signals: &CredentialSignals) -> Result<Resolution, ChatError> {
        if let Some(token) = signals.bearer.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let claims = self.verifier.verify(token).map_err(|e| match e {
                CredentialError::MalformedClaim(reason) => ChatError::AuthenticationInvalid(reason),
                other => {
                    debug!(error = %other, "Credential rejected");
                    ChatError::AuthenticationRequired
                }
            })?;

            let user_id = claims.sub.trim();
            if user_id.is_empty() {
                return Err(ChatError::AuthenticationInvalid(
                    "subject claim is empty".to_string(),
                ));
            }
            return Ok(Resolution {
                identity: Identity::authenticated(user_id),
                issued_guest: None,
            });
        }

        if let Some(guest_id) = signals
            .guest_token
            .as_deref()
            .and_then(|t| t.parse::<GuestId>().ok())
        {
            return Ok(Resolution {
                identity: Identity::guest(guest_id),
                issued_guest: None,
            });
        }

        let guest_id = GuestId::new();
        debug!(%guest_id, "Issuing new guest id");
        Ok(Resolution {
            identity: Identity::guest(guest_id),
            issued_guest: Some(GuestTokenIssue {
                guest_id,
                ttl: self.guest_ttl,
            }),
        })
    }
}
