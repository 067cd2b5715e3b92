//! Identity resolution: who is calling, member or guest.

pub mod resolver;

use helpdesk_types::error::CredentialError;
use helpdesk_types::identity::CredentialClaims;

/// Port for validating an authenticated credential.
///
/// Implementations live in helpdesk-infra (e.g., `JwtCredentialVerifier`).
/// Verification is pure: no network or storage access.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<CredentialClaims, CredentialError>;
}
