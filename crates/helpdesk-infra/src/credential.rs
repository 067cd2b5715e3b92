//! HS256 bearer credential verification.
//!
//! The identity provider signs credentials with a shared secret; this module
//! only checks them. [`JwtCredentialVerifier::issue`] exists for the
//! `helpdesk token` development command and for tests.
//!
//! The secret is held as a [`SecretString`] and is only exposed while
//! building the signing keys.

use chrono::Utc;
use helpdesk_core::identity::CredentialVerifier;
use helpdesk_types::error::CredentialError;
use helpdesk_types::identity::CredentialClaims;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

pub struct JwtCredentialVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCredentialVerifier {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 30;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Sign a credential for `user_id` valid for `ttl`.
    pub fn issue(
        &self,
        user_id: &str,
        role: Option<String>,
        org: Option<i64>,
        ttl: chrono::Duration,
    ) -> Result<String, CredentialError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| CredentialError::Invalid(format!("lifetime {ttl} is out of range")))?;
        let claims = CredentialClaims {
            sub: user_id.to_string(),
            role,
            org,
            exp: expires.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CredentialError::Invalid(e.to_string()))
    }
}

impl CredentialVerifier for JwtCredentialVerifier {
    fn verify(&self, token: &str) -> Result<CredentialClaims, CredentialError> {
        decode::<CredentialClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                ErrorKind::Json(inner) => CredentialError::MalformedClaim(inner.to_string()),
                ErrorKind::MissingRequiredClaim(claim) => {
                    CredentialError::MalformedClaim(format!("missing claim `{claim}`"))
                }
                _ => CredentialError::Invalid(e.to_string()),
            })
    }
}
