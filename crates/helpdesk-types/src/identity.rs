//! Caller identity types.
//!
//! Every request resolves to exactly one [`Identity`]: a registered member
//! whose id comes from a verified bearer credential, or an anonymous guest
//! whose id lives in a short-lived client-held token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Stable identifier of a registered member, taken from the credential's
/// `sub` claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-minted identifier of an anonymous guest.
///
/// Guest ids are never looked up against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(pub Uuid);

impl GuestId {
    /// Mint a fresh random guest id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GuestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// The resolved caller of a request.
///
/// Components branch on this with exhaustive `match`es; there is no
/// third variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Authenticated { user_id: UserId },
    Guest { guest_id: GuestId },
}

impl Identity {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Identity::Authenticated {
            user_id: UserId::new(user_id),
        }
    }

    pub fn guest(guest_id: GuestId) -> Self {
        Identity::Guest { guest_id }
    }

    /// The member id, if this caller is authenticated.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Identity::Authenticated { user_id } => Some(user_id),
            Identity::Guest { .. } => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Authenticated { user_id } => write!(f, "user:{user_id}"),
            Identity::Guest { guest_id } => write!(f, "guest:{guest_id}"),
        }
    }
}

/// Claims carried by a verified bearer credential.
///
/// The identity provider issues these; this service only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Member id.
    pub sub: String,
    /// Role name assigned by the identity provider (e.g. "member", "admin").
    #[serde(default)]
    pub role: Option<String>,
    /// Organization the member belongs to, if any.
    #[serde(default)]
    pub org: Option<i64>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: usize,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_id_parse_roundtrip() {
        let id = GuestId::new();
        let parsed: GuestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_guest_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<GuestId>().is_err());
    }

    #[test]
    fn test_identity_user_id() {
        let member = Identity::authenticated("u-42");
        assert_eq!(member.user_id().map(UserId::as_str), Some("u-42"));
        assert!(!member.is_guest());

        let guest = Identity::guest(GuestId::new());
        assert!(guest.user_id().is_none());
        assert!(guest.is_guest());
    }

    #[test]
    fn test_identity_serde_tagged() {
        let member = Identity::authenticated("u-1");
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["kind"], "authenticated");
        assert_eq!(json["user_id"], "u-1");
    }

    #[test]
    fn test_claims_optional_fields_default() {
        let claims: CredentialClaims =
            serde_json::from_str(r#"{"sub":"7","exp":1700000000}"#).unwrap();
        assert_eq!(claims.sub, "7");
        assert!(claims.role.is_none());
        assert!(claims.org.is_none());
        assert_eq!(claims.iat, 0);
    }
}
