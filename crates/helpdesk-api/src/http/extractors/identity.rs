//! Caller identity extractor.
//!
//! Reads the credential signals of a request and resolves them through the
//! core [`IdentityResolver`](helpdesk_core::identity::resolver::IdentityResolver):
//! - `Authorization: Bearer <jwt>` header, else the credential cookie
//! - the guest cookie
//!
//! When the resolver mints a guest id, the extractor carries a
//! [`GuestCookie`] that handlers put in their response so the browser keeps
//! the id for later requests.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use helpdesk_core::identity::resolver::{CredentialSignals, GuestTokenIssue};
use helpdesk_types::config::AuthConfig;
use helpdesk_types::identity::Identity;

use crate::http::error::AppError;
use crate::state::AppState;

/// Cookie names and attributes for identity tokens.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub credential_cookie: String,
    pub guest_cookie: String,
    pub secure: bool,
}

impl From<&AuthConfig> for CookiePolicy {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            credential_cookie: auth.credential_cookie.clone(),
            guest_cookie: auth.guest_cookie.clone(),
            secure: auth.secure_cookies,
        }
    }
}

impl CookiePolicy {
    /// `Set-Cookie` value for a freshly issued guest id.
    pub fn guest_set_cookie(&self, issue: &GuestTokenIssue) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
            self.guest_cookie,
            issue.guest_id,
            issue.ttl.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn signals(&self, headers: &HeaderMap) -> CredentialSignals {
        CredentialSignals {
            bearer: bearer_token(headers)
                .or_else(|| extract_cookie_value(headers, &self.credential_cookie)),
            guest_token: extract_cookie_value(headers, &self.guest_cookie),
        }
    }
}

/// The resolved caller of a request.
pub struct Caller {
    pub identity: Identity,
    pub guest_cookie: GuestCookie,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let signals = state.cookies.signals(&parts.headers);
        let resolution = state.resolver.resolve(&signals)?;

        let guest_cookie = GuestCookie(
            resolution
                .issued_guest
                .map(|issue| state.cookies.guest_set_cookie(&issue)),
        );

        Ok(Caller {
            identity: resolution.identity,
            guest_cookie,
        })
    }
}

/// Optional `Set-Cookie` for a newly minted guest id.
#[derive(Debug, Default)]
pub struct GuestCookie(pub Option<String>);

impl IntoResponseParts for GuestCookie {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(value) = self.0.and_then(|c| HeaderValue::from_str(&c).ok()) {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Ok(res)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn extract_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|part| part.strip_prefix(&prefix).map(str::to_string))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_types::identity::GuestId;
    use std::time::Duration;

    fn policy() -> CookiePolicy {
        CookiePolicy::from(&AuthConfig::default())
    }

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_header_preferred_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "access_token=from-cookie; guest_id=g"),
        ]);
        let signals = policy().signals(&h);
        assert_eq!(signals.bearer.as_deref(), Some("from-header"));
        assert_eq!(signals.guest_token.as_deref(), Some("g"));
    }

    #[test]
    fn test_credential_cookie_fallback() {
        let h = headers(&[(header::COOKIE, "theme=dark; access_token=tok")]);
        assert_eq!(policy().signals(&h).bearer.as_deref(), Some("tok"));
    }

    #[test]
    fn test_cookies_across_multiple_headers() {
        let h = headers(&[
            (header::COOKIE, "theme=dark"),
            (header::COOKIE, "guest_id=abc"),
        ]);
        let signals = policy().signals(&h);
        assert!(signals.bearer.is_none());
        assert_eq!(signals.guest_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_non_bearer_authorization_ignored() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert!(policy().signals(&h).bearer.is_none());
    }

    #[test]
    fn test_guest_set_cookie_attributes() {
        let guest_id = GuestId::new();
        let issue = GuestTokenIssue {
            guest_id,
            ttl: Duration::from_secs(3600),
        };
        let cookie = policy().guest_set_cookie(&issue);
        assert_eq!(
            cookie,
            format!("guest_id={guest_id}; Path=/; HttpOnly; SameSite=Strict; Max-Age=3600")
        );

        let secure = CookiePolicy {
            secure: true,
            ..policy()
        };
        assert!(secure.guest_set_cookie(&issue).ends_with("; Secure"));
    }
}
