//! Access Tokens
//!
//! HS256 JWTs carried as bearer credentials. The token is self-contained:
//! verification needs only the shared secret, no store lookup.

use chrono::{Duration, Utc};
use http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Primary header, checked first.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed or its signature does not match")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    pub email: String,
    /// Role id as stored in the users table
    pub role: i16,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued token and its expiry (unix seconds).
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: i64,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime: std::time::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: Duration::from_std(lifetime).unwrap_or(Duration::hours(24)),
        }
    }

    pub fn issue(&self, subject: Uuid, email: &str, role: i16) -> Result<AccessToken, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(AccessToken {
            token,
            expires_at: claims.exp,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Pull the raw token out of the request headers.
///
/// `x-access-token` wins over `Authorization`; a leading `Bearer ` is
/// stripped from either. Empty values count as absent.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(ACCESS_TOKEN_HEADER)
        .or_else(|| headers.get(http::header::AUTHORIZATION))?
        .to_str()
        .ok()?
        .trim_start();

    let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-test-secret-test-sec", std::time::Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let user = Uuid::new_v4();
        let issued = service.issue(user, "ana@example.com", 2).unwrap();

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, 2);
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issued = service().issue(Uuid::new_v4(), "a@b.pe", 1).unwrap();
        let other = TokenService::new(b"another-secret", std::time::Duration::from_secs(3600));
        assert!(matches!(other.verify(&issued.token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token() {
        let service = service();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.pe".into(),
            role: 1,
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(service().verify("not.a.jwt"), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_extract_prefers_access_token_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static("abc"));
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer xyz"),
        );
        assert_eq!(extract_access_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_strips_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer xyz"),
        );
        assert_eq!(extract_access_token(&headers).as_deref(), Some("xyz"));

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_access_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_missing_or_empty() {
        assert!(extract_access_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_access_token(&headers).is_none());
    }
}
