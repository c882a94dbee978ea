//! JWT issuance and validation.
//!
//! Tokens are HS256-signed with the shared secret from `[jwt]` and carry the
//! username and role of the principal. They are never stored server-side by
//! the API; validity is purely signature + issuer + audience + expiry.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::credentials::{CredentialVerifier, Principal, Role};
use crate::config::JwtConfig;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Display name (username)
    pub name: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
    credentials: Arc<dyn CredentialVerifier>,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig, credentials: Arc<dyn CredentialVerifier>) -> Self {
        let secret = config.secret_key.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::minutes(config.expiry_minutes),
            credentials,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verify the credential pair and mint a token valid for the configured
    /// lifetime starting now.
    pub async fn issue(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let principal = self
            .credentials
            .verify(username, password)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        self.issue_at(&principal, Utc::now())
    }

    /// Mint a token for an already-verified principal as of `now`.
    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.username.clone(),
            name: principal.username.clone(),
            role: principal.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check signature, issuer, audience and expiry (no leeway).
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

/// Read the `exp` claim without verifying the signature.
///
/// Only for clients that hold a token they cannot verify (the web tier uses
/// it to bound session lifetime). Never use the result for authorization.
pub fn unverified_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryOnly>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Utc.timestamp_opt(data.claims.exp, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            issuer: "catalog-api".to_string(),
            audience: "catalog-clients".to_string(),
            secret_key: "test-secret-key-that-is-at-least-32-bytes".to_string(),
            expiry_minutes: 30,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            &test_jwt_config(),
            Arc::new(StaticCredentials::new("admin", "password", Role::Admin)),
        )
    }

    #[tokio::test]
    async fn test_issue_with_valid_credentials() {
        let issuer = issuer();
        let token = issuer.issue("admin", "password").await.unwrap();
        let claims = issuer.validate(&token).unwrap();

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.name, "admin");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "catalog-api");
        assert_eq!(claims.aud, "catalog-clients");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[tokio::test]
    async fn test_issue_with_invalid_credentials() {
        let issuer = issuer();
        assert_eq!(
            issuer.issue("admin", "nope").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            issuer.issue("nobody", "password").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::minutes(31);
        let token = issuer
            .issue_at(&Principal::new("admin", Role::Admin), issued)
            .unwrap();

        assert_eq!(issuer.validate(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_token_valid_just_before_expiry() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::minutes(29);
        let token = issuer
            .issue_at(&Principal::new("admin", Role::Admin), issued)
            .unwrap();

        assert!(issuer.validate(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer()
            .issue_at(&Principal::new("admin", Role::Admin), Utc::now())
            .unwrap();

        let mut other = test_jwt_config();
        other.secret_key = "a-completely-different-secret-key-value".to_string();
        let other = TokenIssuer::new(
            &other,
            Arc::new(StaticCredentials::new("admin", "password", Role::Admin)),
        );

        assert_eq!(other.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let token = issuer()
            .issue_at(&Principal::new("admin", Role::Admin), Utc::now())
            .unwrap();

        let mut other = test_jwt_config();
        other.audience = "someone-else".to_string();
        let other = TokenIssuer::new(
            &other,
            Arc::new(StaticCredentials::new("admin", "password", Role::Admin)),
        );

        assert_eq!(other.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(issuer().validate("not.a.jwt"), Err(AuthError::InvalidToken));
        assert_eq!(issuer().validate(""), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_unverified_expiry() {
        let now = Utc::now();
        let token = issuer()
            .issue_at(&Principal::new("admin", Role::Admin), now)
            .unwrap();

        let exp = unverified_expiry(&token).unwrap();
        assert_eq!(exp.timestamp(), (now + Duration::minutes(30)).timestamp());
        assert!(unverified_expiry("garbage").is_none());
    }
}
