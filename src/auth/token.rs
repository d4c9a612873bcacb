//! Signed identity tokens.
//!
//! Access and refresh tokens are HS256 JWTs signed with one process-wide
//! secret. Access tokens carry `role` and `nickname`; refresh tokens carry
//! only the subject and timestamps.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;

pub const ROLE_CLAIM: &str = "role";
pub const NICKNAME_CLAIM: &str = "nickname";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("token decoding failed: {0}")]
    Decode(jsonwebtoken::errors::Error),

    #[error("claim `{0}` is missing")]
    MissingClaim(String),

    #[error("token lifetime out of range: {0}")]
    Lifetime(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl Claims {
    fn new(subject: &str, ttl: Duration) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Lifetime(format!("{} seconds", ttl.num_seconds())))?;

        Ok(Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            role: None,
            nickname: None,
        })
    }
}

/// Issues and parses tokens. Immutable once built; share it behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Builds the codec from settings. Lifetimes must be positive.
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        let access_ttl = Duration::try_minutes(config.access_token_ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                TokenError::Lifetime(format!(
                    "access_token_ttl_minutes = {}",
                    config.access_token_ttl_minutes
                ))
            })?;
        let refresh_ttl = Duration::try_days(config.refresh_token_ttl_days)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                TokenError::Lifetime(format!(
                    "refresh_token_ttl_days = {}",
                    config.refresh_token_ttl_days
                ))
            })?;

        Ok(Self::new(&config.jwt_secret, access_ttl, refresh_ttl))
    }

    pub fn issue_access_token(
        &self,
        email: &str,
        role: &str,
        nickname: &str,
    ) -> Result<String, TokenError> {
        let mut claims = Claims::new(email, self.access_ttl)?;
        claims.role = Some(role.to_string());
        claims.nickname = Some(nickname.to_string());
        self.sign(&claims)
    }

    pub fn issue_refresh_token(&self, email: &str) -> Result<String, TokenError> {
        self.sign(&Claims::new(email, self.refresh_ttl)?)
    }

    /// True only for a well-formed, correctly signed, unexpired token.
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match decode::<Claims>(token, &self.decoding_key, &self.validation(true)) {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "token validation failed");
                false
            }
        }
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation(true))
            .map_err(TokenError::Decode)?;
        Ok(data.claims.sub)
    }

    /// Reads a string claim. Expiry is ignored, the signature is not.
    pub fn extract_claim(&self, token: &str, name: &str) -> Result<String, TokenError> {
        let data = decode::<HashMap<String, serde_json::Value>>(
            token,
            &self.decoding_key,
            &self.validation(false),
        )
        .map_err(TokenError::Decode)?;

        data.claims
            .get(name)
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| TokenError::MissingClaim(name.to_string()))
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    fn validation(&self, check_expiry: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = check_expiry;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::hours(1), Duration::days(7))
    }

    fn expired_codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::seconds(-30), Duration::seconds(-30))
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = codec();
        let token = codec.issue_access_token("a@x.com", "ROLE_USER", "alice").unwrap();

        assert!(codec.validate(&token));
        assert_eq!(codec.extract_subject(&token).unwrap(), "a@x.com");
        assert_eq!(codec.extract_claim(&token, ROLE_CLAIM).unwrap(), "ROLE_USER");
        assert_eq!(codec.extract_claim(&token, NICKNAME_CLAIM).unwrap(), "alice");
    }

    #[test]
    fn test_access_token_lifetime() {
        let codec = codec();
        let token = codec.issue_access_token("a@x.com", "ROLE_USER", "alice").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let data = decode::<Claims>(&token, &codec.decoding_key, &codec.validation(true)).unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
    }

    #[test]
    fn test_refresh_token_has_no_profile_claims() {
        let codec = codec();
        let token = codec.issue_refresh_token("a@x.com").unwrap();

        assert!(codec.validate(&token));
        assert_eq!(codec.extract_subject(&token).unwrap(), "a@x.com");
        assert!(matches!(
            codec.extract_claim(&token, ROLE_CLAIM),
            Err(TokenError::MissingClaim(_))
        ));

        let data = decode::<Claims>(&token, &codec.decoding_key, &codec.validation(true)).unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let codec = codec();
        let first = codec.issue_refresh_token("a@x.com").unwrap();
        let second = codec.issue_refresh_token("a@x.com").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token_is_invalid_but_claims_readable() {
        let codec = expired_codec();
        let token = codec.issue_access_token("a@x.com", "ROLE_ADMIN", "alice").unwrap();

        assert!(!codec.validate(&token));
        assert!(codec.extract_subject(&token).is_err());
        assert_eq!(codec.extract_claim(&token, ROLE_CLAIM).unwrap(), "ROLE_ADMIN");
        assert_eq!(codec.extract_claim(&token, NICKNAME_CLAIM).unwrap(), "alice");
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenCodec::new("another-secret", Duration::hours(1), Duration::days(7));
        let token = other.issue_access_token("a@x.com", "ROLE_USER", "alice").unwrap();
        let codec = codec();

        assert!(!codec.validate(&token));
        assert!(matches!(codec.extract_subject(&token), Err(TokenError::Decode(_))));
        // Expired-claim reads still demand our signature.
        assert!(matches!(codec.extract_claim(&token, ROLE_CLAIM), Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_malformed_input_is_invalid() {
        let codec = codec();
        assert!(!codec.validate(""));
        assert!(!codec.validate("not-a-token"));
        assert!(!codec.validate("a.b.c"));
        assert!(codec.extract_subject("garbage").is_err());
    }

    fn auth_config(access_minutes: i64, refresh_days: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            access_token_ttl_minutes: access_minutes,
            refresh_token_ttl_days: refresh_days,
        }
    }

    #[test]
    fn test_from_config_rejects_bad_lifetimes() {
        assert!(TokenCodec::from_config(&auth_config(60, 7)).is_ok());
        assert!(matches!(
            TokenCodec::from_config(&auth_config(-5, 7)),
            Err(TokenError::Lifetime(_))
        ));
        assert!(matches!(
            TokenCodec::from_config(&auth_config(60, 0)),
            Err(TokenError::Lifetime(_))
        ));
        assert!(matches!(
            TokenCodec::from_config(&auth_config(i64::MAX, 7)),
            Err(TokenError::Lifetime(_))
        ));
    }

    #[test]
    fn test_overflowing_expiry_is_an_error() {
        let codec = TokenCodec::from_config(&auth_config(60, 1_000_000_000)).unwrap();

        assert!(codec.issue_access_token("a@x.com", "ROLE_USER", "alice").is_ok());
        assert!(matches!(
            codec.issue_refresh_token("a@x.com"),
            Err(TokenError::Lifetime(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let token = codec.issue_access_token("a@x.com", "ROLE_USER", "alice").unwrap();
        let other = codec.issue_access_token("b@x.com", "ROLE_ADMIN", "bob").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(!codec.validate(&forged));
    }
}
