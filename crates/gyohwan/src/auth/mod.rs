//! Session tokens handed out after a student proves possession of their UUID.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Mint/check capability the exchange service relies on for identity.
pub trait TokenService: Send + Sync {
    /// Issue a bearer token whose subject is the student's UUID.
    fn issue(&self, subject: &str) -> Result<String, TokenError>;
    /// Return the subject of a valid, unexpired token.
    fn verify(&self, token: &str) -> Result<String, TokenError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token could not be signed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0} minutes is out of range")]
    InvalidLifetime(i64),
    #[error("token expiry falls outside the representable time range")]
    ExpiryOverflow,
}

/// HS256 tokens signed with the configured secret.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        let ttl = Duration::try_minutes(config.token_ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(TokenError::InvalidLifetime(config.token_ttl_minutes))?;
        let secret = config.token_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOverflow)?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(TokenError::Invalid)?;
        Ok(data.claims.sub)
    }
}

/// Extract the credential from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
