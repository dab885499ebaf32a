//! Stateless signed bearer tokens (HS256).
//! A token carries subject id, display name, role, issuer, audience and
//! expiry. There is no revocation list: a token stays valid until its expiry
//! even if the account changes server-side within the validity window.

use anyhow::{Result, anyhow};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::storage::User;
use super::principal::{Principal, Role};

/// Claim set encoded into every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature did not verify")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token issuer or audience mismatch")]
    InvalidIssuerOrAudience,
    #[error("token malformed or missing required claims")]
    Malformed,
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "token_expired",
            TokenError::InvalidIssuerOrAudience => "invalid_issuer_or_audience",
            TokenError::Malformed => "malformed_token",
        }
    }
}

impl From<TokenError> for crate::error::AppError {
    fn from(e: TokenError) -> Self {
        crate::error::AppError::unauthenticated(e.code(), "invalid or expired token")
    }
}

/// Issues and validates identity tokens with a symmetric key shared across
/// the process. Stateless; configured once at startup.
pub struct TokenService {
    enc: EncodingKey,
    dec: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(cfg: &Config) -> Self {
        Self::with_parts(&cfg.token_key, &cfg.issuer, &cfg.audience, cfg.token_ttl_secs)
    }

    pub fn with_parts(key: &str, issuer: &str, audience: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        Self {
            enc: EncodingKey::from_secret(key.as_bytes()),
            dec: DecodingKey::from_secret(key.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl_secs,
        }
    }

    /// Encode a signed token for the given user, expiring after the
    /// configured validity window.
    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims {
            sub: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: Utc::now().timestamp() + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.enc)
            .map_err(|e| anyhow!("token encoding failed: {e}"))
    }

    /// Verify signature, expiry, issuer and audience, and reconstruct the
    /// caller identity.
    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        let data = decode::<Claims>(token, &self.dec, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::InvalidIssuerOrAudience,
            _ => TokenError::Malformed,
        })?;
        Ok(Principal {
            user_id: data.claims.sub,
            display_name: data.claims.name,
            role: data.claims.role,
        })
    }
}
