use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    /// Token id, the handle used to revoke the session on logout.
    pub jti: Uuid,
}

impl SessionClaims {
    /// Seconds until expiry, zero once expired.
    pub fn remaining_seconds(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

/// Body accepted by the token issuing route.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token is malformed or its signature does not match")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
    #[error("session lifetime of {0} seconds is out of range")]
    Lifetime(u64),
}

/// Signs and verifies HS256 session tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiration_seconds: u64) -> Result<Self, AuthError> {
        let ttl = i64::try_from(expiration_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or(AuthError::Lifetime(expiration_seconds))?;
        Ok(Self::with_ttl(secret, ttl))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Encoding("session expiry is out of range".into()))?;
        let claims = SessionClaims {
            email: email.to_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        Self::decode_with(token, &self.decoding, &self.validation)
    }

    /// Checks the signature only. Logout uses this to find the token id of a session
    /// that may already have expired.
    pub fn inspect(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self::decode_with(token, &self.decoding, &validation)
    }

    fn decode_with(token: &str, key: &DecodingKey, validation: &Validation) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, key, validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }
}
