use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{SessionProvider, SessionState};
use crate::error::{AppError, Result};

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Session backed by HS256 bearer tokens.
pub struct TokenSession {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSession {
    pub fn new(secret: &str) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Other(anyhow::anyhow!(
                "Session token secret must be at least {} characters long",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        })
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to issue session token: {}", e).into())
    }

    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

impl SessionProvider for TokenSession {
    fn state(&self, bearer: Option<&str>) -> SessionState {
        SessionState {
            loading: false,
            does_session_exist: bearer.and_then(|token| self.verify(token)).is_some(),
        }
    }

    fn logout(&self, bearer: Option<&str>) {
        match bearer.and_then(|token| self.verify(token)) {
            Some(claims) => tracing::info!(subject = %claims.sub, "session logged out"),
            None => tracing::debug!("logout without a valid session"),
        }
    }
}
