//! Session capability with providers selected from configuration

pub mod token;

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{AppError, Result};

pub use token::{SessionClaims, TokenSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub loading: bool,
    pub does_session_exist: bool,
}

pub trait SessionProvider: Send + Sync {
    fn state(&self, bearer: Option<&str>) -> SessionState;

    fn logout(&self, bearer: Option<&str>);
}

/// Always signed in. Used when the deployment has no auth provider.
#[derive(Debug, Clone, Default)]
pub struct StaticSession;

impl SessionProvider for StaticSession {
    fn state(&self, _bearer: Option<&str>) -> SessionState {
        SessionState {
            loading: false,
            does_session_exist: true,
        }
    }

    fn logout(&self, _bearer: Option<&str>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Open,
    Token,
}

impl std::str::FromStr for SessionMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(SessionMode::Open),
            "token" => Ok(SessionMode::Token),
            other => Err(AppError::Other(anyhow::anyhow!("Unknown session mode: {}", other))),
        }
    }
}

pub fn provider_from_config(config: &SessionConfig) -> Result<Arc<dyn SessionProvider>> {
    match config.mode.parse::<SessionMode>()? {
        SessionMode::Open => Ok(Arc::new(StaticSession)),
        SessionMode::Token => Ok(Arc::new(TokenSession::new(&config.token_secret)?)),
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}
