//! Stored authentication state.
//!
//! The token and user object are written by the login flow, which lives
//! outside the map core. We only read them. A missing file is not an error:
//! requests simply go out without an `Authorization` header and the backend
//! decides what to do.

use crate::error::{ConfigError, ParseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Token and user object persisted by the login flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Bearer token sent as `Authorization: Bearer <token>`
    #[serde(default)]
    pub token: Option<String>,

    /// Opaque user object, kept as-is
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

impl StoredCredentials {
    /// Credentials carrying only a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    /// Loads credentials from a JSON file. A missing file yields empty
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No stored credentials");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_json(&contents)
    }

    /// Parses credentials from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let credentials: Self = serde_json::from_str(json).map_err(ParseError::from)?;
        Ok(credentials)
    }

    /// The token, if present and non-empty.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Display name of the stored user, if the object carries one.
    pub fn user_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        user.get("full_name")
            .or_else(|| user.get("name"))
            .and_then(|v| v.as_str())
    }
}
