//! Error types for the CharityMap project map.
//!
//! Every I/O failure in the map core is caught where the request is made and
//! converted into local state (an empty list, a search error message, a
//! location error message). These types are what gets converted. All of them
//! are serializable so a front end can render them as it sees fit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using CharityMapError as the error type.
pub type Result<T> = std::result::Result<T, CharityMapError>;

/// Top-level error type for all CharityMap operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum CharityMapError {
    /// Backend REST API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Device location errors
    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Parsing and deserialization errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors talking to the backend REST API.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The backend answered with a non-2xx status
    #[error("Request to {url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not the expected JSON shape
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The configured base URL cannot be used
    #[error("Invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a status error.
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code, if the backend answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the backend rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }
}

/// Failure to obtain the device position.
///
/// The first three variants mirror the geolocation error codes devices report
/// (1, 2, 3); anything else is `Unavailable`.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    /// The user refused location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// The device could not determine a position
    #[error("Position unavailable")]
    PositionUnavailable,

    /// No position within the configured timeout
    #[error("Location request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Geolocation is not supported or failed for another reason
    #[error("Geolocation unavailable: {reason}")]
    Unavailable { reason: String },
}

impl GeolocationError {
    /// Classifies a numeric device error code.
    pub fn from_code(code: u16, timeout_ms: u64) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout { timeout_ms },
            other => Self::Unavailable {
                reason: format!("unrecognized error code {}", other),
            },
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Message shown in the dismissable location error indicator.
    pub fn user_message(&self) -> String {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access denied. Please enable location permissions to find nearby projects."
                    .to_string()
            }
            GeolocationError::PositionUnavailable => {
                "Location information is unavailable. Please try again later.".to_string()
            }
            GeolocationError::Timeout { .. } => {
                "Location request timed out. Please try again.".to_string()
            }
            GeolocationError::Unavailable { .. } => {
                "Unable to retrieve your location. Geolocation may not be supported.".to_string()
            }
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to parsing stored or received data.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParseError {
    /// Failed to parse JSON data
    #[error("JSON parse error at line {line}, column {column}: {message}")]
    JsonError {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
