//! # CharityMap Core
//!
//! Core types, error handling, and configuration for the CharityMap project map.
//!
//! This crate provides the foundational building blocks shared by every other
//! CharityMap crate:
//!
//! - **Types**: `Project`, its `ProjectStatus` and `ProjectCategory`
//!   classification, `Coordinate` and `UserLocation`.
//! - **Errors**: error types using `thiserror` for every failure mode the map
//!   core converts into local state (API, geolocation, configuration, parsing).
//! - **Configuration**: YAML files with environment variable overrides and
//!   validation.
//! - **Credentials**: the stored bearer token and user object.
//!
//! ## Example
//!
//! ```
//! use charitymap_core::types::{Project, ProjectStatus};
//!
//! let json = r#"{"id": 1, "name": "Borehole", "latitude": "-1.29", "longitude": 36.77,
//!                "status": "completed", "category": "donation"}"#;
//! let project: Project = serde_json::from_str(json).unwrap();
//!
//! assert_eq!(project.status, ProjectStatus::Completed);
//! assert!(project.position().is_some());
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use credentials::StoredCredentials;
pub use error::{ApiError, CharityMapError, GeolocationError, Result};
pub use types::{
    Coordinate, Project, ProjectCategory, ProjectId, ProjectStatus, UserLocation,
};
