//! Geospatial filtering for the CharityMap project map
//!
//! This crate decides which projects the map draws:
//!
//! - Haversine great-circle distance and bounding boxes
//! - Eligibility rules (position, radius)
//! - The legend `VisibilitySet` of status and category toggles
//! - The Near-Me search, nearest first within a clamped radius
//! - Active dataset precedence (Near-Me > search > full list)
//! - Legend counts for the active dataset
//!
//! Everything here is pure and synchronous; I/O lives in `charitymap-client`.
//!
//! # Examples
//!
//! ```rust
//! use charitymap_core::types::{Coordinate, Project, ProjectCategory, ProjectStatus};
//! use charitymap_filter::{find_nearby, ActiveDataset, NearMeState, VisibilitySet};
//!
//! let projects = vec![
//!     Project::new(1, "Borehole", ProjectStatus::Completed, ProjectCategory::Donation)
//!         .at(-1.29, 36.77),
//! ];
//!
//! let nearby = find_nearby(&projects, Coordinate::new(-1.30, 36.78), 5.0);
//! assert_eq!(nearby.len(), 1);
//!
//! let near_me = NearMeState::default();
//! let active = ActiveDataset::select(&near_me, &[], &projects);
//! assert_eq!(active.eligible(&VisibilitySet::default()).count(), 1);
//! ```

pub mod dataset;
pub mod geo;
pub mod legend;
pub mod near_me;
pub mod rules;
pub mod visibility;

// Re-export commonly used types
pub use dataset::{candidate_pool, ActiveDataset, DatasetSource};
pub use geo::{haversine_distance, BoundingBox, EARTH_RADIUS_KM};
pub use legend::{Legend, LegendEntry, NearMeSummary};
pub use near_me::{find_nearby, NearMeState, RadiusBounds};
pub use rules::{FilterResult, FilterRule, PositionFilter, RadiusFilter};
pub use visibility::VisibilitySet;
