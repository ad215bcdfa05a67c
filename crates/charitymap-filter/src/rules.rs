//! Eligibility rules for projects.
//!
//! The marker renderer's eligibility check is `PositionFilter` together with
//! the `VisibilitySet`; the Near-Me search adds a `RadiusFilter`.

use crate::geo::haversine_distance;
use charitymap_core::types::{Coordinate, Project};

/// Result of a filter evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Project passes the filter
    Pass,
    /// Project is blocked by the filter
    Block,
}

impl FilterResult {
    /// Check if the result is Pass
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, FilterResult::Pass)
    }

    /// Check if the result is Block
    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, FilterResult::Block)
    }
}

impl From<bool> for FilterResult {
    #[inline]
    fn from(pass: bool) -> Self {
        if pass {
            FilterResult::Pass
        } else {
            FilterResult::Block
        }
    }
}

/// Trait for filter rules
pub trait FilterRule: Send + Sync {
    /// Evaluate the filter against a project
    fn evaluate(&self, project: &Project) -> FilterResult;

    /// Get a human-readable description of this filter
    fn describe(&self) -> String;
}

/// Passes projects whose latitude and longitude are both present and finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionFilter;

impl FilterRule for PositionFilter {
    #[inline]
    fn evaluate(&self, project: &Project) -> FilterResult {
        project.has_position().into()
    }

    fn describe(&self) -> String {
        "PositionFilter".to_string()
    }
}

/// Passes located projects within `radius_km` of `center` (inclusive).
#[derive(Debug, Clone, Copy)]
pub struct RadiusFilter {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl RadiusFilter {
    pub fn new(center: Coordinate, radius_km: f64) -> Self {
        Self { center, radius_km }
    }

    /// Distance from the center, or `None` for an unlocated project.
    #[inline]
    pub fn distance_to(&self, project: &Project) -> Option<f64> {
        project
            .position()
            .map(|p| haversine_distance(&self.center, &p))
    }
}

impl FilterRule for RadiusFilter {
    #[inline]
    fn evaluate(&self, project: &Project) -> FilterResult {
        self.distance_to(project)
            .is_some_and(|d| d <= self.radius_km)
            .into()
    }

    fn describe(&self) -> String {
        format!(
            "RadiusFilter(center: {}, radius: {:.1}km)",
            self.center, self.radius_km
        )
    }
}
