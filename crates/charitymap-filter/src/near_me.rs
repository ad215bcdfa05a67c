//! Near-Me search: which projects lie within a radius of the user, nearest
//! first.

use crate::rules::RadiusFilter;
use charitymap_core::config::NearMeConfig;
use charitymap_core::types::{Coordinate, Project};
use metrics::counter;
use std::cmp::Ordering;
use tracing::debug;

/// Allowed radius range in kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusBounds {
    pub min_km: f64,
    pub max_km: f64,
}

impl Default for RadiusBounds {
    fn default() -> Self {
        Self {
            min_km: 0.1,
            max_km: 1000.0,
        }
    }
}

impl RadiusBounds {
    pub fn new(min_km: f64, max_km: f64) -> Self {
        Self { min_km, max_km }
    }

    /// Clamps a requested radius into range. Non-finite input is rejected.
    pub fn clamp(&self, radius_km: f64) -> Option<f64> {
        radius_km
            .is_finite()
            .then(|| radius_km.clamp(self.min_km, self.max_km))
    }
}

/// Filters `candidates` to located projects within `radius_km` of `origin`
/// (inclusive), each annotated with its distance, sorted nearest first.
///
/// Pure: the same inputs always produce the same output.
pub fn find_nearby(candidates: &[Project], origin: Coordinate, radius_km: f64) -> Vec<Project> {
    let rule = RadiusFilter::new(origin, radius_km);
    let mut nearby: Vec<Project> = candidates
        .iter()
        .filter_map(|project| {
            let distance = rule.distance_to(project)?;
            (distance <= rule.radius_km).then(|| {
                let mut annotated = project.clone();
                annotated.distance = Some(distance);
                annotated
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });

    nearby
}

/// State of the Near-Me mode.
#[derive(Debug, Clone)]
pub struct NearMeState {
    active: bool,
    radius_km: f64,
    bounds: RadiusBounds,
    results: Vec<Project>,
}

impl Default for NearMeState {
    fn default() -> Self {
        Self::new(&NearMeConfig::default())
    }
}

impl NearMeState {
    pub fn new(config: &NearMeConfig) -> Self {
        let bounds = RadiusBounds::new(config.min_radius_km, config.max_radius_km);
        Self {
            active: false,
            radius_km: bounds
                .clamp(config.default_radius_km)
                .unwrap_or(bounds.min_km),
            bounds,
            results: Vec::new(),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn bounds(&self) -> RadiusBounds {
        self.bounds
    }

    pub fn results(&self) -> &[Project] {
        &self.results
    }

    /// Updates the radius, clamped into bounds. Returns true if it changed.
    pub fn set_radius(&mut self, radius_km: f64) -> bool {
        match self.bounds.clamp(radius_km) {
            Some(clamped) if clamped != self.radius_km => {
                self.radius_km = clamped;
                true
            }
            _ => false,
        }
    }

    /// Runs the search against `candidates` and enters Near-Me mode.
    pub fn run(&mut self, candidates: &[Project], origin: Coordinate) -> &[Project] {
        self.results = find_nearby(candidates, origin, self.radius_km);
        self.active = true;
        counter!("charitymap_near_me_searches_total").increment(1);
        debug!(
            candidates = candidates.len(),
            matches = self.results.len(),
            radius_km = self.radius_km,
            "Near-Me search complete"
        );
        &self.results
    }

    /// Leaves Near-Me mode and drops results. The radius is kept.
    pub fn clear(&mut self) {
        self.active = false;
        self.results.clear();
    }
}
