//! Spherical (web) Mercator projection.
//!
//! Features are stored in projected meters (EPSG:3857). Screen positions are
//! derived from those through the viewport at the current zoom, with 256 px
//! tiles at zoom 0.

use charitymap_core::types::Coordinate;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sphere radius used by web Mercator, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which Mercator diverges; inputs are clamped to it.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Tile edge in pixels at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Half the projected world width in meters.
const HALF_WORLD_M: f64 = PI * EARTH_RADIUS_M;

/// A point in projected meters or in pixels, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Projects a coordinate into web Mercator meters.
pub fn project(coordinate: &Coordinate) -> Point {
    let lat = coordinate.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin_lat = lat.to_radians().sin();

    Point::new(
        EARTH_RADIUS_M * coordinate.longitude.to_radians(),
        EARTH_RADIUS_M * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / 2.0,
    )
}

/// Inverse of [`project`].
pub fn unproject(point: &Point) -> Coordinate {
    Coordinate::new(
        (2.0 * (point.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees(),
        (point.x / EARTH_RADIUS_M).to_degrees(),
    )
}

/// World width in pixels at `zoom`.
#[inline]
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2_f64.powf(zoom)
}

/// Projected meters per screen pixel at `zoom`.
#[inline]
pub fn resolution(zoom: f64) -> f64 {
    2.0 * HALF_WORLD_M / world_size(zoom)
}

/// Ground meters per pixel at `latitude`, for the scale control.
pub fn ground_resolution(latitude: f64, zoom: f64) -> f64 {
    resolution(zoom) * latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().cos()
}
