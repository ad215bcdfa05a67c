//! Great-circle geometry.
//!
//! The Near-Me radius is a hard cutoff, so distances use the full haversine
//! formula on a spherical Earth rather than any flat-earth shortcut.

use charitymap_core::types::Coordinate;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometers.
///
/// ```
/// use charitymap_core::types::Coordinate;
/// use charitymap_filter::geo::haversine_distance;
///
/// let origin = Coordinate::new(0.0, 0.0);
/// let quarter = Coordinate::new(0.0, 90.0);
/// assert!((haversine_distance(&origin, &quarter) - 10007.5).abs() < 0.1);
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Axis-aligned lon/lat bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Smallest box containing every coordinate, or `None` for an empty input.
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        coordinates.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => Self::new(c.latitude, c.latitude, c.longitude, c.longitude),
                Some(b) => Self::new(
                    b.min_lat.min(c.latitude),
                    b.max_lat.max(c.latitude),
                    b.min_lon.min(c.longitude),
                    b.max_lon.max(c.longitude),
                ),
            })
        })
    }

    /// Check if coordinates are within the bounding box
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Center of the box.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// True when the box collapses to a single point.
    pub fn is_point(&self) -> bool {
        self.min_lat == self.max_lat && self.min_lon == self.max_lon
    }
}
