//! Marker iconography.
//!
//! Status picks the fill color, category picks the glyph, and search emphasis
//! adds an outer ring and a larger radius. Styles are plain data; whatever
//! draws the map interprets them.

use charitymap_core::types::{ProjectCategory, ProjectStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);

    /// `#RRGGBB` form.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Symbol drawn inside a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    /// Volunteer: raised hand
    Hand,
    /// Donation: gift box
    Gift,
    /// Fundraising: coin stack
    Coins,
    /// Community: group of people
    People,
    /// Other: star
    Star,
    /// User location: filled dot
    Dot,
}

impl Glyph {
    pub fn for_category(category: ProjectCategory) -> Self {
        match category {
            ProjectCategory::Volunteer => Glyph::Hand,
            ProjectCategory::Donation => Glyph::Gift,
            ProjectCategory::Fundraising => Glyph::Coins,
            ProjectCategory::Community => Glyph::People,
            ProjectCategory::Other => Glyph::Star,
        }
    }
}

/// Fill color for a status.
pub fn status_color(status: ProjectStatus) -> Rgb {
    match status {
        ProjectStatus::Pending => Rgb(0xFF, 0x98, 0x00),
        ProjectStatus::InProgress => Rgb(0x4C, 0xAF, 0x50),
        ProjectStatus::Completed => Rgb(0x21, 0x96, 0xF3),
        ProjectStatus::OnHold => Rgb(0xFF, 0x57, 0x22),
        ProjectStatus::Cancelled => Rgb(0xF4, 0x43, 0x36),
        ProjectStatus::Unknown => Rgb(0x9E, 0x9E, 0x9E),
    }
}

const MARKER_RADIUS: f64 = 12.0;
const EMPHASIS_RADIUS: f64 = 16.0;
const RING_COLOR: Rgb = Rgb(0xFF, 0xD6, 0x00);
const USER_LOCATION_FILL: Rgb = Rgb(0x42, 0x85, 0xF4);

/// How one marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub fill: Rgb,
    pub stroke: Rgb,
    pub stroke_width: f64,
    pub glyph: Glyph,
    /// Outer emphasis ring
    pub ring: Option<Rgb>,
    /// Radius in pixels; also the hit-test radius
    pub radius: f64,
}

impl MarkerStyle {
    /// Style for a project marker.
    pub fn for_project(category: ProjectCategory, status: ProjectStatus, emphasis: bool) -> Self {
        Self {
            fill: status_color(status),
            stroke: Rgb::WHITE,
            stroke_width: if emphasis { 3.0 } else { 2.0 },
            glyph: Glyph::for_category(category),
            ring: emphasis.then_some(RING_COLOR),
            radius: if emphasis { EMPHASIS_RADIUS } else { MARKER_RADIUS },
        }
    }

    /// Fixed style of the user location marker.
    pub fn user_location() -> Self {
        Self {
            fill: USER_LOCATION_FILL,
            stroke: Rgb::WHITE,
            stroke_width: 3.0,
            glyph: Glyph::Dot,
            ring: Some(Rgb(0xBB, 0xDE, 0xFB)),
            radius: 8.0,
        }
    }

    #[inline]
    pub fn has_ring(&self) -> bool {
        self.ring.is_some()
    }
}
