//! # charitymap-map
//!
//! Headless map core for CharityMap: viewport and base layers, marker
//! features with status and category iconography, hover and click handling,
//! and the [`CharityMap`] coordinator that ties them to the project list,
//! search, and Near-Me state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use charitymap_client::{FixedLocationProvider, StaticProjectSource};
//! use charitymap_core::config::AppConfig;
//! use charitymap_map::CharityMap;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let source = Arc::new(StaticProjectSource::default());
//! let locator = Arc::new(FixedLocationProvider::default());
//!
//! let mut map = CharityMap::new(&AppConfig::default(), source, locator);
//! map.mount();
//! map.load_projects().await;
//! println!("{} markers", map.surface().markers().map(|m| m.len()).unwrap_or(0));
//! # }
//! ```

pub mod controller;
pub mod interaction;
pub mod panel;
pub mod projection;
pub mod renderer;
pub mod style;
pub mod surface;

// Re-export commonly used types
pub use controller::CharityMap;
pub use interaction::{Cursor, InteractionState, Tooltip};
pub use panel::{DetailField, DetailPanel, DetailTab};
pub use projection::Point;
pub use renderer::{build_features, Feature, FeatureId, FeatureKind, MarkerLayer, SyncReport};
pub use style::{Glyph, MarkerStyle, Rgb};
pub use surface::{BaseLayer, MapControl, MapSurface, ScaleBar, SurfaceError, ViewTransition, Viewport};
