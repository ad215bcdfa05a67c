//! Map surface: the viewport, base layers, and the marker overlay.
//!
//! The surface is an explicit state container with a create/use/dispose
//! lifecycle. Before [`MapSurface::init`] (and after [`MapSurface::dispose`])
//! there is no viewport, and every viewport operation returns
//! [`SurfaceError::Detached`].

use crate::projection::{self, Point};
use crate::renderer::{Feature, MarkerLayer};
use charitymap_core::config::{MapConfig, TileSourceConfig};
use charitymap_core::types::Coordinate;
use charitymap_filter::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Map surface is not initialized")]
    Detached,
}

/// The three mutually exclusive raster base layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseLayer {
    #[default]
    Default,
    Satellite,
    Terrain,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Default, BaseLayer::Satellite, BaseLayer::Terrain];
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseLayer::Default => write!(f, "street"),
            BaseLayer::Satellite => write!(f, "satellite"),
            BaseLayer::Terrain => write!(f, "terrain"),
        }
    }
}

/// Controls attached at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapControl {
    Zoom,
    Scale,
}

/// Center, zoom, and pixel size of the visible map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Screen pixel (origin top-left) of a projected point.
    pub fn to_screen(&self, projected: &Point) -> Point {
        let center = projection::project(&self.center);
        let resolution = projection::resolution(self.zoom);
        Point::new(
            f64::from(self.width) / 2.0 + (projected.x - center.x) / resolution,
            f64::from(self.height) / 2.0 - (projected.y - center.y) / resolution,
        )
    }

    /// Projected point under a screen pixel.
    pub fn from_screen(&self, screen: &Point) -> Point {
        let center = projection::project(&self.center);
        let resolution = projection::resolution(self.zoom);
        Point::new(
            center.x + (screen.x - f64::from(self.width) / 2.0) * resolution,
            center.y - (screen.y - f64::from(self.height) / 2.0) * resolution,
        )
    }

    /// Geographic coordinate under a screen pixel.
    pub fn coordinate_at(&self, screen: &Point) -> Coordinate {
        projection::unproject(&self.from_screen(screen))
    }
}

/// A viewport change, recorded so a renderer can animate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransition {
    pub from: Viewport,
    pub to: Viewport,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Scale control readout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBar {
    pub meters_per_pixel: f64,
}

#[derive(Debug)]
struct MapInstance {
    viewport: Viewport,
    base_layer: BaseLayer,
    controls: Vec<MapControl>,
    markers: MarkerLayer,
    marker_layer_visible: bool,
    tile_error: bool,
    last_transition: Option<ViewTransition>,
}

/// Owner of the single map instance.
#[derive(Debug)]
pub struct MapSurface {
    config: MapConfig,
    instance: Option<MapInstance>,
}

impl MapSurface {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            instance: None,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Creates the map at the default view. Returns false (and changes
    /// nothing) if a map already exists.
    pub fn init(&mut self) -> bool {
        if self.instance.is_some() {
            debug!("Map already initialized");
            return false;
        }

        self.instance = Some(MapInstance {
            viewport: self.default_viewport(),
            base_layer: BaseLayer::Default,
            controls: vec![MapControl::Zoom, MapControl::Scale],
            markers: MarkerLayer::default(),
            marker_layer_visible: true,
            tile_error: false,
            last_transition: None,
        });
        info!(
            center = %self.config.default_center,
            zoom = self.config.default_zoom,
            "Map initialized"
        );
        true
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.instance.is_some()
    }

    /// Releases the map instance so a later `init` starts clean.
    pub fn dispose(&mut self) {
        if self.instance.take().is_some() {
            info!("Map disposed");
        }
    }

    fn instance(&self) -> Result<&MapInstance, SurfaceError> {
        self.instance.as_ref().ok_or(SurfaceError::Detached)
    }

    fn instance_mut(&mut self) -> Result<&mut MapInstance, SurfaceError> {
        self.instance.as_mut().ok_or(SurfaceError::Detached)
    }

    fn default_viewport(&self) -> Viewport {
        Viewport {
            center: self.config.default_center,
            zoom: self.config.default_zoom,
            width: self.config.viewport_width,
            height: self.config.viewport_height,
        }
    }

    pub fn viewport(&self) -> Result<Viewport, SurfaceError> {
        Ok(self.instance()?.viewport)
    }

    pub fn controls(&self) -> Result<&[MapControl], SurfaceError> {
        Ok(&self.instance()?.controls)
    }

    // ---- Base layers ----

    pub fn base_layer(&self) -> Result<BaseLayer, SurfaceError> {
        Ok(self.instance()?.base_layer)
    }

    /// Shows `layer` and hides the other two. The marker layer is untouched.
    pub fn set_base_layer(&mut self, layer: BaseLayer) -> Result<(), SurfaceError> {
        let instance = self.instance_mut()?;
        if instance.base_layer != layer {
            debug!(from = %instance.base_layer, to = %layer, "Switching base layer");
            instance.base_layer = layer;
        }
        Ok(())
    }

    pub fn is_layer_visible(&self, layer: BaseLayer) -> Result<bool, SurfaceError> {
        Ok(self.instance()?.base_layer == layer)
    }

    pub fn tile_source(&self, layer: BaseLayer) -> &TileSourceConfig {
        match layer {
            BaseLayer::Default => &self.config.base_layers.default,
            BaseLayer::Satellite => &self.config.base_layers.satellite,
            BaseLayer::Terrain => &self.config.base_layers.terrain,
        }
    }

    /// Records that a base tile failed to load. Nothing is retried here.
    pub fn report_tile_error(&mut self) -> Result<(), SurfaceError> {
        self.instance_mut()?.tile_error = true;
        Ok(())
    }

    pub fn tile_error(&self) -> bool {
        self.instance.as_ref().is_some_and(|i| i.tile_error)
    }

    // ---- Marker overlay ----

    pub fn set_marker_layer_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        self.instance_mut()?.marker_layer_visible = visible;
        Ok(())
    }

    pub fn is_marker_layer_visible(&self) -> bool {
        self.instance.as_ref().is_some_and(|i| i.marker_layer_visible)
    }

    pub fn markers(&self) -> Result<&MarkerLayer, SurfaceError> {
        Ok(&self.instance()?.markers)
    }

    pub(crate) fn markers_mut(&mut self) -> Result<&mut MarkerLayer, SurfaceError> {
        Ok(&mut self.instance_mut()?.markers)
    }

    /// Topmost interactive feature under a screen pixel. Nothing is hit while
    /// the marker layer is hidden.
    pub fn hit_test(&self, screen: Point) -> Option<&Feature> {
        let instance = self.instance.as_ref()?;
        if !instance.marker_layer_visible {
            return None;
        }
        instance.markers.hit_test(&instance.viewport, &screen)
    }

    // ---- Viewport changes ----

    pub fn last_transition(&self) -> Option<ViewTransition> {
        self.instance.as_ref().and_then(|i| i.last_transition)
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    fn move_to(&mut self, center: Coordinate, zoom: f64, animate: bool) -> Result<(), SurfaceError> {
        let zoom = self.clamp_zoom(zoom);
        let duration = if animate {
            self.config.animation()
        } else {
            Duration::ZERO
        };

        let instance = self.instance_mut()?;
        let from = instance.viewport;
        let to = Viewport {
            center,
            zoom,
            ..from
        };
        instance.viewport = to;
        instance.last_transition = Some(ViewTransition { from, to, duration });
        debug!(center = %center, zoom, animated = animate, "Viewport moved");
        Ok(())
    }

    pub fn center_on(&mut self, center: Coordinate, zoom: f64, animate: bool) -> Result<(), SurfaceError> {
        self.move_to(center, zoom, animate)
    }

    /// Back to the configured default center and zoom.
    pub fn reset_view(&mut self) -> Result<(), SurfaceError> {
        let center = self.config.default_center;
        let zoom = self.config.default_zoom;
        self.move_to(center, zoom, true)
    }

    /// Fits `extent` inside the viewport less the configured padding, no
    /// closer than `fit_max_zoom`, animated.
    pub fn fit_extent(&mut self, extent: &BoundingBox) -> Result<(), SurfaceError> {
        let viewport = self.viewport()?;
        let south_west = projection::project(&Coordinate::new(extent.min_lat, extent.min_lon));
        let north_east = projection::project(&Coordinate::new(extent.max_lat, extent.max_lon));

        let padding = self.config.fit_padding_px * 2.0;
        let usable_w = (f64::from(viewport.width) - padding).max(1.0);
        let usable_h = (f64::from(viewport.height) - padding).max(1.0);

        // Extent size in pixels at zoom 0
        let res0 = projection::resolution(0.0);
        let extent_w = (north_east.x - south_west.x).abs() / res0;
        let extent_h = (north_east.y - south_west.y).abs() / res0;

        let fit_zoom = [usable_w / extent_w, usable_h / extent_h]
            .into_iter()
            .filter(|ratio| ratio.is_finite())
            .fold(f64::INFINITY, f64::min)
            .log2();
        let zoom = if fit_zoom.is_finite() {
            fit_zoom.min(self.config.fit_max_zoom)
        } else {
            self.config.fit_max_zoom
        };

        let center = projection::unproject(&Point::new(
            (south_west.x + north_east.x) / 2.0,
            (south_west.y + north_east.y) / 2.0,
        ));

        self.move_to(center, zoom, true)
    }

    // ---- Controls ----

    pub fn zoom_in(&mut self) -> Result<(), SurfaceError> {
        let viewport = self.viewport()?;
        self.move_to(viewport.center, viewport.zoom + 1.0, true)
    }

    pub fn zoom_out(&mut self) -> Result<(), SurfaceError> {
        let viewport = self.viewport()?;
        self.move_to(viewport.center, viewport.zoom - 1.0, true)
    }

    pub fn scale_bar(&self) -> Result<ScaleBar, SurfaceError> {
        let viewport = self.viewport()?;
        Ok(ScaleBar {
            meters_per_pixel: projection::ground_resolution(viewport.center.latitude, viewport.zoom),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> MapSurface {
        let mut surface = MapSurface::new(MapConfig::default());
        assert!(surface.init());
        surface
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut surface = surface();
        surface.set_base_layer(BaseLayer::Terrain).unwrap();
        assert!(!surface.init());
        assert_eq!(surface.base_layer().unwrap(), BaseLayer::Terrain);
    }

    #[test]
    fn test_default_view_and_controls() {
        let surface = surface();
        let viewport = surface.viewport().unwrap();
        assert_eq!(viewport.center, Coordinate::new(-1.2921, 36.7758));
        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(surface.controls().unwrap(), &[MapControl::Zoom, MapControl::Scale]);
    }

    #[test]
    fn test_dispose_then_reinit() {
        let mut surface = surface();
        surface.center_on(Coordinate::new(0.0, 0.0), 3.0, false).unwrap();
        surface.dispose();

        assert!(!surface.is_initialized());
        assert_eq!(surface.viewport(), Err(SurfaceError::Detached));
        assert!(surface.hit_test(Point::new(0.0, 0.0)).is_none());

        assert!(surface.init());
        assert_eq!(surface.viewport().unwrap().zoom, 10.0);
    }

    #[test]
    fn test_base_layers_mutually_exclusive() {
        let mut surface = surface();
        for selected in BaseLayer::ALL {
            surface.set_base_layer(selected).unwrap();
            let visible: Vec<_> = BaseLayer::ALL
                .into_iter()
                .filter(|l| surface.is_layer_visible(*l).unwrap())
                .collect();
            assert_eq!(visible, vec![selected]);
            assert!(surface.is_marker_layer_visible());
        }
    }

    #[test]
    fn test_tile_sources() {
        let surface = surface();
        assert_eq!(surface.tile_source(BaseLayer::Satellite).max_zoom, 20);
        assert_eq!(surface.tile_source(BaseLayer::Terrain).max_zoom, 24);
        assert_eq!(surface.tile_source(BaseLayer::Default).preload, 4);
    }

    #[test]
    fn test_tile_error_flag() {
        let mut surface = surface();
        assert!(!surface.tile_error());
        surface.report_tile_error().unwrap();
        assert!(surface.tile_error());
    }

    #[test]
    fn test_screen_round_trip() {
        let surface = surface();
        let viewport = surface.viewport().unwrap();

        let center = viewport.to_screen(&projection::project(&viewport.center));
        assert!((center.x - 640.0).abs() < 1e-6);
        assert!((center.y - 400.0).abs() < 1e-6);

        let c = viewport.coordinate_at(&Point::new(100.0, 700.0));
        let back = viewport.to_screen(&projection::project(&c));
        assert!((back.x - 100.0).abs() < 1e-6);
        assert!((back.y - 700.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_extent_keeps_padding() {
        let mut surface = surface();
        let extent = BoundingBox::new(-1.40, -1.20, 36.70, 36.90);
        surface.fit_extent(&extent).unwrap();

        let viewport = surface.viewport().unwrap();
        let sw = viewport.to_screen(&projection::project(&Coordinate::new(-1.40, 36.70)));
        let ne = viewport.to_screen(&projection::project(&Coordinate::new(-1.20, 36.90)));

        for p in [sw, ne] {
            assert!(p.x >= 50.0 - 1e-6 && p.x <= 1230.0 + 1e-6);
            assert!(p.y >= 50.0 - 1e-6 && p.y <= 750.0 + 1e-6);
        }
        // Height is the tight dimension for a square extent in a wide viewport
        assert!(((sw.y - ne.y) - 700.0).abs() < 1e-3);

        let transition = surface.last_transition().unwrap();
        assert_eq!(transition.duration, Duration::from_millis(1000));
    }

    #[test]
    fn test_fit_extent_caps_zoom() {
        let mut surface = surface();
        let extent = BoundingBox::new(-1.2921, -1.2920, 36.7758, 36.7759);
        surface.fit_extent(&extent).unwrap();
        assert_eq!(surface.viewport().unwrap().zoom, 16.0);

        let point = BoundingBox::new(-1.0, -1.0, 36.0, 36.0);
        surface.fit_extent(&point).unwrap();
        assert_eq!(surface.viewport().unwrap().zoom, 16.0);
    }

    #[test]
    fn test_zoom_controls_clamped() {
        let mut surface = surface();
        surface.center_on(Coordinate::new(0.0, 0.0), 24.0, false).unwrap();
        surface.zoom_in().unwrap();
        assert_eq!(surface.viewport().unwrap().zoom, 24.0);

        surface.zoom_out().unwrap();
        assert_eq!(surface.viewport().unwrap().zoom, 23.0);
        assert!(surface.scale_bar().unwrap().meters_per_pixel > 0.0);
    }
}
