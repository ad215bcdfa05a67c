//! Hover tooltips and click-to-detail.

use crate::panel::DetailPanel;
use crate::projection::Point;
use crate::surface::MapSurface;
use serde::Serialize;

/// Tooltip offset from the pointer, in pixels.
const TOOLTIP_OFFSET: Point = Point { x: 10.0, y: -10.0 };

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub text: String,
    /// Screen position of the tooltip's top-left corner
    pub anchor: Point,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    tooltip: Option<Tooltip>,
    cursor: Cursor,
}

impl InteractionState {
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Shows the project name next to the pointer when it is over a project
    /// marker, otherwise hides the tooltip.
    pub fn pointer_move(&mut self, surface: &MapSurface, at: Point) {
        match surface.hit_test(at).and_then(|f| f.as_project()) {
            Some(project) => {
                self.tooltip = Some(Tooltip {
                    text: project.name.clone(),
                    anchor: Point::new(at.x + TOOLTIP_OFFSET.x, at.y + TOOLTIP_OFFSET.y),
                });
                self.cursor = Cursor::Pointer;
            }
            None => self.pointer_leave(),
        }
    }

    pub fn pointer_leave(&mut self) {
        self.tooltip = None;
        self.cursor = Cursor::Default;
    }

    /// Opens `panel` on the project under `at`. Returns false, leaving the
    /// panel untouched, when no project is hit.
    pub fn click(&self, surface: &MapSurface, at: Point, panel: &mut DetailPanel) -> bool {
        match surface.hit_test(at).and_then(|f| f.as_project()) {
            Some(project) => {
                panel.open(project.clone());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection;
    use crate::renderer::Feature;
    use charitymap_core::config::MapConfig;
    use charitymap_core::types::{Coordinate, Project, ProjectCategory, ProjectStatus, UserLocation};

    fn surface_with(features: Vec<Feature>) -> MapSurface {
        let mut surface = MapSurface::new(MapConfig::default());
        surface.init();
        surface.markers_mut().unwrap().sync(features);
        surface
    }

    fn screen_of(surface: &MapSurface, c: Coordinate) -> Point {
        surface.viewport().unwrap().to_screen(&projection::project(&c))
    }

    fn well() -> Project {
        Project::new(5, "Village Well", ProjectStatus::Pending, ProjectCategory::Donation)
            .at(-1.2921, 36.7758)
    }

    #[test]
    fn test_hover_shows_tooltip() {
        let surface = surface_with(vec![Feature::project(&well(), false).unwrap()]);
        let at = screen_of(&surface, Coordinate::new(-1.2921, 36.7758));

        let mut state = InteractionState::default();
        state.pointer_move(&surface, at);
        assert_eq!(state.cursor(), Cursor::Pointer);
        assert_eq!(state.tooltip().unwrap().text, "Village Well");

        state.pointer_move(&surface, Point::new(at.x + 100.0, at.y));
        assert!(state.tooltip().is_none());
        assert_eq!(state.cursor(), Cursor::Default);
    }

    #[test]
    fn test_leave_hides_tooltip() {
        let surface = surface_with(vec![Feature::project(&well(), false).unwrap()]);
        let at = screen_of(&surface, Coordinate::new(-1.2921, 36.7758));

        let mut state = InteractionState::default();
        state.pointer_move(&surface, at);
        state.pointer_leave();
        assert!(state.tooltip().is_none());
    }

    #[test]
    fn test_user_location_not_interactive() {
        let location = UserLocation::new(-1.2921, 36.7758);
        let surface = surface_with(vec![Feature::user_location(&location)]);
        let at = screen_of(&surface, location.coordinate());

        let mut state = InteractionState::default();
        state.pointer_move(&surface, at);
        assert!(state.tooltip().is_none());

        let mut panel = DetailPanel::default();
        assert!(!state.click(&surface, at, &mut panel));
        assert!(!panel.is_open());
    }

    #[test]
    fn test_click_opens_panel_and_miss_keeps_it() {
        let surface = surface_with(vec![Feature::project(&well(), false).unwrap()]);
        let at = screen_of(&surface, Coordinate::new(-1.2921, 36.7758));
        let state = InteractionState::default();
        let mut panel = DetailPanel::default();

        assert!(state.click(&surface, at, &mut panel));
        assert_eq!(panel.selected().unwrap().name, "Village Well");

        assert!(!state.click(&surface, Point::new(0.0, 0.0), &mut panel));
        assert!(panel.is_open(), "empty-space clicks leave the panel alone");
    }

    #[test]
    fn test_hidden_marker_layer_is_not_hit() {
        let mut surface = surface_with(vec![Feature::project(&well(), false).unwrap()]);
        surface.set_marker_layer_visible(false).unwrap();
        let at = screen_of(&surface, Coordinate::new(-1.2921, 36.7758));

        let mut state = InteractionState::default();
        state.pointer_move(&surface, at);
        assert!(state.tooltip().is_none());
    }
}
