//! The `CharityMap` coordinator.
//!
//! Owns every piece of map state and is the only place that decides when the
//! overlay is resynchronized: after each mutation of the project list, search
//! results, visibility toggles, Near-Me state, or user location. All I/O
//! failures land in local state (`search_error`, `location_error`, the list
//! fetcher's last error) and never propagate to the caller.

use crate::interaction::{Cursor, InteractionState, Tooltip};
use crate::panel::{DetailPanel, DetailTab};
use crate::projection::Point;
use crate::renderer::{build_features, SyncReport};
use crate::surface::{BaseLayer, MapSurface, SurfaceError};
use charitymap_client::{
    DataFetcher, GeolocationService, LocationProvider, PositionOptions, ProjectSource,
    SearchColumn, SearchOutcome, SearchQuery, SearchScheduler,
};
use charitymap_core::config::AppConfig;
use charitymap_core::error::{ApiError, GeolocationError};
use charitymap_core::types::{Coordinate, Project, ProjectCategory, ProjectStatus, UserLocation};
use charitymap_filter::{
    candidate_pool, ActiveDataset, BoundingBox, DatasetSource, Legend, NearMeState, VisibilitySet,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CharityMap {
    surface: MapSurface,
    fetcher: DataFetcher,
    search: SearchScheduler,
    geolocation: GeolocationService,

    projects: Vec<Project>,
    search_query: SearchQuery,
    search_results: Vec<Project>,
    search_error: Option<ApiError>,

    visibility: VisibilitySet,
    near_me: NearMeState,
    user_location: Option<UserLocation>,
    location_error: Option<GeolocationError>,
    pending_center: Option<Coordinate>,

    interaction: InteractionState,
    panel: DetailPanel,
    last_sync: SyncReport,
}

impl CharityMap {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn ProjectSource>,
        locator: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            surface: MapSurface::new(config.map.clone()),
            fetcher: DataFetcher::new(Arc::clone(&source)),
            search: SearchScheduler::new(source, config.search.debounce()),
            geolocation: GeolocationService::new(
                locator,
                PositionOptions::from(&config.geolocation),
            ),
            projects: Vec::new(),
            search_query: SearchQuery::new("", SearchColumn::All),
            search_results: Vec::new(),
            search_error: None,
            visibility: VisibilitySet::default(),
            near_me: NearMeState::new(&config.near_me),
            user_location: None,
            location_error: None,
            pending_center: None,
            interaction: InteractionState::default(),
            panel: DetailPanel::default(),
            last_sync: SyncReport::default(),
        }
    }

    // ---- Lifecycle ----

    /// Creates the map (once) and draws the current state.
    pub fn mount(&mut self) {
        if self.surface.init() {
            self.sync();
        }
    }

    /// Tears the map down and drops any search still waiting on the debounce
    /// timer. State survives; a later `mount` redraws it.
    pub fn unmount(&mut self) {
        self.search.cancel();
        self.interaction.pointer_leave();
        self.surface.dispose();
    }

    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn set_base_layer(&mut self, layer: BaseLayer) -> Result<(), SurfaceError> {
        self.surface.set_base_layer(layer)
    }

    pub fn set_marker_layer_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        self.surface.set_marker_layer_visible(visible)
    }

    // ---- Synchronization ----

    /// Recomputes the feature set and reconciles the overlay, then applies a
    /// queued center request. Does nothing while unmounted.
    fn sync(&mut self) {
        let active = ActiveDataset::select(&self.near_me, &self.search_results, &self.projects);
        let features = build_features(&active, &self.visibility, self.user_location.as_ref());

        let markers = match self.surface.markers_mut() {
            Ok(markers) => markers,
            Err(_) => {
                debug!("Map not mounted, skipping marker sync");
                return;
            }
        };
        self.last_sync = markers.sync(features);

        if let Some(target) = self.pending_center.take() {
            let zoom = self.surface.config().focus_zoom;
            if let Err(e) = self.surface.center_on(target, zoom, true) {
                warn!(error = %e, "Failed to apply center request");
            }
        }
    }

    pub fn last_sync(&self) -> SyncReport {
        self.last_sync
    }

    pub fn active_source(&self) -> DatasetSource {
        ActiveDataset::select(&self.near_me, &self.search_results, &self.projects).source
    }

    pub fn legend(&self) -> Legend {
        let active = ActiveDataset::select(&self.near_me, &self.search_results, &self.projects);
        Legend::compute(&active, &self.visibility, &self.near_me)
    }

    // ---- Project list ----

    /// Loads the full project list. On failure the list is empty and the
    /// error is available from [`CharityMap::list_error`].
    pub async fn load_projects(&mut self) -> usize {
        self.projects = self.fetcher.load_all().await;
        self.sync();
        self.projects.len()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }

    pub fn list_error(&self) -> Option<ApiError> {
        self.fetcher.last_error()
    }

    // ---- Search ----

    /// Updates the search box. A blank query clears the search immediately;
    /// anything else is sent after the debounce window unless superseded.
    /// Returns the sequence number of the scheduled request.
    pub fn set_search_query(&mut self, text: impl Into<String>, column: SearchColumn) -> Option<u64> {
        self.search_query = SearchQuery::new(text, column);

        if self.search_query.is_blank() {
            self.search.cancel();
            let had_results = !self.search_results.is_empty();
            self.search_results.clear();
            self.search_error = None;
            if had_results {
                self.sync();
            }
            return None;
        }

        Some(self.search.schedule(self.search_query.clone()))
    }

    pub fn search_query(&self) -> &SearchQuery {
        &self.search_query
    }

    pub fn search_results(&self) -> &[Project] {
        &self.search_results
    }

    pub fn search_error(&self) -> Option<&ApiError> {
        self.search_error.as_ref()
    }

    pub fn dismiss_search_error(&mut self) {
        self.search_error = None;
    }

    /// Applies a completed search. Stale outcomes are dropped; returns
    /// whether this one was applied.
    pub fn apply_search_outcome(&mut self, outcome: SearchOutcome) -> bool {
        if !self.search.is_current(&outcome) {
            return false;
        }

        match outcome.result {
            Ok(results) => {
                info!(query = %outcome.query.term(), count = results.len(), "Search results applied");
                self.search_results = results;
                self.search_error = None;
                self.sync();
                if !self.search_results.is_empty() {
                    self.fit_to_search_results();
                }
            }
            Err(e) => {
                warn!(query = %outcome.query.term(), error = %e, "Search failed");
                self.search_results.clear();
                self.search_error = Some(e);
                self.sync();
            }
        }
        true
    }

    /// Applies every search that has completed so far. Returns how many were
    /// applied.
    pub fn poll_search(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.search.try_recv() {
            if self.apply_search_outcome(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next completed search and applies it.
    pub async fn next_search_outcome(&mut self) -> Option<bool> {
        let outcome = self.search.recv().await?;
        Some(self.apply_search_outcome(outcome))
    }

    /// Single result: center on it. Several: fit their bounding box.
    fn fit_to_search_results(&mut self) {
        let located: Vec<Coordinate> = self
            .search_results
            .iter()
            .filter_map(Project::position)
            .collect();

        let result = match located.as_slice() {
            [] => return,
            [single] => {
                let zoom = self.surface.config().single_result_zoom;
                self.surface.center_on(*single, zoom, true)
            }
            many => match BoundingBox::from_coordinates(many.iter()) {
                Some(extent) => self.surface.fit_extent(&extent),
                None => return,
            },
        };

        if let Err(e) = result {
            debug!(error = %e, "Skipping auto-fit");
        }
    }

    // ---- Visibility ----

    pub fn visibility(&self) -> &VisibilitySet {
        &self.visibility
    }

    pub fn toggle_status(&mut self, status: ProjectStatus) -> bool {
        let visible = self.visibility.toggle_status(status);
        self.sync();
        visible
    }

    pub fn toggle_category(&mut self, category: ProjectCategory) -> bool {
        let visible = self.visibility.toggle_category(category);
        self.sync();
        visible
    }

    pub fn select_all(&mut self) {
        self.visibility.select_all();
        self.sync();
    }

    pub fn deselect_all(&mut self) {
        self.visibility.deselect_all();
        self.sync();
    }

    // ---- Location and Near-Me ----

    pub fn user_location(&self) -> Option<&UserLocation> {
        self.user_location.as_ref()
    }

    pub fn location_error(&self) -> Option<&GeolocationError> {
        self.location_error.as_ref()
    }

    pub fn dismiss_location_error(&mut self) {
        self.location_error = None;
    }

    /// Acquires the device position, replacing any previous one.
    pub async fn locate_user(&mut self) -> Result<UserLocation, GeolocationError> {
        match self.geolocation.locate().await {
            Ok(location) => {
                self.user_location = Some(location);
                self.location_error = None;
                self.sync();
                Ok(location)
            }
            Err(e) => {
                self.location_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn near_me(&self) -> &NearMeState {
        &self.near_me
    }

    /// Runs Near-Me around the held location, acquiring one first if needed.
    /// Returns false, without entering Near-Me mode, if no location could be
    /// obtained.
    pub async fn find_near_me(&mut self) -> bool {
        let origin = match self.user_location {
            Some(location) => location,
            None => match self.locate_user().await {
                Ok(location) => location,
                Err(_) => return false,
            },
        };

        self.near_me.run(
            candidate_pool(&self.search_results, &self.projects),
            origin.coordinate(),
        );
        self.sync();
        true
    }

    /// Changes the radius. While Near-Me is active the search reruns around
    /// the held location. Returns whether the radius changed.
    pub fn set_radius(&mut self, radius_km: f64) -> bool {
        if !self.near_me.set_radius(radius_km) {
            return false;
        }

        if let (true, Some(location)) = (self.near_me.is_active(), self.user_location) {
            self.near_me.run(
                candidate_pool(&self.search_results, &self.projects),
                location.coordinate(),
            );
            self.sync();
        }
        true
    }

    /// Leaves Near-Me mode, forgets the location, and recenters the map.
    pub fn clear_near_me(&mut self) {
        self.near_me.clear();
        self.user_location = None;
        self.location_error = None;
        if let Err(e) = self.surface.reset_view() {
            debug!(error = %e, "Skipping recenter");
        }
        self.sync();
    }

    // ---- Inbound navigation ----

    /// Queues a one-shot "center on" instruction, applied on the next sync
    /// (immediately when mounted).
    pub fn request_center(&mut self, target: Coordinate) {
        self.pending_center = Some(target);
        if self.surface.is_initialized() {
            self.sync();
        }
    }

    pub fn pending_center(&self) -> Option<Coordinate> {
        self.pending_center
    }

    // ---- Interaction ----

    pub fn pointer_move(&mut self, at: Point) {
        self.interaction.pointer_move(&self.surface, at);
    }

    pub fn pointer_leave(&mut self) {
        self.interaction.pointer_leave();
    }

    pub fn click(&mut self, at: Point) -> bool {
        self.interaction.click(&self.surface, at, &mut self.panel)
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.interaction.tooltip()
    }

    pub fn cursor(&self) -> Cursor {
        self.interaction.cursor()
    }

    pub fn panel(&self) -> &DetailPanel {
        &self.panel
    }

    pub fn select_detail_tab(&mut self, tab: DetailTab) {
        self.panel.select_tab(tab);
    }

    pub fn close_panel(&mut self) {
        self.panel.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection;
    use async_trait::async_trait;
    use charitymap_client::{FixedLocationProvider, StaticProjectSource};
    use std::time::Duration;

    fn projects() -> Vec<Project> {
        let mut clinic = Project::new(1, "Kibera Clinic", ProjectStatus::Completed, ProjectCategory::Donation)
            .at(-1.29, 36.77);
        clinic.county = Some("Nairobi".to_string());
        vec![
            clinic,
            Project::new(2, "Mombasa Well", ProjectStatus::Pending, ProjectCategory::Volunteer)
                .at(-4.04, 39.66),
            Project::new(3, "Kisumu School", ProjectStatus::InProgress, ProjectCategory::Community)
                .at(-0.09, 34.77),
            Project::new(4, "Unplaced", ProjectStatus::Pending, ProjectCategory::Other),
        ]
    }

    fn map_with(location: Option<Coordinate>) -> CharityMap {
        let source = Arc::new(StaticProjectSource::new(projects()));
        let locator = Arc::new(FixedLocationProvider::new(location));
        let mut map = CharityMap::new(&AppConfig::default(), source, locator);
        map.mount();
        map
    }

    #[tokio::test]
    async fn test_load_draws_located_projects() {
        let mut map = map_with(None);
        assert_eq!(map.load_projects().await, 4);

        let markers = map.surface().markers().unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(map.last_sync().added, 3);
        assert_eq!(map.active_source(), DatasetSource::All);
    }

    #[tokio::test]
    async fn test_toggle_hides_marker() {
        let mut map = map_with(None);
        map.load_projects().await;

        assert!(!map.toggle_status(ProjectStatus::Completed));
        assert_eq!(map.surface().markers().unwrap().len(), 2);
        assert_eq!(map.legend().status(ProjectStatus::Completed).unwrap().visible, 0);

        map.deselect_all();
        assert!(map.surface().markers().unwrap().is_empty());
        map.select_all();
        assert_eq!(map.surface().markers().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_single_result_centers() {
        let mut map = map_with(None);
        map.load_projects().await;

        map.set_search_query("kisumu", SearchColumn::All);
        assert_eq!(map.next_search_outcome().await, Some(true));

        assert_eq!(map.active_source(), DatasetSource::Search);
        let markers = map.surface().markers().unwrap();
        assert_eq!(markers.len(), 1);
        assert!(markers.features()[0].is_search_result());

        let viewport = map.surface().viewport().unwrap();
        assert_eq!(viewport.center, Coordinate::new(-0.09, 34.77));
        assert_eq!(viewport.zoom, 15.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_many_results_fit() {
        let mut map = map_with(None);
        map.load_projects().await;

        // Every name contains an "l"; three of the four are located
        map.set_search_query("l", SearchColumn::Name);
        map.next_search_outcome().await;

        assert_eq!(map.search_results().len(), 4);
        let viewport = map.surface().viewport().unwrap();
        for p in map.search_results().iter().filter_map(Project::position) {
            let screen = viewport.to_screen(&projection::project(&p));
            assert!(screen.x >= 0.0 && screen.x <= 1280.0);
            assert!(screen.y >= 0.0 && screen.y <= 800.0);
        }
        assert!(viewport.zoom < 15.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_clears_search() {
        let mut map = map_with(None);
        map.load_projects().await;

        map.set_search_query("clinic", SearchColumn::All);
        map.next_search_outcome().await;
        assert_eq!(map.search_results().len(), 1);

        assert_eq!(map.set_search_query("   ", SearchColumn::All), None);
        assert!(map.search_results().is_empty());
        assert_eq!(map.active_source(), DatasetSource::All);
        assert_eq!(map.surface().markers().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_search_dropped_by_blank_query() {
        let mut map = map_with(None);
        map.load_projects().await;

        map.set_search_query("clinic", SearchColumn::All);
        map.set_search_query("", SearchColumn::All);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(map.poll_search(), 0);
        assert!(map.search_results().is_empty());
    }

    /// Serves the fixture list but fails any search for "boom".
    struct FlakySearchSource {
        inner: StaticProjectSource,
    }

    #[async_trait]
    impl ProjectSource for FlakySearchSource {
        async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
            self.inner.fetch_all().await
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
            if query.term() == "boom" {
                return Err(ApiError::status("/api/projects", 500, "search backend down"));
            }
            self.inner.search(query).await
        }
    }

    fn flaky_map() -> CharityMap {
        let source = Arc::new(FlakySearchSource {
            inner: StaticProjectSource::new(projects()),
        });
        let locator = Arc::new(FixedLocationProvider::default());
        let mut map = CharityMap::new(&AppConfig::default(), source, locator);
        map.mount();
        map
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_sets_error_and_clears_results() {
        let mut map = flaky_map();
        map.load_projects().await;

        map.set_search_query("well", SearchColumn::All);
        assert_eq!(map.next_search_outcome().await, Some(true));
        assert_eq!(map.search_results().len(), 1);
        assert_eq!(map.active_source(), DatasetSource::Search);

        map.set_search_query("boom", SearchColumn::All);
        assert_eq!(map.next_search_outcome().await, Some(true));

        assert!(map.search_results().is_empty());
        assert_eq!(map.search_error().and_then(ApiError::status_code), Some(500));
        assert!(map.list_error().is_none(), "list and search errors are separate");
        assert_eq!(map.active_source(), DatasetSource::All);
        assert_eq!(map.surface().markers().unwrap().len(), 3);

        map.dismiss_search_error();
        assert!(map.search_error().is_none());
        assert_eq!(map.projects().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_search_clears_previous_error() {
        let mut map = flaky_map();
        map.load_projects().await;

        map.set_search_query("boom", SearchColumn::All);
        map.next_search_outcome().await;
        assert!(map.search_error().is_some());

        map.set_search_query("school", SearchColumn::All);
        map.next_search_outcome().await;
        assert!(map.search_error().is_none());
        assert_eq!(map.search_results().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_outcome_not_applied() {
        let mut map = map_with(None);
        map.load_projects().await;

        let seq = map.set_search_query("school", SearchColumn::All).unwrap();
        let stale = SearchOutcome {
            seq: seq - 1,
            query: SearchQuery::new("well", SearchColumn::All),
            result: Ok(projects()),
        };
        assert!(!map.apply_search_outcome(stale));
        assert!(map.search_results().is_empty());
        assert_eq!(map.active_source(), DatasetSource::All);

        assert_eq!(map.next_search_outcome().await, Some(true));
        assert_eq!(map.search_results().len(), 1);
        assert_eq!(map.search_results()[0].name, "Kisumu School");
        assert_eq!(map.active_source(), DatasetSource::Search);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_pending_search() {
        let mut map = map_with(None);
        map.load_projects().await;

        map.set_search_query("clinic", SearchColumn::All);
        map.unmount();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(map.poll_search(), 0);

        map.mount();
        assert!(map.search_results().is_empty());
        assert_eq!(map.active_source(), DatasetSource::All);
    }

    #[tokio::test]
    async fn test_near_me_acquires_location() {
        let mut map = map_with(Some(Coordinate::new(-1.30, 36.78)));
        map.load_projects().await;

        assert!(map.find_near_me().await);
        assert_eq!(map.active_source(), DatasetSource::NearMe);
        assert_eq!(map.near_me().results().len(), 1);
        assert!(map.surface().markers().unwrap().user_location_feature().is_some());

        assert!(map.set_radius(1000.0));
        assert_eq!(map.near_me().results().len(), 3);

        map.clear_near_me();
        assert!(map.user_location().is_none());
        assert!(!map.near_me().is_active());
        assert!(map.surface().markers().unwrap().user_location_feature().is_none());
        assert_eq!(
            map.surface().viewport().unwrap().center,
            Coordinate::new(-1.2921, 36.7758)
        );
    }

    #[tokio::test]
    async fn test_location_failure_keeps_mode_off() {
        let mut map = map_with(None);
        map.load_projects().await;

        assert!(!map.find_near_me().await);
        assert!(!map.near_me().is_active());
        assert!(matches!(
            map.location_error(),
            Some(GeolocationError::Unavailable { .. })
        ));

        map.dismiss_location_error();
        assert!(map.location_error().is_none());
    }

    #[tokio::test]
    async fn test_request_center_is_one_shot() {
        let mut map = map_with(None);
        let target = Coordinate::new(-4.04, 39.66);

        map.request_center(target);
        assert!(map.pending_center().is_none());
        let viewport = map.surface().viewport().unwrap();
        assert_eq!(viewport.center, target);
        assert_eq!(viewport.zoom, 15.0);

        map.surface.center_on(Coordinate::new(0.0, 0.0), 5.0, false).unwrap();
        map.load_projects().await;
        assert_eq!(map.surface().viewport().unwrap().center, Coordinate::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn test_request_center_waits_for_mount() {
        let source = Arc::new(StaticProjectSource::default());
        let locator = Arc::new(FixedLocationProvider::default());
        let mut map = CharityMap::new(&AppConfig::default(), source, locator);

        let target = Coordinate::new(-4.04, 39.66);
        map.request_center(target);
        assert_eq!(map.pending_center(), Some(target));

        map.mount();
        assert!(map.pending_center().is_none());
        assert_eq!(map.surface().viewport().unwrap().center, target);
    }

    #[tokio::test]
    async fn test_click_opens_details() {
        let mut map = map_with(None);
        map.load_projects().await;

        let at = map
            .surface()
            .viewport()
            .unwrap()
            .to_screen(&projection::project(&Coordinate::new(-1.29, 36.77)));

        map.pointer_move(at);
        assert_eq!(map.cursor(), Cursor::Pointer);
        assert_eq!(map.tooltip().unwrap().text, "Kibera Clinic");

        assert!(map.click(at));
        assert_eq!(map.panel().view_full_details().as_deref(), Some("/projects/1"));

        map.close_panel();
        assert!(!map.panel().is_open());
    }

    #[tokio::test]
    async fn test_unmount_and_remount() {
        let mut map = map_with(None);
        map.load_projects().await;
        map.unmount();
        assert!(!map.surface().is_initialized());

        map.toggle_status(ProjectStatus::Pending);
        map.mount();
        assert_eq!(map.surface().markers().unwrap().len(), 2);
    }
}
