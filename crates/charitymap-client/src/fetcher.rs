//! Full project list loading.

use crate::source::ProjectSource;
use charitymap_core::error::ApiError;
use charitymap_core::types::Project;
use metrics::counter;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Default)]
struct FetchState {
    loading: bool,
    last_error: Option<ApiError>,
}

/// Loads the full project snapshot.
///
/// Failures never reach the caller: they are logged, remembered in
/// [`DataFetcher::last_error`], and the load yields an empty list.
#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn ProjectSource>,
    state: Arc<RwLock<FetchState>>,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn ProjectSource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(FetchState::default())),
        }
    }

    pub fn source(&self) -> Arc<dyn ProjectSource> {
        Arc::clone(&self.source)
    }

    /// True while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Error from the most recent load, if it failed.
    pub fn last_error(&self) -> Option<ApiError> {
        self.state.read().last_error.clone()
    }

    pub async fn load_all(&self) -> Vec<Project> {
        let _loading = LoadingGuard::start(&self.state);
        counter!("charitymap_project_loads_total").increment(1);

        match self.source.fetch_all().await {
            Ok(projects) => {
                info!(count = projects.len(), "Loaded projects");
                self.state.write().last_error = None;
                projects
            }
            Err(e) => {
                counter!("charitymap_project_load_failures_total").increment(1);
                error!(error = %e, "Failed to load projects");
                self.state.write().last_error = Some(e);
                Vec::new()
            }
        }
    }
}

/// Clears the loading flag even if the load future is dropped mid-flight.
struct LoadingGuard<'a> {
    state: &'a RwLock<FetchState>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a RwLock<FetchState>) -> Self {
        state.write().loading = true;
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.write().loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchQuery;
    use crate::source::StaticProjectSource;
    use async_trait::async_trait;
    use charitymap_core::types::{ProjectCategory, ProjectStatus};
    use std::time::Duration;

    struct FailingSource;

    #[async_trait]
    impl ProjectSource for FailingSource {
        async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
            Err(ApiError::status("http://test/api/projects", 500, "boom"))
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
            Ok(Vec::new())
        }
    }

    struct SlowSource;

    #[async_trait]
    impl ProjectSource for SlowSource {
        async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(Vec::new())
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_load_success() {
        let source = StaticProjectSource::new(vec![Project::new(
            1,
            "Well",
            ProjectStatus::Completed,
            ProjectCategory::Donation,
        )]);
        let fetcher = DataFetcher::new(Arc::new(source));

        let projects = fetcher.load_all().await;
        assert_eq!(projects.len(), 1);
        assert!(fetcher.last_error().is_none());
        assert!(!fetcher.is_loading());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let fetcher = DataFetcher::new(Arc::new(FailingSource));

        let projects = fetcher.load_all().await;
        assert!(projects.is_empty());
        assert_eq!(fetcher.last_error().and_then(|e| e.status_code()), Some(500));
        assert!(!fetcher.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_during_fetch() {
        let fetcher = DataFetcher::new(Arc::new(SlowSource));
        let background = fetcher.clone();
        let handle = tokio::spawn(async move { background.load_all().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(fetcher.is_loading());

        handle.await.unwrap();
        assert!(!fetcher.is_loading());
    }
}
