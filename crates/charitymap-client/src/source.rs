//! Where projects come from.

use crate::search::SearchQuery;
use async_trait::async_trait;
use charitymap_core::error::ApiError;
use charitymap_core::types::Project;
use std::sync::Arc;

/// A backend that can list and search projects.
///
/// `ApiClient` is the production implementation; tests and the demo data set
/// use `StaticProjectSource`.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Full project snapshot.
    async fn fetch_all(&self) -> Result<Vec<Project>, ApiError>;

    /// Projects matching a non-blank query.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError>;
}

#[async_trait]
impl<T: ProjectSource + ?Sized> ProjectSource for Arc<T> {
    async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
        (**self).fetch_all().await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
        (**self).search(query).await
    }
}

/// In-memory project source that searches with the same column semantics as
/// the backend (case-insensitive substring match).
#[derive(Debug, Clone, Default)]
pub struct StaticProjectSource {
    projects: Vec<Project>,
}

impl StaticProjectSource {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl ProjectSource for StaticProjectSource {
    async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.projects.clone())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
        Ok(self
            .projects
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchColumn;
    use charitymap_core::types::{ProjectCategory, ProjectStatus};

    #[tokio::test]
    async fn test_static_source_search() {
        let mut clinic = Project::new(1, "Kibera Clinic", ProjectStatus::Pending, ProjectCategory::Community);
        clinic.county = Some("Nairobi".to_string());
        let well = Project::new(2, "Well", ProjectStatus::Completed, ProjectCategory::Donation);

        let source = StaticProjectSource::new(vec![clinic, well]);
        assert_eq!(source.fetch_all().await.unwrap().len(), 2);

        let hits = source
            .search(&SearchQuery::new("clinic", SearchColumn::All))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = source
            .search(&SearchQuery::new("nairobi", SearchColumn::County))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = source
            .search(&SearchQuery::new("nairobi", SearchColumn::Name))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
