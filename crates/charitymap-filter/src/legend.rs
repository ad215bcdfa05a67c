//! Legend counts for the active dataset.

use crate::dataset::{ActiveDataset, DatasetSource};
use crate::near_me::NearMeState;
use crate::visibility::VisibilitySet;
use charitymap_core::types::{ProjectCategory, ProjectStatus};
use serde::Serialize;

/// One legend row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry<K> {
    pub key: K,
    /// Toggle state
    pub enabled: bool,
    /// Located projects with this key in the active dataset
    pub total: usize,
    /// Of those, how many are currently drawn
    pub visible: usize,
}

/// Near-Me line shown under the legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearMeSummary {
    pub count: usize,
    pub radius_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub source: DatasetSource,
    pub statuses: Vec<LegendEntry<ProjectStatus>>,
    pub categories: Vec<LegendEntry<ProjectCategory>>,
    /// Total markers drawn for the active dataset
    pub visible_markers: usize,
    pub near_me: Option<NearMeSummary>,
}

impl Legend {
    pub fn compute(
        active: &ActiveDataset<'_>,
        visibility: &VisibilitySet,
        near_me: &NearMeState,
    ) -> Self {
        let located: Vec<_> = active
            .projects
            .iter()
            .filter(|p| p.has_position())
            .collect();

        let statuses = ProjectStatus::ALL
            .into_iter()
            .map(|status| {
                let with_key = located.iter().filter(|p| p.status == status);
                LegendEntry {
                    key: status,
                    enabled: visibility.is_status_visible(status),
                    total: with_key.clone().count(),
                    visible: with_key.filter(|p| visibility.is_visible(p)).count(),
                }
            })
            .collect();

        let categories = ProjectCategory::ALL
            .into_iter()
            .map(|category| {
                let with_key = located.iter().filter(|p| p.category == category);
                LegendEntry {
                    key: category,
                    enabled: visibility.is_category_visible(category),
                    total: with_key.clone().count(),
                    visible: with_key.filter(|p| visibility.is_visible(p)).count(),
                }
            })
            .collect();

        let near_me = near_me.is_active().then(|| NearMeSummary {
            count: near_me.results().len(),
            radius_km: near_me.radius_km(),
        });

        Self {
            source: active.source,
            statuses,
            categories,
            visible_markers: located.iter().filter(|p| visibility.is_visible(p)).count(),
            near_me,
        }
    }

    pub fn status(&self, status: ProjectStatus) -> Option<&LegendEntry<ProjectStatus>> {
        self.statuses.iter().find(|e| e.key == status)
    }

    pub fn category(&self, category: ProjectCategory) -> Option<&LegendEntry<ProjectCategory>> {
        self.categories.iter().find(|e| e.key == category)
    }
}
