//! Legend visibility toggles.
//!
//! Two independent maps, one keyed by status and one by category. Everything
//! starts visible. Select-all and deselect-all act on both maps at once.

use crate::rules::{FilterResult, FilterRule};
use charitymap_core::types::{Project, ProjectCategory, ProjectStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySet {
    statuses: BTreeMap<ProjectStatus, bool>,
    categories: BTreeMap<ProjectCategory, bool>,
}

impl Default for VisibilitySet {
    fn default() -> Self {
        Self::all_visible()
    }
}

impl VisibilitySet {
    /// Every status and category visible.
    pub fn all_visible() -> Self {
        Self::filled(true)
    }

    fn filled(value: bool) -> Self {
        Self {
            statuses: ProjectStatus::ALL.iter().map(|s| (*s, value)).collect(),
            categories: ProjectCategory::ALL.iter().map(|c| (*c, value)).collect(),
        }
    }

    /// Whether a status is toggled on. Statuses outside the legend
    /// (`Unknown`) are never visible.
    pub fn is_status_visible(&self, status: ProjectStatus) -> bool {
        self.statuses.get(&status).copied().unwrap_or(false)
    }

    /// Whether a category is toggled on.
    pub fn is_category_visible(&self, category: ProjectCategory) -> bool {
        self.categories.get(&category).copied().unwrap_or(false)
    }

    /// Whether a project's status and category are both toggled on.
    #[inline]
    pub fn is_visible(&self, project: &Project) -> bool {
        self.is_status_visible(project.status) && self.is_category_visible(project.category)
    }

    /// Flips one status. Returns the new value.
    pub fn toggle_status(&mut self, status: ProjectStatus) -> bool {
        match self.statuses.get_mut(&status) {
            Some(visible) => {
                *visible = !*visible;
                *visible
            }
            None => false,
        }
    }

    /// Flips one category. Returns the new value.
    pub fn toggle_category(&mut self, category: ProjectCategory) -> bool {
        match self.categories.get_mut(&category) {
            Some(visible) => {
                *visible = !*visible;
                *visible
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, status: ProjectStatus, visible: bool) {
        if let Some(entry) = self.statuses.get_mut(&status) {
            *entry = visible;
        }
    }

    pub fn set_category(&mut self, category: ProjectCategory, visible: bool) {
        if let Some(entry) = self.categories.get_mut(&category) {
            *entry = visible;
        }
    }

    /// Turns on all ten toggles.
    pub fn select_all(&mut self) {
        *self = Self::filled(true);
    }

    /// Turns off all ten toggles.
    pub fn deselect_all(&mut self) {
        *self = Self::filled(false);
    }

    /// True when every toggle is on.
    pub fn is_all_selected(&self) -> bool {
        self.statuses.values().all(|v| *v) && self.categories.values().all(|v| *v)
    }

    /// Number of toggles currently on, out of ten.
    pub fn enabled_count(&self) -> usize {
        self.statuses.values().filter(|v| **v).count()
            + self.categories.values().filter(|v| **v).count()
    }

    /// Status toggles in legend order.
    pub fn statuses(&self) -> impl Iterator<Item = (ProjectStatus, bool)> + '_ {
        ProjectStatus::ALL
            .into_iter()
            .map(|s| (s, self.is_status_visible(s)))
    }

    /// Category toggles in legend order.
    pub fn categories(&self) -> impl Iterator<Item = (ProjectCategory, bool)> + '_ {
        ProjectCategory::ALL
            .into_iter()
            .map(|c| (c, self.is_category_visible(c)))
    }
}

impl FilterRule for VisibilitySet {
    #[inline]
    fn evaluate(&self, project: &Project) -> FilterResult {
        self.is_visible(project).into()
    }

    fn describe(&self) -> String {
        format!("VisibilitySet(enabled: {}/10)", self.enabled_count())
    }
}
