//! Active dataset selection.
//!
//! Exactly one project collection drives each render pass, chosen by
//! precedence: Near-Me results (mode active and non-empty), then search
//! results (non-empty), then the full list.

use crate::near_me::NearMeState;
use crate::rules::{FilterRule, PositionFilter};
use crate::visibility::VisibilitySet;
use charitymap_core::types::Project;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    NearMe,
    Search,
    All,
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::NearMe => write!(f, "near-me results"),
            DatasetSource::Search => write!(f, "search results"),
            DatasetSource::All => write!(f, "all projects"),
        }
    }
}

/// The collection feeding the current render pass.
#[derive(Debug, Clone, Copy)]
pub struct ActiveDataset<'a> {
    pub source: DatasetSource,
    pub projects: &'a [Project],
}

impl<'a> ActiveDataset<'a> {
    /// Applies the precedence rule.
    pub fn select(
        near_me: &'a NearMeState,
        search_results: &'a [Project],
        all: &'a [Project],
    ) -> Self {
        if near_me.is_active() && !near_me.results().is_empty() {
            Self {
                source: DatasetSource::NearMe,
                projects: near_me.results(),
            }
        } else if !search_results.is_empty() {
            Self {
                source: DatasetSource::Search,
                projects: search_results,
            }
        } else {
            Self {
                source: DatasetSource::All,
                projects: all,
            }
        }
    }

    /// Markers get search emphasis only when search results are active.
    #[inline]
    pub fn is_search_result(&self) -> bool {
        self.source == DatasetSource::Search
    }

    /// Projects that may be drawn: located, and visible in `visibility`.
    pub fn eligible<'v>(
        &self,
        visibility: &'v VisibilitySet,
    ) -> impl Iterator<Item = &'a Project> + 'v
    where
        'a: 'v,
    {
        let projects = self.projects;
        projects.iter().filter(move |p| {
            PositionFilter.evaluate(p).is_pass() && visibility.evaluate(p).is_pass()
        })
    }
}

/// The pool a Near-Me search filters: search results if any, else the full
/// list.
pub fn candidate_pool<'a>(search_results: &'a [Project], all: &'a [Project]) -> &'a [Project] {
    if search_results.is_empty() {
        all
    } else {
        search_results
    }
}
