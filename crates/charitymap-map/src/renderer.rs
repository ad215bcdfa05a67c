//! Marker renderer: turns the active dataset into overlay features and keeps
//! the overlay in sync.
//!
//! Synchronization reconciles by feature ID. Features that disappeared are
//! removed, new ones are added, and ones whose payload or style changed are
//! replaced in place. After a sync the overlay holds exactly the freshly
//! computed set, in render order, as a full replace would.

use crate::projection::{self, Point};
use crate::style::MarkerStyle;
use crate::surface::Viewport;
use charitymap_core::types::{Project, ProjectId, UserLocation};
use charitymap_filter::{ActiveDataset, VisibilitySet};
use metrics::counter;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Identity of an overlay feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum FeatureId {
    CharityProject(ProjectId),
    UserLocation,
}

/// What a feature represents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeatureKind {
    #[serde(rename_all = "camelCase")]
    CharityProject {
        project: Project,
        is_search_result: bool,
    },
    UserLocation { location: UserLocation },
}

/// One point on the marker overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    /// Position in projected meters
    pub position: Point,
    pub style: MarkerStyle,
}

impl Feature {
    /// Builds a project feature. `None` if the project has no usable position.
    pub fn project(project: &Project, is_search_result: bool) -> Option<Self> {
        let coordinate = project.position()?;
        Some(Self {
            id: FeatureId::CharityProject(project.id.clone()),
            position: projection::project(&coordinate),
            style: MarkerStyle::for_project(project.category, project.status, is_search_result),
            kind: FeatureKind::CharityProject {
                project: project.clone(),
                is_search_result,
            },
        })
    }

    pub fn user_location(location: &UserLocation) -> Self {
        Self {
            id: FeatureId::UserLocation,
            position: projection::project(&location.coordinate()),
            style: MarkerStyle::user_location(),
            kind: FeatureKind::UserLocation {
                location: *location,
            },
        }
    }

    /// Discriminator as exposed to drawing code.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            FeatureKind::CharityProject { .. } => "charityProject",
            FeatureKind::UserLocation { .. } => "userLocation",
        }
    }

    /// Project payload, for project features.
    pub fn as_project(&self) -> Option<&Project> {
        match &self.kind {
            FeatureKind::CharityProject { project, .. } => Some(project),
            FeatureKind::UserLocation { .. } => None,
        }
    }

    pub fn is_search_result(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::CharityProject {
                is_search_result: true,
                ..
            }
        )
    }

    /// Only project features respond to hover and click.
    #[inline]
    pub fn is_interactive(&self) -> bool {
        matches!(self.kind, FeatureKind::CharityProject { .. })
    }
}

/// Computes the feature set for one render pass: one feature per eligible
/// project in the active dataset, then the user location marker on top.
pub fn build_features(
    active: &ActiveDataset<'_>,
    visibility: &VisibilitySet,
    user_location: Option<&UserLocation>,
) -> Vec<Feature> {
    let emphasis = active.is_search_result();
    let mut features: Vec<Feature> = active
        .eligible(visibility)
        .filter_map(|project| Feature::project(project, emphasis))
        .collect();

    if let Some(location) = user_location {
        features.push(Feature::user_location(location));
    }

    features
}

/// Outcome of one overlay sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub retained: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.updated == 0
    }
}

/// The overlay's feature collection, in draw order (last is topmost).
#[derive(Debug, Default)]
pub struct MarkerLayer {
    features: Vec<Feature>,
}

impl MarkerLayer {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| &f.id == id)
    }

    pub fn project_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.is_interactive())
    }

    pub fn user_location_feature(&self) -> Option<&Feature> {
        self.get(&FeatureId::UserLocation)
    }

    /// Reconciles the layer to exactly `next`.
    pub fn sync(&mut self, next: Vec<Feature>) -> SyncReport {
        let mut previous: HashMap<FeatureId, Feature> = self
            .features
            .drain(..)
            .map(|f| (f.id.clone(), f))
            .collect();

        let mut report = SyncReport::default();
        for feature in next {
            match previous.remove(&feature.id) {
                Some(old) if old == feature => {
                    report.retained += 1;
                    self.features.push(old);
                }
                Some(_) => {
                    report.updated += 1;
                    self.features.push(feature);
                }
                None => {
                    report.added += 1;
                    self.features.push(feature);
                }
            }
        }
        report.removed = previous.len();

        counter!("charitymap_marker_syncs_total").increment(1);
        debug!(
            added = report.added,
            removed = report.removed,
            updated = report.updated,
            retained = report.retained,
            "Marker layer synced"
        );
        report
    }

    /// Topmost interactive feature whose marker covers `screen`.
    pub fn hit_test(&self, viewport: &Viewport, screen: &Point) -> Option<&Feature> {
        self.features
            .iter()
            .rev()
            .filter(|f| f.is_interactive())
            .find(|f| viewport.to_screen(&f.position).distance_to(screen) <= f.style.radius)
    }
}
