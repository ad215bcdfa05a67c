//! Core types for the CharityMap project map.
//!
//! Projects are owned by the backend and treated as an immutable snapshot per
//! fetch. The only field the map core ever writes is the derived `distance`,
//! attached to copies produced by the Near-Me search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable identifier of a project as issued by the backend.
///
/// The backend emits integer IDs, but older records were keyed by string, so
/// both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectId {
    /// Numeric identifier
    Numeric(i64),
    /// Textual identifier
    Text(String),
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Numeric(id) => write!(f, "{}", id),
            ProjectId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ProjectId {
    fn from(id: i64) -> Self {
        ProjectId::Numeric(id)
    }
}

impl From<i32> for ProjectId {
    fn from(id: i32) -> Self {
        ProjectId::Numeric(i64::from(id))
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        ProjectId::Text(id.to_string())
    }
}

/// Lifecycle status of a project.
///
/// Status drives the marker fill color. Values the backend sends that are not
/// listed here deserialize as `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    /// Every status that can be toggled in the legend, in display order.
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
        ProjectStatus::Cancelled,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Cancelled => "cancelled",
            ProjectStatus::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Cancelled => "Cancelled",
            ProjectStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of charity work a project represents.
///
/// Category drives the marker glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Volunteer,
    Donation,
    Fundraising,
    Community,
    #[default]
    #[serde(other)]
    Other,
}

impl ProjectCategory {
    /// Every category that can be toggled in the legend, in display order.
    pub const ALL: [ProjectCategory; 5] = [
        ProjectCategory::Volunteer,
        ProjectCategory::Donation,
        ProjectCategory::Fundraising,
        ProjectCategory::Community,
        ProjectCategory::Other,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::Volunteer => "volunteer",
            ProjectCategory::Donation => "donation",
            ProjectCategory::Fundraising => "fundraising",
            ProjectCategory::Community => "community",
            ProjectCategory::Other => "other",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectCategory::Volunteer => "Volunteer",
            ProjectCategory::Donation => "Donation",
            ProjectCategory::Fundraising => "Fundraising",
            ProjectCategory::Community => "Community",
            ProjectCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Person a project is assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignee {
    #[serde(default)]
    pub id: Option<ProjectId>,
    #[serde(default)]
    pub full_name: String,
}

/// A charity or construction project as returned by `/api/projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub county: Option<String>,

    #[serde(default)]
    pub subcounty: Option<String>,

    #[serde(default)]
    pub target_individual: Option<String>,

    #[serde(default, deserialize_with = "lenient_enum")]
    pub status: ProjectStatus,

    #[serde(default, deserialize_with = "lenient_enum")]
    pub category: ProjectCategory,

    /// Latitude, `None` when missing or not a finite number
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,

    /// Longitude, `None` when missing or not a finite number
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,

    /// Completion percentage (0-100)
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub progress: Option<f64>,

    #[serde(default)]
    pub assignee: Option<Assignee>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Great-circle distance in kilometers from the active user location.
    /// Only populated on Near-Me results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Project {
    /// Creates a project with only the fields the map core needs.
    pub fn new(
        id: impl Into<ProjectId>,
        name: impl Into<String>,
        status: ProjectStatus,
        category: ProjectCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            county: None,
            subcounty: None,
            target_individual: None,
            status,
            category,
            latitude: None,
            longitude: None,
            progress: None,
            assignee: None,
            created_at: None,
            updated_at: None,
            distance: None,
        }
    }

    /// Builder-style setter for the project position.
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Returns the project position if both coordinates are present and finite.
    pub fn position(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(Coordinate::new(lat, lon))
            }
            _ => None,
        }
    }

    /// Returns true if the project can be placed on the map.
    #[inline]
    pub fn has_position(&self) -> bool {
        self.position().is_some()
    }

    /// Assignee display name, if any.
    pub fn assignee_name(&self) -> Option<&str> {
        self.assignee
            .as_ref()
            .map(|a| a.full_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Envelope used by the project list endpoint: `{ "data": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPage {
    #[serde(default)]
    pub data: Vec<Project>,
}

/// The device position the Near-Me search is anchored on.
///
/// At most one is live at a time; acquiring a new one replaces the old.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in meters
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// When the fix was taken
    pub acquired_at: DateTime<Utc>,
}

impl UserLocation {
    /// Creates a location fixed now.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            acquired_at: Utc::now(),
        }
    }

    /// The location as a plain coordinate.
    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Age of the fix relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.acquired_at
    }
}

/// Accepts a number, a numeric string, or null. Anything else, and anything
/// that is not finite, becomes `None`.
fn lenient_coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

/// Null maps to the enum default instead of failing the whole record.
fn lenient_enum<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_deserialize_numeric_strings() {
        let json = r#"{"id": 7, "name": "Clinic", "latitude": " -1.29 ", "longitude": "36.77",
                       "status": "in_progress", "category": "community", "progress": 40}"#;
        let project: Project = serde_json::from_str(json).unwrap();

        assert_eq!(project.id, ProjectId::Numeric(7));
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.category, ProjectCategory::Community);
        assert_eq!(project.position(), Some(Coordinate::new(-1.29, 36.77)));
        assert_eq!(project.progress, Some(40.0));
    }

    #[test]
    fn test_project_malformed_coordinates() {
        let json = r#"{"id": "p-1", "latitude": "abc", "longitude": null}"#;
        let project: Project = serde_json::from_str(json).unwrap();

        assert_eq!(project.id, ProjectId::Text("p-1".to_string()));
        assert!(project.latitude.is_none());
        assert!(project.longitude.is_none());
        assert!(!project.has_position());
    }

    #[test]
    fn test_project_missing_coordinates() {
        let json = r#"{"id": 3, "name": "No location"}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert!(project.position().is_none());
    }

    #[test]
    fn test_unknown_status_and_null_category() {
        let json = r#"{"id": 1, "status": "archived", "category": null}"#;
        let project: Project = serde_json::from_str(json).unwrap();

        assert_eq!(project.status, ProjectStatus::Unknown);
        assert_eq!(project.category, ProjectCategory::Other);
    }

    #[test]
    fn test_status_wire_names() {
        for status in ProjectStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_assignee_name() {
        let json = r#"{"id": 1, "assignee": {"full_name": "Wanjiru Kamau"}}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.assignee_name(), Some("Wanjiru Kamau"));

        let unassigned = Project::new(2, "x", ProjectStatus::Pending, ProjectCategory::Other);
        assert_eq!(unassigned.assignee_name(), None);
    }

    #[test]
    fn test_project_page_envelope() {
        let json = r#"{"data": [{"id": 1}, {"id": 2}], "total": 2}"#;
        let page: ProjectPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(-1.2921, 36.7758).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_distance_not_serialized_when_absent() {
        let project = Project::new(1, "x", ProjectStatus::Pending, ProjectCategory::Other);
        let json = serde_json::to_string(&project).unwrap();
        assert!(!json.contains("distance"));
    }
}
