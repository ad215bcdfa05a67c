//! Side panel showing the clicked project.

use charitymap_core::types::Project;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailTab {
    #[default]
    Basic,
    Location,
}

/// One labelled line in a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailField {
    pub label: &'static str,
    pub value: String,
}

impl DetailField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

const NOT_SET: &str = "N/A";

#[derive(Debug, Clone, Default)]
pub struct DetailPanel {
    selected: Option<Project>,
    tab: DetailTab,
}

impl DetailPanel {
    /// Opens on the basic tab with `project` selected.
    pub fn open(&mut self, project: Project) {
        self.selected = Some(project);
        self.tab = DetailTab::Basic;
    }

    /// Closes the panel and clears the selection.
    pub fn close(&mut self) {
        self.selected = None;
        self.tab = DetailTab::Basic;
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&Project> {
        self.selected.as_ref()
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
    }

    /// Fields of the current tab, empty when closed.
    pub fn fields(&self) -> Vec<DetailField> {
        match self.tab {
            DetailTab::Basic => self.basic_fields(),
            DetailTab::Location => self.location_fields(),
        }
    }

    pub fn basic_fields(&self) -> Vec<DetailField> {
        let Some(p) = &self.selected else {
            return Vec::new();
        };
        vec![
            DetailField::new("Name", p.name.clone()),
            DetailField::new("Status", p.status.label()),
            DetailField::new("Category", p.category.label()),
            DetailField::new("Description", or_not_set(p.description.as_deref())),
            DetailField::new("Target Individual", or_not_set(p.target_individual.as_deref())),
        ]
    }

    pub fn location_fields(&self) -> Vec<DetailField> {
        let Some(p) = &self.selected else {
            return Vec::new();
        };
        let mut fields = vec![
            DetailField::new("County", or_not_set(p.county.as_deref())),
            DetailField::new("Subcounty", or_not_set(p.subcounty.as_deref())),
            DetailField::new("Latitude", format_coordinate(p.latitude)),
            DetailField::new("Longitude", format_coordinate(p.longitude)),
            DetailField::new(
                "Progress",
                p.progress
                    .map(|v| format!("{:.0}%", v))
                    .unwrap_or_else(|| NOT_SET.to_string()),
            ),
            DetailField::new("Assignee", or_not_set(p.assignee_name())),
        ];
        if let Some(distance) = p.distance {
            fields.push(DetailField::new("Distance", format!("{:.2} km", distance)));
        }
        fields
    }

    /// Navigation target of the "view full details" action.
    pub fn view_full_details(&self) -> Option<String> {
        self.selected.as_ref().map(|p| format!("/projects/{}", p.id))
    }
}

fn or_not_set(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(NOT_SET)
        .to_string()
}

fn format_coordinate(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.6}", v))
        .unwrap_or_else(|| NOT_SET.to_string())
}
