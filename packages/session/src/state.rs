//! The view model rendered by front ends.

use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use zip_map_ai::Insights;
use zip_map_census_models::{Boundary, Demographics, ZipCode};
use zip_map_places::Place;
use zip_map_spatial::PrecisionMode;

/// Progress of one independent pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum PipelineStatus {
    /// Nothing requested.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request succeeded.
    Ready,
    /// The last request failed with this user-facing message.
    Failed(String),
}

impl PipelineStatus {
    /// True while a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure message, if the last request failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Presentation flags with no effect on data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiChrome {
    /// Current color scheme.
    pub theme: Theme,
    /// Whether the results panel is expanded.
    pub panel_open: bool,
    /// Whether the welcome message is showing.
    pub welcome_open: bool,
    /// Whether the data sources dialog is showing.
    pub about_open: bool,
}

impl Default for UiChrome {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            panel_open: false,
            welcome_open: true,
            about_open: false,
        }
    }
}

/// A second ZIP code drawn next to the primary one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// The comparison ZIP code.
    pub zip_code: ZipCode,
    /// Its boundary.
    pub boundary: Boundary,
}

/// Everything a front end needs to draw the current view.
///
/// Each pipeline owns a disjoint set of fields:
///
/// | Pipeline | Fields |
/// |---|---|
/// | search | `zip_code`, `demographics`, `cities`, `boundary` |
/// | places | `places`, `places_precision`, `selected_place` |
/// | comparison | `comparison` |
/// | insights | `insights` |
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// The ZIP code currently shown.
    pub zip_code: Option<ZipCode>,
    /// Its ACS statistics.
    pub demographics: Option<Demographics>,
    /// City names covering it.
    pub cities: Option<Vec<String>>,
    /// Its boundary polygon.
    pub boundary: Option<Boundary>,
    /// A comparison ZIP code's boundary.
    pub comparison: Option<Comparison>,
    /// Points of interest inside the boundary.
    pub places: Option<Vec<Place>>,
    /// How strictly `places` was filtered.
    pub places_precision: Option<PrecisionMode>,
    /// AI profile and doppelgangers.
    pub insights: Option<Insights>,
    /// The place the user picked, if any.
    pub selected_place: Option<Place>,

    /// Demographics, cities, and boundary.
    pub search: PipelineStatus,
    /// Places search.
    pub places_status: PipelineStatus,
    /// Comparison boundary.
    pub comparison_status: PipelineStatus,
    /// AI insights.
    pub insights_status: PipelineStatus,

    /// Presentation flags.
    pub chrome: UiChrome,
}

impl ViewState {
    /// Clears every result field and resets the dependent pipelines.
    ///
    /// The search status and the chrome are left alone.
    pub fn clear_results(&mut self) {
        self.zip_code = None;
        self.demographics = None;
        self.cities = None;
        self.boundary = None;
        self.comparison = None;
        self.places = None;
        self.places_precision = None;
        self.insights = None;
        self.selected_place = None;

        self.places_status = PipelineStatus::Idle;
        self.comparison_status = PipelineStatus::Idle;
        self.insights_status = PipelineStatus::Idle;
    }

    /// True if any pipeline has a request in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.search.is_loading()
            || self.places_status.is_loading()
            || self.comparison_status.is_loading()
            || self.insights_status.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_toggles_both_ways() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.to_string(), "dark");
    }

    #[test]
    fn chrome_starts_with_welcome_open() {
        let chrome = UiChrome::default();
        assert!(chrome.welcome_open);
        assert!(!chrome.panel_open);
        assert!(!chrome.about_open);
        assert_eq!(chrome.theme, Theme::Light);
    }

    #[test]
    fn pipeline_status_serializes_with_message() {
        let failed = PipelineStatus::Failed("boom".to_string());
        assert_eq!(failed.error(), Some("boom"));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "status": "failed", "message": "boom" })
        );
        assert_eq!(
            serde_json::to_value(PipelineStatus::Ready).unwrap(),
            serde_json::json!({ "status": "ready" })
        );
    }

    #[test]
    fn clear_results_keeps_search_status_and_chrome() {
        let mut state = ViewState {
            zip_code: Some(ZipCode::parse("94043").unwrap()),
            cities: Some(vec!["Mountain View".to_string()]),
            search: PipelineStatus::Loading,
            insights_status: PipelineStatus::Failed("x".to_string()),
            ..ViewState::default()
        };
        state.chrome.theme = Theme::Dark;

        state.clear_results();

        assert!(state.zip_code.is_none());
        assert!(state.cities.is_none());
        assert_eq!(state.insights_status, PipelineStatus::Idle);
        assert_eq!(state.search, PipelineStatus::Loading);
        assert_eq!(state.chrome.theme, Theme::Dark);
    }
}
