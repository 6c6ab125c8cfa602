//! Askama templates for the web frontend.

use askama::Template;

use crate::domain::{RouteOption, RouteResult};
use crate::orchestrator::LookupState;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page with the route and API key forms.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub configured: bool,
    pub result: ResultView,
}

// ============================================================================
// Fragment Templates (AJAX responses, no base.html)
// ============================================================================

/// Route result fragment: a route, an error box, a spinner or nothing.
#[derive(Template)]
#[template(path = "route_result.html")]
pub struct RouteResultTemplate {
    pub result: ResultView,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// What the result area shows for a lookup state.
#[derive(Debug, Clone, Default)]
pub struct ResultView {
    pub loading: bool,
    pub route: Option<RouteView>,
    pub error: Option<String>,
}

impl ResultView {
    /// Derive the view from the orchestrator state.
    pub fn from_state(state: &LookupState) -> Self {
        match state {
            LookupState::Idle => Self::default(),
            LookupState::Loading => Self {
                loading: true,
                ..Self::default()
            },
            LookupState::Success(result) => Self {
                route: Some(RouteView::from_result(result)),
                ..Self::default()
            },
            LookupState::Failure(failure) => Self {
                error: Some(failure.user_message()),
                ..Self::default()
            },
        }
    }
}

/// A found route.
#[derive(Debug, Clone)]
pub struct RouteView {
    pub duration_display: String,
    pub distance_display: String,
    pub transfers_display: String,
    /// Only the accessibility features that are present
    pub badges: Vec<BadgeView>,
    pub steps: Vec<StepView>,
}

impl RouteView {
    pub fn from_result(result: &RouteResult) -> Self {
        let mut badges = Vec::new();
        if result.accessibility.stroller_friendly {
            badges.push(BadgeView {
                class: "stroller",
                label: "Stroller Friendly",
            });
        }
        if result.accessibility.has_elevators {
            badges.push(BadgeView {
                class: "elevator",
                label: "Elevator Access",
            });
        }

        let transfers_display = match result.transfer_count {
            1 => "1 transfer".to_string(),
            n => format!("{n} transfers"),
        };

        Self {
            duration_display: format!("{} min", result.duration_minutes),
            distance_display: format!("{:.1} mi", result.distance_miles),
            transfers_display,
            badges,
            steps: result.options.iter().map(StepView::from_option).collect(),
        }
    }
}

/// Accessibility badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    /// CSS modifier class
    pub class: &'static str,
    pub label: &'static str,
}

/// One line ridden as part of a route.
#[derive(Debug, Clone)]
pub struct StepView {
    pub line_name: String,
    pub direction: String,
    pub stops_display: String,
}

impl StepView {
    pub fn from_option(option: &RouteOption) -> Self {
        Self {
            line_name: option.line_name().to_string(),
            direction: option.direction().to_string(),
            stops_display: option.stops().join(" → "),
        }
    }
}
