//! Plan and step definitions

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::opt_duration_format;
use crate::driver::{MouseClick, Point, ScrollDirection};
use crate::finder::{Checked, Finder, Restriction};

/// A named scenario: steps run in order under one UI context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,

    /// Overrides the configured UI timeout for every step
    #[serde(default, with = "opt_duration_format", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    /// Overrides the configured polling interval
    #[serde(default, with = "opt_duration_format", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,

    pub steps: Vec<Step>,
}

/// One step. Which fields matter depends on `uses`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// Wraps the step in a named action
    pub name: Option<String>,

    /// Action to use (e.g. "ui/left-click", "flow/retry")
    pub uses: String,

    pub finder: Option<Finder>,

    #[serde(default, with = "opt_duration_format", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    /// Attempts for `flow/retry`, runs for `flow/repeat`
    pub times: Option<usize>,

    /// Child steps of flow actions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    pub probe: Option<Box<Step>>,

    pub then: Option<Box<Step>>,

    pub condition: Option<Box<Step>>,

    pub direction: Option<ScrollDirection>,

    pub button: Option<MouseClick>,

    pub point: Option<Point>,

    pub restriction: Option<Restriction>,

    pub checked: Option<Checked>,

    /// UI steps: timeout of this step's waits. Flow steps: bound on the whole step.
    #[serde(default, with = "opt_duration_format", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Step {
    /// How the step is referred to in errors
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uses)
    }
}
