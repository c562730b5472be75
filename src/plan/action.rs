//! Parsing of the `uses` field

use std::fmt;

/// Categories of plan actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Ui,   // ui/left-click, ui/wait-until-exists, etc.
    Flow, // flow/combine, flow/retry, etc.
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Ui => write!(f, "ui"),
            ActionCategory::Flow => write!(f, "flow"),
        }
    }
}

/// Parsed action from "uses" field
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAction {
    pub category: ActionCategory,
    pub action: String,
}

impl ParsedAction {
    /// Parse an action string like "ui/left-click" into category and action
    pub fn parse(uses: &str) -> Result<Self, String> {
        let parts: Vec<&str> = uses.split('/').collect();
        if parts.len() != 2 || parts[1].is_empty() {
            return Err(format!(
                "Invalid action format '{}'. Expected 'category/action'",
                uses
            ));
        }

        let category = match parts[0] {
            "ui" => ActionCategory::Ui,
            "flow" => ActionCategory::Flow,
            _ => return Err(format!("Unknown action category: {}", parts[0])),
        };

        Ok(Self {
            category,
            action: parts[1].to_string(),
        })
    }
}

impl fmt::Display for ParsedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.action)
    }
}
