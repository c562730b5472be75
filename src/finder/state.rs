//! Node states, checked states and restrictions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Boolean states a node can carry. A state absent from a node reads as false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum State {
    AutofillAvailable,
    Collapsed,
    Default,
    Editable,
    Expanded,
    Focusable,
    Focused,
    Horizontal,
    Hovered,
    Ignored,
    Invisible,
    Linked,
    Multiline,
    Multiselectable,
    Offscreen,
    Protected,
    Required,
    RichlyEditable,
    Vertical,
    Visited,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::AutofillAvailable => "autofillAvailable",
            State::Collapsed => "collapsed",
            State::Default => "default",
            State::Editable => "editable",
            State::Expanded => "expanded",
            State::Focusable => "focusable",
            State::Focused => "focused",
            State::Horizontal => "horizontal",
            State::Hovered => "hovered",
            State::Ignored => "ignored",
            State::Invisible => "invisible",
            State::Linked => "linked",
            State::Multiline => "multiline",
            State::Multiselectable => "multiselectable",
            State::Offscreen => "offscreen",
            State::Protected => "protected",
            State::Required => "required",
            State::RichlyEditable => "richlyEditable",
            State::Vertical => "vertical",
            State::Visited => "visited",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked state of a toggle-like node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Checked {
    True,
    False,
    Mixed,
    #[default]
    None,
}

impl fmt::Display for Checked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Checked::True => "true",
            Checked::False => "false",
            Checked::Mixed => "mixed",
            Checked::None => "none",
        })
    }
}

/// Input restriction of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Restriction {
    #[default]
    None,
    Disabled,
    ReadOnly,
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Restriction::None => "none",
            Restriction::Disabled => "disabled",
            Restriction::ReadOnly => "readOnly",
        })
    }
}
