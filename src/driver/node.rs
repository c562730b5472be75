//! Node properties and geometry

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::finder::{Checked, Restriction, Role, State};

/// A point in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A screen rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center_point(&self) -> Point {
        Point::new(self.left + self.width / 2, self.top + self.height / 2)
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right() && p.y >= self.top && p.y < self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) - ({} x {})", self.left, self.top, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseClick {
    #[default]
    Left,
    Right,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Properties of one accessibility node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeInfo {
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub checked: Checked,
    pub restriction: Restriction,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub state: BTreeMap<State, bool>,
    pub location: Rect,
}

impl NodeInfo {
    pub fn new(role: Role, name: &str) -> Self {
        Self {
            role,
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class_name = class.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn with_state(mut self, state: State, value: bool) -> Self {
        self.state.insert(state, value);
        self
    }

    pub fn with_location(mut self, location: Rect) -> Self {
        self.location = location;
        self
    }

    pub fn with_checked(mut self, checked: Checked) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = restriction;
        self
    }

    /// Value of a boolean state; absent states are false
    pub fn is(&self, state: State) -> bool {
        self.state.get(&state).copied().unwrap_or(false)
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.role, self.name)?;
        if !self.class_name.is_empty() {
            write!(f, " class={:?}", self.class_name)?;
        }
        let states: Vec<&str> = self
            .state
            .iter()
            .filter(|(_, v)| **v)
            .map(|(s, _)| s.as_str())
            .collect();
        if !states.is_empty() {
            write!(f, " [{}]", states.join(" "))?;
        }
        if self.checked != Checked::None {
            write!(f, " checked={}", self.checked)?;
        }
        if self.restriction != Restriction::None {
            write!(f, " restriction={}", self.restriction)?;
        }
        write!(f, " {}", self.location)
    }
}
