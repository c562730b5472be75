//! Declarative node finders
//!
//! A [`Finder`] is an immutable description of which accessibility node(s)
//! to locate. Every builder method returns a new finder and leaves the
//! receiver untouched, so finders can be shared and extended freely:
//!
//! ```
//! use ui_actions::finder::{self, Role};
//!
//! let dialog = finder::role(Role::Dialog).name_containing("Settings");
//! let ok = finder::name("OK").role(Role::Button).ancestor(&dialog);
//! assert_eq!(
//!     ok.pretty(),
//!     "{name: /^OK$/, role: button, ancestor: {name: /Settings/, role: dialog}}"
//! );
//! ```

pub mod matcher;
pub mod resolve;
pub mod role;
pub mod state;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::driver::NodeInfo;

pub use matcher::{ClassMatcher, NameMatcher};
pub use resolve::{resolve_all, resolve_one, ResolveError};
pub use role::Role;
pub use state::{Checked, Restriction, State};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Finder {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<NameMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_name: Option<ClassMatcher>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    state: BTreeMap<State, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checked: Option<Checked>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restriction: Option<Restriction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ancestor: Option<Box<Finder>>,
    #[serde(skip_serializing_if = "is_false")]
    first: bool,
    #[serde(skip_serializing_if = "is_zero")]
    nth: usize,
    #[serde(skip_serializing_if = "is_false")]
    root: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Finder {
    /// An empty finder. It must be given at least one constraint before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// The root of the tree
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }

    fn with(&self, update: impl FnOnce(&mut Finder)) -> Finder {
        let mut f = self.clone();
        update(&mut f);
        f
    }

    pub fn name(&self, name: &str) -> Finder {
        self.with(|f| f.name = Some(NameMatcher::Exact(name.to_string())))
    }

    pub fn name_containing(&self, name: &str) -> Finder {
        self.with(|f| f.name = Some(NameMatcher::Containing(name.to_string())))
    }

    pub fn name_starting_with(&self, name: &str) -> Finder {
        self.with(|f| f.name = Some(NameMatcher::StartingWith(name.to_string())))
    }

    /// Match the name against a regex, compiled now
    pub fn name_regex(&self, pattern: &str) -> Result<Finder, regex::Error> {
        let matcher = NameMatcher::regex(pattern)?;
        Ok(self.with(|f| f.name = Some(matcher)))
    }

    pub fn role(&self, role: Role) -> Finder {
        self.with(|f| f.role = Some(role))
    }

    pub fn class_name(&self, class: &str) -> Finder {
        self.with(|f| f.class_name = Some(ClassMatcher::Exact(class.to_string())))
    }

    /// The class name contains `class` as a whole word
    pub fn has_class(&self, class: &str) -> Finder {
        self.with(|f| f.class_name = Some(ClassMatcher::has(class)))
    }

    pub fn state(&self, state: State, value: bool) -> Finder {
        self.with(|f| {
            f.state.insert(state, value);
        })
    }

    pub fn autofill_available(&self) -> Finder {
        self.state(State::AutofillAvailable, true)
    }

    pub fn collapsed(&self) -> Finder {
        self.state(State::Collapsed, true)
    }

    pub fn default_state(&self) -> Finder {
        self.state(State::Default, true)
    }

    pub fn editable(&self) -> Finder {
        self.state(State::Editable, true)
    }

    pub fn expanded(&self) -> Finder {
        self.state(State::Expanded, true)
    }

    pub fn focusable(&self) -> Finder {
        self.state(State::Focusable, true)
    }

    pub fn focused(&self) -> Finder {
        self.state(State::Focused, true)
    }

    pub fn horizontal(&self) -> Finder {
        self.state(State::Horizontal, true)
    }

    pub fn hovered(&self) -> Finder {
        self.state(State::Hovered, true)
    }

    pub fn ignored(&self) -> Finder {
        self.state(State::Ignored, true)
    }

    pub fn invisible(&self) -> Finder {
        self.state(State::Invisible, true)
    }

    pub fn visible(&self) -> Finder {
        self.state(State::Invisible, false)
    }

    pub fn linked(&self) -> Finder {
        self.state(State::Linked, true)
    }

    pub fn multiline(&self) -> Finder {
        self.state(State::Multiline, true)
    }

    pub fn multiselectable(&self) -> Finder {
        self.state(State::Multiselectable, true)
    }

    pub fn offscreen(&self) -> Finder {
        self.state(State::Offscreen, true)
    }

    pub fn onscreen(&self) -> Finder {
        self.state(State::Offscreen, false)
    }

    pub fn protected(&self) -> Finder {
        self.state(State::Protected, true)
    }

    pub fn required(&self) -> Finder {
        self.state(State::Required, true)
    }

    pub fn richly_editable(&self) -> Finder {
        self.state(State::RichlyEditable, true)
    }

    pub fn vertical(&self) -> Finder {
        self.state(State::Vertical, true)
    }

    pub fn visited(&self) -> Finder {
        self.state(State::Visited, true)
    }

    pub fn checked(&self, checked: Checked) -> Finder {
        self.with(|f| f.checked = Some(checked))
    }

    pub fn restriction(&self, restriction: Restriction) -> Finder {
        self.with(|f| f.restriction = Some(restriction))
    }

    /// Only look at descendants of the unique node `ancestor` matches
    pub fn ancestor(&self, ancestor: &Finder) -> Finder {
        self.with(|f| f.ancestor = Some(Box::new(ancestor.clone())))
    }

    /// Attach `ancestor` at the end of the existing ancestor chain
    pub fn final_ancestor(&self, ancestor: &Finder) -> Finder {
        match &self.ancestor {
            Some(existing) => {
                let chained = existing.final_ancestor(ancestor);
                self.with(|f| f.ancestor = Some(Box::new(chained)))
            }
            None => self.ancestor(ancestor),
        }
    }

    /// Take the first match in document order instead of requiring uniqueness
    pub fn first(&self) -> Finder {
        self.with(|f| {
            f.first = true;
            f.nth = 0;
        })
    }

    /// Take the match at index `n` (0-based) in document order
    pub fn nth(&self, n: usize) -> Finder {
        if n == 0 {
            return self.first();
        }
        self.with(|f| {
            f.nth = n;
            f.first = false;
        })
    }

    pub fn get_ancestor(&self) -> Option<&Finder> {
        self.ancestor.as_deref()
    }

    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn index(&self) -> usize {
        self.nth
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// True when the finder places no constraint on a node.
    /// An ancestor alone counts as a constraint; `first` and `nth` do not.
    pub fn is_empty(&self) -> bool {
        !self.root
            && self.name.is_none()
            && self.role.is_none()
            && self.class_name.is_none()
            && self.state.is_empty()
            && self.checked.is_none()
            && self.restriction.is_none()
            && self.ancestor.is_none()
    }

    /// Whether `node` satisfies this finder's own predicates.
    /// Ancestry and indexing are handled by [`resolve`].
    pub fn matches(&self, node: &NodeInfo) -> bool {
        if let Some(role) = self.role {
            if node.role != role {
                return false;
            }
        }
        if let Some(class) = &self.class_name {
            if !class.matches(&node.class_name) {
                return false;
            }
        }
        if self.state.iter().any(|(s, want)| node.is(*s) != *want) {
            return false;
        }
        if let Some(checked) = self.checked {
            if node.checked != checked {
                return false;
            }
        }
        if let Some(restriction) = self.restriction {
            if node.restriction != restriction {
                return false;
            }
        }
        match &self.name {
            Some(name) => name.matches(&node.name),
            None => true,
        }
    }

    /// Human-readable form used in error messages and logs
    pub fn pretty(&self) -> String {
        let mut parts = Vec::new();
        if self.root {
            parts.push("root: true".to_string());
        }
        if let Some(name) = &self.name {
            parts.push(format!("name: {}", name));
        }
        if let Some(class) = &self.class_name {
            parts.push(format!("className: {}", class));
        }
        if let Some(role) = self.role {
            parts.push(format!("role: {}", role));
        }
        if !self.state.is_empty() {
            let states: Vec<String> = self
                .state
                .iter()
                .map(|(s, v)| format!("{}: {}", s, v))
                .collect();
            parts.push(format!("state: {{{}}}", states.join(", ")));
        }
        if let Some(checked) = self.checked {
            parts.push(format!("checked: {}", checked));
        }
        if let Some(restriction) = self.restriction {
            parts.push(format!("restriction: {}", restriction));
        }
        if self.first {
            parts.push("first: true".to_string());
        }
        if self.nth > 0 {
            parts.push(format!("nth: {}", self.nth));
        }
        if let Some(ancestor) = &self.ancestor {
            parts.push(format!("ancestor: {}", ancestor.pretty()));
        }
        format!("{{{}}}", parts.join(", "))
    }
}

impl fmt::Display for Finder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

pub fn name(name: &str) -> Finder {
    Finder::new().name(name)
}

pub fn name_containing(name: &str) -> Finder {
    Finder::new().name_containing(name)
}

pub fn name_starting_with(name: &str) -> Finder {
    Finder::new().name_starting_with(name)
}

pub fn name_regex(pattern: &str) -> Result<Finder, regex::Error> {
    Finder::new().name_regex(pattern)
}

pub fn role(role: Role) -> Finder {
    Finder::new().role(role)
}

pub fn class_name(class: &str) -> Finder {
    Finder::new().class_name(class)
}

pub fn has_class(class: &str) -> Finder {
    Finder::new().has_class(class)
}

pub fn state(state: State, value: bool) -> Finder {
    Finder::new().state(state, value)
}

pub fn focused() -> Finder {
    Finder::new().focused()
}

pub fn ancestor(ancestor: &Finder) -> Finder {
    Finder::new().ancestor(ancestor)
}

pub fn root() -> Finder {
    Finder::root()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_do_not_mutate_receiver() {
        let base = role(Role::Button);
        let ok = base.name("OK");
        let cancel = base.name("Cancel");

        assert_eq!(base.pretty(), "{role: button}");
        assert_eq!(ok.pretty(), "{name: /^OK$/, role: button}");
        assert_eq!(cancel.pretty(), "{name: /^Cancel$/, role: button}");
    }

    #[test]
    fn test_is_empty() {
        assert!(Finder::new().is_empty());
        assert!(Finder::new().first().is_empty());
        assert!(Finder::new().nth(3).is_empty());
        assert!(!ancestor(&role(Role::Dialog)).is_empty());
        assert!(!Finder::root().is_empty());
        assert!(!focused().is_empty());
    }

    #[test]
    fn test_nth_zero_is_first() {
        assert_eq!(role(Role::Tab).nth(0), role(Role::Tab).first());
        assert_eq!(role(Role::Tab).nth(2).index(), 2);
        assert!(!role(Role::Tab).first().nth(2).is_first());
    }

    #[test]
    fn test_final_ancestor_extends_the_chain() {
        let f = name("OK")
            .ancestor(&role(Role::Dialog))
            .final_ancestor(&role(Role::Window));
        assert_eq!(
            f.pretty(),
            "{name: /^OK$/, ancestor: {role: dialog, ancestor: {role: window}}}"
        );
    }

    #[test]
    fn test_matches_treats_absent_state_as_false() {
        let node = NodeInfo::new(Role::Button, "OK");
        assert!(role(Role::Button).state(State::Focused, false).matches(&node));
        assert!(!role(Role::Button).focused().matches(&node));

        let node = node.with_state(State::Focused, true);
        assert!(role(Role::Button).focused().matches(&node));
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
name:
  containing: Wi-Fi
role: button
className:
  has: FeaturePodIconButton
state:
  focused: true
ancestor:
  role: dialog
first: true
"#;
        let finder: Finder = serde_yaml::from_str(yaml).unwrap();
        let expected = name_containing("Wi-Fi")
            .role(Role::Button)
            .has_class("FeaturePodIconButton")
            .focused()
            .ancestor(&role(Role::Dialog))
            .first();
        assert_eq!(finder, expected);

        let back: Finder = serde_yaml::from_str(&serde_yaml::to_string(&finder).unwrap()).unwrap();
        assert_eq!(back, finder);
    }
}
