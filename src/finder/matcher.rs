//! Name and class-name predicates
//!
//! Name regexes are compiled when the matcher is built, so a malformed
//! pattern is reported at construction or deserialization time.

use std::fmt;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

/// Predicate on a node's name
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Exact(String),
    Containing(String),
    StartingWith(String),
    Regex(Regex),
}

impl NameMatcher {
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(NameMatcher::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Exact(s) => name == s,
            NameMatcher::Containing(s) => name.contains(s.as_str()),
            NameMatcher::StartingWith(s) => name.starts_with(s.as_str()),
            NameMatcher::Regex(re) => re.is_match(name),
        }
    }
}

impl PartialEq for NameMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NameMatcher::Exact(a), NameMatcher::Exact(b))
            | (NameMatcher::Containing(a), NameMatcher::Containing(b))
            | (NameMatcher::StartingWith(a), NameMatcher::StartingWith(b)) => a == b,
            (NameMatcher::Regex(a), NameMatcher::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for NameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatcher::Exact(s) => write!(f, "/^{}$/", regex::escape(s)),
            NameMatcher::Containing(s) => write!(f, "/{}/", regex::escape(s)),
            NameMatcher::StartingWith(s) => write!(f, "/^{}/", regex::escape(s)),
            NameMatcher::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Serialized form: `{exact: ..}`, `{containing: ..}`, `{startingWith: ..}`
/// or `{regex: ..}`. A bare string deserializes as an exact match.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum NameRepr {
    Exact(String),
    Containing(String),
    StartingWith(String),
    Regex(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NameInput {
    Plain(String),
    Tagged(NameRepr),
}

impl TryFrom<NameInput> for NameMatcher {
    type Error = regex::Error;

    fn try_from(input: NameInput) -> Result<Self, Self::Error> {
        Ok(match input {
            NameInput::Plain(s) | NameInput::Tagged(NameRepr::Exact(s)) => NameMatcher::Exact(s),
            NameInput::Tagged(NameRepr::Containing(s)) => NameMatcher::Containing(s),
            NameInput::Tagged(NameRepr::StartingWith(s)) => NameMatcher::StartingWith(s),
            NameInput::Tagged(NameRepr::Regex(p)) => NameMatcher::regex(&p)?,
        })
    }
}

impl NameMatcher {
    fn key(&self) -> &'static str {
        match self {
            NameMatcher::Exact(_) => "exact",
            NameMatcher::Containing(_) => "containing",
            NameMatcher::StartingWith(_) => "startingWith",
            NameMatcher::Regex(_) => "regex",
        }
    }

    fn value(&self) -> &str {
        match self {
            NameMatcher::Exact(s) | NameMatcher::Containing(s) | NameMatcher::StartingWith(s) => s,
            NameMatcher::Regex(re) => re.as_str(),
        }
    }
}

/// Always a one-entry map so YAML output carries no enum tags
impl Serialize for NameMatcher {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key(), self.value())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for NameMatcher {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = NameInput::deserialize(deserializer)?;
        NameMatcher::try_from(input).map_err(serde::de::Error::custom)
    }
}

/// Predicate on a node's class name
#[derive(Debug, Clone)]
pub enum ClassMatcher {
    /// The whole class name equals the string
    Exact(String),
    /// The class name contains the string as a whole word
    Has(String),
}

impl ClassMatcher {
    pub fn has(class: &str) -> Self {
        ClassMatcher::Has(class.to_string())
    }

    pub fn matches(&self, class_name: &str) -> bool {
        match self {
            ClassMatcher::Exact(s) => class_name == s,
            ClassMatcher::Has(s) => contains_word(class_name, s),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Word-boundary containment, the same as matching `\b<word>\b`
fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        before.map_or(true, |c| !is_word_char(c)) && after.map_or(true, |c| !is_word_char(c))
    })
}

impl PartialEq for ClassMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ClassMatcher::Exact(a), ClassMatcher::Exact(b)) => a == b,
            (ClassMatcher::Has(a), ClassMatcher::Has(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ClassMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassMatcher::Exact(s) => write!(f, "{:?}", s),
            ClassMatcher::Has(s) => write!(f, "/\\b{}\\b/", regex::escape(s)),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum ClassRepr {
    Exact(String),
    Has(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassInput {
    Plain(String),
    Tagged(ClassRepr),
}

impl Serialize for ClassMatcher {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ClassMatcher::Exact(s) => map.serialize_entry("exact", s)?,
            ClassMatcher::Has(class) => map.serialize_entry("has", class)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassMatcher {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ClassInput::deserialize(deserializer)? {
            ClassInput::Plain(s) | ClassInput::Tagged(ClassRepr::Exact(s)) => ClassMatcher::Exact(s),
            ClassInput::Tagged(ClassRepr::Has(s)) => ClassMatcher::has(&s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matchers() {
        assert!(NameMatcher::Exact("OK".into()).matches("OK"));
        assert!(!NameMatcher::Exact("OK".into()).matches("OK button"));
        assert!(NameMatcher::Containing("Wi-Fi".into()).matches("Show Wi-Fi networks"));
        assert!(NameMatcher::StartingWith("Show".into()).matches("Show Wi-Fi networks"));
        assert!(NameMatcher::regex("^Tab [0-9]+$").unwrap().matches("Tab 12"));
    }

    #[test]
    fn test_invalid_regex_fails_at_construction() {
        assert!(NameMatcher::regex("(unclosed").is_err());
        let res: Result<NameMatcher, _> = serde_yaml::from_str("regex: \"(unclosed\"");
        assert!(res.is_err());
    }

    #[test]
    fn test_has_class_matches_whole_words() {
        let m = ClassMatcher::has("Tab");
        assert!(m.matches("Tab"));
        assert!(m.matches("BrowserView Tab selected"));
        assert!(!m.matches("TabStrip"));
    }

    #[test]
    fn test_plain_string_deserializes_as_exact() {
        let m: NameMatcher = serde_yaml::from_str("\"Close\"").unwrap();
        assert_eq!(m, NameMatcher::Exact("Close".into()));

        let m: NameMatcher = serde_yaml::from_str("containing: Wi-Fi").unwrap();
        assert_eq!(m, NameMatcher::Containing("Wi-Fi".into()));

        let c: ClassMatcher = serde_yaml::from_str("has: Tab").unwrap();
        assert_eq!(c, ClassMatcher::has("Tab"));
    }

    #[test]
    fn test_serialized_matchers_read_back() {
        let names = vec![
            NameMatcher::Exact("Close".into()),
            NameMatcher::Containing("Wi-Fi".into()),
            NameMatcher::StartingWith("Show".into()),
            NameMatcher::regex("^Tab [0-9]+$").unwrap(),
        ];
        for m in &names {
            let yaml = serde_yaml::to_string(m).unwrap();
            assert!(!yaml.contains('!'), "tagged yaml: {}", yaml);
            assert_eq!(&serde_yaml::from_str::<NameMatcher>(&yaml).unwrap(), m);
            let json = serde_json::to_string(m).unwrap();
            assert_eq!(&serde_json::from_str::<NameMatcher>(&json).unwrap(), m);
        }
        assert_eq!(
            serde_json::to_string(&NameMatcher::StartingWith("Show".into())).unwrap(),
            r#"{"startingWith":"Show"}"#
        );

        for c in [ClassMatcher::Exact("Frame".into()), ClassMatcher::has("Tab")] {
            let yaml = serde_yaml::to_string(&c).unwrap();
            assert!(!yaml.contains('!'), "tagged yaml: {}", yaml);
            assert_eq!(serde_yaml::from_str::<ClassMatcher>(&yaml).unwrap(), c);
        }
        assert_eq!(serde_json::to_string(&ClassMatcher::has("Tab")).unwrap(), r#"{"has":"Tab"}"#);
    }

    #[test]
    fn test_pretty_form() {
        assert_eq!(NameMatcher::Exact("a.b".into()).to_string(), r"/^a\.b$/");
        assert_eq!(ClassMatcher::Exact("Frame".into()).to_string(), "\"Frame\"");
    }
}
