//! Action error types
//!
//! Every failure carries an [`ErrorKind`] tag, the chain of labels pushed by
//! named actions and combinators on the way up, and optionally the pretty
//! form of the finder that produced it.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::driver::DriverError;
use crate::finder::Finder;

/// The failure categories the engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No node matched the finder
    NotFound,
    /// A deadline fired before the operation succeeded
    Timeout,
    /// The context was cancelled
    Cancelled,
    /// The node exists but is in the wrong state
    StateMismatch,
    /// The accessibility backend failed
    TransportError,
    /// The caller violated an invariant (empty or ambiguous finder, bad argument)
    CallerError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::StateMismatch => "state mismatch",
            ErrorKind::TransportError => "transport error",
            ErrorKind::CallerError => "caller error",
        }
    }

    /// Whether polling and retry loops may try again after an error of this kind.
    /// Cancellation always surfaces and caller errors are never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Cancelled | ErrorKind::CallerError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionError {
    kind: ErrorKind,
    message: String,
    /// Innermost label first
    labels: Vec<String>,
    finder: Option<String>,
    /// For timeouts: the kind of the last error seen before the deadline
    cause: Option<ErrorKind>,
    poll_break: bool,
}

impl ActionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            labels: Vec::new(),
            finder: None,
            cause: None,
            poll_break: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "context cancelled")
    }

    pub fn state_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StateMismatch, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportError, message)
    }

    pub fn caller(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CallerError, message)
    }

    pub(crate) fn deadline_exceeded() -> Self {
        Self::timeout("context deadline exceeded")
    }

    /// Wrap the last error seen by a waiting loop as a timeout, keeping its
    /// message chain and finder.
    pub fn timed_out(last: ActionError, elapsed: Duration) -> Self {
        let cause = last.cause.unwrap_or(last.kind);
        Self {
            kind: ErrorKind::Timeout,
            message: format!("timed out after {:?}: {}", elapsed, last.message),
            labels: last.labels,
            finder: last.finder,
            cause: Some(cause),
            poll_break: false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The innermost message, without labels
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Labels from outermost to innermost
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().rev().map(String::as_str)
    }

    pub fn finder(&self) -> Option<&str> {
        self.finder.as_deref()
    }

    /// For a timeout, the kind of the error that kept the loop going
    pub fn cause(&self) -> Option<ErrorKind> {
        self.cause
    }

    /// Push a label onto the chain. The newest label is printed first.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Attach the finder that produced this error, unless one is already set
    pub fn with_finder(mut self, finder: &Finder) -> Self {
        if self.finder.is_none() {
            self.finder = Some(finder.pretty());
        }
        self
    }

    /// Mark this error so that [`poll`](crate::engine::poll::poll) stops
    /// immediately and returns it.
    pub fn into_poll_break(mut self) -> Self {
        self.poll_break = true;
        self
    }

    pub fn is_poll_break(&self) -> bool {
        self.poll_break
    }

    pub(crate) fn clear_poll_break(mut self) -> Self {
        self.poll_break = false;
        self
    }

    pub(crate) fn is_deadline_exceeded(&self) -> bool {
        self.kind == ErrorKind::Timeout && self.cause.is_none()
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in self.labels() {
            write!(f, "{}: ", label)?;
        }
        f.write_str(&self.message)?;
        match &self.finder {
            Some(finder) if !self.message.contains(finder.as_str()) => {
                write!(f, ": {}", finder)
            }
            _ => Ok(()),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<DriverError> for ActionError {
    fn from(err: DriverError) -> Self {
        let (kind, query) = match &err {
            DriverError::NotFound(query) => (ErrorKind::NotFound, Some(query.clone())),
            DriverError::Ambiguous(query) => (ErrorKind::CallerError, Some(query.clone())),
            DriverError::InvalidQuery(_) => (ErrorKind::CallerError, None),
            _ => (ErrorKind::TransportError, None),
        };
        // A failed lookup already names the query that failed, which may be
        // an ancestor of the finder the caller passed in.
        ActionError {
            finder: query,
            ..ActionError::new(kind, err.to_string())
        }
    }
}

/// Shorthand for marking an error as a poll break
pub fn poll_break(err: ActionError) -> ActionError {
    err.into_poll_break()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_print_outermost_first() {
        let err = ActionError::not_found("no node")
            .with_label("click OK")
            .with_label("close dialog");

        assert_eq!(err.to_string(), "close dialog: click OK: no node");
        assert_eq!(err.labels().collect::<Vec<_>>(), vec!["close dialog", "click OK"]);
    }

    #[test]
    fn test_timed_out_keeps_chain_and_cause() {
        let last = ActionError::not_found("no node")
            .with_label("wait for dialog")
            .with_finder(&Finder::new().name("OK"));
        let err = ActionError::timed_out(last, Duration::from_secs(2));

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.cause(), Some(ErrorKind::NotFound));
        assert!(err.to_string().starts_with("wait for dialog: timed out after 2s"));
        assert!(err.finder().unwrap().contains("OK"));
    }

    #[test]
    fn test_nested_timeout_keeps_original_cause() {
        let inner = ActionError::timed_out(ActionError::not_found("x"), Duration::from_secs(1));
        let outer = ActionError::timed_out(inner, Duration::from_secs(5));
        assert_eq!(outer.cause(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_driver_error_mapping() {
        let err: ActionError = DriverError::NotFound("{name: /^OK$/}".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: ActionError = DriverError::Ambiguous("{role: button}".into()).into();
        assert_eq!(err.kind(), ErrorKind::CallerError);

        let err: ActionError = DriverError::Disconnected.into();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }

    #[test]
    fn test_lookup_failure_names_the_failing_query_once() {
        let strip = Finder::new().role(crate::finder::Role::TabList);
        let tab = Finder::new().name("Docs").ancestor(&strip);

        let err = ActionError::from(DriverError::Ambiguous(strip.pretty()))
            .with_finder(&tab)
            .with_label("find tab");
        let text = err.to_string();
        assert_eq!(text.matches(strip.pretty().as_str()).count(), 1);
        assert!(!text.contains(tab.pretty().as_str()));
        assert_eq!(err.finder(), Some(strip.pretty().as_str()));

        let err = ActionError::from(DriverError::Disconnected).with_finder(&tab);
        assert_eq!(err.to_string(), format!("Backend disconnected: {}", tab.pretty()));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::NotFound.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
        assert!(!ErrorKind::CallerError.is_retryable());
    }

    #[test]
    fn test_finder_is_attached_once() {
        let err = ActionError::not_found("x")
            .with_finder(&Finder::new().name("inner"))
            .with_finder(&Finder::new().name("outer"));
        assert!(err.finder().unwrap().contains("inner"));
    }
}
