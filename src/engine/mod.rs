//! Action engine
//!
//! This module contains:
//! - `context` - Deadlines and cancellation handed to every action
//! - `error` - Error kinds and the label chain
//! - `poll` - The poll loop and cancellable sleep
//! - `action` - The type-erased action value
//! - `combinators` - Sequencing, naming, retries and conditionals
//! - `runner` - Top-level runs with cleanup and failure dumps

pub mod action;
pub mod combinators;
pub mod context;
pub mod error;
pub mod poll;
pub mod runner;

pub use action::{Action, ActionResult};
pub use combinators::{
    combine, if_fail_then, if_success_then, named, repeat, retry, retry_silently, retry_until,
    retry_with_interval, sleep, with_timeout,
};
pub use context::Context;
pub use error::{poll_break, ActionError, ErrorKind};
pub use poll::{poll, PollOptions, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
pub use runner::{RunResult, Runner, Verdict};
