//! Declarative plans
//!
//! A plan is a YAML scenario whose steps name UI and flow actions:
//! - `step` - Plan and Step definitions
//! - `action` - Parsing of the `uses` field
//! - `loader` - Load plans from files and directories
//! - `compile` - Turn a plan into a single [`Action`](crate::engine::Action)
//!
//! ```yaml
//! name: dismiss-dialog
//! timeout: 10s
//! steps:
//!   - uses: ui/wait-until-exists
//!     finder: { role: dialog, name: { containing: Update } }
//!   - name: close it
//!     uses: ui/click-until
//!     finder: { role: button, name: Later }
//!     condition:
//!       uses: ui/gone
//!       finder: { role: dialog }
//! ```

pub mod action;
pub mod compile;
pub mod loader;
pub mod step;

pub use action::{ActionCategory, ParsedAction};
pub use compile::{compile, compile_step, PlanError};
pub use loader::{LoadError, PlanLoader};
pub use step::{Plan, Step};
