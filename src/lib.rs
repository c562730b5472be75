//! # UI Actions
//!
//! Composable UI automation over an accessibility tree. Actions are built
//! from finders, combined into larger actions, and run under a context that
//! carries a deadline and cancellation.
//!
//! ## Features
//!
//! - **Finders** - Immutable node predicates: name, role, class, states, ancestry
//! - **Polling** - Every wait is bounded by the UI timeout or the caller's deadline
//! - **Combinators** - Sequencing, naming, retries, conditionals
//! - **Device modes** - Clamshell and tablet handlers behind one trait
//! - **Declarative plans** - YAML scenarios compiled into actions
//!
//! ## Drivers
//!
//! - **Memory**: Synthetic accessibility tree, scriptable from tests
//! - **RPC**: Accessibility backend process spoken to over JSON-RPC on stdio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ui_actions::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let tree = TreeNode::from_yaml(r#"
//! role: desktop
//! location: { left: 0, top: 0, width: 800, height: 600 }
//! children:
//!   - role: button
//!     name: Settings
//!     location: { left: 10, top: 10, width: 80, height: 30 }
//! "#)?;
//!     let ui = UiContext::new(Arc::new(MemoryDriver::new(tree)));
//!     let settings = finder::name("Settings").role(Role::Button);
//!
//!     let open = named(
//!         "open settings",
//!         combine(
//!             "click settings",
//!             vec![
//!                 ui.with_timeout(Duration::from_secs(5)).wait_until_exists(&settings),
//!                 ui.left_click(&settings),
//!             ],
//!         ),
//!     );
//!     open.run(&Context::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod finder;
pub mod handler;
pub mod input;
pub mod plan;
pub mod uiauto;

// Re-export main types
pub use config::{ConfigError, EngineConfig};
pub use driver::{Driver, DriverError, MemoryDriver, NodeInfo, Rect, RpcDriver, TreeNode};
pub use engine::{Action, ActionError, ActionResult, Context, ErrorKind, PollOptions, RunResult, Runner, Verdict};
pub use finder::Finder;
pub use handler::{new_action_handler, DeviceMode, UiActionHandler};
pub use plan::{compile, LoadError, Plan, PlanError, PlanLoader};
pub use uiauto::UiContext;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::driver::{
        Driver, DriverError, MemoryDriver, MouseClick, NodeInfo, Point, Rect, RpcDriver,
        ScrollDirection, TreeNode,
    };
    pub use crate::engine::{
        combine, if_fail_then, if_success_then, named, poll_break, repeat, retry, retry_until,
        sleep, Action, ActionError, ActionResult, Context, ErrorKind, PollOptions, Runner, Verdict,
    };
    pub use crate::finder::{self, Checked, Finder, Restriction, Role, State};
    pub use crate::handler::{new_action_handler, DeviceMode, UiActionHandler};
    pub use crate::uiauto::UiContext;
}
