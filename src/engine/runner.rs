//! Top-level runs
//!
//! The runner owns the outermost context of a scenario. It bounds the run,
//! keeps time back for teardown, and on failure dumps what the UI looked like
//! so the failure can be diagnosed afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use super::action::Action;
use super::context::Context;
use super::error::{ActionError, ErrorKind};
use crate::config::EngineConfig;
use crate::driver::Driver;

/// Outcome of a run as a test harness would report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    Aborted,
    InfraFailure,
    TestBug,
}

impl From<ErrorKind> for Verdict {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Cancelled => Verdict::Aborted,
            ErrorKind::NotFound | ErrorKind::Timeout | ErrorKind::StateMismatch => Verdict::Failed,
            ErrorKind::TransportError => Verdict::InfraFailure,
            ErrorKind::CallerError => Verdict::TestBug,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Passed => "PASSED",
            Verdict::Failed => "FAILED",
            Verdict::Aborted => "ABORTED",
            Verdict::InfraFailure => "INFRA FAILURE",
            Verdict::TestBug => "TEST BUG",
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: String,
    pub name: String,
    pub verdict: Verdict,
    pub error: Option<ActionError>,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    /// Where the failure dump was written, if one was
    pub dump_dir: Option<PathBuf>,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

pub struct Runner {
    driver: Arc<dyn Driver>,
    run_timeout: Duration,
    cleanup_reserve: Duration,
    output_dir: Option<PathBuf>,
}

impl Runner {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::from_config(driver, &EngineConfig::default())
    }

    pub fn from_config(driver: Arc<dyn Driver>, config: &EngineConfig) -> Self {
        Self {
            driver,
            run_timeout: config.run_timeout,
            cleanup_reserve: config.cleanup_reserve,
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_cleanup_reserve(mut self, reserve: Duration) -> Self {
        self.cleanup_reserve = reserve;
        self
    }

    /// `None` disables failure dumps
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub async fn run(&self, name: &str, action: &Action) -> RunResult {
        self.run_in(&Context::new(), name, action, None).await
    }

    /// Like [`Runner::run`]; `cleanup` runs afterwards whatever the outcome,
    /// with the reserved time.
    pub async fn run_with_cleanup(&self, name: &str, action: &Action, cleanup: &Action) -> RunResult {
        self.run_in(&Context::new(), name, action, Some(cleanup)).await
    }

    /// Run under `parent`, so the caller can cancel the run
    #[instrument(skip(self, parent, action, cleanup))]
    pub async fn run_in(
        &self,
        parent: &Context,
        name: &str,
        action: &Action,
        cleanup: Option<&Action>,
    ) -> RunResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(run_id = %run_id, "Starting run: {}", name);

        let ctx = parent.with_timeout(self.run_timeout);
        let (work, cleanup_ctx) = ctx.reserve_for_cleanup(self.cleanup_reserve);

        let error = action.run(&work).await.err();
        let verdict = error
            .as_ref()
            .map_or(Verdict::Passed, |e| Verdict::from(e.kind()));

        let mut dump_dir = None;
        if let Some(err) = &error {
            error!("Run {} {}: {}", name, verdict, err);
            if matches!(verdict, Verdict::Failed | Verdict::InfraFailure | Verdict::TestBug) {
                if let Some(root) = &self.output_dir {
                    dump_dir = self.dump(&cleanup_ctx, root, name, err).await;
                }
            }
        }

        if let Some(cleanup) = cleanup {
            if let Err(e) = cleanup.run(&cleanup_ctx).await {
                warn!("Cleanup of {} failed: {}", name, e);
            }
        }

        let elapsed = start.elapsed();
        info!(run_id = %run_id, "Run {} finished in {:?}: {}", name, elapsed, verdict);
        RunResult {
            run_id,
            name: name.to_string(),
            verdict,
            error,
            elapsed,
            started_at,
            dump_dir,
        }
    }

    /// Write `error.txt`, `ui_tree.txt` and, when the backend can take one,
    /// `screenshot.png`. Failures here are logged, never returned.
    async fn dump(&self, ctx: &Context, root: &Path, name: &str, err: &ActionError) -> Option<PathBuf> {
        let dir = root.join(format!(
            "{}-{}",
            dir_name(name),
            Local::now().format("%Y%m%d-%H%M%S")
        ));
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!("Failed to create dump directory {}: {}", dir.display(), e);
            return None;
        }

        let report = format!("{}\nkind: {}\n", err, err.kind());
        if let Err(e) = tokio::fs::write(dir.join("error.txt"), report).await {
            warn!("Failed to write error report: {}", e);
        }

        match ctx.guard(self.driver.dump_tree()).await {
            Ok(tree) => {
                if let Err(e) = tokio::fs::write(dir.join("ui_tree.txt"), tree).await {
                    warn!("Failed to write UI tree: {}", e);
                }
            }
            Err(e) => warn!("Failed to dump UI tree: {}", e),
        }

        match ctx
            .guard(self.driver.capture_screenshot(&dir.join("screenshot.png")))
            .await
        {
            Ok(true) => {}
            Ok(false) => info!("Backend cannot take screenshots, skipping"),
            Err(e) => warn!("Failed to capture screenshot: {}", e),
        }

        info!("Failure dump written to {}", dir.display());
        Some(dir)
    }
}

/// Run names become directory names; keep them to a safe alphabet
fn dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "run".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MemoryDriver, NodeInfo, TreeNode};
    use crate::engine::combinators;
    use crate::finder::Role;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn runner() -> Runner {
        let driver = MemoryDriver::new(TreeNode::new(NodeInfo::new(Role::Desktop, "")));
        Runner::new(Arc::new(driver)).with_output_dir(None)
    }

    #[test]
    fn test_verdict_mapping() {
        assert_eq!(Verdict::from(ErrorKind::Cancelled), Verdict::Aborted);
        assert_eq!(Verdict::from(ErrorKind::NotFound), Verdict::Failed);
        assert_eq!(Verdict::from(ErrorKind::Timeout), Verdict::Failed);
        assert_eq!(Verdict::from(ErrorKind::StateMismatch), Verdict::Failed);
        assert_eq!(Verdict::from(ErrorKind::TransportError), Verdict::InfraFailure);
        assert_eq!(Verdict::from(ErrorKind::CallerError), Verdict::TestBug);
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(dir_name("sign out/in"), "sign_out_in");
        assert_eq!(dir_name(""), "run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timeout_leaves_cleanup_time() {
        let runner = runner()
            .with_run_timeout(Duration::from_secs(10))
            .with_cleanup_reserve(Duration::from_secs(3));
        let cleaned = Arc::new(AtomicBool::new(false));
        let flag = cleaned.clone();
        let cleanup = Action::new(move |ctx| {
            let flag = flag.clone();
            async move {
                ctx.err()?;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        });

        let result = runner
            .run_with_cleanup("slow", &combinators::sleep(Duration::from_secs(60)), &cleanup)
            .await;
        assert_eq!(result.verdict, Verdict::Failed);
        assert_eq!(result.error.as_ref().map(|e| e.kind()), Some(ErrorKind::Timeout));
        assert_eq!(result.elapsed, Duration::from_secs(7));
        assert!(cleaned.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancelled_run_is_aborted() {
        let parent = Context::new();
        parent.cancel();
        let result = runner()
            .run_in(&parent, "cancelled", &combinators::sleep(Duration::from_secs(1)), None)
            .await;
        assert_eq!(result.verdict, Verdict::Aborted);
        assert!(!result.success());
        assert!(result.dump_dir.is_none());
    }
}
