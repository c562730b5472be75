use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ui_actions::config::parse_duration;
use ui_actions::finder::resolve_all;
use ui_actions::plan::{compile, Plan, PlanLoader};
use ui_actions::prelude::*;
use ui_actions::{EngineConfig, RunResult};

#[derive(Parser)]
#[command(name = "ui-actions")]
#[command(about = "Run UI automation plans against an accessibility backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a plan file, or every plan in a directory
    Run {
        /// Path to a plan YAML file or a directory of plans
        #[arg(value_name = "PLAN")]
        plan: PathBuf,

        /// Run against a synthetic accessibility tree
        #[arg(long, value_name = "TREE", conflicts_with = "backend")]
        tree: Option<PathBuf>,

        /// Backend program spoken to over JSON-RPC on stdio
        #[arg(long, value_name = "PROGRAM")]
        backend: Option<String>,

        /// Arguments passed to the backend program
        #[arg(last = true, value_name = "ARGS")]
        backend_args: Vec<String>,

        /// Engine config file (default: <DIR>/config.yaml when running a directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where failure dumps are written (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Default UI timeout, e.g. "10s" (overrides config)
        #[arg(short, long)]
        timeout: Option<String>,
    },

    /// Validate plan files without running them
    Validate {
        /// Path to plan file or directory
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Resolve a finder against a tree file and print the matches
    Query {
        /// Synthetic accessibility tree YAML
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        /// Finder as YAML, e.g. '{ role: button, name: OK }'
        #[arg(value_name = "FINDER")]
        finder: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "ui_actions=debug"
    } else {
        "ui_actions=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "ui-actions failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Run {
            plan,
            tree,
            backend,
            backend_args,
            config,
            output,
            timeout,
        } => run_plans(plan, tree, backend, backend_args, config, output, timeout).await,
        Commands::Validate { path } => validate(path),
        Commands::Query { tree, finder } => query(tree, &finder),
    }
}

fn load_plans(path: &Path) -> anyhow::Result<Vec<Plan>> {
    if !path.exists() {
        anyhow::bail!("Path not found: {}", path.display());
    }
    if path.is_dir() {
        Ok(PlanLoader::load_directory(path)?)
    } else {
        Ok(vec![PlanLoader::load_file(path)?])
    }
}

fn load_config(plan: &Path, config: Option<PathBuf>) -> anyhow::Result<EngineConfig> {
    let config = config.or_else(|| {
        let default = plan.join("config.yaml");
        (plan.is_dir() && default.exists()).then_some(default)
    });
    match config {
        Some(path) => {
            println!("Using config: {}\n", path.display());
            Ok(EngineConfig::load(&path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_plans(
    path: PathBuf,
    tree: Option<PathBuf>,
    backend: Option<String>,
    backend_args: Vec<String>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    timeout: Option<String>,
) -> anyhow::Result<bool> {
    let mut config = load_config(&path, config)?;
    if let Some(output) = output {
        config.output_dir = Some(output);
    }
    if let Some(timeout) = timeout {
        config.timeout = parse_duration(&timeout)?;
    }

    let plans = load_plans(&path)?;
    if plans.is_empty() {
        println!("No plans found in: {}", path.display());
        return Ok(true);
    }

    let driver: Arc<dyn Driver> = match (tree, backend, &config.backend) {
        (Some(tree), _, _) => Arc::new(MemoryDriver::new(TreeNode::load(&tree)?)),
        (None, Some(program), _) => Arc::new(RpcDriver::start(&program, &backend_args).await?),
        (None, None, Some(backend)) => Arc::new(RpcDriver::start(&backend.program, &backend.args).await?),
        (None, None, None) => anyhow::bail!("No driver: pass --tree or --backend, or set backend in the config"),
    };

    let ui = UiContext::from_config(driver.clone(), &config);
    let actions = plans
        .iter()
        .map(|plan| compile(plan, &ui).with_context(|| format!("Invalid plan '{}'", plan.name)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let root = Context::new();
    let cancel = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    let runner = Runner::from_config(driver, &config);
    let mut results = Vec::new();
    for (plan, action) in plans.iter().zip(&actions) {
        println!("Running plan: {}", plan.name);
        let result = runner.run_in(&root, &plan.name, action, None).await;
        let aborted = result.verdict == Verdict::Aborted;
        results.push(result);
        if aborted {
            break;
        }
    }

    print_results(&results);
    Ok(results.iter().all(RunResult::success) && results.len() == plans.len())
}

fn print_results(results: &[RunResult]) {
    println!("\n=== Results ===\n");
    for result in results {
        let status = if result.success() { "✓" } else { "✗" };
        println!(
            "{} {} {} ({:.1}s)",
            status,
            result.name,
            result.verdict,
            result.elapsed.as_secs_f64()
        );
        if let Some(err) = &result.error {
            println!("    Error: {}", err);
        }
        if let Some(dir) = &result.dump_dir {
            println!("    Dump: {}", dir.display());
        }
    }
    let passed = results.iter().filter(|r| r.success()).count();
    println!("\n{}/{} passed", passed, results.len());
}

fn validate(path: PathBuf) -> anyhow::Result<bool> {
    let plans = load_plans(&path)?;
    if plans.is_empty() {
        println!("No plans found in: {}", path.display());
        return Ok(true);
    }

    let ui = UiContext::new(Arc::new(MemoryDriver::new(TreeNode::default())));
    let mut valid = true;
    for plan in &plans {
        match compile(plan, &ui) {
            Ok(_) => println!("✓ {} ({} steps)", plan.name, plan.steps.len()),
            Err(e) => {
                println!("✗ {}: {}", plan.name, e);
                valid = false;
            }
        }
    }
    Ok(valid)
}

fn query(tree: PathBuf, finder: &str) -> anyhow::Result<bool> {
    let tree = TreeNode::load(&tree)?;
    let finder: Finder = serde_yaml::from_str(finder).context("Invalid finder")?;
    println!("Finder: {}", finder);

    match resolve_all(&finder, &tree) {
        Ok(nodes) if nodes.is_empty() => {
            println!("No matches ({})", ErrorKind::NotFound);
            Ok(false)
        }
        Ok(nodes) => {
            for node in &nodes {
                println!("  {}", node.info);
            }
            println!("{} match(es)", nodes.len());
            Ok(true)
        }
        Err(e) => {
            let err = ActionError::from(DriverError::from(e));
            println!("{} ({})", err, err.kind());
            Ok(false)
        }
    }
}
