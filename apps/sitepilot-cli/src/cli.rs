//! Command-line surface: load a manifest file, run one goal, print the
//! trace. All file I/O lives here; the core never touches the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use sitepilot_core::engine::{execute, GoalInstance};
use sitepilot_core::manifest::{load_manifest, ManifestSpec};
use sitepilot_core::resolver::GoalDescriptor;
use sitepilot_core::trace::SUMMARY_VALIDATION_FAILED;

#[derive(Debug, Parser)]
#[command(name = "sitepilot", about = "Sitepilot CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve and validate one goal against a manifest, print the trace
    Run(RunArgs),
    /// List the actions a manifest declares
    Actions(ManifestArgs),
    /// Structurally validate a manifest
    Check(ManifestArgs),
}

#[derive(Debug, Args, Clone)]
struct RunArgs {
    #[arg(default_value = "manifests/flight_search.json")]
    manifest: PathBuf,
    /// Goal id declared in the manifest
    #[arg(long)]
    goal: String,
    /// Goal description quoted in the trace summary (defaults to the
    /// manifest's description for the goal)
    #[arg(long)]
    description: Option<String>,
    /// Input values as name=value (repeatable)
    #[arg(long = "input", value_name = "NAME=VALUE")]
    inputs: Vec<String>,
    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Args, Clone)]
struct ManifestArgs {
    #[arg(default_value = "manifests/flight_search.json")]
    manifest: PathBuf,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Run(args) => {
                init_logging(args.verbose);
                run_goal(args)
            }
            Command::Actions(args) => {
                init_logging(false);
                list_actions(&args.manifest)
            }
            Command::Check(args) => {
                init_logging(false);
                check_manifest(&args.manifest)
            }
        }
    }
}

fn run_goal(args: RunArgs) -> Result<()> {
    let manifest = load(&args.manifest)?;

    let description = match args.description {
        Some(description) => description,
        None => manifest
            .goal(&args.goal)
            .map(|g| g.description.clone())
            .unwrap_or_else(|| args.goal.clone()),
    };

    let mut instance = GoalInstance::new(description);
    for raw in &args.inputs {
        let (name, value) = parse_input(raw)?;
        instance = instance.with_value(name, value);
    }

    let goal = GoalDescriptor::by_id(args.goal.as_str());
    let trace = execute(&manifest, &goal, &instance)
        .with_context(|| format!("resolve goal '{}'", args.goal))?;

    let rendered = if args.compact {
        serde_json::to_string(&trace)?
    } else {
        serde_json::to_string_pretty(&trace)?
    };
    println!("{rendered}");

    if trace.result_summary == SUMMARY_VALIDATION_FAILED {
        std::process::exit(1);
    }
    Ok(())
}

fn list_actions(path: &Path) -> Result<()> {
    let manifest = load(path)?;
    for action in &manifest.actions {
        let goals = if action.goals.is_empty() {
            "-".to_string()
        } else {
            action.goals.join(", ")
        };
        println!("{}\t{}\t[{}]", action.id, action.title, goals);
    }
    Ok(())
}

fn check_manifest(path: &Path) -> Result<()> {
    let manifest = load(path)?;
    println!(
        "{}: OK ({} goal(s), {} action(s), {} state model(s))",
        path.display(),
        manifest.goals.len(),
        manifest.actions.len(),
        manifest.state_models.len()
    );
    Ok(())
}

fn load(path: &Path) -> Result<ManifestSpec> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let manifest = load_manifest(&contents)
        .with_context(|| format!("load manifest {}", path.display()))?
        .with_origin(path.display().to_string());
    info!(origin = %manifest.origin(), actions = manifest.actions.len(), "manifest loaded");
    Ok(manifest)
}

fn parse_input(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => bail!("invalid --input '{raw}': expected NAME=VALUE"),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_splits_on_first_equals() {
        let (name, value) = parse_input("date_range=2025-01-10/2025-01-15").expect("parse");
        assert_eq!(name, "date_range");
        assert_eq!(value, "2025-01-10/2025-01-15");

        let (name, value) = parse_input("note=a=b").expect("parse");
        assert_eq!(name, "note");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn test_parse_input_rejects_missing_equals_or_name() {
        assert!(parse_input("origin").is_err());
        assert!(parse_input("=SFO").is_err());
    }
}
