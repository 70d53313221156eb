//! addon-graph CLI - Main entry point

mod commands;

use addon_core::{AddonSettings, Project, ProjectOptions};
use addon_foundation::SETTINGS_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// addons - inspect addon discovery, ordering and instance caching
#[derive(Parser, Debug)]
#[command(name = "addons")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Project root directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Settings file (defaults to <root>/addon-settings.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable per-bundle instance caching
    #[arg(long)]
    no_instance_caching: bool,

    /// Let lazy engines reuse addons the project already bundles
    #[arg(long)]
    dedupe_engines: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the project's top-level addons in load order
    List,
    /// Print the full addon tree, marking proxies
    Tree {
        /// Stop descending below this depth
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print non-fatal package errors found during discovery
    Errors,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = load_settings(&args)?;
    tracing::debug!("Using settings: {:?}", settings);

    let project = Project::load(&args.root, ProjectOptions::new().with_settings(settings))?;

    match args.command {
        Command::List => {
            project.initialize_addons()?;
            commands::list(&project);
        }
        Command::Tree { depth } => {
            project.initialize_addons()?;
            commands::tree(&project, depth);
        }
        Command::Errors => {
            let report = project.error_report();
            commands::errors(&report);
        }
    }

    Ok(())
}

/// Settings file + env, then command line flags on top
fn load_settings(args: &Args) -> anyhow::Result<AddonSettings> {
    if let Some(path) = &args.config {
        if !path.exists() {
            anyhow::bail!("settings file {} not found", path.display());
        }
    }
    let default_path = args.root.join(SETTINGS_FILE);
    let path = args.config.as_deref().unwrap_or(&default_path);
    let mut settings = AddonSettings::resolve(Some(path))?;

    if args.no_instance_caching {
        settings = settings.instance_caching(false);
    }
    if args.dedupe_engines {
        settings = settings.engines_addon_dedupe(true);
    }
    // the `errors` command prints the report itself
    if matches!(args.command, Command::Errors) {
        settings = settings.report_package_errors(false);
    }
    Ok(settings)
}
