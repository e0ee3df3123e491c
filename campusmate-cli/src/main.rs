//! Campusmate CLI — interactive slash-command surface.
//!
//! Runs the suggestion TUI by default; subcommands inspect the command
//! catalog and the persisted plugin enablement state.

mod dispatch;
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use campusmate_core::{
    Catalog, DisabledOverlay, EnablementSource, FileEnablementStore, SuggestionPresenter,
    load_config,
};

use dispatch::EchoDispatcher;

/// Campusmate: slash-command suggestions for the campus assistant
#[derive(Parser, Debug)]
#[command(name = "campusmate", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory holding the enablement record
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Treat plugins absent from the enablement record as disabled
    #[arg(long)]
    fail_closed: bool,

    /// Disable a plugin for this session (repeatable)
    #[arg(long = "disable", value_name = "PLUGIN")]
    disabled: Vec<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the command catalog
    Commands,
    /// Show plugin enablement state
    Plugins,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if cli.fail_closed {
        config.fail_closed = true;
    }

    init_tracing(cli.verbose, &config.log_filter);

    let catalog = Arc::new(Catalog::with_defaults()?);
    let store = FileEnablementStore::new(&config.data_dir, config.fail_policy());
    let source: Arc<dyn EnablementSource> = if cli.disabled.is_empty() {
        Arc::new(store)
    } else {
        Arc::new(DisabledOverlay::new(store, cli.disabled))
    };

    match cli.command {
        Some(Commands::Commands) => {
            for line in catalog_listing(&catalog) {
                println!("{line}");
            }
        }
        Some(Commands::Plugins) => {
            let snapshot = source.snapshot().await;
            for plugin_id in catalog.plugin_ids() {
                let state = if snapshot.is_enabled(plugin_id) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("{plugin_id:<14} {state}");
            }
        }
        None => {
            let presenter = SuggestionPresenter::new(catalog, source);
            tui::run(presenter, Arc::new(EchoDispatcher)).await?;
        }
    }

    Ok(())
}

/// Format the catalog for the `commands` subcommand: one line per
/// command, indented lines for its parameters.
fn catalog_listing(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();
    for cmd in catalog.list() {
        lines.push(format!(
            "{:<14} {:<12} {}",
            cmd.trigger, cmd.plugin_id, cmd.description
        ));
        for param in &cmd.params {
            let required = if param.required { "*" } else { "" };
            lines.push(format!("    {}{} ({:?})", param.name, required, param.kind));
        }
    }
    lines
}

/// Map `-v` counts to a tracing filter, honoring RUST_LOG when set.
fn init_tracing(verbose: u8, default_filter: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::new(value),
        Err(_) => match verbose {
            0 => EnvFilter::new(default_filter),
            1 => EnvFilter::new("campusmate=debug"),
            _ => EnvFilter::new("campusmate=trace"),
        },
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_listing_names_every_command() {
        let catalog = Catalog::with_defaults().unwrap();
        let lines = catalog_listing(&catalog);
        for trigger in [
            "/documents",
            "/scores",
            "/summary",
            "/timetable",
            "/questions",
            "/research",
            "/sto",
            "/nlp",
            "/topcv",
        ] {
            assert!(
                lines.iter().any(|l| l.starts_with(trigger)),
                "{trigger} missing from listing"
            );
        }
    }

    #[test]
    fn test_catalog_listing_marks_required_params() {
        let catalog = Catalog::with_defaults().unwrap();
        let lines = catalog_listing(&catalog);
        assert!(lines.iter().any(|l| l.trim_start().starts_with("semester*")));
        // prefer_lecturer is optional, so no marker.
        assert!(
            lines
                .iter()
                .any(|l| l.trim_start().starts_with("prefer_lecturer ("))
        );
    }
}
