pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod manager;
pub mod notify;
pub mod platform;
pub mod render;
pub mod store;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::Cli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting nudge CLI"
    );

    let cfg = config::Config::load(cli.config.as_deref())?;
    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = store::TaskStore::open(&data_dir)
        .with_context(|| format!("failed to open task store at {}", data_dir.display()))?;
    let registry = platform::FileRegistry::open(&data_dir).with_context(|| {
        format!(
            "failed to open notification registry at {}",
            data_dir.display()
        )
    })?;

    let policy = notify::HandlerPolicy::from_config(&cfg);
    let mut notifier = notify::Notifier::new(Box::new(registry), policy)?;
    let granted = notifier.ensure_permission()?;
    debug!(granted, "notification permission checked");

    let mut manager = manager::TaskManager::open(store, notifier);
    let mut renderer = render::Renderer::new(&cfg)?;

    commands::dispatch(&mut manager, &mut renderer, cli.command)?;

    info!("done");
    Ok(())
}
