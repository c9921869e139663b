use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nudge",
    version,
    about = "Nudge: a to-do list with one-shot reminders",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Config file to read instead of ~/.nudgerc.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory holding the task list and the notification registry.
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a task to the list.
    Add {
        title: Vec<String>,
    },

    /// Show the task list.
    List,

    /// Flip a task between done and not done.
    Toggle {
        id: String,
    },

    /// Change a task's title and/or reminder.
    Edit {
        id: String,

        /// New title; the current one is kept when omitted.
        #[arg(long = "title")]
        title: Option<String>,

        /// When to fire the reminder: RFC 3339, "YYYY-MM-DD HH:MM",
        /// "YYYY-MM-DD", or a relative offset like 90m, 2h, 1d12h.
        #[arg(long = "remind", conflicts_with = "no_reminder")]
        remind: Option<String>,

        /// Drop the task's reminder.
        #[arg(long = "no-reminder")]
        no_reminder: bool,
    },

    /// Remove a task, cancelling its reminder first.
    Delete {
        id: String,
    },

    /// Show the pending reminder notifications.
    Reminders,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
