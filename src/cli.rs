use crate::schedule::ViewMode;
use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dayplan", version, about = "Date-organized task list")]
pub struct Cli {
    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,
    /// Task file to use instead of the discovered one
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// View granularity: day, week, month or year
    #[arg(long, value_parser = clap::value_parser!(ViewMode))]
    pub view: Option<ViewMode>,
    /// Reference date in YYYY-MM-DD format (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a task file in the current directory
    Init,
    /// Add a task to a day
    Add {
        /// Task text
        text: String,
        /// Day to file the task under (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Show the tasks visible in a view
    List {
        #[command(flatten)]
        view: ViewArgs,
        /// Move the window by this many units of the view
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i32,
    },
    /// Flip a task between open and done
    Toggle {
        /// Day the task is filed under (YYYY-MM-DD)
        date_key: String,
        /// Position of the task within that day
        index: usize,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Remove a task
    Delete {
        /// Day the task is filed under (YYYY-MM-DD)
        date_key: String,
        /// Position of the task within that day
        index: usize,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Launch the interactive TUI
    Tui {
        #[command(flatten)]
        view: ViewArgs,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    crate::model::parse_date_key(raw.trim())
        .ok_or_else(|| format!("invalid date (use YYYY-MM-DD): {}", raw))
}

/// Installs the stderr subscriber. `interactive` silences logging by default
/// so the TUI's alternate screen is not drawn over.
pub fn init_tracing(verbose: u8, quiet: u8, interactive: bool) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 || (interactive && verbose == 0) {
        "off"
    } else if quiet == 1 {
        "error"
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
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        tracing::debug!(error = %err, "tracing subscriber already set, continuing");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_accepts_view_date_and_negative_shift() {
        let cli = Cli::parse_from([
            "dayplan", "list", "--view", "week", "--date", "2024-03-06", "--shift", "-1",
        ]);
        match cli.command {
            Some(Command::List { view, shift }) => {
                assert_eq!(view.view, Some(ViewMode::Week));
                assert_eq!(view.date, NaiveDate::from_ymd_opt(2024, 3, 6));
                assert_eq!(shift, -1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn bad_date_is_rejected() {
        let parsed = Cli::try_parse_from(["dayplan", "add", "rent", "--date", "03/01/2024"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dayplan", "toggle", "2024-03-01", "0", "-vv", "--file", "x.yml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.file, Some(PathBuf::from("x.yml")));
    }
}
