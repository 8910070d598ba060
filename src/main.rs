use anyhow::Result;
use clap::Parser;
use dayplan::cli::{self, Command, ViewArgs};
use dayplan::commands;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let file = args.file;
    let command = args.command.unwrap_or(Command::Tui {
        view: ViewArgs::default(),
    });
    let interactive = matches!(command, Command::Tui { .. });
    cli::init_tracing(args.verbose, args.quiet, interactive)?;
    match command {
        Command::Init => commands::init(),
        Command::Add { text, date } => commands::add(file, text, date),
        Command::List { view, shift } => commands::list(file, view, shift),
        Command::Toggle {
            date_key,
            index,
            view,
        } => commands::toggle(file, date_key, index, view),
        Command::Delete {
            date_key,
            index,
            view,
        } => commands::delete(file, date_key, index, view),
        Command::Tui { view } => commands::tui(file, view),
    }
}
