use crate::app::{App, Event, Snapshot};
use crate::cli::ViewArgs;
use crate::schedule::ViewMode;
use crate::storage::{init_project_store, locate_store, StoreLocation};
use crate::ui;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::env;
use std::path::PathBuf;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_store(&cwd)?;
    println!("Initialized task file at {}", location.path.display());
    Ok(())
}

pub fn add(file: Option<PathBuf>, text: String, date: Option<NaiveDate>) -> Result<()> {
    let mut app = open_app(file, date)?;
    let key = app.scheduler().current_key();
    app.dispatch(Event::AddTask(text))?;
    let index = app.store().get(&key).len().saturating_sub(1);
    println!("Added task {} on {}", index, key);
    Ok(())
}

pub fn list(file: Option<PathBuf>, view: ViewArgs, shift: i32) -> Result<()> {
    let mut app = open_view(file, &view)?;
    app.subscribe(print_snapshot);
    app.dispatch(Event::Navigate(shift))?;
    Ok(())
}

pub fn toggle(file: Option<PathBuf>, date_key: String, index: usize, view: ViewArgs) -> Result<()> {
    let mut app = open_view(file, &view)?;
    app.subscribe(print_snapshot);
    app.dispatch(Event::Toggle { date_key, index })?;
    Ok(())
}

pub fn delete(file: Option<PathBuf>, date_key: String, index: usize, view: ViewArgs) -> Result<()> {
    let mut app = open_view(file, &view)?;
    app.subscribe(print_snapshot);
    app.dispatch(Event::Delete { date_key, index })?;
    Ok(())
}

pub fn tui(file: Option<PathBuf>, view: ViewArgs) -> Result<()> {
    let app = open_view(file, &view)?;
    ui::run(app)
}

fn open_app(file: Option<PathBuf>, date: Option<NaiveDate>) -> Result<App> {
    let location = current_location(file)?;
    let mut app = App::open(location, Local::now().date_naive());
    if let Some(date) = date {
        app.dispatch(Event::GoTo(date))?;
    }
    Ok(app)
}

fn open_view(file: Option<PathBuf>, view: &ViewArgs) -> Result<App> {
    let mut app = open_app(file, view.date)?;
    app.dispatch(Event::SelectView(view.view.unwrap_or(ViewMode::Day)))?;
    Ok(app)
}

fn current_location(file: Option<PathBuf>) -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    let location = locate_store(file, &cwd)?;
    tracing::debug!(path = %location.path.display(), scope = location.scope_label(), "using task file");
    Ok(location)
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("{} · {}", snapshot.state.mode, snapshot.label);
    if snapshot.state.mode != ViewMode::Year {
        println!("{}", snapshot.date_number);
    }
    println!();
    if snapshot.tasks.is_empty() {
        println!("  (no tasks)");
    }
    for entry in &snapshot.tasks {
        let mark = if entry.task.completed { "x" } else { " " };
        println!(
            "  [{}] {} #{}  {}",
            mark, entry.date_key, entry.index, entry.task.text
        );
    }
}
