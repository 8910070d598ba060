//! Application context: the task store, the view state and the file they are
//! persisted to, plus the renderers that want to hear about every change.

use crate::model::{DateKey, TaskStore};
use crate::schedule::{ViewMode, ViewScheduler, ViewState, VisibleTask};
use crate::storage::{load_store, save_store, StoreLocation};
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Plain data handed to renderers after each change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: ViewState,
    pub label: String,
    pub date_number: String,
    pub tasks: Vec<VisibleTask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AddTask(String),
    SelectView(ViewMode),
    Navigate(i32),
    Today,
    GoTo(NaiveDate),
    Toggle { date_key: DateKey, index: usize },
    Delete { date_key: DateKey, index: usize },
}

pub type Renderer = Box<dyn FnMut(&Snapshot)>;

pub struct App {
    store: TaskStore,
    scheduler: ViewScheduler,
    location: StoreLocation,
    today: NaiveDate,
    renderers: Vec<Renderer>,
}

impl App {
    pub fn new(store: TaskStore, location: StoreLocation, today: NaiveDate) -> Self {
        App {
            store,
            scheduler: ViewScheduler::new(ViewMode::Day, today),
            location,
            today,
            renderers: Vec::new(),
        }
    }

    pub fn open(location: StoreLocation, today: NaiveDate) -> Self {
        let store = load_store(&location);
        Self::new(store, location, today)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn scheduler(&self) -> &ViewScheduler {
        &self.scheduler
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub fn subscribe(&mut self, renderer: impl FnMut(&Snapshot) + 'static) {
        self.renderers.push(Box::new(renderer));
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.scheduler.state(),
            label: self.scheduler.label(),
            date_number: self.scheduler.date_number(),
            tasks: self.scheduler.visible(&self.store),
        }
    }

    /// Applies one input event, persists task changes, and notifies renderers.
    ///
    /// A toggle or delete aimed at a missing task fails without saving or
    /// rendering.
    pub fn dispatch(&mut self, event: Event) -> Result<Snapshot> {
        match event {
            Event::AddTask(text) => {
                let key = self.scheduler.current_key();
                tracing::info!(date_key = %key, "adding task");
                self.store.add(&key, text);
                self.persist()?;
            }
            Event::SelectView(mode) => self.scheduler.set_mode(mode),
            Event::Navigate(delta) => self.scheduler.advance(delta),
            Event::Today => self.scheduler.go_to(self.today),
            Event::GoTo(date) => self.scheduler.go_to(date),
            Event::Toggle { date_key, index } => {
                let completed = self
                    .store
                    .toggle(&date_key, index)
                    .with_context(|| format!("toggling task {} on {}", index, date_key))?;
                tracing::info!(%date_key, index, completed, "toggled task");
                self.persist()?;
            }
            Event::Delete { date_key, index } => {
                let removed = self
                    .store
                    .delete(&date_key, index)
                    .with_context(|| format!("deleting task {} on {}", index, date_key))?;
                tracing::info!(%date_key, index, text = %removed.text, "deleted task");
                self.persist()?;
            }
        }
        let snapshot = self.snapshot();
        for render in self.renderers.iter_mut() {
            render(&snapshot);
        }
        Ok(snapshot)
    }

    fn persist(&self) -> Result<()> {
        save_store(&self.location, &self.store)
    }
}
