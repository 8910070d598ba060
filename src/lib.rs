pub mod app;
pub mod cli;
pub mod commands;
pub mod model;
pub mod schedule;
pub mod storage;
pub mod ui;

pub use app::{App, Event, Snapshot};
pub use model::{format_date_key, parse_date_key, DateKey, StoreError, Task, TaskStore};
pub use schedule::{ViewMode, ViewScheduler, ViewState, VisibleTask, Window};
pub use storage::{load_store, locate_store, save_store, StoreLocation, StoreScope};
