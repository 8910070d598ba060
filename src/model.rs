use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical `yyyy-MM-dd` key of a local calendar day.
pub type DateKey = String;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub text: String,
    pub completed: bool,
}

/// All tasks, grouped by day. Keys keep their insertion order, which is also
/// the order they appear in on disk.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TaskStore {
    days: IndexMap<DateKey, Vec<Task>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no tasks stored for {0}")]
    KeyNotFound(DateKey),
    #[error("task index {index} out of range for {date_key} ({len} tasks)")]
    IndexOutOfRange {
        date_key: DateKey,
        index: usize,
        len: usize,
    },
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            text: text.into(),
            completed: false,
        }
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, date_key: &str, text: impl Into<String>) {
        self.days
            .entry(date_key.to_string())
            .or_default()
            .push(Task::new(text));
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle(&mut self, date_key: &str, index: usize) -> Result<bool, StoreError> {
        let task = self.task_mut(date_key, index)?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn delete(&mut self, date_key: &str, index: usize) -> Result<Task, StoreError> {
        let tasks = self
            .days
            .get_mut(date_key)
            .ok_or_else(|| StoreError::KeyNotFound(date_key.to_string()))?;
        if index >= tasks.len() {
            return Err(StoreError::IndexOutOfRange {
                date_key: date_key.to_string(),
                index,
                len: tasks.len(),
            });
        }
        // Emptied days stay in the map.
        Ok(tasks.remove(index))
    }

    pub fn get(&self, date_key: &str) -> &[Task] {
        self.days.get(date_key).map(Vec::as_slice).unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn contains_key(&self, date_key: &str) -> bool {
        self.days.contains_key(date_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Task])> {
        self.days.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of tasks across all days.
    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn task_mut(&mut self, date_key: &str, index: usize) -> Result<&mut Task, StoreError> {
        let tasks = self
            .days
            .get_mut(date_key)
            .ok_or_else(|| StoreError::KeyNotFound(date_key.to_string()))?;
        let len = tasks.len();
        tasks.get_mut(index).ok_or_else(|| StoreError::IndexOutOfRange {
            date_key: date_key.to_string(),
            index,
            len,
        })
    }
}

pub fn format_date_key(date: NaiveDate) -> DateKey {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}
