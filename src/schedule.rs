//! View state and the date windows derived from it.
//!
//! A [`ViewScheduler`] never touches tasks itself: it reads a [`TaskStore`]
//! to build the visible sequence and leaves every mutation to the store.

use crate::model::{format_date_key, parse_date_key, DateKey, Task, TaskStore};
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub reference_date: NaiveDate,
}

/// Inclusive range of days.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleTask {
    pub task: Task,
    pub date_key: DateKey,
    /// Position inside the day's list at the time of derivation.
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct ViewScheduler {
    state: ViewState,
}

#[derive(thiserror::Error, Debug)]
#[error("unknown view mode: {0} (expected day, week, month or year)")]
pub struct ParseViewModeError(String);

impl ViewMode {
    pub fn all() -> [ViewMode; 4] {
        [ViewMode::Day, ViewMode::Week, ViewMode::Month, ViewMode::Year]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::Year => "Year",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(ViewMode::Day),
            "week" | "w" => Ok(ViewMode::Week),
            "month" | "m" => Ok(ViewMode::Month),
            "year" | "y" => Ok(ViewMode::Year),
            _ => Err(ParseViewModeError(s.to_string())),
        }
    }
}

impl Window {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl ViewState {
    pub fn window(&self) -> Window {
        let date = self.reference_date;
        match self.mode {
            ViewMode::Day => Window {
                start: date,
                end: date,
            },
            ViewMode::Week => {
                // Monday-anchored; Sunday closes the week that began six days earlier.
                let offset = Duration::days(i64::from(date.weekday().num_days_from_monday()));
                let start = date.checked_sub_signed(offset).unwrap_or(NaiveDate::MIN);
                Window {
                    start,
                    end: start
                        .checked_add_signed(Duration::days(6))
                        .unwrap_or(NaiveDate::MAX),
                }
            }
            ViewMode::Month => {
                let start = date.with_day(1).unwrap_or(date);
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(NaiveDate::MAX);
                Window { start, end }
            }
            ViewMode::Year => Window {
                start: NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
                end: NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
            },
        }
    }

    /// Header text for the current mode.
    pub fn label(&self) -> String {
        let date = self.reference_date;
        match self.mode {
            ViewMode::Day => date.format("%A").to_string(),
            ViewMode::Week => {
                let window = self.window();
                format!(
                    "{} – {}",
                    window.start.format("%b %-d, %Y"),
                    window.end.format("%b %-d, %Y")
                )
            }
            ViewMode::Month => date.format("%B %Y").to_string(),
            ViewMode::Year => date.year().to_string(),
        }
    }

    pub fn date_number(&self) -> String {
        self.reference_date.format("%B %-d, %Y").to_string()
    }
}

impl ViewScheduler {
    pub fn new(mode: ViewMode, reference_date: NaiveDate) -> Self {
        ViewScheduler {
            state: ViewState {
                mode,
                reference_date,
            },
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.state.reference_date
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        tracing::debug!(from = %self.state.mode, to = %mode, "view mode changed");
        self.state.mode = mode;
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.state.reference_date = date;
    }

    pub fn window(&self) -> Window {
        self.state.window()
    }

    pub fn label(&self) -> String {
        self.state.label()
    }

    pub fn date_number(&self) -> String {
        self.state.date_number()
    }

    /// Key new tasks are filed under.
    pub fn current_key(&self) -> DateKey {
        format_date_key(self.state.reference_date)
    }

    /// Moves the reference date by `delta` units of the current mode.
    ///
    /// Month and year steps clamp the day to the target month's length, so
    /// Jan 31 + 1 month is the last day of February.
    pub fn advance(&mut self, delta: i32) {
        let current = self.state.reference_date;
        let shifted = match self.state.mode {
            ViewMode::Day => current.checked_add_signed(Duration::days(i64::from(delta))),
            ViewMode::Week => current.checked_add_signed(Duration::days(i64::from(delta) * 7)),
            ViewMode::Month => shift_months(current, i64::from(delta)),
            ViewMode::Year => shift_months(current, i64::from(delta) * 12),
        };
        match shifted {
            Some(date) => {
                tracing::debug!(mode = %self.state.mode, delta, from = %current, to = %date, "navigated");
                self.state.reference_date = date;
            }
            None => {
                tracing::warn!(mode = %self.state.mode, delta, date = %current, "navigation out of range; ignoring");
            }
        }
    }

    /// Tasks inside the current window, in store key order.
    pub fn visible(&self, store: &TaskStore) -> Vec<VisibleTask> {
        if self.state.mode == ViewMode::Day {
            let key = self.current_key();
            return collect_day(&key, store.get(&key));
        }

        let window = self.window();
        let mut visible = Vec::new();
        for (key, tasks) in store.iter() {
            let Some(date) = parse_date_key(key) else {
                tracing::debug!(key, "skipping unparseable date key");
                continue;
            };
            if window.contains(date) {
                visible.extend(collect_day(key, tasks));
            }
        }
        visible
    }
}

fn collect_day(key: &str, tasks: &[Task]) -> Vec<VisibleTask> {
    tasks
        .iter()
        .enumerate()
        .map(|(index, task)| VisibleTask {
            task: task.clone(),
            date_key: key.to_string(),
            index,
        })
        .collect()
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn keys(visible: &[VisibleTask]) -> Vec<&str> {
        visible.iter().map(|v| v.date_key.as_str()).collect()
    }

    fn march_store() -> TaskStore {
        let mut store = TaskStore::new();
        store.add("2024-03-01", "rent");
        store.add("2024-03-15", "trip");
        store
    }

    #[test]
    fn day_view_returns_only_that_day() {
        let store = march_store();
        let scheduler = ViewScheduler::new(ViewMode::Day, ymd(2024, 3, 1));
        let visible = scheduler.visible(&store);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].task.text, "rent");
        assert_eq!(visible[0].date_key, "2024-03-01");
        assert_eq!(visible[0].index, 0);
    }

    #[test]
    fn month_view_collects_whole_month() {
        let store = march_store();
        let scheduler = ViewScheduler::new(ViewMode::Month, ymd(2024, 3, 10));
        let texts: Vec<_> = scheduler
            .visible(&store)
            .into_iter()
            .map(|v| v.task.text)
            .collect();
        assert_eq!(texts, vec!["rent", "trip"]);
    }

    #[test]
    fn week_view_from_wednesday_spans_monday_to_sunday() {
        let mut store = TaskStore::new();
        store.add("2024-03-03", "previous sunday");
        store.add("2024-03-04", "monday");
        store.add("2024-03-10", "sunday");
        store.add("2024-03-11", "next monday");
        let scheduler = ViewScheduler::new(ViewMode::Week, ymd(2024, 3, 6));
        assert_eq!(
            scheduler.window(),
            Window {
                start: ymd(2024, 3, 4),
                end: ymd(2024, 3, 10),
            }
        );
        assert_eq!(keys(&scheduler.visible(&store)), vec!["2024-03-04", "2024-03-10"]);
    }

    #[test]
    fn sunday_belongs_to_preceding_week() {
        let scheduler = ViewScheduler::new(ViewMode::Week, ymd(2024, 3, 10));
        assert_eq!(scheduler.window().start, ymd(2024, 3, 4));
        assert_eq!(scheduler.window().end, ymd(2024, 3, 10));
    }

    #[test]
    fn week_window_clamps_at_calendar_limits() {
        let mut scheduler = ViewScheduler::new(ViewMode::Day, NaiveDate::MAX);
        scheduler.advance(1);
        scheduler.set_mode(ViewMode::Week);
        let window = scheduler.window();
        assert_eq!(window.end, NaiveDate::MAX);
        assert!(window.contains(NaiveDate::MAX));
        assert!(!scheduler.label().is_empty());

        let mut store = TaskStore::new();
        store.add("2024-03-04", "far away");
        let earliest = ViewScheduler::new(ViewMode::Week, NaiveDate::MIN);
        assert_eq!(earliest.window().start, NaiveDate::MIN);
        assert!(earliest.visible(&store).is_empty());
        assert!(!earliest.label().is_empty());
    }

    #[test]
    fn month_and_year_windows() {
        let feb = ViewState {
            mode: ViewMode::Month,
            reference_date: ymd(2024, 2, 14),
        };
        assert_eq!(feb.window().start, ymd(2024, 2, 1));
        assert_eq!(feb.window().end, ymd(2024, 2, 29));

        let dec = ViewState {
            mode: ViewMode::Month,
            reference_date: ymd(2023, 12, 31),
        };
        assert_eq!(dec.window().end, ymd(2023, 12, 31));

        let year = ViewState {
            mode: ViewMode::Year,
            reference_date: ymd(2024, 7, 4),
        };
        assert_eq!(
            year.window(),
            Window {
                start: ymd(2024, 1, 1),
                end: ymd(2024, 12, 31),
            }
        );
    }

    #[test]
    fn range_views_follow_store_order_and_keep_indices() {
        let mut store = TaskStore::new();
        store.add("2024-06-20", "late");
        store.add("2024-06-02", "early a");
        store.add("2024-06-02", "early b");
        let scheduler = ViewScheduler::new(ViewMode::Year, ymd(2024, 1, 1));
        let visible = scheduler.visible(&store);
        assert_eq!(keys(&visible), vec!["2024-06-20", "2024-06-02", "2024-06-02"]);
        let indices: Vec<_> = visible.iter().map(|v| v.index).collect();
        assert_eq!(indices, vec![0, 0, 1]);
    }

    #[test]
    fn malformed_keys_are_skipped() {
        let mut store = march_store();
        store.add("not-a-date", "ghost");
        store.add("2024-13-01", "ghost");
        let scheduler = ViewScheduler::new(ViewMode::Year, ymd(2024, 3, 1));
        assert_eq!(keys(&scheduler.visible(&store)), vec!["2024-03-01", "2024-03-15"]);
    }

    #[test]
    fn navigation_steps_per_mode() {
        let mut scheduler = ViewScheduler::new(ViewMode::Day, ymd(2024, 3, 1));
        scheduler.advance(-1);
        assert_eq!(scheduler.reference_date(), ymd(2024, 2, 29));

        scheduler.set_mode(ViewMode::Week);
        scheduler.advance(2);
        assert_eq!(scheduler.reference_date(), ymd(2024, 3, 14));

        scheduler.set_mode(ViewMode::Year);
        scheduler.advance(-1);
        assert_eq!(scheduler.reference_date(), ymd(2023, 3, 14));
    }

    #[test]
    fn month_navigation_clamps_to_month_end() {
        let mut scheduler = ViewScheduler::new(ViewMode::Month, ymd(2024, 1, 31));
        scheduler.advance(1);
        assert_eq!(scheduler.reference_date(), ymd(2024, 2, 29));
        scheduler.advance(-2);
        assert_eq!(scheduler.reference_date(), ymd(2023, 12, 29));
    }

    #[test]
    fn year_navigation_from_leap_day() {
        let mut scheduler = ViewScheduler::new(ViewMode::Year, ymd(2024, 2, 29));
        scheduler.advance(1);
        assert_eq!(scheduler.reference_date(), ymd(2025, 2, 28));
    }

    #[test]
    fn navigation_past_calendar_limits_is_ignored() {
        let mut scheduler = ViewScheduler::new(ViewMode::Day, NaiveDate::MAX);
        scheduler.advance(1);
        assert_eq!(scheduler.reference_date(), NaiveDate::MAX);
    }

    #[test]
    fn labels_per_mode() {
        let mut scheduler = ViewScheduler::new(ViewMode::Day, ymd(2024, 3, 6));
        assert_eq!(scheduler.label(), "Wednesday");
        scheduler.set_mode(ViewMode::Week);
        assert_eq!(scheduler.label(), "Mar 4, 2024 – Mar 10, 2024");
        scheduler.set_mode(ViewMode::Month);
        assert_eq!(scheduler.label(), "March 2024");
        scheduler.set_mode(ViewMode::Year);
        assert_eq!(scheduler.label(), "2024");
        assert_eq!(scheduler.date_number(), "March 6, 2024");
    }

    #[test]
    fn view_mode_parses_names_and_initials() {
        assert_eq!("Week".parse::<ViewMode>().unwrap(), ViewMode::Week);
        assert_eq!("y".parse::<ViewMode>().unwrap(), ViewMode::Year);
        assert!("fortnight".parse::<ViewMode>().is_err());
    }
}
