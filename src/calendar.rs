// Calendar grid - fixed 6x7 month layout
//
// Weeks start on Sunday (column 0). The grid always has 42 cells: cells
// before day 1 and after the last day are empty, even when the month fits
// in 4 or 5 rows.

use crate::db::{CalendarEvent, Store};
use crate::error::{PortalError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

pub const GRID_ROWS: usize = 6;
pub const GRID_COLUMNS: usize = 7;
pub const GRID_CELLS: usize = GRID_ROWS * GRID_COLUMNS;

/// Event as shown inside a day cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridCell {
    Empty,
    Day {
        day: u32,
        date: NaiveDate,
        events: Vec<EventSummary>,
    },
}

impl GridCell {
    pub fn is_empty(&self) -> bool {
        matches!(self, GridCell::Empty)
    }

    pub fn day(&self) -> Option<u32> {
        match self {
            GridCell::Empty => None,
            GridCell::Day { day, .. } => Some(*day),
        }
    }

    pub fn events(&self) -> &[EventSummary] {
        match self {
            GridCell::Empty => &[],
            GridCell::Day { events, .. } => events,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarGrid {
    pub month: u32,
    pub year: i32,
    pub cells: Vec<GridCell>,
}

impl CalendarGrid {
    /// The six week rows, Sunday first.
    pub fn weeks(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(GRID_COLUMNS)
    }

    /// Cell holding `day`, if the month has it.
    pub fn cell_for_day(&self, day: u32) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.day() == Some(day))
    }

    pub fn days_in_month(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Convert the month selector's 0-based index (January = 0) to 1-12.
pub fn month_from_selector(index: u32) -> Option<u32> {
    (index < 12).then_some(index + 1)
}

/// Canonical `YYYY-MM-DD` key used to match events to cells.
pub fn date_key(year: i32, month: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// Sunday-based weekday index of day 1 and the number of days in the month.
pub fn month_layout(month: u32, year: i32) -> Result<(usize, u32)> {
    if !(1..=12).contains(&month) {
        return Err(PortalError::InvalidMonth(month));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(PortalError::InvalidDate { year, month })?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or(PortalError::InvalidDate { year, month })?;

    let starting_weekday = first.weekday().num_days_from_sunday() as usize;
    Ok((starting_weekday, last.day()))
}

/// Lay out `month` of `year` as 42 cells and attach same-day events.
///
/// Events outside the month are ignored. Events sharing a date keep the
/// order they have in `events`.
pub fn build_calendar_grid(
    month: u32,
    year: i32,
    events: &[CalendarEvent],
) -> Result<CalendarGrid> {
    let (starting_weekday, total_days) = month_layout(month, year)?;
    let mut event_map = group_by_date(events);

    let mut cells = Vec::with_capacity(GRID_CELLS);
    let mut day = 1;

    for index in 0..GRID_CELLS {
        if index < starting_weekday || day > total_days {
            cells.push(GridCell::Empty);
            continue;
        }

        let key = date_key(year, month, day);
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(PortalError::InvalidDate { year, month })?;

        cells.push(GridCell::Day {
            day,
            date,
            events: event_map.remove(&key).unwrap_or_default(),
        });
        day += 1;
    }

    Ok(CalendarGrid { month, year, cells })
}

/// Build the grid for a month selector value (0-based) and year.
pub fn calendar_for_month(store: &Store, selector_month: u32, year: i32) -> Result<CalendarGrid> {
    let month = month_from_selector(selector_month)
        .ok_or(PortalError::InvalidMonth(selector_month.saturating_add(1)))?;

    let events = store.events_for_month(month, year);
    build_calendar_grid(month, year, &events)
}

fn group_by_date(events: &[CalendarEvent]) -> HashMap<String, Vec<EventSummary>> {
    let mut map: HashMap<String, Vec<EventSummary>> = HashMap::new();

    for event in events {
        let key = event.date.format("%Y-%m-%d").to_string();
        map.entry(key).or_default().push(EventSummary {
            title: event.title.clone(),
            description: event.description.clone(),
        });
    }

    map
}
