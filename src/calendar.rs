//! Calendar projections over scheduled records.
//!
//! Days are calendar days in UTC. Records without a date show up only in
//! [`unscheduled`].

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::query::{SortKey, sort_records};
use crate::Record;

/// Records scheduled on one day of a month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub day: Date,
    pub records: Vec<Record>,
}

fn utc_day(instant: OffsetDateTime) -> Date {
    instant.to_offset(UtcOffset::UTC).date()
}

/// Records scheduled on `day`, earliest first.
pub fn records_on(records: &[Record], day: Date) -> Vec<Record> {
    let mut matching: Vec<Record> = records
        .iter()
        .filter(|r| r.date().is_some_and(|d| utc_day(d) == day))
        .cloned()
        .collect();
    sort_records(&mut matching, SortKey::Date);
    matching
}

/// Records without a scheduled date, in input order.
pub fn unscheduled(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter(|r| r.date().is_none())
        .cloned()
        .collect()
}

/// Up to `limit` records scheduled at or after `now`, soonest first.
pub fn upcoming(records: &[Record], now: OffsetDateTime, limit: usize) -> Vec<Record> {
    let mut future: Vec<Record> = records
        .iter()
        .filter(|r| r.date().is_some_and(|d| d >= now))
        .cloned()
        .collect();
    sort_records(&mut future, SortKey::Date);
    future.truncate(limit);
    future
}

/// Incomplete tasks whose date has passed, most overdue first.
pub fn overdue_tasks(records: &[Record], now: OffsetDateTime) -> Vec<Record> {
    let mut late: Vec<Record> = records
        .iter()
        .filter(|r| r.is_task() && !r.completed() && r.date().is_some_and(|d| d < now))
        .cloned()
        .collect();
    sort_records(&mut late, SortKey::Date);
    late
}

/// One bucket per day of `month`, each holding that day's records.
///
/// Returns an empty grid for an impossible year.
pub fn month_grid(records: &[Record], year: i32, month: Month) -> Vec<DayBucket> {
    let Ok(first) = Date::from_calendar_date(year, month, 1) else {
        return Vec::new();
    };

    let mut grid = Vec::with_capacity(31);
    let mut day = first;
    while day.month() == month {
        grid.push(DayBucket {
            day,
            records: records_on(records, day),
        });
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    grid
}
