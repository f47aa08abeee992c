//! Date math behind the month, week and day views.
//! Weeks start on Sunday and every window is expressed in UTC.

use calendar_shared::Event;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Month,
    Week,
    Day,
}

impl ViewKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "month" => Some(ViewKind::Month),
            "week" => Some(ViewKind::Week),
            "day" => Some(ViewKind::Day),
            _ => None,
        }
    }
}

/// Get month name
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Six Sunday-first weeks covering the month, padded with days from the
/// neighbouring months.
pub fn month_grid(year: i32, month: u32) -> Option<[[NaiveDate; 7]; 6]> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let start = week_start(first);

    let mut grid = [[start; 7]; 6];
    for (week, row) in grid.iter_mut().enumerate() {
        for (weekday, cell) in row.iter_mut().enumerate() {
            *cell = start + Duration::days((week * 7 + weekday) as i64);
        }
    }

    Some(grid)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Inclusive window a view shows, suitable for `startDate`/`endDate`.
pub fn view_range(kind: ViewKind, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let (first, last) = match kind {
        ViewKind::Month => {
            let start = week_start(date.with_day(1).unwrap_or(date));
            (start, start + Duration::days(41))
        }
        ViewKind::Week => {
            let start = week_start(date);
            (start, start + Duration::days(6))
        }
        ViewKind::Day => (date, date),
    };

    (start_of_day(first), end_of_day(last))
}

/// Move one view forward (`step > 0`) or back by `step` units.
/// Month moves keep the day, clamped to the target month's length.
pub fn navigate(kind: ViewKind, date: NaiveDate, step: i32) -> NaiveDate {
    match kind {
        ViewKind::Month => {
            let months = Months::new(step.unsigned_abs());
            if step >= 0 {
                date.checked_add_months(months)
            } else {
                date.checked_sub_months(months)
            }
            .unwrap_or(date)
        }
        ViewKind::Week => date + Duration::weeks(step as i64),
        ViewKind::Day => date + Duration::days(step as i64),
    }
}

/// Events that touch the given day.
pub fn events_on(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    let from = start_of_day(date);
    let to = from + Duration::days(1);
    events.iter().filter(|e| e.overlaps(from, to)).collect()
}
