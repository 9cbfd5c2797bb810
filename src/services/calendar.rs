//! Month grid for the calendar page.
//!
//! Weeks start on Monday and always hold seven days, so the first and last
//! week spill into the neighbouring months.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::domain::Weekday;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub in_month: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    pub weekday_names: [Weekday; 7],
    pub weeks: Vec<[CalendarDay; 7]>,
    pub today: NaiveDate,
    pub prev: YearMonth,
    pub next: YearMonth,
}

/// Builds the grid for `year`/`month`. Returns `None` for a month outside 1..=12
/// or a year chrono cannot represent.
#[must_use]
pub fn month_grid(year: i32, month: u32, today: NaiveDate) -> Option<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    let prev_first = first.checked_sub_months(Months::new(1))?;

    let lead = u64::from(first.weekday().num_days_from_monday());
    let mut cursor = first.checked_sub_days(Days::new(lead))?;

    let mut weeks = Vec::with_capacity(6);
    while cursor < next_first {
        let mut week = Vec::with_capacity(7);
        for _ in 0..7 {
            week.push(CalendarDay {
                date: cursor,
                weekday: Weekday::from_date(cursor),
                in_month: cursor.month() == month && cursor.year() == year,
                is_today: cursor == today,
            });
            cursor = cursor.succ_opt()?;
        }
        weeks.push(week.try_into().ok()?);
    }

    Some(MonthGrid {
        year,
        month,
        month_name: MONTH_NAMES[(month - 1) as usize],
        weekday_names: Weekday::ALL,
        weeks,
        today,
        prev: YearMonth {
            year: prev_first.year(),
            month: prev_first.month(),
        },
        next: YearMonth {
            year: next_first.year(),
            month: next_first.month(),
        },
    })
}
