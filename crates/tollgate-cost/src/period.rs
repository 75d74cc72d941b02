// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local-time day and budget-period arithmetic. All values are unix seconds.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Unix time of local midnight starting `date`.
fn local_midnight(date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        // Midnight skipped by a DST jump: fall back to the UTC reading.
        .unwrap_or_else(|| naive.and_utc().timestamp())
}

/// `[start, end)` of the local day containing `now`.
pub fn today_bounds(now: DateTime<Local>) -> (i64, i64) {
    let today = now.date_naive();
    let start = local_midnight(today);
    let end = today
        .succ_opt()
        .map(local_midnight)
        .unwrap_or(start + SECONDS_PER_DAY);
    (start, end)
}

/// `[start of today, last second of this month]` in local time.
pub fn current_period(now: DateTime<Local>) -> (i64, i64) {
    let today = now.date_naive();
    let start = local_midnight(today);
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    let end = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| local_midnight(first) - 1)
        .unwrap_or(start + SECONDS_PER_DAY - 1);
    (start, end)
}

/// Whole days from `now` to `period_end`, never negative.
pub fn days_remaining(period_end: i64, now: i64) -> i64 {
    ((period_end - now) / SECONDS_PER_DAY).max(0)
}
