//! Calendar tags for special days and recurring events.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Special days and the `MM-DD` date they fall on.
pub const SPECIAL_DAYS: &[(&str, &str)] = &[
    ("new-year", "01-01"),
    ("christmas", "12-25"),
    ("children-day", "05-05"),
];

/// Special-day tags that fall on `date`.
pub fn special_days_on(date: NaiveDate) -> Vec<&'static str> {
    let month_day = date.format("%m-%d").to_string();
    SPECIAL_DAYS
        .iter()
        .filter(|(_, md)| *md == month_day)
        .map(|(tag, _)| *tag)
        .collect()
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Event tags active at `now`: weekly, hourly and monthly markers.
pub fn active_events(now: NaiveDateTime) -> Vec<&'static str> {
    let mut tags = Vec::new();
    let date = now.date();

    match date.weekday() {
        Weekday::Mon => tags.push("monday"),
        Weekday::Fri => tags.push("friday"),
        Weekday::Sat | Weekday::Sun => tags.push("weekend"),
        _ => {}
    }

    match now.hour() {
        4..=6 => tags.push("dawn"),
        12..=13 => tags.push("lunch"),
        15..=16 => tags.push("snack-time"),
        _ => {}
    }

    match date.month() {
        1 => tags.push("january"),
        6 => tags.push("june"),
        12 => tags.push("december"),
        _ => {}
    }

    let day = date.day();
    if day <= 3 {
        tags.push("month-start");
    }
    if day + 3 > days_in_month(date) {
        tags.push("month-end");
    }

    tags
}
