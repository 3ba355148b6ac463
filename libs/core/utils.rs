use chrono::{Local, NaiveDate};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn unix_now() -> u64 {
    let now = SystemTime::now();
    let duration = now
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards");

    duration.as_secs()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn tomorrow(today: NaiveDate) -> NaiveDate {
    today + chrono::Duration::days(1)
}

/// How a due date relates to the current day, for badge rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueLabel {
    Expired,
    Today,
    Tomorrow,
    InDays(i64),
}

pub fn classify_due_date(due: NaiveDate, today: NaiveDate) -> DueLabel {
    let days = (due - today).num_days();

    if days < 0 {
        DueLabel::Expired
    } else if days == 0 {
        DueLabel::Today
    } else if days == 1 {
        DueLabel::Tomorrow
    } else {
        DueLabel::InDays(days)
    }
}

pub fn format_due_date(due: NaiveDate) -> String {
    due.format("%d/%m/%Y").to_string()
}
