//! Calendar helpers shared by the server and the CLI.
//!
//! All functions take `today` explicitly so callers decide which clock (UTC on
//! the server, local time in the CLI) defines a "day".

use chrono::{Datelike as _, Days, NaiveDate};

use crate::log::Log;

/// 1-indexed day number of `today` within a project starting on `start`.
///
/// The start date itself is day 1. Dates before the start yield 0 or less.
pub fn days_since(start: NaiveDate, today: NaiveDate) -> i64 {
  (today - start).num_days() + 1
}

/// Whole days left until the last day of the project, never negative.
pub fn days_remaining(start: NaiveDate, deadline: u32, today: NaiveDate) -> i64 {
  let Some(last_day) = start.checked_add_days(Days::new(u64::from(deadline.saturating_sub(1))))
  else {
    return 0;
  };
  (last_day - today).num_days().max(0)
}

/// Human-friendly rendering of `date` relative to `today`.
///
/// `"Today"`, `"Yesterday"`, `"N days ago"` within a week, otherwise
/// `"Mar 4"` (or `"Mar 4, 2024"` when the year differs from today's).
pub fn format_relative(date: NaiveDate, today: NaiveDate) -> String {
  if date == today {
    return "Today".to_owned();
  }
  if today.pred_opt() == Some(date) {
    return "Yesterday".to_owned();
  }

  let diff = (today - date).num_days().abs();
  if diff < 7 {
    format!("{diff} days ago")
  } else if date.year() == today.year() {
    date.format("%b %-d").to_string()
  } else {
    date.format("%b %-d, %Y").to_string()
  }
}

/// The log recorded on `today`, if any.
pub fn today_log(logs: &[Log], today: NaiveDate) -> Option<&Log> {
  logs.iter().find(|log| log.date == today)
}

pub fn has_today_log(logs: &[Log], today: NaiveDate) -> bool {
  today_log(logs, today).is_some()
}
