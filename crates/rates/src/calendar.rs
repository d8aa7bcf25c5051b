//! Business-day calendar.
//!
//! Maps "now" to the most recent non-weekend UTC calendar date, which the
//! reconciliation engine uses as its freshness reference. Deterministic,
//! no I/O.

use chrono::{Datelike, NaiveDate, Utc, Weekday};

/// The latest applicable business date as of now (UTC).
pub fn current_business_date() -> NaiveDate {
    business_date_from(Utc::now().date_naive())
}

/// Roll a date back to the nearest business day: weekends map to the
/// preceding Friday, weekdays are returned unchanged.
pub fn business_date_from(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        match date.pred_opt() {
            Some(prev) => date = prev,
            None => break,
        }
    }
    date
}
