//! Date range for listing events.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use devcal_core::Timestamp;

/// Days listed from today when no end date is given
pub const DEFAULT_DAYS: i64 = 7;

/// Closed range of instants, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl DateRange {
    /// Parse the `--from`/`--to` arguments.
    /// - `from`: "start" for everything since the epoch, or YYYY-MM-DD; defaults to today
    /// - `to`: YYYY-MM-DD, defaults to DEFAULT_DAYS after `from`'s day
    pub fn from_args(from: Option<&str>, to: Option<&str>) -> Result<Self, String> {
        let today = Utc::now().date_naive();

        let from_dt = match from {
            Some("start") => DateTime::UNIX_EPOCH,
            Some(s) => start_of_day(parse_date(s)?),
            None => start_of_day(today),
        };

        let to_dt = match to {
            Some(s) => end_of_day(parse_date(s)?),
            None => end_of_day(from_dt.date_naive().max(today) + Duration::days(DEFAULT_DAYS)),
        };

        if to_dt < from_dt {
            return Err(format!(
                "End date {} is before start date {}",
                to_dt.date_naive(),
                from_dt.date_naive()
            ));
        }

        Ok(DateRange {
            from: from_dt.into(),
            to: to_dt.into(),
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last millisecond of the day in UTC
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}
