//! UTC instants carried as epoch milliseconds on the wire.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, stored as milliseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Convert to a chrono datetime. Returns None outside chrono's representable range.
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    /// Calendar date of this instant in UTC.
    pub fn date_naive(self) -> Option<NaiveDate> {
        self.to_utc().map(|dt| dt.date_naive())
    }

    pub fn now() -> Self {
        Utc::now().into()
    }

    pub fn saturating_add(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.num_milliseconds()))
    }

    pub fn saturating_sub(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration.num_milliseconds()))
    }

    /// Signed distance from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> Duration {
        Duration::milliseconds(self.0.saturating_sub(earlier.0))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_utc() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}
