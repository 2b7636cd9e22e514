//! Calendar helpers
//!
//! Date parsing, Monday-start week arithmetic, inclusive day ranges and the
//! serde adapters used for the task wire format.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::{Error, Result};

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, in which case the UTC
/// calendar day of the instant is used.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if is_plain_date(raw) {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| Error::InvalidInput(format!("Invalid date: {}", raw)));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| Error::InvalidInput(format!("Date must be in YYYY-MM-DD format: {}", raw)))
}

fn is_plain_date(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Monday of the week containing `anchor`
pub fn start_of_week(anchor: NaiveDate) -> NaiveDate {
    anchor - Duration::days(i64::from(anchor.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `anchor`
pub fn end_of_week(anchor: NaiveDate) -> NaiveDate {
    start_of_week(anchor) + Duration::days(6)
}

/// 00:00:00.000 UTC on `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 UTC on `date`
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
        .and_utc()
}

/// Label such as `2024 W24` for the ISO week containing `anchor`
pub fn week_label(anchor: NaiveDate) -> String {
    let week = anchor.iso_week();
    format!("{} W{:02}", week.year(), week.week())
}

/// An inclusive range of calendar days with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(
                "start must be before or equal to end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// The Monday-to-Sunday week containing `anchor`
    pub fn week_of(anchor: NaiveDate) -> Self {
        Self {
            start: start_of_week(anchor),
            end: end_of_week(anchor),
        }
    }

    /// A range covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First instant covered by the range
    pub fn start_bound(&self) -> DateTime<Utc> {
        start_of_day(self.start)
    }

    /// Last instant covered by the range
    pub fn end_bound(&self) -> DateTime<Utc> {
        end_of_day(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the range, both ends included
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every day of the range in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Serialize a date as an ISO-8601 midnight UTC timestamp
/// (`2024-06-10T00:00:00.000Z`); deserialize from anything [`parse_date`]
/// accepts.
pub mod midnight_iso {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
