use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The requested range was empty or inverted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("start date {start} is after end date {end}")]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive calendar range of trading days to request.
///
/// Providers return bars dated on or after `start` and on or before `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRangeError> {
        if start > end {
            return Err(InvalidRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Midnight UTC of the first day.
    pub fn start_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
    }

    /// Last representable second of the final day, UTC.
    pub fn end_utc(&self) -> DateTime<Utc> {
        let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Utc.from_utc_datetime(&self.end.and_time(last))
    }

    /// Number of calendar days covered, both ends included.
    pub fn calendar_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(d(2024, 2, 1), d(2024, 1, 1)).unwrap_err();
        assert_eq!(err.start, d(2024, 2, 1));
    }

    #[test]
    fn single_day_range_is_valid() {
        let r = DateRange::new(d(2024, 2, 1), d(2024, 2, 1)).unwrap();
        assert!(r.contains(d(2024, 2, 1)));
        assert_eq!(r.calendar_days(), 1);
    }

    #[test]
    fn utc_bounds_cover_whole_days() {
        let r = DateRange::new(d(2024, 1, 2), d(2024, 1, 5)).unwrap();
        assert_eq!(r.start_utc().to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert_eq!(r.end_utc().to_rfc3339(), "2024-01-05T23:59:59+00:00");
        assert!(!r.contains(d(2024, 1, 6)));
    }
}
