use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use campustrade_core::{ExchangeError, ExchangeResult, ValueObject};

/// Inclusive rental window `[start, end]`, `start <= end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ExchangeResult<Self> {
        if start > end {
            return Err(ExchangeError::validation(format!(
                "rental start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Two inclusive ranges intersect unless one ends before the other starts.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

impl ValueObject for DateRange {}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
