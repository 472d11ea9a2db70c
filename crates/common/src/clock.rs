//! Capture-date clock.
//!
//! Frame filenames embed the calendar day on which the frame was acquired.
//! The acquisition loop asks a [`CaptureClock`] for that day once per
//! iteration, so tests can pin the date while production reads local time.

use chrono::NaiveDate;

/// Source of the capture date stamped into frame filenames.
pub trait CaptureClock: Send + Sync {
    /// Today's calendar date.
    fn today(&self) -> NaiveDate;
}

/// Reads the host's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl CaptureClock for LocalClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }
}

impl CaptureClock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }
}
