//! The trip ledger: how many trips each vessel has taken per operating day.
//!
//! Two backends share the [`TripLedger`] trait:
//!
//! ```text
//! memory::InMemoryLedger   per-vessel mutex around a Vec<TripRecord>
//! sqlite::SqliteLedger     append-only `trips` table, IMMEDIATE transactions
//! ```
//!
//! Both make [`TripLedger::record`] a compare-and-append: the day's count is
//! re-read and the cap enforced under the same lock that guards the insert.

pub mod memory;
pub mod sqlite;

use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::model::TripRecord;

pub use memory::InMemoryLedger;
pub use sqlite::SqliteLedger;

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The vessel already has its full allowance of trips for the day.
    #[error("vessel {vessel_id} already has {limit} trips on {day}")]
    CapacityExceeded {
        vessel_id: String,
        day: Date,
        limit: u32,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lock was poisoned by a panicking writer.
    #[error("ledger lock poisoned")]
    Poisoned,

    #[error("corrupt ledger data: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, LedgerError>;

/// Source of truth for trips taken per vessel per operating day.
///
/// Unknown vessel ids count as zero trips; callers validate vessels against
/// the fleet directory before asking.
pub trait TripLedger: Send + Sync {
    /// The daily cap this ledger enforces on [`record`](Self::record).
    fn max_trips_per_day(&self) -> u32;

    /// The calendar that maps instants to operating days.
    fn calendar(&self) -> &OperatingCalendar;

    /// Trips recorded for `vessel_id` on the operating day containing `as_of`.
    fn trips_today(&self, vessel_id: &str, as_of: Timestamp) -> Result<u32>;

    /// Appends a trip, failing with [`LedgerError::CapacityExceeded`] when the
    /// vessel's count for that day has already reached the cap.
    fn record(&self, vessel_id: &str, driver_id: &str, at: Timestamp) -> Result<TripRecord>;

    /// All trips recorded on `day`, oldest first.
    fn trips_on(&self, day: Date) -> Result<Vec<TripRecord>>;
}

/// Maps instants to the facility-local calendar day trip counts reset on.
#[derive(Debug, Clone)]
pub struct OperatingCalendar {
    timezone: TimeZone,
}

impl OperatingCalendar {
    pub fn new(timezone: TimeZone) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> &TimeZone {
        &self.timezone
    }

    /// The operating day `at` falls on.
    pub fn operating_day(&self, at: Timestamp) -> Date {
        at.to_zoned(self.timezone.clone()).date()
    }

    /// Builds the record for a trip issued at `at`.
    pub(crate) fn trip(&self, vessel_id: &str, driver_id: &str, at: Timestamp) -> TripRecord {
        TripRecord {
            vessel_id: vessel_id.to_string(),
            driver_id: driver_id.to_string(),
            issued_at: at,
            operating_day: self.operating_day(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::tz;

    #[test]
    fn operating_day_follows_facility_zone() {
        // 20:00 UTC is already the next morning at UTC+5.
        let at: Timestamp = "2026-06-01T20:00:00Z".parse().unwrap();

        let utc = OperatingCalendar::new(TimeZone::UTC);
        let local = OperatingCalendar::new(TimeZone::fixed(tz::offset(5)));

        assert_eq!(utc.operating_day(at), jiff::civil::date(2026, 6, 1));
        assert_eq!(local.operating_day(at), jiff::civil::date(2026, 6, 2));
    }

    #[test]
    fn trip_carries_its_operating_day() {
        let calendar = OperatingCalendar::new(TimeZone::fixed(tz::offset(-4)));
        let at: Timestamp = "2026-06-02T02:30:00Z".parse().unwrap();

        let trip = calendar.trip("B-101", "D01", at);

        assert_eq!(trip.vessel_id, "B-101");
        assert_eq!(trip.driver_id, "D01");
        assert_eq!(trip.issued_at, at);
        assert_eq!(trip.operating_day, jiff::civil::date(2026, 6, 1));
    }
}
