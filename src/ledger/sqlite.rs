//! `SQLite`-backed trip ledger.
//!
//! One `trips` table, append-only: triggers abort any UPDATE or DELETE.
//! Appends run inside an IMMEDIATE transaction, which takes the database
//! write lock before the day's count is read, so two processes sharing the
//! file serialize the same way two threads sharing the connection do.

use std::{path::Path, sync::Mutex, time::Duration};

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, TransactionBehavior, params};
use tracing::{debug, warn};

use crate::model::TripRecord;

use super::{LedgerError, OperatingCalendar, Result, TripLedger};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS trips (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    vessel_id     TEXT NOT NULL,
    driver_id     TEXT NOT NULL,
    issued_at     TEXT NOT NULL,
    operating_day TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS trips_by_vessel_day ON trips (vessel_id, operating_day);
CREATE INDEX IF NOT EXISTS trips_by_day ON trips (operating_day);

CREATE TRIGGER IF NOT EXISTS trips_no_update BEFORE UPDATE ON trips
BEGIN
    SELECT RAISE(ABORT, 'trips are append-only');
END;

CREATE TRIGGER IF NOT EXISTS trips_no_delete BEFORE DELETE ON trips
BEGIN
    SELECT RAISE(ABORT, 'trips are append-only');
END;
";

/// How long a writer waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`TripLedger`] persisted to a `SQLite` file.
pub struct SqliteLedger {
    calendar: OperatingCalendar,
    max_trips_per_day: u32,
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Opens or creates a ledger at `path`.
    pub fn open(
        path: impl AsRef<Path>,
        calendar: OperatingCalendar,
        max_trips_per_day: u32,
    ) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, calendar, max_trips_per_day)
    }

    /// Creates a ledger that lives only as long as this value.
    pub fn in_memory(calendar: OperatingCalendar, max_trips_per_day: u32) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, calendar, max_trips_per_day)
    }

    fn with_connection(
        conn: Connection,
        calendar: OperatingCalendar,
        max_trips_per_day: u32,
    ) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            calendar,
            max_trips_per_day,
            conn: Mutex::new(conn),
        })
    }
}

fn count_on(conn: &Connection, vessel_id: &str, day: Date) -> Result<u32> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM trips WHERE vessel_id = ?1 AND operating_day = ?2",
        params![vessel_id, day.to_string()],
        |row| row.get(0),
    )?;
    u32::try_from(n).map_err(|_| LedgerError::Corrupt(format!("negative trip count: {n}")))
}

impl TripLedger for SqliteLedger {
    fn max_trips_per_day(&self) -> u32 {
        self.max_trips_per_day
    }

    fn calendar(&self) -> &OperatingCalendar {
        &self.calendar
    }

    fn trips_today(&self, vessel_id: &str, as_of: Timestamp) -> Result<u32> {
        let conn = self.conn.lock().map_err(|_| LedgerError::Poisoned)?;
        count_on(&conn, vessel_id, self.calendar.operating_day(as_of))
    }

    fn record(&self, vessel_id: &str, driver_id: &str, at: Timestamp) -> Result<TripRecord> {
        let mut conn = self.conn.lock().map_err(|_| LedgerError::Poisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let trip = self.calendar.trip(vessel_id, driver_id, at);
        let taken = count_on(&tx, vessel_id, trip.operating_day)?;
        if taken >= self.max_trips_per_day {
            // Dropping `tx` rolls back and releases the write lock.
            warn!(vessel_id, day = %trip.operating_day, taken, "daily trip cap reached");
            return Err(LedgerError::CapacityExceeded {
                vessel_id: vessel_id.to_string(),
                day: trip.operating_day,
                limit: self.max_trips_per_day,
            });
        }

        tx.execute(
            "INSERT INTO trips (vessel_id, driver_id, issued_at, operating_day)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &trip.vessel_id,
                &trip.driver_id,
                trip.issued_at.to_string(),
                trip.operating_day.to_string(),
            ],
        )?;
        tx.commit()?;

        debug!(vessel_id, driver_id, day = %trip.operating_day, trip = taken + 1, "trip recorded");
        Ok(trip)
    }

    fn trips_on(&self, day: Date) -> Result<Vec<TripRecord>> {
        let conn = self.conn.lock().map_err(|_| LedgerError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT vessel_id, driver_id, issued_at, operating_day
             FROM trips
             WHERE operating_day = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt
            .query_map(params![day.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<core::result::Result<Vec<_>, _>>()?;

        let mut trips = rows
            .into_iter()
            .map(|(vessel_id, driver_id, issued_at, operating_day)| {
                Ok(TripRecord {
                    vessel_id,
                    driver_id,
                    issued_at: issued_at
                        .parse()
                        .map_err(|e| LedgerError::Corrupt(format!("invalid issued_at: {e}")))?,
                    operating_day: operating_day
                        .parse()
                        .map_err(|e| LedgerError::Corrupt(format!("invalid operating_day: {e}")))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        // Stored timestamps are text; order on the parsed instant.
        trips.sort_by(|a, b| a.issued_at.cmp(&b.issued_at));
        Ok(trips)
    }
}
