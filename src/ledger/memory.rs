//! In-memory trip ledger.
//!
//! Each vessel's records sit behind their own mutex, so commits for
//! different vessels never contend while two commits for the same vessel
//! are strictly serialized.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use jiff::{Timestamp, civil::Date};
use tracing::{debug, warn};

use crate::model::TripRecord;

use super::{LedgerError, OperatingCalendar, Result, TripLedger};

type VesselTrips = Arc<Mutex<Vec<TripRecord>>>;

/// A [`TripLedger`] held entirely in process memory.
pub struct InMemoryLedger {
    calendar: OperatingCalendar,
    max_trips_per_day: u32,
    vessels: Mutex<HashMap<String, VesselTrips>>,
}

impl InMemoryLedger {
    pub fn new(calendar: OperatingCalendar, max_trips_per_day: u32) -> Self {
        Self {
            calendar,
            max_trips_per_day,
            vessels: Mutex::new(HashMap::new()),
        }
    }

    /// The record list for a vessel, created on first use.
    ///
    /// The map lock is held only long enough to clone the handle.
    fn vessel(&self, vessel_id: &str) -> Result<VesselTrips> {
        let mut vessels = self.vessels.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(Arc::clone(
            vessels.entry(vessel_id.to_string()).or_default(),
        ))
    }

    fn existing_vessel(&self, vessel_id: &str) -> Result<Option<VesselTrips>> {
        let vessels = self.vessels.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(vessels.get(vessel_id).map(Arc::clone))
    }
}

fn count_on(trips: &[TripRecord], day: Date) -> u32 {
    let n = trips.iter().filter(|t| t.operating_day == day).count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl TripLedger for InMemoryLedger {
    fn max_trips_per_day(&self) -> u32 {
        self.max_trips_per_day
    }

    fn calendar(&self) -> &OperatingCalendar {
        &self.calendar
    }

    fn trips_today(&self, vessel_id: &str, as_of: Timestamp) -> Result<u32> {
        let Some(trips) = self.existing_vessel(vessel_id)? else {
            return Ok(0);
        };
        let trips = trips.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(count_on(&trips, self.calendar.operating_day(as_of)))
    }

    fn record(&self, vessel_id: &str, driver_id: &str, at: Timestamp) -> Result<TripRecord> {
        let handle = self.vessel(vessel_id)?;
        let mut trips = handle.lock().map_err(|_| LedgerError::Poisoned)?;

        let trip = self.calendar.trip(vessel_id, driver_id, at);
        let taken = count_on(&trips, trip.operating_day);
        if taken >= self.max_trips_per_day {
            warn!(vessel_id, day = %trip.operating_day, taken, "daily trip cap reached");
            return Err(LedgerError::CapacityExceeded {
                vessel_id: vessel_id.to_string(),
                day: trip.operating_day,
                limit: self.max_trips_per_day,
            });
        }

        trips.push(trip.clone());
        debug!(vessel_id, driver_id, day = %trip.operating_day, trip = taken + 1, "trip recorded");
        Ok(trip)
    }

    fn trips_on(&self, day: Date) -> Result<Vec<TripRecord>> {
        let handles: Vec<VesselTrips> = {
            let vessels = self.vessels.lock().map_err(|_| LedgerError::Poisoned)?;
            vessels.values().map(Arc::clone).collect()
        };
        let mut out = Vec::new();
        for handle in handles {
            let trips = handle.lock().map_err(|_| LedgerError::Poisoned)?;
            out.extend(trips.iter().filter(|t| t.operating_day == day).cloned());
        }
        out.sort_by(|a, b| a.issued_at.cmp(&b.issued_at));
        Ok(out)
    }
}
