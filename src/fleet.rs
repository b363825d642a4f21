//! Fleet directory: the vessels and drivers a checkpoint can look up.
//!
//! The checkpoint depends only on [`VesselRepository`] and
//! [`DriverRepository`]. [`Fleet`] is the in-process implementation, loaded
//! from `fleet.toml` or built from the demo fleet.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::{Driver, LicenseStatus, OperationalStatus, Vessel};

/// Errors raised while registering or updating fleet records.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("vessel already registered: {0}")]
    DuplicateVessel(String),

    #[error("driver already registered: {0}")]
    DuplicateDriver(String),

    #[error("vessel {0} must have a capacity greater than zero")]
    ZeroCapacity(String),

    #[error("vessel not found: {0}")]
    VesselNotFound(String),

    #[error("driver not found: {0}")]
    DriverNotFound(String),

    #[error("driver {driver_id} is assigned to unknown vessel {vessel_id}")]
    UnknownAssignment { driver_id: String, vessel_id: String },

    #[error("invalid fleet file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = core::result::Result<T, FleetError>;

/// Looks up vessels by id.
pub trait VesselRepository: Send + Sync {
    fn get_vessel(&self, id: &str) -> Option<Vessel>;
}

/// Looks up drivers by id.
pub trait DriverRepository: Send + Sync {
    fn get_driver(&self, id: &str) -> Option<Driver>;
}

/// An in-memory fleet directory.
///
/// Records are keyed by id and iterate in id order. Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vessels: BTreeMap<String, Vessel>,
    drivers: BTreeMap<String, Driver>,
}

/// On-disk shape of `fleet.toml`.
#[derive(Debug, Deserialize)]
struct FleetFile {
    #[serde(default)]
    vessels: Vec<Vessel>,
    #[serde(default)]
    drivers: Vec<Driver>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a fleet from TOML with `[[vessels]]` and `[[drivers]]` tables.
    ///
    /// Vessels are registered before drivers, so assignments may reference
    /// any vessel in the file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: FleetFile = toml::from_str(contents)?;
        let mut fleet = Self::new();
        for vessel in file.vessels {
            fleet.register_vessel(vessel)?;
        }
        for driver in file.drivers {
            fleet.register_driver(driver)?;
        }
        Ok(fleet)
    }

    /// The demo fleet the firm app ships with.
    pub fn sample() -> Self {
        let vessels = [
            ("B-101", "Ganga Rider 1", 6, OperationalStatus::Active, Some("Ramesh Enterprises")),
            ("B-102", "Ganga Rider 2", 8, OperationalStatus::Active, Some("Ramesh Enterprises")),
            ("B-103", "Yamuna Express", 10, OperationalStatus::UnderRepair, Some("City Rafting Co.")),
            ("B-104", "Rapid Runner", 6, OperationalStatus::Blocked, None),
        ];
        let drivers = [
            ("D01", "Ramesh Kumar", "UK07-202201", "9876543210", LicenseStatus::Active, Some("B-101")),
            ("D02", "Suresh Singh", "UK07-202305", "9123456789", LicenseStatus::Active, Some("B-103")),
            ("D03", "Amit Verma", "UK07-PENDING", "8899776655", LicenseStatus::Pending, None),
            ("D04", "Rahul Sharma", "UK07-202199", "7766554433", LicenseStatus::Blocked, None),
        ];

        let mut fleet = Self::new();
        for (id, name, capacity, status, owner) in vessels {
            fleet.vessels.insert(
                id.to_string(),
                Vessel {
                    id: id.to_string(),
                    name: name.to_string(),
                    capacity,
                    operational_status: status,
                    owner: owner.map(String::from),
                },
            );
        }
        for (id, name, license, phone, status, vessel) in drivers {
            fleet.drivers.insert(
                id.to_string(),
                Driver {
                    id: id.to_string(),
                    name: name.to_string(),
                    license_number: license.to_string(),
                    license_status: status,
                    assigned_vessel_id: vessel.map(String::from),
                    phone: Some(phone.to_string()),
                },
            );
        }
        fleet
    }

    // ── Vessels ──

    pub fn register_vessel(&mut self, vessel: Vessel) -> Result<()> {
        if vessel.capacity == 0 {
            return Err(FleetError::ZeroCapacity(vessel.id));
        }
        if self.vessels.contains_key(&vessel.id) {
            return Err(FleetError::DuplicateVessel(vessel.id));
        }
        self.vessels.insert(vessel.id.clone(), vessel);
        Ok(())
    }

    /// Moves a vessel between active, under repair, and blocked.
    pub fn set_vessel_status(&mut self, id: &str, status: OperationalStatus) -> Result<()> {
        let vessel = self
            .vessels
            .get_mut(id)
            .ok_or_else(|| FleetError::VesselNotFound(id.to_string()))?;
        vessel.operational_status = status;
        Ok(())
    }

    pub fn vessels(&self) -> impl Iterator<Item = &Vessel> {
        self.vessels.values()
    }

    // ── Drivers ──

    /// Registers a driver. An assigned vessel must already be registered.
    pub fn register_driver(&mut self, driver: Driver) -> Result<()> {
        if self.drivers.contains_key(&driver.id) {
            return Err(FleetError::DuplicateDriver(driver.id));
        }
        if let Some(vessel_id) = &driver.assigned_vessel_id
            && !self.vessels.contains_key(vessel_id)
        {
            return Err(FleetError::UnknownAssignment {
                driver_id: driver.id,
                vessel_id: vessel_id.clone(),
            });
        }
        self.drivers.insert(driver.id.clone(), driver);
        Ok(())
    }

    pub fn set_license_status(&mut self, id: &str, status: LicenseStatus) -> Result<()> {
        let driver = self
            .drivers
            .get_mut(id)
            .ok_or_else(|| FleetError::DriverNotFound(id.to_string()))?;
        driver.license_status = status;
        Ok(())
    }

    /// Assigns a driver to a vessel, or clears the assignment with `None`.
    pub fn assign_vessel(&mut self, driver_id: &str, vessel_id: Option<&str>) -> Result<()> {
        if let Some(vessel_id) = vessel_id
            && !self.vessels.contains_key(vessel_id)
        {
            return Err(FleetError::UnknownAssignment {
                driver_id: driver_id.to_string(),
                vessel_id: vessel_id.to_string(),
            });
        }
        let driver = self
            .drivers
            .get_mut(driver_id)
            .ok_or_else(|| FleetError::DriverNotFound(driver_id.to_string()))?;
        driver.assigned_vessel_id = vessel_id.map(String::from);
        Ok(())
    }

    pub fn drivers(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.values()
    }

    /// Drivers whose name or license number contains `query` (ignoring case),
    /// or whose phone number contains it verbatim.
    pub fn search_drivers<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Driver> + 'a {
        let needle = query.to_lowercase();
        self.drivers.values().filter(move |d| {
            d.name.to_lowercase().contains(&needle)
                || d.license_number.to_lowercase().contains(&needle)
                || d.phone.as_deref().is_some_and(|p| p.contains(query))
        })
    }
}

impl VesselRepository for Fleet {
    fn get_vessel(&self, id: &str) -> Option<Vessel> {
        self.vessels.get(id).cloned()
    }
}

impl DriverRepository for Fleet {
    fn get_driver(&self, id: &str) -> Option<Driver> {
        self.drivers.get(id).cloned()
    }
}
