//! Pass commands: print the payload a firm encodes into a QR code.

use clap::Subcommand;

use gatepass::{Checkpoint, DriverRepository, Fleet, PassPayload, VesselRepository};

#[derive(Debug, Subcommand)]
pub enum PassCommand {
    /// Print a vessel's sail pass.
    Vessel {
        /// Vessel ID (e.g. `B-101`).
        id: String,
    },

    /// Print a driver's ID card.
    Driver {
        /// Driver ID (e.g. `D01`).
        id: String,
    },
}

pub(super) fn cmd_vessel(fleet: &Fleet, checkpoint: &Checkpoint, id: &str) -> Result<(), String> {
    let vessel = fleet
        .get_vessel(id)
        .ok_or_else(|| format!("vessel not found: {id}"))?;
    let encoded = PassPayload::for_vessel(&vessel, checkpoint.now())
        .encode()
        .map_err(|e| format!("failed to encode pass: {e}"))?;
    println!("{encoded}");
    Ok(())
}

pub(super) fn cmd_driver(fleet: &Fleet, checkpoint: &Checkpoint, id: &str) -> Result<(), String> {
    let driver = fleet
        .get_driver(id)
        .ok_or_else(|| format!("driver not found: {id}"))?;
    let encoded = PassPayload::for_driver(&driver, checkpoint.now())
        .encode()
        .map_err(|e| format!("failed to encode pass: {e}"))?;
    println!("{encoded}");
    Ok(())
}
