//! Brake-state snapshots.
//!
//! Serializes the dynamic brake state of a train (pressures, governor and
//! release flags, deceleration outputs, handle positions) via `bitcode` with
//! a versioned header. Configuration such as rates and set points is not
//! included: a snapshot is restored into a train built from the same consist.
//!
//! Hold-brake regulators are opaque strategies and are not captured, and
//! live audio sources are dropped; a restored train restarts its rub cues.

use serde::{Deserialize, Serialize};

use crate::train::Train;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a brake-state snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xB4A3_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("snapshot has {snapshot} cars but the train has {train}")]
    CarCountMismatch { snapshot: usize, train: usize },
    #[error("snapshot has {snapshot} coupling flags but the train has {train} couplings")]
    CouplingCountMismatch { snapshot: usize, train: usize },
    #[error("snapshot loco brake presence does not match the train")]
    LocoBrakeMismatch,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Frame count at the time the snapshot was taken.
    pub frame: u64,
}

impl SnapshotHeader {
    pub fn new(frame: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            frame,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot payload
// ---------------------------------------------------------------------------

/// Dynamic brake state of one car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarBrakeState {
    pub brake_pipe: f64,
    pub straight_air_pipe: f64,
    pub brake_cylinder: f64,
    pub main_reservoir: f64,
    pub compressor_running: bool,
    pub releasing: bool,
    pub deceleration_due_to_brake: f64,
    pub deceleration_due_to_motor: f64,
}

/// Positions of the driver's handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlePositions {
    pub brake: f64,
    pub loco_brake: Option<f64>,
    pub reverser: i8,
    pub emergency: bool,
    pub hold_brake: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrakeSnapshot {
    pub header: SnapshotHeader,
    pub cars: Vec<CarBrakeState>,
    pub handles: HandlePositions,
    pub breached: Vec<bool>,
}

// ---------------------------------------------------------------------------
// Train methods
// ---------------------------------------------------------------------------

impl Train {
    /// Capture the dynamic brake state.
    pub fn snapshot(&self) -> BrakeSnapshot {
        let cars = self
            .cars()
            .iter()
            .map(|car| CarBrakeState {
                brake_pipe: car.brake.brake_pipe.current_pressure,
                straight_air_pipe: car.brake.straight_air_pipe,
                brake_cylinder: car.brake.brake_cylinder.current_pressure,
                main_reservoir: car.brake.air_compressor.main_reservoir_pressure,
                compressor_running: car.brake.air_compressor.is_running(),
                releasing: car.brake.is_releasing(),
                deceleration_due_to_brake: car.deceleration_due_to_brake,
                deceleration_due_to_motor: car.deceleration_due_to_motor(),
            })
            .collect();
        let handles = self.handles();
        BrakeSnapshot {
            header: SnapshotHeader::new(self.frame()),
            cars,
            handles: HandlePositions {
                brake: handles.brake.actual,
                loco_brake: handles.loco_brake.as_ref().map(|h| h.actual),
                reverser: handles.reverser.actual,
                emergency: handles.emergency.actual,
                hold_brake: handles.hold_brake.actual,
            },
            breached: self.breached().to_vec(),
        }
    }

    /// Serialize the dynamic brake state to a binary blob.
    pub fn serialize_brakes(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(&self.snapshot()).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode a blob produced by [`Train::serialize_brakes`] and apply it.
    pub fn deserialize_brakes(&mut self, data: &[u8]) -> Result<(), SnapshotError> {
        let snapshot: BrakeSnapshot =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        self.restore_brakes(&snapshot)
    }

    /// Apply a snapshot. Nothing is modified if validation fails.
    pub fn restore_brakes(&mut self, snapshot: &BrakeSnapshot) -> Result<(), SnapshotError> {
        snapshot.header.validate()?;
        if snapshot.cars.len() != self.car_count() {
            return Err(SnapshotError::CarCountMismatch {
                snapshot: snapshot.cars.len(),
                train: self.car_count(),
            });
        }
        let couplings = self.car_count() - 1;
        if snapshot.breached.len() != couplings {
            return Err(SnapshotError::CouplingCountMismatch {
                snapshot: snapshot.breached.len(),
                train: couplings,
            });
        }
        if snapshot.handles.loco_brake.is_some() != self.handles().has_loco_brake() {
            return Err(SnapshotError::LocoBrakeMismatch);
        }

        for (car, state) in self.cars_mut().iter_mut().zip(&snapshot.cars) {
            car.brake.brake_pipe.current_pressure = state.brake_pipe;
            car.brake.straight_air_pipe = state.straight_air_pipe;
            car.brake.brake_cylinder.current_pressure = state.brake_cylinder;
            car.brake
                .air_compressor
                .restore(state.main_reservoir, state.compressor_running);
            car.brake.restore_releasing(state.releasing);
            car.brake.air_sound = None;
            car.brake.rub.source = None;
            car.deceleration_due_to_brake = state.deceleration_due_to_brake;
            if let Some(motor) = car.motor.as_mut() {
                motor.deceleration_due_to_motor = state.deceleration_due_to_motor;
            }
        }

        let handles = self.handles_mut();
        handles.brake.actual = snapshot.handles.brake;
        if let (Some(loco), Some(actual)) = (handles.loco_brake.as_mut(), snapshot.handles.loco_brake) {
            loco.actual = actual;
        }
        handles.reverser.actual = snapshot.handles.reverser;
        handles.emergency.actual = snapshot.handles.emergency;
        handles.hold_brake.actual = snapshot.handles.hold_brake;

        self.restore_progress(snapshot.header.frame, &snapshot.breached);
        Ok(())
    }
}
