//! Serde data file structs for consist definitions.
//!
//! These structs define the on-disk format for a train: its driver controls
//! and its cars. They are deserialized from RON, JSON, or TOML data files and
//! then resolved into core types by the loader. Every numeric field that has
//! a sensible default may be omitted.

use airbrake_core::apparatus::{
    BrakeSystem, BrakeType, DEFAULT_BRAKE_CONTROL_SPEED, DEFAULT_DECELERATION_AT_SERVICE_MAXIMUM,
};
use airbrake_core::compressor::{
    DEFAULT_COMPRESSOR_RATE, DEFAULT_MAIN_RESERVOIR_MAXIMUM_PRESSURE,
    DEFAULT_MAIN_RESERVOIR_MINIMUM_PRESSURE, DEFAULT_RESERVOIR_LEAK_RATE,
};
use airbrake_core::handle::{HandleKind, LocoBrakeMode};
use airbrake_core::pressure::{
    DEFAULT_BRAKE_PIPE_CHARGE_RATE, DEFAULT_BRAKE_PIPE_EXHAUST_RATE,
    DEFAULT_BRAKE_PIPE_NORMAL_PRESSURE, DEFAULT_CYLINDER_APPLY_RATE,
    DEFAULT_CYLINDER_EMERGENCY_RATE, DEFAULT_CYLINDER_RELEASE_RATE,
    DEFAULT_EMERGENCY_MAXIMUM_PRESSURE, DEFAULT_SERVICE_MAXIMUM_PRESSURE,
};
use serde::Deserialize;

// ===========================================================================
// Train
// ===========================================================================

/// A complete consist.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainData {
    /// Index of the driver car after `count` expansion.
    #[serde(default)]
    pub driver_car: usize,
    #[serde(default)]
    pub loco_brake_mode: LocoBrakeMode,
    pub handles: HandlesData,
    pub cars: Vec<CarData>,
}

// ===========================================================================
// Handles
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HandlesData {
    pub brake: HandleData,
    #[serde(default)]
    pub loco_brake: Option<HandleData>,
}

/// A brake handle. `maximum_notch` is required for notched kinds and ignored
/// for continuous kinds.
#[derive(Debug, Clone, Deserialize)]
pub struct HandleData {
    pub kind: HandleKind,
    #[serde(default)]
    pub maximum_notch: Option<u32>,
}

// ===========================================================================
// Cars
// ===========================================================================

/// One car, or `count` identical cars in a row.
#[derive(Debug, Clone, Deserialize)]
pub struct CarData {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub brake_type: BrakeType,
    #[serde(default)]
    pub system: BrakeSystem,
    #[serde(default)]
    pub brake_pipe: BrakePipeData,
    #[serde(default)]
    pub brake_cylinder: BrakeCylinderData,
    #[serde(default)]
    pub compressor: CompressorData,
    #[serde(default = "default_brake_control_speed")]
    pub brake_control_speed: f64,
    #[serde(default = "default_deceleration")]
    pub deceleration_at_service_maximum: f64,
    /// Present only on powered cars.
    #[serde(default)]
    pub motor_deceleration: Option<f64>,
    #[serde(default)]
    pub sounds: SoundsData,
}

fn default_count() -> usize {
    1
}

fn default_brake_control_speed() -> f64 {
    DEFAULT_BRAKE_CONTROL_SPEED
}

fn default_deceleration() -> f64 {
    DEFAULT_DECELERATION_AT_SERVICE_MAXIMUM
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrakePipeData {
    pub normal_pressure: f64,
    pub leak_rate: f64,
    pub charge_rate: f64,
    pub exhaust_rate: f64,
}

impl Default for BrakePipeData {
    fn default() -> Self {
        Self {
            normal_pressure: DEFAULT_BRAKE_PIPE_NORMAL_PRESSURE,
            leak_rate: 0.0,
            charge_rate: DEFAULT_BRAKE_PIPE_CHARGE_RATE,
            exhaust_rate: DEFAULT_BRAKE_PIPE_EXHAUST_RATE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrakeCylinderData {
    pub service_maximum_pressure: f64,
    pub emergency_maximum_pressure: f64,
    pub apply_rate: f64,
    pub release_rate: f64,
    pub emergency_rate: f64,
}

impl Default for BrakeCylinderData {
    fn default() -> Self {
        Self {
            service_maximum_pressure: DEFAULT_SERVICE_MAXIMUM_PRESSURE,
            emergency_maximum_pressure: DEFAULT_EMERGENCY_MAXIMUM_PRESSURE,
            apply_rate: DEFAULT_CYLINDER_APPLY_RATE,
            release_rate: DEFAULT_CYLINDER_RELEASE_RATE,
            emergency_rate: DEFAULT_CYLINDER_EMERGENCY_RATE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompressorData {
    pub minimum_pressure: f64,
    pub maximum_pressure: f64,
    pub rate: f64,
    pub leak_rate: f64,
}

impl Default for CompressorData {
    fn default() -> Self {
        Self {
            minimum_pressure: DEFAULT_MAIN_RESERVOIR_MINIMUM_PRESSURE,
            maximum_pressure: DEFAULT_MAIN_RESERVOIR_MAXIMUM_PRESSURE,
            rate: DEFAULT_COMPRESSOR_RATE,
            leak_rate: DEFAULT_RESERVOIR_LEAK_RATE,
        }
    }
}

// ===========================================================================
// Sounds
// ===========================================================================

/// Sound buffer bindings for a car. Absent entries are silent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SoundsData {
    pub air_zero: Option<SoundData>,
    pub air_normal: Option<SoundData>,
    pub air_high: Option<SoundData>,
    pub rub: Option<SoundData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoundData {
    pub buffer: u32,
    /// `[x, y, z]` relative to the car body.
    #[serde(default)]
    pub position: [f64; 3],
}
