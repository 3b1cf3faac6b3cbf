//! Pneumatic pressure stores: the brake pipe and the brake cylinder.
//!
//! Pressures share whatever unit the consist is configured in (the bundled
//! defaults are kPa). Rates are pressure per second. Every decrement is
//! floored at zero.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BRAKE_PIPE_NORMAL_PRESSURE: f64 = 490.0;
pub const DEFAULT_BRAKE_PIPE_CHARGE_RATE: f64 = 150.0;
pub const DEFAULT_BRAKE_PIPE_EXHAUST_RATE: f64 = 200.0;
pub const DEFAULT_SERVICE_MAXIMUM_PRESSURE: f64 = 480.0;
pub const DEFAULT_EMERGENCY_MAXIMUM_PRESSURE: f64 = 480.0;
pub const DEFAULT_CYLINDER_APPLY_RATE: f64 = 300.0;
pub const DEFAULT_CYLINDER_RELEASE_RATE: f64 = 200.0;
pub const DEFAULT_CYLINDER_EMERGENCY_RATE: f64 = 400.0;

/// Subtract `rate * dt` from `pressure`, never going below zero.
#[inline]
pub fn leaked(pressure: f64, rate: f64, dt: f64) -> f64 {
    (pressure - rate * dt).max(0.0)
}

/// Move `current` toward `target`, rising at `rise_rate` and falling at
/// `fall_rate`, without overshooting. The result is never negative.
pub fn approach(current: f64, target: f64, rise_rate: f64, fall_rate: f64, dt: f64) -> f64 {
    if current < target {
        (current + rise_rate * dt).min(target)
    } else if current > target {
        (current - fall_rate * dt).max(target).max(0.0)
    } else {
        current
    }
}

// ---------------------------------------------------------------------------
// Brake pipe
// ---------------------------------------------------------------------------

/// The car's section of the train line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrakePipe {
    pub current_pressure: f64,
    /// Fully charged (released) pressure.
    pub normal_pressure: f64,
    /// Loss per second at a coupling touching a derailed car.
    pub leak_rate: f64,
    pub charge_rate: f64,
    pub exhaust_rate: f64,
}

impl BrakePipe {
    /// A fully charged pipe with default charge and exhaust rates.
    pub fn new(normal_pressure: f64, leak_rate: f64) -> Self {
        Self {
            current_pressure: normal_pressure,
            normal_pressure,
            leak_rate,
            charge_rate: DEFAULT_BRAKE_PIPE_CHARGE_RATE,
            exhaust_rate: DEFAULT_BRAKE_PIPE_EXHAUST_RATE,
        }
    }

    pub fn with_rates(mut self, charge_rate: f64, exhaust_rate: f64) -> Self {
        self.charge_rate = charge_rate;
        self.exhaust_rate = exhaust_rate;
        self
    }

    /// Apply one coupling's worth of derailment leak.
    pub fn leak(&mut self, dt: f64) {
        self.current_pressure = leaked(self.current_pressure, self.leak_rate, dt);
    }

    /// Charge or exhaust toward `target`. Charging never lifts the pipe above
    /// `supply` (the main-reservoir pressure), but a pipe already above the
    /// supply is not pulled down by it.
    pub fn drive(&mut self, target: f64, supply: f64, dt: f64) {
        let current = self.current_pressure;
        self.current_pressure = if current < target {
            approach(current, target.min(supply), self.charge_rate, 0.0, dt).max(current)
        } else {
            approach(current, target, 0.0, self.exhaust_rate, dt)
        };
    }
}

impl Default for BrakePipe {
    fn default() -> Self {
        Self::new(DEFAULT_BRAKE_PIPE_NORMAL_PRESSURE, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Brake cylinder
// ---------------------------------------------------------------------------

/// The actuator that presses the shoes against the wheels.
///
/// `service_maximum_pressure` must be strictly positive; the data loader
/// rejects zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrakeCylinder {
    pub current_pressure: f64,
    pub service_maximum_pressure: f64,
    pub emergency_maximum_pressure: f64,
    pub apply_rate: f64,
    pub release_rate: f64,
    pub emergency_rate: f64,
}

impl BrakeCylinder {
    /// A released cylinder with default rates.
    pub fn new(service_maximum_pressure: f64, emergency_maximum_pressure: f64) -> Self {
        Self {
            current_pressure: 0.0,
            service_maximum_pressure,
            emergency_maximum_pressure,
            apply_rate: DEFAULT_CYLINDER_APPLY_RATE,
            release_rate: DEFAULT_CYLINDER_RELEASE_RATE,
            emergency_rate: DEFAULT_CYLINDER_EMERGENCY_RATE,
        }
    }

    pub fn with_rates(mut self, apply_rate: f64, release_rate: f64, emergency_rate: f64) -> Self {
        self.apply_rate = apply_rate;
        self.release_rate = release_rate;
        self.emergency_rate = emergency_rate;
        self
    }

    /// Current pressure as a fraction of the service maximum.
    pub fn ratio(&self) -> f64 {
        self.current_pressure / self.service_maximum_pressure
    }
}

impl Default for BrakeCylinder {
    fn default() -> Self {
        Self::new(
            DEFAULT_SERVICE_MAXIMUM_PRESSURE,
            DEFAULT_EMERGENCY_MAXIMUM_PRESSURE,
        )
    }
}
