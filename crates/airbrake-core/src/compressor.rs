//! Air compressor and main reservoir.
//!
//! The compressor is governed by two set points: it starts when the main
//! reservoir falls below `minimum_pressure` and stops once it reaches
//! `maximum_pressure`. The reservoir bleeds slowly through system leakage, so
//! a main car's compressor cycles over a long run.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAIN_RESERVOIR_MINIMUM_PRESSURE: f64 = 690.0;
pub const DEFAULT_MAIN_RESERVOIR_MAXIMUM_PRESSURE: f64 = 780.0;
pub const DEFAULT_COMPRESSOR_RATE: f64 = 5.0;
pub const DEFAULT_RESERVOIR_LEAK_RATE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirCompressor {
    pub main_reservoir_pressure: f64,
    pub minimum_pressure: f64,
    pub maximum_pressure: f64,
    /// Pressure gained per second while running.
    pub rate: f64,
    /// Pressure lost per second to system leakage.
    pub leak_rate: f64,
    running: bool,
}

impl AirCompressor {
    /// A stopped compressor with a full main reservoir.
    pub fn new(minimum_pressure: f64, maximum_pressure: f64, rate: f64) -> Self {
        Self {
            main_reservoir_pressure: maximum_pressure,
            minimum_pressure,
            maximum_pressure,
            rate,
            leak_rate: DEFAULT_RESERVOIR_LEAK_RATE,
            running: false,
        }
    }

    pub fn with_reservoir_pressure(mut self, pressure: f64) -> Self {
        self.main_reservoir_pressure = pressure;
        self
    }

    pub fn with_leak_rate(mut self, leak_rate: f64) -> Self {
        self.leak_rate = leak_rate;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the governor and reservoir by `dt` seconds.
    pub fn charge(&mut self, dt: f64) {
        self.main_reservoir_pressure = (self.main_reservoir_pressure - self.leak_rate * dt).max(0.0);
        if !self.running && self.main_reservoir_pressure < self.minimum_pressure {
            self.running = true;
        }
        if self.running {
            self.main_reservoir_pressure =
                (self.main_reservoir_pressure + self.rate * dt).min(self.maximum_pressure);
            if self.main_reservoir_pressure >= self.maximum_pressure {
                self.running = false;
            }
        }
    }

    /// Overwrite the governor state, used when restoring a snapshot.
    pub(crate) fn restore(&mut self, main_reservoir_pressure: f64, running: bool) {
        self.main_reservoir_pressure = main_reservoir_pressure;
        self.running = running;
    }
}

impl Default for AirCompressor {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAIN_RESERVOIR_MINIMUM_PRESSURE,
            DEFAULT_MAIN_RESERVOIR_MAXIMUM_PRESSURE,
            DEFAULT_COMPRESSOR_RATE,
        )
    }
}
