//! Hold-brake regulators for motor cars.
//!
//! A regulator receives the motor deceleration computed for the frame and may
//! rewrite it in place according to the hold-brake handle.

/// Strategy that post-processes a motor car's deceleration.
pub trait HoldBrakeRegulator: std::fmt::Debug {
    /// Adjust `deceleration` given whether the hold brake is engaged.
    fn regulate(&mut self, deceleration: &mut f64, engaged: bool);
}

/// Default regulator.
///
/// While engaged it latches the last nonzero motor deceleration and keeps
/// supplying it once the motor brake cuts out (below the brake control speed,
/// or with the reverser in neutral), holding the train at a standstill.
/// Disengaging releases the latch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldBrake {
    held: f64,
}

impl HoldBrake {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latched deceleration, zero when nothing is held.
    pub fn held(&self) -> f64 {
        self.held
    }
}

impl HoldBrakeRegulator for HoldBrake {
    fn regulate(&mut self, deceleration: &mut f64, engaged: bool) {
        if !engaged {
            self.held = 0.0;
            return;
        }
        if *deceleration > 0.0 {
            self.held = *deceleration;
        } else {
            *deceleration = self.held;
        }
    }
}

/// Regulator that leaves the motor deceleration untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassThrough;

impl HoldBrakeRegulator for PassThrough {
    fn regulate(&mut self, _deceleration: &mut f64, _engaged: bool) {}
}
