//! Driver controls read by the brake system.
//!
//! The input layer writes the `actual` positions before each frame; the brake
//! system only reads them. A brake handle's kind and maximum notch are fixed
//! when it is built.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Handle kinds
// ---------------------------------------------------------------------------

/// How a brake handle is discretized.
///
/// Notched kinds step from 0 (released) to `maximum_notch` (full service).
/// Continuous-air kinds command a brake-pipe pressure ratio in `[0, 1]`, so a
/// *higher* `actual` means *less* brake demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Notched,
    ContinuousAir,
    LocoNotched,
    LocoContinuousAir,
}

impl HandleKind {
    /// True for the continuous-air kinds.
    pub fn is_continuous(self) -> bool {
        matches!(self, HandleKind::ContinuousAir | HandleKind::LocoContinuousAir)
    }

    /// True for the kinds meant for an independent locomotive brake.
    pub fn is_loco(self) -> bool {
        matches!(self, HandleKind::LocoNotched | HandleKind::LocoContinuousAir)
    }
}

// ---------------------------------------------------------------------------
// Brake handle
// ---------------------------------------------------------------------------

/// A train or locomotive brake handle.
///
/// `maximum_notch` must be strictly positive; the data loader rejects zero.
/// Continuous kinds carry a maximum of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    kind: HandleKind,
    maximum_notch: u32,
    /// Current position. Notch number for notched kinds, pressure ratio for
    /// continuous kinds.
    pub actual: f64,
}

impl Handle {
    /// Create a handle in its released position.
    pub fn new(kind: HandleKind, maximum_notch: u32) -> Self {
        let (maximum_notch, actual) = if kind.is_continuous() {
            (1, 1.0)
        } else {
            (maximum_notch, 0.0)
        };
        Self {
            kind,
            maximum_notch,
            actual,
        }
    }

    pub fn notched(maximum_notch: u32) -> Self {
        Self::new(HandleKind::Notched, maximum_notch)
    }

    pub fn continuous_air() -> Self {
        Self::new(HandleKind::ContinuousAir, 1)
    }

    pub fn loco_notched(maximum_notch: u32) -> Self {
        Self::new(HandleKind::LocoNotched, maximum_notch)
    }

    pub fn loco_continuous_air() -> Self {
        Self::new(HandleKind::LocoContinuousAir, 1)
    }

    /// Builder-style setter for the initial position.
    pub fn with_actual(mut self, actual: f64) -> Self {
        self.actual = actual;
        self
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn maximum_notch(&self) -> u32 {
        self.maximum_notch
    }

    /// Brake demand as a fraction of full service, clamped to `[0, 1]`.
    pub fn demand(&self) -> f64 {
        if self.kind.is_continuous() {
            (1.0 - self.actual).clamp(0.0, 1.0)
        } else {
            (self.actual / self.maximum_notch as f64).clamp(0.0, 1.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Other driver controls
// ---------------------------------------------------------------------------

/// Direction selector. Zero is neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverserHandle {
    pub actual: i8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyHandle {
    pub actual: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldBrakeHandle {
    pub actual: bool,
}

/// How the locomotive brake handle combines with the train brake handle on
/// the driver car.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocoBrakeMode {
    /// The loco handle always drives the driver car.
    Independent,
    /// The handle demanding more braking wins.
    #[default]
    Combined,
    /// The loco handle wins whenever it is off its release position.
    Blocking,
}

// ---------------------------------------------------------------------------
// Handle set
// ---------------------------------------------------------------------------

/// The complete set of driver controls for one train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleSet {
    pub brake: Handle,
    pub loco_brake: Option<Handle>,
    pub reverser: ReverserHandle,
    pub emergency: EmergencyHandle,
    pub hold_brake: HoldBrakeHandle,
}

impl HandleSet {
    /// A handle set with only a train brake; every other control is neutral.
    pub fn new(brake: Handle) -> Self {
        Self {
            brake,
            loco_brake: None,
            reverser: ReverserHandle::default(),
            emergency: EmergencyHandle::default(),
            hold_brake: HoldBrakeHandle::default(),
        }
    }

    pub fn with_loco_brake(mut self, loco_brake: Handle) -> Self {
        self.loco_brake = Some(loco_brake);
        self
    }

    pub fn has_loco_brake(&self) -> bool {
        self.loco_brake.is_some()
    }

    /// Position of the loco brake handle, or 0 when the train has none.
    pub fn loco_brake_actual(&self) -> f64 {
        self.loco_brake.as_ref().map_or(0.0, |h| h.actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notched_handle_starts_released() {
        let h = Handle::notched(8);
        assert_eq!(h.actual, 0.0);
        assert_eq!(h.maximum_notch(), 8);
        assert_eq!(h.demand(), 0.0);
    }

    #[test]
    fn continuous_handle_starts_released() {
        let h = Handle::continuous_air();
        assert_eq!(h.actual, 1.0);
        assert_eq!(h.maximum_notch(), 1);
        assert_eq!(h.demand(), 0.0);
    }

    #[test]
    fn notched_demand_is_fraction_of_maximum() {
        let h = Handle::notched(8).with_actual(2.0);
        assert_eq!(h.demand(), 0.25);
    }

    #[test]
    fn continuous_demand_is_inverted() {
        let h = Handle::loco_continuous_air().with_actual(0.25);
        assert_eq!(h.demand(), 0.75);
    }

    #[test]
    fn demand_is_clamped() {
        assert_eq!(Handle::notched(4).with_actual(9.0).demand(), 1.0);
        assert_eq!(Handle::continuous_air().with_actual(1.5).demand(), 0.0);
    }

    #[test]
    fn kind_predicates() {
        assert!(HandleKind::ContinuousAir.is_continuous());
        assert!(!HandleKind::LocoNotched.is_continuous());
        assert!(HandleKind::LocoNotched.is_loco());
        assert!(!HandleKind::Notched.is_loco());
    }

    #[test]
    fn loco_actual_defaults_to_zero() {
        let set = HandleSet::new(Handle::notched(8));
        assert!(!set.has_loco_brake());
        assert_eq!(set.loco_brake_actual(), 0.0);

        let set = set.with_loco_brake(Handle::loco_notched(4).with_actual(3.0));
        assert_eq!(set.loco_brake_actual(), 3.0);
    }
}
