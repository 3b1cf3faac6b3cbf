//! Cars and motor-brake coupling.

use crate::apparatus::{BrakeSystem, CarBrake};
use crate::handle::{Handle, HandleSet};
use crate::hold_brake::{HoldBrake, HoldBrakeRegulator};

/// Motor equipment carried by a powered car.
#[derive(Debug)]
pub struct MotorUnit {
    /// Deceleration (m/s²) the motor supplies at full brake demand.
    pub motor_deceleration: f64,
    /// Output of the last frame, after the hold brake.
    pub deceleration_due_to_motor: f64,
    pub hold_brake: Box<dyn HoldBrakeRegulator>,
}

impl MotorUnit {
    /// A motor unit with the default [`HoldBrake`] regulator.
    pub fn new(motor_deceleration: f64) -> Self {
        Self {
            motor_deceleration,
            deceleration_due_to_motor: 0.0,
            hold_brake: Box::new(HoldBrake::new()),
        }
    }

    pub fn with_hold_brake(mut self, regulator: Box<dyn HoldBrakeRegulator>) -> Self {
        self.hold_brake = regulator;
        self
    }
}

#[derive(Debug)]
pub struct Car {
    pub brake: CarBrake,
    /// Signed speed along the track (m/s).
    pub current_speed: f64,
    pub derailed: bool,
    /// Friction-brake output of the last frame.
    pub deceleration_due_to_brake: f64,
    pub motor: Option<MotorUnit>,
}

impl Car {
    /// An unpowered car.
    pub fn trailer(brake: CarBrake) -> Self {
        Self {
            brake,
            current_speed: 0.0,
            derailed: false,
            deceleration_due_to_brake: 0.0,
            motor: None,
        }
    }

    /// A powered car.
    pub fn powered(brake: CarBrake, motor: MotorUnit) -> Self {
        Self {
            motor: Some(motor),
            ..Self::trailer(brake)
        }
    }

    pub fn is_motor_car(&self) -> bool {
        self.motor.is_some()
    }

    /// Motor deceleration of the last frame; zero for trailers.
    pub fn deceleration_due_to_motor(&self) -> f64 {
        self.motor.as_ref().map_or(0.0, |m| m.deceleration_due_to_motor)
    }

    /// Total braking deceleration of the last frame.
    pub fn total_deceleration(&self) -> f64 {
        self.deceleration_due_to_brake + self.deceleration_due_to_motor()
    }

    /// Recompute motor deceleration for the frame, then let the hold brake
    /// regulate it. No-op for trailers.
    pub fn update_motor(&mut self, handles: &HandleSet, is_driver: bool) {
        let demanded = motor_deceleration(self, handles, is_driver);
        if let Some(motor) = self.motor.as_mut() {
            motor.deceleration_due_to_motor = demanded;
            motor
                .hold_brake
                .regulate(&mut motor.deceleration_due_to_motor, handles.hold_brake.actual);
        }
    }
}

/// Motor deceleration demanded of `car` before the hold brake.
///
/// Zero for trailers, automatic-air cars, below the brake control speed, with
/// the reverser in neutral, or while the emergency brake is applied.
pub fn motor_deceleration(car: &Car, handles: &HandleSet, is_driver: bool) -> f64 {
    let Some(motor) = car.motor.as_ref() else {
        return 0.0;
    };
    let engaged = car.brake.system != BrakeSystem::AutomaticAir
        && car.current_speed.abs() >= car.brake.brake_control_speed
        && handles.reverser.actual != 0
        && !handles.emergency.actual;
    if !engaged {
        return 0.0;
    }

    let loco = handles
        .loco_brake
        .as_ref()
        .filter(|loco| is_driver && handle_applied(loco));
    let fraction = match loco {
        Some(loco) => motor_fraction(loco, handles.brake.maximum_notch()),
        None => motor_fraction(&handles.brake, handles.brake.maximum_notch()),
    };
    fraction * motor.motor_deceleration
}

/// Whether a handle is off its release position.
fn handle_applied(handle: &Handle) -> bool {
    if handle.kind().is_continuous() {
        handle.demand() > 0.0
    } else {
        handle.actual != 0.0
    }
}

/// Share of motor capacity demanded by `handle`. Notched positions are
/// scaled by the train brake's maximum notch; continuous positions are a
/// pipe-pressure ratio, so released (1.0) demands nothing.
fn motor_fraction(handle: &Handle, brake_maximum_notch: u32) -> f64 {
    if handle.kind().is_continuous() {
        handle.demand()
    } else {
        handle.actual / brake_maximum_notch as f64
    }
}
