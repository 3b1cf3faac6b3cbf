//! Per-car brake apparatus.
//!
//! [`CarBrake::update`] integrates one car's brake pipe, straight-air pipe
//! and brake cylinder for a frame and returns the deceleration the friction
//! brake supplies. It also selects which air-release cue, if any, the car
//! emits this frame.

use serde::{Deserialize, Serialize};

use crate::audio::CarSound;
use crate::compressor::AirCompressor;
use crate::handle::Handle;
use crate::pressure::{BrakeCylinder, BrakePipe, approach};

/// Speed-dependent loss of shoe friction, per m/s.
pub const SHOE_FRICTION_FADE: f64 = 0.005;
pub const DEFAULT_BRAKE_CONTROL_SPEED: f64 = 2.0;
pub const DEFAULT_DECELERATION_AT_SERVICE_MAXIMUM: f64 = 1.0;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Whether the car's compressor charges its main reservoir.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrakeType {
    Main,
    #[default]
    Auxiliary,
}

/// How handle demand reaches the brake cylinder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrakeSystem {
    /// Demand sets a straight-air pipe pressure which the cylinder follows.
    #[default]
    StraightAir,
    /// Demand drives the cylinder directly.
    ElectricCommand,
    /// Demand reduces the brake pipe; the cylinder responds to the reduction.
    AutomaticAir,
}

/// The air-release cues a car can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirSound {
    /// The cylinder finished venting.
    Zero,
    /// A small release started.
    Normal,
    /// A large release started.
    High,
}

/// Buffers for each air-release cue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirSounds {
    pub zero: CarSound,
    pub normal: CarSound,
    pub high: CarSound,
}

impl AirSounds {
    pub fn get(&self, sound: AirSound) -> &CarSound {
        match sound {
            AirSound::Zero => &self.zero,
            AirSound::Normal => &self.normal,
            AirSound::High => &self.high,
        }
    }
}

/// Shoe friction relative to standstill; falls off slowly with speed.
#[inline]
pub fn shoe_friction(speed: f64) -> f64 {
    1.0 / (1.0 + SHOE_FRICTION_FADE * speed.abs())
}

// ---------------------------------------------------------------------------
// Car brake apparatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarBrake {
    pub brake_type: BrakeType,
    pub system: BrakeSystem,
    pub brake_pipe: BrakePipe,
    pub straight_air_pipe: f64,
    pub brake_cylinder: BrakeCylinder,
    pub air_compressor: AirCompressor,
    /// Motor braking only engages at or above this speed (m/s).
    pub brake_control_speed: f64,
    /// Deceleration (m/s²) at full service cylinder pressure.
    pub deceleration_at_service_maximum: f64,
    pub air_sounds: AirSounds,
    pub rub: CarSound,
    /// Cue selected by the last update.
    pub air_sound: Option<AirSound>,
    releasing: bool,
}

impl CarBrake {
    pub fn new(
        brake_type: BrakeType,
        system: BrakeSystem,
        brake_pipe: BrakePipe,
        brake_cylinder: BrakeCylinder,
    ) -> Self {
        Self {
            brake_type,
            system,
            brake_pipe,
            straight_air_pipe: 0.0,
            brake_cylinder,
            air_compressor: AirCompressor::default(),
            brake_control_speed: DEFAULT_BRAKE_CONTROL_SPEED,
            deceleration_at_service_maximum: DEFAULT_DECELERATION_AT_SERVICE_MAXIMUM,
            air_sounds: AirSounds::default(),
            rub: CarSound::default(),
            air_sound: None,
            releasing: false,
        }
    }

    pub fn with_compressor(mut self, compressor: AirCompressor) -> Self {
        self.air_compressor = compressor;
        self
    }

    pub fn with_brake_control_speed(mut self, speed: f64) -> Self {
        self.brake_control_speed = speed;
        self
    }

    pub fn with_deceleration(mut self, deceleration: f64) -> Self {
        self.deceleration_at_service_maximum = deceleration;
        self
    }

    pub fn with_air_sounds(mut self, sounds: AirSounds) -> Self {
        self.air_sounds = sounds;
        self
    }

    pub fn with_rub_sound(mut self, rub: CarSound) -> Self {
        self.rub = rub;
        self
    }

    pub fn cylinder_ratio(&self) -> f64 {
        self.brake_cylinder.ratio()
    }

    pub fn is_releasing(&self) -> bool {
        self.releasing
    }

    /// The air-release slot selected by the last update, if any.
    pub fn current_air_sound(&self) -> Option<&CarSound> {
        self.air_sound.map(|s| self.air_sounds.get(s))
    }

    /// Integrate one frame and return the friction-brake deceleration.
    ///
    /// `speed` is the driver car's speed. The cylinder target of an automatic
    /// air brake is computed from the pipe pressure settled by the previous
    /// frame, before this frame's pipe charging or exhaust.
    pub fn update(&mut self, dt: f64, speed: f64, handle: &Handle, emergency: bool) -> f64 {
        self.air_sound = None;
        let demand = handle.demand();
        let settled_pipe = self.brake_pipe.current_pressure;

        let pipe_target = match self.system {
            BrakeSystem::AutomaticAir if emergency => 0.0,
            BrakeSystem::AutomaticAir => self.brake_pipe.normal_pressure * (1.0 - demand),
            _ => self.brake_pipe.normal_pressure,
        };
        let supply = self.air_compressor.main_reservoir_pressure;
        self.brake_pipe.drive(pipe_target, supply, dt);

        let cylinder = &self.brake_cylinder;
        let target = if emergency {
            cylinder.emergency_maximum_pressure
        } else {
            match self.system {
                BrakeSystem::AutomaticAir => {
                    let normal = self.brake_pipe.normal_pressure;
                    if normal > 0.0 {
                        cylinder.service_maximum_pressure
                            * ((normal - settled_pipe) / normal).clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                }
                _ => cylinder.service_maximum_pressure * demand,
            }
        };
        let rise_rate = if emergency {
            cylinder.emergency_rate
        } else {
            cylinder.apply_rate
        };
        let fall_rate = cylinder.release_rate;

        let before = cylinder.current_pressure;
        let after = match self.system {
            BrakeSystem::StraightAir => {
                self.straight_air_pipe =
                    approach(self.straight_air_pipe, target, rise_rate, fall_rate, dt);
                approach(before, self.straight_air_pipe, rise_rate, fall_rate, dt)
            }
            BrakeSystem::ElectricCommand | BrakeSystem::AutomaticAir => {
                approach(before, target, rise_rate, fall_rate, dt)
            }
        };
        self.brake_cylinder.current_pressure = after;

        let releasing = after < before;
        if releasing && after <= 0.0 {
            self.air_sound = Some(AirSound::Zero);
        } else if releasing && !self.releasing {
            let pending = before - target;
            self.air_sound = if pending > 0.5 * self.brake_cylinder.service_maximum_pressure {
                Some(AirSound::High)
            } else {
                Some(AirSound::Normal)
            };
        }
        self.releasing = releasing && after > 0.0;

        self.deceleration_at_service_maximum * self.cylinder_ratio() * shoe_friction(speed)
    }

    /// Overwrite the release-edge flag, used when restoring a snapshot.
    pub(crate) fn restore_releasing(&mut self, releasing: bool) {
        self.releasing = releasing;
    }
}

impl Default for CarBrake {
    fn default() -> Self {
        Self::new(
            BrakeType::default(),
            BrakeSystem::default(),
            BrakePipe::default(),
            BrakeCylinder::default(),
        )
    }
}
