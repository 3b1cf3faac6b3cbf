//! Shared test helpers: a recording audio service and consist builders.

use slotmap::SlotMap;

use crate::apparatus::{BrakeSystem, BrakeType, CarBrake};
use crate::audio::{AudioService, Vector3};
use crate::car::{Car, MotorUnit};
use crate::handle::{Handle, HandleSet, LocoBrakeMode};
use crate::id::{CarIndex, SoundBufferId, SourceId};
use crate::pressure::{BrakeCylinder, BrakePipe};
use crate::train::Train;

// ---------------------------------------------------------------------------
// Recording audio service
// ---------------------------------------------------------------------------

/// One `play_sound` call.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub source: SourceId,
    pub buffer: SoundBufferId,
    pub pitch: f64,
    pub gain: f64,
    pub position: Vector3,
    pub emitter: CarIndex,
    pub looped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LiveSource {
    pitch: f64,
    gain: f64,
    looped: bool,
}

/// An [`AudioService`] that records every call. Looped sources play until
/// stopped; one-shots play until [`RecordingAudio::finish`] is called.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    live: SlotMap<SourceId, LiveSource>,
    plays: Vec<PlayRecord>,
    stops: usize,
    updates: usize,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self) -> &[PlayRecord] {
        &self.plays
    }

    /// Plays that were started looped (rub cues).
    pub fn looped_plays(&self) -> impl Iterator<Item = &PlayRecord> {
        self.plays.iter().filter(|p| p.looped)
    }

    /// Plays that were one-shots (air-release cues).
    pub fn one_shots(&self) -> impl Iterator<Item = &PlayRecord> {
        self.plays.iter().filter(|p| !p.looped)
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn gain_of(&self, source: SourceId) -> Option<f64> {
        self.live.get(source).map(|s| s.gain)
    }

    pub fn pitch_of(&self, source: SourceId) -> Option<f64> {
        self.live.get(source).map(|s| s.pitch)
    }

    /// End a source as if its buffer ran out.
    pub fn finish(&mut self, source: SourceId) {
        self.live.remove(source);
    }

    /// End every one-shot source.
    pub fn finish_one_shots(&mut self) {
        self.live.retain(|_, s| s.looped);
    }
}

impl AudioService for RecordingAudio {
    fn play_sound(
        &mut self,
        buffer: SoundBufferId,
        pitch: f64,
        gain: f64,
        position: Vector3,
        emitter: CarIndex,
        looped: bool,
    ) -> SourceId {
        let source = self.live.insert(LiveSource { pitch, gain, looped });
        self.plays.push(PlayRecord {
            source,
            buffer,
            pitch,
            gain,
            position,
            emitter,
            looped,
        });
        source
    }

    fn stop_sound(&mut self, source: SourceId) {
        if self.live.remove(source).is_some() {
            self.stops += 1;
        }
    }

    fn is_playing(&self, source: SourceId) -> bool {
        self.live.contains_key(source)
    }

    fn update_sound(&mut self, source: SourceId, pitch: f64, gain: f64) {
        if let Some(live) = self.live.get_mut(source) {
            live.pitch = pitch;
            live.gain = gain;
            self.updates += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A cylinder that reaches any target within one 1-second frame.
pub fn fast_cylinder() -> BrakeCylinder {
    BrakeCylinder::new(400.0, 500.0).with_rates(1000.0, 1000.0, 1000.0)
}

pub fn electric_brake() -> CarBrake {
    CarBrake::new(
        BrakeType::Auxiliary,
        BrakeSystem::ElectricCommand,
        BrakePipe::new(490.0, 5.0),
        fast_cylinder(),
    )
}

pub fn automatic_air_brake() -> CarBrake {
    CarBrake::new(
        BrakeType::Main,
        BrakeSystem::AutomaticAir,
        BrakePipe::new(490.0, 5.0),
        BrakeCylinder::default(),
    )
}

/// `n` electric-command trailers behind a notched 8-step train brake.
pub fn electric_train(n: usize) -> Train {
    let cars = (0..n).map(|_| Car::trailer(electric_brake())).collect();
    build(cars, HandleSet::new(Handle::notched(8)), LocoBrakeMode::Combined)
}

/// `n` automatic-air cars (all main) behind a notched 8-step train brake.
pub fn automatic_air_train(n: usize) -> Train {
    let cars = (0..n).map(|_| Car::trailer(automatic_air_brake())).collect();
    build(cars, HandleSet::new(Handle::notched(8)), LocoBrakeMode::Combined)
}

/// A powered electric-command car leading `n - 1` trailers, reverser forward.
pub fn motor_train(n: usize, motor_deceleration: f64) -> Train {
    let mut cars = vec![Car::powered(electric_brake(), MotorUnit::new(motor_deceleration))];
    cars.extend((1..n).map(|_| Car::trailer(electric_brake())));
    let mut handles = HandleSet::new(Handle::notched(8));
    handles.reverser.actual = 1;
    build(cars, handles, LocoBrakeMode::Combined)
}

/// Assemble a train driven from car 0.
pub fn build(cars: Vec<Car>, handles: HandleSet, mode: LocoBrakeMode) -> Train {
    match Train::new(cars, 0, handles, mode) {
        Ok(train) => train,
        Err(e) => panic!("test train is invalid: {e}"),
    }
}

/// Set every car's speed.
pub fn set_speed(train: &mut Train, speed: f64) {
    for car in train.cars_mut() {
        car.current_speed = speed;
    }
}
