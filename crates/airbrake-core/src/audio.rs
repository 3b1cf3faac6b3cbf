//! Audio cues emitted by the brakes.
//!
//! The brake system never mixes or streams audio itself. It calls into an
//! [`AudioService`] supplied by the host, which owns the sources and decides
//! how overlapping one-shots are layered.

use serde::{Deserialize, Serialize};
use slotmap::Key;

use crate::id::{CarIndex, SoundBufferId, SourceId};

/// Below this speed (5 km/h, in m/s) the rub gain ramps up from silence.
pub const RUB_FADE_IN_SPEED: f64 = 1.38888888888889;
/// Above this speed (45 km/h, in m/s) the rub gain fades out.
pub const RUB_FADE_OUT_SPEED: f64 = 12.5;
pub const RUB_FADE_FACTOR: f64 = 0.1;

/// A playing rub sound keeps going while pitch and gain stay above these.
pub const RUB_SUSTAIN_PITCH: f64 = 0.01;
pub const RUB_SUSTAIN_GAIN: f64 = 0.001;
/// A silent rub sound only starts once pitch and gain exceed these.
pub const RUB_START_PITCH: f64 = 0.02;
pub const RUB_START_GAIN: f64 = 0.01;

/// Emission position relative to the car body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Audio service
// ---------------------------------------------------------------------------

/// The audio primitives the brake system depends on.
pub trait AudioService {
    /// Start `buffer` and return a handle to the new source.
    fn play_sound(
        &mut self,
        buffer: SoundBufferId,
        pitch: f64,
        gain: f64,
        position: Vector3,
        emitter: CarIndex,
        looped: bool,
    ) -> SourceId;

    fn stop_sound(&mut self, source: SourceId);

    fn is_playing(&self, source: SourceId) -> bool;

    /// Change pitch and gain of a source that is already playing.
    fn update_sound(&mut self, source: SourceId, pitch: f64, gain: f64);
}

/// An audio service that discards everything. Useful for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioService for NullAudio {
    fn play_sound(
        &mut self,
        _buffer: SoundBufferId,
        _pitch: f64,
        _gain: f64,
        _position: Vector3,
        _emitter: CarIndex,
        _looped: bool,
    ) -> SourceId {
        SourceId::null()
    }

    fn stop_sound(&mut self, _source: SourceId) {}

    fn is_playing(&self, _source: SourceId) -> bool {
        false
    }

    fn update_sound(&mut self, _source: SourceId, _pitch: f64, _gain: f64) {}
}

// ---------------------------------------------------------------------------
// Per-car sound slot
// ---------------------------------------------------------------------------

/// A sound a car can emit: which buffer, where, and the live source if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarSound {
    pub buffer: Option<SoundBufferId>,
    pub position: Vector3,
    #[serde(skip)]
    pub source: Option<SourceId>,
}

impl CarSound {
    pub fn new(buffer: SoundBufferId, position: Vector3) -> Self {
        Self {
            buffer: Some(buffer),
            position,
            source: None,
        }
    }

    pub fn is_playing(&self, audio: &dyn AudioService) -> bool {
        self.source.is_some_and(|s| audio.is_playing(s))
    }
}

// ---------------------------------------------------------------------------
// Rub cue
// ---------------------------------------------------------------------------

/// Pitch and gain of the brake-shoe rub for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubCue {
    pub pitch: f64,
    pub gain: f64,
}

/// Gain multiplier applied to the cylinder ratio at `speed` (absolute m/s).
pub fn rub_speed_factor(speed: f64) -> f64 {
    if speed < RUB_FADE_IN_SPEED {
        let t = speed * speed;
        1.5552 * t - 0.746496 * speed * t
    } else if speed > RUB_FADE_OUT_SPEED {
        let t = speed - RUB_FADE_OUT_SPEED;
        1.0 / (RUB_FADE_FACTOR * t * t + 1.0)
    } else {
        1.0
    }
}

/// Shape the rub cue from car speed and cylinder pressure ratio. A derailed
/// car's shoes are not on the rail, so its gain is zero.
pub fn rub_cue(speed: f64, cylinder_ratio: f64, derailed: bool) -> RubCue {
    let spd = speed.abs();
    let base = if derailed { 0.0 } else { cylinder_ratio };
    RubCue {
        pitch: 1.0 / (spd + 1.0) + 1.0,
        gain: base * rub_speed_factor(spd),
    }
}

/// Drive the looping rub sound with hysteresis: the start thresholds are
/// higher than the sustain thresholds so the cue does not chatter.
pub fn update_rub_sound(
    sound: &mut CarSound,
    cue: RubCue,
    emitter: CarIndex,
    audio: &mut dyn AudioService,
) {
    let Some(buffer) = sound.buffer else {
        return;
    };
    match sound.source {
        Some(source) if audio.is_playing(source) => {
            if cue.pitch > RUB_SUSTAIN_PITCH && cue.gain > RUB_SUSTAIN_GAIN {
                audio.update_sound(source, cue.pitch, cue.gain);
            } else {
                audio.stop_sound(source);
                sound.source = None;
            }
        }
        _ => {
            if cue.pitch > RUB_START_PITCH && cue.gain > RUB_START_GAIN {
                sound.source = Some(audio.play_sound(
                    buffer,
                    cue.pitch,
                    cue.gain,
                    sound.position,
                    emitter,
                    true,
                ));
            }
        }
    }
}
