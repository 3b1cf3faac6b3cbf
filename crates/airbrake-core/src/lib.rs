//! Airbrake Core -- pneumatic brake simulation for multi-car trains.
//!
//! This crate models the driver's brake handles, the per-car brake apparatus
//! (brake pipe, straight-air pipe, brake cylinder, air compressor), motor
//! braking with a hold-brake regulator, and the audio cues the brakes emit.
//! Everything is advanced once per simulation frame by
//! [`train::Train::update_brakes`].
//!
//! # Frame Pipeline
//!
//! Each call to [`train::Train::update_brakes`] runs two phases in a fixed
//! order:
//!
//! 1. **Per-car update** -- for every car, front to back: charge the air
//!    compressor (main cars only), pick the active handle (driver car only),
//!    integrate the brake pipe and cylinder, fire the air-release cue, couple
//!    motor deceleration through the hold brake, and shape the rub cue.
//! 2. **Propagation** -- leak pipe pressure at every coupling touching a
//!    derailed car, then broadcast the mean pressure to every car.
//!
//! Because propagation runs last, the pipe pressure a car reads during its
//! update is always the value settled by the *previous* frame.
//!
//! # Key Types
//!
//! - [`train::Train`] -- Owns the cars and the handle set; frame orchestrator.
//! - [`handle::Handle`] -- A brake handle with a [`handle::HandleKind`].
//! - [`blending::select_handle`] -- Loco/train brake blending decision table.
//! - [`apparatus::CarBrake`] -- Per-car pneumatic state and integration.
//! - [`propagation::propagate`] -- Lumped inter-car pipe model.
//! - [`audio::AudioService`] -- The audio primitives the brakes call into.
//! - [`snapshot`] -- Versioned brake-state snapshots via bitcode.

pub mod apparatus;
pub mod audio;
pub mod blending;
pub mod car;
pub mod compressor;
pub mod event;
pub mod handle;
pub mod hash;
pub mod hold_brake;
pub mod id;
pub mod pressure;
pub mod propagation;
pub mod snapshot;
pub mod train;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
