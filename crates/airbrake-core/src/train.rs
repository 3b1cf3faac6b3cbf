//! The train: an ordered consist of cars plus the driver's handle set.
//!
//! [`Train::update_brakes`] is the frame orchestrator. It owns no clock; the
//! host calls it once per simulation frame with the elapsed time.

use log::{debug, trace};

use crate::apparatus::BrakeType;
use crate::audio::{AudioService, rub_cue, update_rub_sound};
use crate::blending::{ActiveHandle, select_handle};
use crate::car::Car;
use crate::event::{BrakeEvent, EventBuffer};
use crate::handle::{HandleSet, LocoBrakeMode};
use crate::hash::StateHash;
use crate::id::CarIndex;
use crate::propagation::{PipeView, propagate};

/// Structural errors detected when a train is assembled.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrainError {
    #[error("a train needs at least one car")]
    NoCars,
    #[error("driver car {driver_car} out of range for a train of {car_count} cars")]
    DriverCarOutOfRange { driver_car: usize, car_count: usize },
}

/// Inputs shared by every car during one frame.
struct FrameInputs<'a> {
    dt: f64,
    frame: u64,
    driver_car: usize,
    driver_speed: f64,
    handles: &'a HandleSet,
    mode: LocoBrakeMode,
}

#[derive(Debug)]
pub struct Train {
    cars: Vec<Car>,
    driver_car: usize,
    handles: HandleSet,
    loco_brake_mode: LocoBrakeMode,
    frame: u64,
    /// Per coupling: whether it was leaking after the last propagation.
    breached: Vec<bool>,
    events: EventBuffer,
}

impl Train {
    /// Assemble a train. The number of cars is fixed for the train's life.
    pub fn new(
        cars: Vec<Car>,
        driver_car: usize,
        handles: HandleSet,
        loco_brake_mode: LocoBrakeMode,
    ) -> Result<Self, TrainError> {
        if cars.is_empty() {
            return Err(TrainError::NoCars);
        }
        if driver_car >= cars.len() {
            return Err(TrainError::DriverCarOutOfRange {
                driver_car,
                car_count: cars.len(),
            });
        }
        let couplings = cars.len() - 1;
        Ok(Self {
            cars,
            driver_car,
            handles,
            loco_brake_mode,
            frame: 0,
            breached: vec![false; couplings],
            events: EventBuffer::default(),
        })
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    /// Mutable access for the track layer (speeds, derailment). The slice
    /// cannot change the number of cars.
    pub fn cars_mut(&mut self) -> &mut [Car] {
        &mut self.cars
    }

    pub fn car(&self, index: usize) -> Option<&Car> {
        self.cars.get(index)
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    pub fn driver_car(&self) -> usize {
        self.driver_car
    }

    pub fn handles(&self) -> &HandleSet {
        &self.handles
    }

    /// The input layer writes handle positions through here between frames.
    pub fn handles_mut(&mut self) -> &mut HandleSet {
        &mut self.handles
    }

    pub fn loco_brake_mode(&self) -> LocoBrakeMode {
        self.loco_brake_mode
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Per coupling, whether it leaked during the last frame.
    pub fn breached(&self) -> &[bool] {
        &self.breached
    }

    pub(crate) fn restore_progress(&mut self, frame: u64, breached: &[bool]) {
        self.frame = frame;
        for (slot, &value) in self.breached.iter_mut().zip(breached) {
            *slot = value;
        }
    }

    /// Replace the event buffer with an empty one of `capacity` events.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventBuffer::new(capacity);
        self
    }

    /// Events emitted since the last drain, oldest first.
    pub fn events(&self) -> &EventBuffer {
        &self.events
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<BrakeEvent> {
        self.events.drain()
    }

    /// The handle currently driving the driver car's brake.
    pub fn driver_active_handle(&self) -> ActiveHandle {
        match self.handles.loco_brake.as_ref() {
            Some(loco) => select_handle(
                self.loco_brake_mode,
                &self.handles.brake,
                loco,
                &self.cars[self.driver_car].brake.brake_cylinder,
            ),
            None => ActiveHandle::TrainBrake,
        }
    }

    /// Advance every car's brakes by `dt` seconds.
    ///
    /// Cars are updated front to back, then brake-pipe pressure is
    /// propagated across the train. A car therefore reads the pipe pressure
    /// settled by the *previous* call; a pipe change made this frame reaches
    /// the other cars' cylinders one frame later.
    pub fn update_brakes(&mut self, dt: f64, audio: &mut dyn AudioService) {
        let inputs = FrameInputs {
            dt,
            frame: self.frame,
            driver_car: self.driver_car,
            driver_speed: self.cars[self.driver_car].current_speed,
            handles: &self.handles,
            mode: self.loco_brake_mode,
        };
        for (index, car) in self.cars.iter_mut().enumerate() {
            update_car(car, CarIndex(index), &inputs, &mut self.events, audio);
        }
        self.propagate_pipes(dt);
        self.frame += 1;
    }

    fn propagate_pipes(&mut self, dt: f64) {
        let view: Vec<PipeView> = self
            .cars
            .iter()
            .map(|car| PipeView {
                pressure: car.brake.brake_pipe.current_pressure,
                leak_rate: car.brake.brake_pipe.leak_rate,
                derailed: car.derailed,
            })
            .collect();
        let result = propagate(&view, dt);

        for (car, pressure) in self.cars.iter_mut().zip(&result.pressures) {
            car.brake.brake_pipe.current_pressure = *pressure;
        }
        for (coupling, (&now, was)) in result.leaking.iter().zip(self.breached.iter_mut()).enumerate() {
            if now && !*was {
                debug!("coupling {coupling} breached at frame {}", self.frame);
                self.events.push(BrakeEvent::CouplingBreached {
                    coupling,
                    frame: self.frame,
                });
            }
            *was = now;
        }
        trace!(
            "frame {}: brake pipe settled at {:.3} over {} cars",
            self.frame,
            result.settled,
            self.cars.len()
        );
    }

    /// Hash all pressures, outputs and flags that drive the next frame.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.frame);
        for car in &self.cars {
            let brake = &car.brake;
            hash.write_f64(brake.brake_pipe.current_pressure);
            hash.write_f64(brake.straight_air_pipe);
            hash.write_f64(brake.brake_cylinder.current_pressure);
            hash.write_f64(brake.air_compressor.main_reservoir_pressure);
            hash.write_bool(brake.air_compressor.is_running());
            hash.write_bool(brake.is_releasing());
            hash.write_f64(car.deceleration_due_to_brake);
            hash.write_f64(car.deceleration_due_to_motor());
        }
        hash.finish()
    }
}

fn update_car(
    car: &mut Car,
    index: CarIndex,
    inputs: &FrameInputs<'_>,
    events: &mut EventBuffer,
    audio: &mut dyn AudioService,
) {
    car.deceleration_due_to_brake = 0.0;

    if car.brake.brake_type == BrakeType::Main {
        let was_running = car.brake.air_compressor.is_running();
        car.brake.air_compressor.charge(inputs.dt);
        match (was_running, car.brake.air_compressor.is_running()) {
            (false, true) => {
                debug!("car {}: compressor started at frame {}", index.0, inputs.frame);
                events.push(BrakeEvent::CompressorStarted {
                    car: index,
                    frame: inputs.frame,
                });
            }
            (true, false) => {
                debug!("car {}: compressor stopped at frame {}", index.0, inputs.frame);
                events.push(BrakeEvent::CompressorStopped {
                    car: index,
                    frame: inputs.frame,
                });
            }
            _ => {}
        }
    }

    let is_driver = index.0 == inputs.driver_car;
    let handles = inputs.handles;
    let active = match handles.loco_brake.as_ref() {
        Some(loco) if is_driver => {
            select_handle(inputs.mode, &handles.brake, loco, &car.brake.brake_cylinder)
        }
        _ => ActiveHandle::TrainBrake,
    };
    car.deceleration_due_to_brake = car.brake.update(
        inputs.dt,
        inputs.driver_speed,
        active.resolve(handles),
        handles.emergency.actual,
    );

    if let Some(sound) = car.brake.current_air_sound() {
        if let Some(buffer) = sound.buffer {
            audio.play_sound(buffer, 1.0, 1.0, sound.position, index, false);
        }
    }

    car.update_motor(handles, is_driver);

    let cue = rub_cue(car.current_speed, car.brake.cylinder_ratio(), car.derailed);
    update_rub_sound(&mut car.brake.rub, cue, index, audio);
}
