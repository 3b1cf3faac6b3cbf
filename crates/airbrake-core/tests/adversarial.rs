//! Adversarial input tests for the brake system.
//!
//! Edge cases that should either be rejected at construction or be handled
//! gracefully without panics or negative pressures.

use airbrake_core::audio::NullAudio;
use airbrake_core::car::Car;
use airbrake_core::handle::{Handle, HandleSet, LocoBrakeMode};
use airbrake_core::test_utils::*;
use airbrake_core::train::{Train, TrainError};

fn assert_sane(train: &Train) {
    for car in train.cars() {
        let brake = &car.brake;
        assert!(brake.brake_pipe.current_pressure.is_finite());
        assert!(brake.brake_pipe.current_pressure >= 0.0);
        assert!(brake.brake_cylinder.current_pressure >= 0.0);
        assert!(brake.straight_air_pipe >= 0.0);
        assert!(car.deceleration_due_to_brake.is_finite());
    }
}

#[test]
fn zero_dt_changes_nothing() {
    let mut train = automatic_air_train(4);
    train.handles_mut().brake.actual = 8.0;
    let before = train.snapshot();
    train.update_brakes(0.0, &mut NullAudio);
    let after = train.snapshot();
    assert_eq!(before.cars, after.cars);
}

#[test]
fn enormous_dt_saturates() {
    let mut train = automatic_air_train(3);
    train.cars_mut()[1].derailed = true;
    train.handles_mut().emergency.actual = true;
    train.update_brakes(1e9, &mut NullAudio);
    assert_sane(&train);
    for car in train.cars() {
        assert_eq!(car.brake.brake_pipe.current_pressure, 0.0);
    }
}

#[test]
fn every_car_derailed() {
    let mut train = electric_train(6);
    for car in train.cars_mut() {
        car.derailed = true;
    }
    for _ in 0..1000 {
        train.update_brakes(0.1, &mut NullAudio);
    }
    assert_sane(&train);
    assert!(train.breached().iter().all(|&b| b));
    // One breach event per coupling, not per frame.
    assert_eq!(train.drain_events().len(), 5);
}

#[test]
fn single_car_train_derails() {
    let mut train = electric_train(1);
    train.cars_mut()[0].derailed = true;
    train.update_brakes(1.0, &mut NullAudio);
    assert!(train.breached().is_empty());
    assert!(train.drain_events().is_empty());
    assert_sane(&train);
}

#[test]
fn driver_car_at_rear() {
    let cars = (0..4).map(|_| Car::trailer(electric_brake())).collect();
    let handles = HandleSet::new(Handle::notched(8).with_actual(2.0))
        .with_loco_brake(Handle::loco_notched(8).with_actual(8.0));
    let mut train = Train::new(cars, 3, handles, LocoBrakeMode::Combined).unwrap();
    train.update_brakes(1.0, &mut NullAudio);
    assert_eq!(train.cars()[3].brake.brake_cylinder.current_pressure, 400.0);
    assert_eq!(train.cars()[0].brake.brake_cylinder.current_pressure, 100.0);
}

#[test]
fn construction_errors() {
    let handles = HandleSet::new(Handle::notched(8));
    assert_eq!(
        Train::new(Vec::new(), 0, handles.clone(), LocoBrakeMode::Combined).unwrap_err(),
        TrainError::NoCars
    );
    let err = Train::new(
        vec![Car::trailer(electric_brake())],
        7,
        handles,
        LocoBrakeMode::Combined,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "driver car 7 out of range for a train of 1 cars");
}

#[test]
fn handle_flapping_every_frame() {
    let mut train = automatic_air_train(5);
    let mut audio = RecordingAudio::new();
    for frame in 0..500 {
        train.handles_mut().brake.actual = if frame % 2 == 0 { 8.0 } else { 0.0 };
        train.handles_mut().emergency.actual = frame % 7 == 0;
        train.update_brakes(1.0 / 30.0, &mut audio);
    }
    assert_sane(&train);
}

#[test]
fn reverse_running_is_symmetric() {
    let mut forward = motor_train(2, 0.8);
    let mut backward = motor_train(2, 0.8);
    set_speed(&mut forward, 15.0);
    set_speed(&mut backward, -15.0);
    for train in [&mut forward, &mut backward] {
        train.handles_mut().brake.actual = 6.0;
        train.update_brakes(1.0, &mut NullAudio);
    }
    for (f, b) in forward.cars().iter().zip(backward.cars()) {
        assert_eq!(f.deceleration_due_to_brake, b.deceleration_due_to_brake);
        assert_eq!(f.deceleration_due_to_motor(), b.deceleration_due_to_motor());
    }
}

#[test]
fn loco_handle_on_non_driver_cars_is_ignored() {
    let cars = (0..3).map(|_| Car::trailer(electric_brake())).collect();
    let handles = HandleSet::new(Handle::notched(8))
        .with_loco_brake(Handle::loco_notched(8).with_actual(8.0));
    let mut train = Train::new(cars, 1, handles, LocoBrakeMode::Independent).unwrap();
    train.update_brakes(1.0, &mut NullAudio);
    assert_eq!(train.cars()[0].brake.brake_cylinder.current_pressure, 0.0);
    assert_eq!(train.cars()[1].brake.brake_cylinder.current_pressure, 400.0);
    assert_eq!(train.cars()[2].brake.brake_cylinder.current_pressure, 0.0);
}
