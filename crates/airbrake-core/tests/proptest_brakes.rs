//! Property-based tests for the brake system.
//!
//! Uses proptest to generate random consists, handle sequences and pipe
//! states, then verify the pressure and blending invariants hold.

use airbrake_core::blending::select_handle;
use airbrake_core::handle::{Handle, HandleSet, LocoBrakeMode};
use airbrake_core::pressure::{BrakeCylinder, approach, leaked};
use airbrake_core::propagation::{PipeView, propagate};
use airbrake_core::test_utils::*;
use airbrake_core::train::Train;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_pipe() -> impl Strategy<Value = PipeView> {
    (0.0..1000.0f64, 0.0..50.0f64, any::<bool>()).prop_map(|(pressure, leak_rate, derailed)| {
        PipeView {
            pressure,
            leak_rate,
            derailed,
        }
    })
}

fn arb_handle() -> impl Strategy<Value = Handle> {
    prop_oneof![
        (1u32..=14).prop_flat_map(|max| (Just(max), 0..=max))
            .prop_map(|(max, n)| Handle::notched(max).with_actual(n as f64)),
        (0.0..=1.0f64).prop_map(|a| Handle::continuous_air().with_actual(a)),
    ]
}

fn arb_loco_handle() -> impl Strategy<Value = Handle> {
    prop_oneof![
        (1u32..=14).prop_flat_map(|max| (Just(max), 0..=max))
            .prop_map(|(max, n)| Handle::loco_notched(max).with_actual(n as f64)),
        (0.0..=1.0f64).prop_map(|a| Handle::loco_continuous_air().with_actual(a)),
    ]
}

fn arb_mode() -> impl Strategy<Value = LocoBrakeMode> {
    prop_oneof![
        Just(LocoBrakeMode::Independent),
        Just(LocoBrakeMode::Combined),
        Just(LocoBrakeMode::Blocking),
    ]
}

/// Per-frame inputs: (brake notch, emergency, derail index, dt).
fn arb_inputs(max_frames: usize) -> impl Strategy<Value = Vec<(u8, bool, Option<u8>, f64)>> {
    proptest::collection::vec(
        (0..=8u8, prop::bool::weighted(0.05), prop::option::weighted(0.02, 0..8u8), 0.0..0.5f64),
        1..=max_frames,
    )
}

fn run(train: &mut Train, inputs: &[(u8, bool, Option<u8>, f64)]) {
    let mut audio = RecordingAudio::new();
    for &(notch, emergency, derail, dt) in inputs {
        train.handles_mut().brake.actual = notch as f64;
        train.handles_mut().emergency.actual = emergency;
        if let Some(index) = derail {
            let count = train.car_count();
            train.cars_mut()[index as usize % count].derailed = true;
        }
        train.update_brakes(dt, &mut audio);
        audio.finish_one_shots();
    }
}

// ===========================================================================
// Pressure primitives
// ===========================================================================

proptest! {
    #[test]
    fn leak_never_negative(p in 0.0..1000.0f64, rate in 0.0..1e6f64, dt in 0.0..100.0f64) {
        prop_assert!(leaked(p, rate, dt) >= 0.0);
    }

    #[test]
    fn approach_never_overshoots(
        current in 0.0..1000.0f64,
        target in 0.0..1000.0f64,
        rise in 0.0..1000.0f64,
        fall in 0.0..1000.0f64,
        dt in 0.0..10.0f64,
    ) {
        let next = approach(current, target, rise, fall, dt);
        prop_assert!(next >= 0.0);
        let lo = current.min(target);
        let hi = current.max(target);
        prop_assert!(next >= lo && next <= hi);
    }
}

// ===========================================================================
// Propagation
// ===========================================================================

proptest! {
    #[test]
    fn propagation_equalises_and_floors(
        pipes in proptest::collection::vec(arb_pipe(), 1..40),
        dt in 0.0..5.0f64,
    ) {
        let result = propagate(&pipes, dt);
        prop_assert_eq!(result.pressures.len(), pipes.len());
        prop_assert_eq!(result.leaking.len(), pipes.len() - 1);
        for &p in &result.pressures {
            prop_assert_eq!(p, result.settled);
            prop_assert!(p >= 0.0);
        }
    }

    #[test]
    fn propagation_without_derailment_preserves_mean(
        pressures in proptest::collection::vec(0.0..1000.0f64, 1..40),
        dt in 0.0..5.0f64,
    ) {
        let pipes: Vec<PipeView> = pressures
            .iter()
            .map(|&pressure| PipeView { pressure, leak_rate: 10.0, derailed: false })
            .collect();
        let mean = pressures.iter().sum::<f64>() / pressures.len() as f64;
        let result = propagate(&pipes, dt);
        prop_assert!((result.settled - mean).abs() < 1e-9);
        prop_assert!(result.leaking.iter().all(|&l| !l));
    }

    #[test]
    fn leaks_are_local_to_derailed_couplings(
        pipes in proptest::collection::vec(arb_pipe(), 2..40),
    ) {
        let result = propagate(&pipes, 1.0);
        for (i, &leaking) in result.leaking.iter().enumerate() {
            prop_assert_eq!(leaking, pipes[i].derailed || pipes[i + 1].derailed);
        }
    }

    #[test]
    fn derailment_never_raises_pressure(
        pipes in proptest::collection::vec(arb_pipe(), 1..40),
        dt in 0.0..5.0f64,
    ) {
        let intact: Vec<PipeView> = pipes.iter().map(|p| PipeView { derailed: false, ..*p }).collect();
        let leaking = propagate(&pipes, dt).settled;
        let clean = propagate(&intact, dt).settled;
        prop_assert!(leaking <= clean + 1e-9);
    }
}

// ===========================================================================
// Blending
// ===========================================================================

proptest! {
    #[test]
    fn blending_is_pure(
        mode in arb_mode(),
        brake in arb_handle(),
        loco in arb_loco_handle(),
        cylinder_pressure in 0.0..500.0f64,
    ) {
        let mut cylinder = BrakeCylinder::new(400.0, 450.0);
        cylinder.current_pressure = cylinder_pressure;
        let first = select_handle(mode, &brake, &loco, &cylinder);
        let second = select_handle(mode, &brake, &loco, &cylinder);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn equal_maximum_notch_tie_goes_to_loco(max in 1u32..=14, notch in 0u32..=14) {
        let notch = notch.min(max) as f64;
        let brake = Handle::notched(max).with_actual(notch);
        let loco = Handle::loco_notched(max).with_actual(notch);
        let cylinder = BrakeCylinder::default();
        prop_assert_eq!(
            select_handle(LocoBrakeMode::Combined, &brake, &loco, &cylinder),
            airbrake_core::blending::ActiveHandle::LocoBrake
        );
    }
}

// ===========================================================================
// Whole-train invariants
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pressures_stay_non_negative(n in 1usize..12, inputs in arb_inputs(120)) {
        let mut train = automatic_air_train(n);
        set_speed(&mut train, 12.0);
        run(&mut train, &inputs);
        for car in train.cars() {
            prop_assert!(car.brake.brake_pipe.current_pressure >= 0.0);
            prop_assert!(car.brake.brake_cylinder.current_pressure >= 0.0);
            prop_assert!(car.brake.air_compressor.main_reservoir_pressure >= 0.0);
            prop_assert!(car.deceleration_due_to_brake >= 0.0);
        }
    }

    #[test]
    fn pipes_equal_after_every_frame(n in 1usize..12, inputs in arb_inputs(60)) {
        let mut train = electric_train(n);
        let mut audio = RecordingAudio::new();
        for &(notch, emergency, derail, dt) in &inputs {
            train.handles_mut().brake.actual = notch as f64;
            train.handles_mut().emergency.actual = emergency;
            if let Some(index) = derail {
                train.cars_mut()[index as usize % n].derailed = true;
            }
            train.update_brakes(dt, &mut audio);
            let first = train.cars()[0].brake.brake_pipe.current_pressure;
            prop_assert!(train.cars().iter().all(|c| c.brake.brake_pipe.current_pressure == first));
        }
    }

    #[test]
    fn replay_is_deterministic(n in 1usize..8, inputs in arb_inputs(80)) {
        let mut a = motor_train(n, 0.9);
        let mut b = motor_train(n, 0.9);
        set_speed(&mut a, 20.0);
        set_speed(&mut b, 20.0);
        run(&mut a, &inputs);
        run(&mut b, &inputs);
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn motor_brake_zero_in_emergency(n in 1usize..6, notch in 0..=8u8) {
        let mut train = motor_train(n, 1.0);
        set_speed(&mut train, 20.0);
        train.handles_mut().brake.actual = notch as f64;
        train.handles_mut().emergency.actual = true;
        train.update_brakes(0.1, &mut RecordingAudio::new());
        for car in train.cars() {
            prop_assert_eq!(car.deceleration_due_to_motor(), 0.0);
        }
    }
}

#[test]
fn handle_set_round_trips_through_train() {
    let handles = HandleSet::new(Handle::notched(8)).with_loco_brake(Handle::loco_notched(4));
    let train = build(vec![airbrake_core::car::Car::trailer(electric_brake())], handles.clone(), LocoBrakeMode::Blocking);
    assert_eq!(train.handles(), &handles);
    assert_eq!(train.loco_brake_mode(), LocoBrakeMode::Blocking);
}
