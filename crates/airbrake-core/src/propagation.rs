//! Lumped brake-pipe propagation across the whole train.
//!
//! The train line is treated as one shared pneumatic volume rather than a
//! chain of independent pipes. Each frame, every coupling that touches a
//! derailed car bleeds both of its pipes, then the mean pressure of all cars
//! is written back to every car. Wave propagation along the line is not
//! modelled.
//!
//! [`propagate`] works on an immutable view and returns a fresh pressure
//! vector, so the result never depends on the order cars are visited in.

use crate::pressure::leaked;

/// What propagation needs to know about one car's pipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeView {
    pub pressure: f64,
    pub leak_rate: f64,
    pub derailed: bool,
}

/// Result of one propagation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    /// New pipe pressure for each car. Every entry equals `settled`.
    pub pressures: Vec<f64>,
    /// Mean of the post-leak pressures.
    pub settled: f64,
    /// One flag per coupling (between car `i` and `i + 1`): true when the
    /// coupling leaked this pass.
    pub leaking: Vec<bool>,
}

/// Apply derailment leaks pairwise, then average across the train.
pub fn propagate(pipes: &[PipeView], dt: f64) -> Propagation {
    if pipes.is_empty() {
        return Propagation {
            pressures: Vec::new(),
            settled: 0.0,
            leaking: Vec::new(),
        };
    }

    let mut leaked_pressures: Vec<f64> = pipes.iter().map(|p| p.pressure).collect();
    let leaking: Vec<bool> = pipes
        .windows(2)
        .map(|pair| pair[0].derailed || pair[1].derailed)
        .collect();

    for (coupling, &breached) in leaking.iter().enumerate() {
        if breached {
            for car in [coupling, coupling + 1] {
                leaked_pressures[car] = leaked(leaked_pressures[car], pipes[car].leak_rate, dt);
            }
        }
    }

    let settled = leaked_pressures.iter().sum::<f64>() / pipes.len() as f64;
    Propagation {
        pressures: vec![settled; pipes.len()],
        settled,
        leaking,
    }
}
