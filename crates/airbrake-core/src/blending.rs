//! Loco/train brake handle blending for the driver car.
//!
//! [`select_handle`] is a pure function of the blending mode, the two
//! handles and the driver car's brake cylinder. In [`LocoBrakeMode::Combined`]
//! it dispatches on the pair of handle kinds through a fixed table; pairs the
//! table does not name fall through to a pressure-differential comparison.

use crate::handle::{Handle, HandleKind, HandleSet, LocoBrakeMode};
use crate::pressure::BrakeCylinder;

/// Which handle supplies brake demand to a car this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveHandle {
    TrainBrake,
    LocoBrake,
}

impl ActiveHandle {
    /// Borrow the selected handle from `handles`. A loco selection on a set
    /// without a loco handle resolves to the train brake.
    pub fn resolve(self, handles: &HandleSet) -> &Handle {
        match (self, handles.loco_brake.as_ref()) {
            (ActiveHandle::LocoBrake, Some(loco)) => loco,
            _ => &handles.brake,
        }
    }
}

/// Which branch of the Combined table a pair of kinds falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinedRule {
    /// Both handles notched: compare notch positions on a common scale.
    NotchComparison,
    /// Both handles continuous air: the lower pressure ratio wins.
    LowerRatio,
    /// Anything else: compare the cylinder ratio with the notched target.
    PressureDifferential,
}

/// The Combined-mode dispatch table keyed by `(train kind, loco kind)`.
pub fn combined_rule(brake: HandleKind, loco: HandleKind) -> CombinedRule {
    match (brake, loco) {
        (HandleKind::Notched, HandleKind::LocoNotched) => CombinedRule::NotchComparison,
        (HandleKind::ContinuousAir, HandleKind::LocoContinuousAir) => CombinedRule::LowerRatio,
        _ => CombinedRule::PressureDifferential,
    }
}

/// Pick the handle that drives the driver car's brake cylinder.
pub fn select_handle(
    mode: LocoBrakeMode,
    brake: &Handle,
    loco: &Handle,
    cylinder: &BrakeCylinder,
) -> ActiveHandle {
    match mode {
        LocoBrakeMode::Independent => ActiveHandle::LocoBrake,
        LocoBrakeMode::Blocking => {
            if loco.actual != 0.0 {
                ActiveHandle::LocoBrake
            } else {
                ActiveHandle::TrainBrake
            }
        }
        LocoBrakeMode::Combined => match combined_rule(brake.kind(), loco.kind()) {
            CombinedRule::NotchComparison => compare_notches(brake, loco),
            CombinedRule::LowerRatio => {
                if brake.actual < loco.actual {
                    ActiveHandle::TrainBrake
                } else {
                    ActiveHandle::LocoBrake
                }
            }
            CombinedRule::PressureDifferential => pressure_differential(brake, loco, cylinder),
        },
    }
}

/// Higher notch wins. With unequal maxima the handle with fewer notches is
/// rescaled onto the other's notch scale; ties go to the loco handle.
fn compare_notches(brake: &Handle, loco: &Handle) -> ActiveHandle {
    let brake_max = brake.maximum_notch();
    let loco_max = loco.maximum_notch();

    if brake_max == loco_max {
        if loco.actual >= brake.actual {
            ActiveHandle::LocoBrake
        } else {
            ActiveHandle::TrainBrake
        }
    } else if brake_max > loco_max {
        let normalized = loco.actual / loco_max as f64 * brake_max as f64;
        if normalized > brake.actual {
            ActiveHandle::LocoBrake
        } else {
            ActiveHandle::TrainBrake
        }
    } else {
        let normalized = brake.actual / brake_max as f64 * loco_max as f64;
        if normalized > loco.actual {
            ActiveHandle::TrainBrake
        } else {
            ActiveHandle::LocoBrake
        }
    }
}

/// Mixed or unrecognized kinds. The notched side is the train handle when the
/// loco handle is continuous, otherwise the loco handle. The train handle is
/// used while the cylinder ratio is below that handle's target ratio.
fn pressure_differential(brake: &Handle, loco: &Handle, cylinder: &BrakeCylinder) -> ActiveHandle {
    let notched = if loco.kind().is_continuous() { brake } else { loco };
    let service_max = cylinder.service_maximum_pressure;
    let current = cylinder.current_pressure / service_max;
    let target = service_max / notched.maximum_notch() as f64 * notched.actual / service_max;
    if current < target {
        ActiveHandle::TrainBrake
    } else {
        ActiveHandle::LocoBrake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder_at(pressure: f64) -> BrakeCylinder {
        let mut c = BrakeCylinder::new(400.0, 450.0);
        c.current_pressure = pressure;
        c
    }

    fn combined(brake: &Handle, loco: &Handle) -> ActiveHandle {
        select_handle(LocoBrakeMode::Combined, brake, loco, &cylinder_at(0.0))
    }

    // -----------------------------------------------------------------------
    // Independent / Blocking
    // -----------------------------------------------------------------------

    #[test]
    fn independent_always_uses_loco() {
        let brake = Handle::notched(8).with_actual(8.0);
        let loco = Handle::loco_notched(4);
        let chosen = select_handle(LocoBrakeMode::Independent, &brake, &loco, &cylinder_at(0.0));
        assert_eq!(chosen, ActiveHandle::LocoBrake);
    }

    #[test]
    fn blocking_uses_loco_when_applied() {
        let brake = Handle::notched(8).with_actual(8.0);
        let loco = Handle::loco_notched(4).with_actual(1.0);
        let chosen = select_handle(LocoBrakeMode::Blocking, &brake, &loco, &cylinder_at(0.0));
        assert_eq!(chosen, ActiveHandle::LocoBrake);
    }

    #[test]
    fn blocking_falls_back_to_train_brake() {
        let brake = Handle::notched(8).with_actual(2.0);
        let loco = Handle::loco_notched(4);
        let chosen = select_handle(LocoBrakeMode::Blocking, &brake, &loco, &cylinder_at(0.0));
        assert_eq!(chosen, ActiveHandle::TrainBrake);
    }

    // -----------------------------------------------------------------------
    // Combined: both notched
    // -----------------------------------------------------------------------

    #[test]
    fn equal_maximum_higher_notch_wins() {
        let brake = Handle::notched(8).with_actual(5.0);
        let loco = Handle::loco_notched(8).with_actual(3.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::TrainBrake);

        let loco = Handle::loco_notched(8).with_actual(6.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    #[test]
    fn equal_maximum_tie_selects_loco() {
        let brake = Handle::notched(8).with_actual(4.0);
        let loco = Handle::loco_notched(8).with_actual(4.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);

        let brake = Handle::notched(8);
        let loco = Handle::loco_notched(8);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    #[test]
    fn smaller_loco_scale_is_normalized() {
        // 3 of 4 on the loco handle is 6 of 8 on the train handle.
        let brake = Handle::notched(8).with_actual(4.0);
        let loco = Handle::loco_notched(4).with_actual(3.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);

        let brake = Handle::notched(8).with_actual(7.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::TrainBrake);
    }

    #[test]
    fn smaller_loco_scale_tie_selects_train() {
        let brake = Handle::notched(8).with_actual(6.0);
        let loco = Handle::loco_notched(4).with_actual(3.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::TrainBrake);
    }

    #[test]
    fn smaller_train_scale_is_normalized() {
        // 2 of 4 on the train handle is 4 of 8 on the loco handle.
        let brake = Handle::notched(4).with_actual(2.0);
        let loco = Handle::loco_notched(8).with_actual(3.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::TrainBrake);

        let loco = Handle::loco_notched(8).with_actual(5.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    #[test]
    fn smaller_train_scale_tie_selects_loco() {
        let brake = Handle::notched(4).with_actual(2.0);
        let loco = Handle::loco_notched(8).with_actual(4.0);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    // -----------------------------------------------------------------------
    // Combined: both continuous
    // -----------------------------------------------------------------------

    #[test]
    fn continuous_pair_lower_ratio_wins() {
        let brake = Handle::continuous_air().with_actual(0.3);
        let loco = Handle::loco_continuous_air().with_actual(0.8);
        assert_eq!(combined(&brake, &loco), ActiveHandle::TrainBrake);

        let loco = Handle::loco_continuous_air().with_actual(0.1);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    #[test]
    fn continuous_pair_tie_selects_loco() {
        let brake = Handle::continuous_air().with_actual(0.5);
        let loco = Handle::loco_continuous_air().with_actual(0.5);
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    // -----------------------------------------------------------------------
    // Combined: mixed kinds (documented behaviour, kept as-is)
    // -----------------------------------------------------------------------

    #[test]
    fn mixed_kinds_documented_notched_train_continuous_loco() {
        // Target ratio comes from the notched train handle: 4 of 8 = 0.5.
        let brake = Handle::notched(8).with_actual(4.0);
        let loco = Handle::loco_continuous_air().with_actual(0.2);

        let below = select_handle(LocoBrakeMode::Combined, &brake, &loco, &cylinder_at(100.0));
        assert_eq!(below, ActiveHandle::TrainBrake);

        let at = select_handle(LocoBrakeMode::Combined, &brake, &loco, &cylinder_at(200.0));
        assert_eq!(at, ActiveHandle::LocoBrake);
    }

    #[test]
    fn mixed_kinds_documented_continuous_train_notched_loco() {
        // Target ratio comes from the notched loco handle: 1 of 4 = 0.25.
        let brake = Handle::continuous_air().with_actual(0.0);
        let loco = Handle::loco_notched(4).with_actual(1.0);

        let below = select_handle(LocoBrakeMode::Combined, &brake, &loco, &cylinder_at(50.0));
        assert_eq!(below, ActiveHandle::TrainBrake);

        let above = select_handle(LocoBrakeMode::Combined, &brake, &loco, &cylinder_at(300.0));
        assert_eq!(above, ActiveHandle::LocoBrake);
    }

    #[test]
    fn unrecognized_pair_falls_through_to_pressure_differential() {
        // Two train-style notched handles are not in the table.
        let brake = Handle::notched(8).with_actual(8.0);
        let loco = Handle::notched(8).with_actual(0.0);
        assert_eq!(
            combined_rule(brake.kind(), loco.kind()),
            CombinedRule::PressureDifferential
        );
        // Target comes from the loco side (0 of 8), so the loco handle wins
        // even though the train handle is at full service.
        assert_eq!(combined(&brake, &loco), ActiveHandle::LocoBrake);
    }

    #[test]
    fn dispatch_table_names_exactly_two_pairs() {
        use HandleKind::*;
        let kinds = [Notched, ContinuousAir, LocoNotched, LocoContinuousAir];
        let mut notch = 0;
        let mut ratio = 0;
        for a in kinds {
            for b in kinds {
                match combined_rule(a, b) {
                    CombinedRule::NotchComparison => notch += 1,
                    CombinedRule::LowerRatio => ratio += 1,
                    CombinedRule::PressureDifferential => {}
                }
            }
        }
        assert_eq!((notch, ratio), (1, 1));
    }

    #[test]
    fn selection_is_deterministic() {
        let brake = Handle::notched(6).with_actual(3.0);
        let loco = Handle::loco_notched(9).with_actual(4.0);
        let first = combined(&brake, &loco);
        for _ in 0..100 {
            assert_eq!(combined(&brake, &loco), first);
        }
    }

    #[test]
    fn resolve_without_loco_returns_train_brake() {
        let set = HandleSet::new(Handle::notched(8).with_actual(3.0));
        assert_eq!(ActiveHandle::LocoBrake.resolve(&set).actual, 3.0);
    }
}
