//! Rest detection
//!
//! A die is settled once both its linear and angular speed have stayed under
//! threshold for a continuous dwell period. Any tick above threshold restarts
//! the dwell.

use super::state::Die;
use crate::settings::SettleTuning;

#[derive(Debug, Clone)]
pub struct RestDetector {
    linear_threshold: f32,
    angular_threshold: f32,
    dwell_ms: f64,
}

impl Default for RestDetector {
    fn default() -> Self {
        Self::new(&SettleTuning::default())
    }
}

impl RestDetector {
    pub fn new(tuning: &SettleTuning) -> Self {
        Self {
            linear_threshold: tuning.linear_threshold,
            angular_threshold: tuning.angular_threshold,
            dwell_ms: tuning.dwell_ms,
        }
    }

    #[inline]
    pub fn is_quiet(&self, linear_speed: f32, angular_speed: f32) -> bool {
        linear_speed < self.linear_threshold && angular_speed < self.angular_threshold
    }

    /// Feed one tick of motion for `die` at time `now_ms`.
    ///
    /// Returns true on the single tick the die becomes settled; already
    /// settled dice are ignored.
    pub fn observe(&self, die: &mut Die, linear_speed: f32, angular_speed: f32, now_ms: f64) -> bool {
        if die.settled {
            return false;
        }
        if !self.is_quiet(linear_speed, angular_speed) {
            die.settled_since = None;
            return false;
        }
        let since = *die.settled_since.get_or_insert(now_ms);
        if now_ms - since >= self.dwell_ms {
            die.settled = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DiceStyle;
    use crate::sim::DieType;
    use crate::sim::state::{DieId, RollGroupId};
    use crate::sim::world::World;
    use crate::sim::body::BodyDesc;
    use crate::settings::{PhysicsTuning, TrayDims};

    fn die() -> Die {
        let mut world = World::new(&PhysicsTuning::default(), &TrayDims::default());
        let body = world.add_body(BodyDesc::new(DieType::D6.shape(), 1.0));
        Die::new(DieId(1), DieType::D6, body, RollGroupId(1), None, DiceStyle::default())
    }

    /// Tick at 60 Hz from `start` for `ms` milliseconds with the given speeds.
    /// Returns the time of the settle transition, if any.
    fn run(detector: &RestDetector, die: &mut Die, start: f64, ms: f64, lin: f32, ang: f32) -> Option<f64> {
        let frame = 1000.0 / 60.0;
        let mut t = start;
        let mut settled_at = None;
        while t < start + ms {
            if detector.observe(die, lin, ang, t) {
                assert!(settled_at.is_none(), "settled twice");
                settled_at = Some(t);
            }
            t += frame;
        }
        settled_at
    }

    #[test]
    fn test_never_settles_while_moving() {
        let detector = RestDetector::default();
        let mut d = die();
        assert_eq!(run(&detector, &mut d, 0.0, 5000.0, 0.15, 0.0), None);
        assert_eq!(run(&detector, &mut d, 5000.0, 5000.0, 0.0, 0.4), None);
        assert!(!d.settled);
        assert!(d.settled_since.is_none());
    }

    #[test]
    fn test_settles_after_dwell() {
        let detector = RestDetector::default();
        let mut d = die();
        let at = run(&detector, &mut d, 1000.0, 2000.0, 0.1, 0.3).expect("settles");
        assert!(at >= 1000.0 + 700.0);
        assert!(at < 1000.0 + 700.0 + 1000.0 / 60.0 + 1e-6);
        assert!(d.settled);
    }

    #[test]
    fn test_exact_dwell_boundary() {
        let detector = RestDetector::default();
        let mut d = die();
        assert!(!detector.observe(&mut d, 0.0, 0.0, 0.0));
        assert!(!detector.observe(&mut d, 0.0, 0.0, 699.9));
        assert!(detector.observe(&mut d, 0.0, 0.0, 700.0));
    }

    #[test]
    fn test_bump_restarts_dwell() {
        let detector = RestDetector::default();
        let mut d = die();
        // 500 ms quiet, one bounce, then quiet again
        assert_eq!(run(&detector, &mut d, 0.0, 500.0, 0.05, 0.05), None);
        assert!(!detector.observe(&mut d, 1.0, 0.05, 500.0));
        assert!(d.settled_since.is_none());

        let second_dip = 520.0;
        let at = run(&detector, &mut d, second_dip, 1500.0, 0.05, 0.05).expect("settles");
        assert!(at >= second_dip + 700.0, "resumed from the first dip: {at}");
    }

    #[test]
    fn test_settled_die_never_retriggers() {
        let detector = RestDetector::default();
        let mut d = die();
        run(&detector, &mut d, 0.0, 1000.0, 0.0, 0.0).expect("settles");
        assert_eq!(run(&detector, &mut d, 1000.0, 2000.0, 0.0, 0.0), None);
        // Motion after settling does not reopen the die either
        assert!(!detector.observe(&mut d, 5.0, 5.0, 3000.0));
        assert!(d.settled);
    }
}
