//! Per-frame roll settlement
//!
//! One call to [`advance`] steps physics, watches every live die for rest,
//! reads the face of each die that just settled, folds percentile halves into
//! their combined value and publishes the results.

use serde::{Deserialize, Serialize};

use super::die_type::DieType;
use super::spawn::ThrowVelocity;
use super::state::{DiceSession, ResultSource, RollGroupId, RollResult};
use crate::consts::MAX_DICE_PER_ROLL;

/// Dice queued for the next roll, per selectable type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    counts: [u32; DieType::SELECTABLE.len()],
}

impl Selection {
    fn slot(die_type: DieType) -> Option<usize> {
        DieType::SELECTABLE.iter().position(|&t| t == die_type)
    }

    /// Add one die of `die_type`. Returns false when the roll is already full
    /// or the type cannot be selected directly.
    pub fn increment(&mut self, die_type: DieType) -> bool {
        if self.total() as usize >= MAX_DICE_PER_ROLL {
            return false;
        }
        match Self::slot(die_type) {
            Some(slot) => {
                self.counts[slot] += 1;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.counts = Default::default();
    }

    pub fn count(&self, die_type: DieType) -> u32 {
        Self::slot(die_type).map_or(0, |slot| self.counts[slot])
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Button text: `d6` when none are queued, `d6 × 2` otherwise
    pub fn label(&self, die_type: DieType) -> String {
        match self.count(die_type) {
            0 => die_type.as_str().to_string(),
            n => format!("{} × {}", die_type.as_str(), n),
        }
    }

    /// Queued types and counts in display order
    pub fn entries(&self) -> impl Iterator<Item = (DieType, u32)> + '_ {
        DieType::SELECTABLE
            .iter()
            .zip(self.counts.iter())
            .filter(|&(_, &n)| n > 0)
            .map(|(&t, &n)| (t, n))
    }
}

/// One roll action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollRequest {
    pub selection: Selection,
    /// Swipe velocity shared by every die in the roll
    pub velocity: Option<ThrowVelocity>,
}

impl RollRequest {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            velocity: None,
        }
    }

    pub fn with_velocity(mut self, velocity: ThrowVelocity) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

impl DiceSession {
    /// Spawn every die in the request under a fresh roll group.
    /// Returns `None` for an empty selection.
    pub fn request_roll(&mut self, request: &RollRequest) -> Option<RollGroupId> {
        if request.selection.is_empty() {
            return None;
        }
        let group = self.alloc_roll_group();
        log::info!(
            "Roll {} requested: {} dice{}",
            group,
            request.selection.total(),
            if request.velocity.is_some() { " (swiped)" } else { "" }
        );
        for (die_type, count) in request.selection.entries() {
            for _ in 0..count {
                self.spawn_die(die_type, request.velocity, group);
            }
        }
        Some(group)
    }

    /// Advance the tray by one rendered frame. Returns the number of results
    /// published.
    pub fn advance(&mut self, frame_dt: f32) -> usize {
        advance(self, frame_dt)
    }
}

/// Advance `session` by one frame of `frame_dt` seconds
pub fn advance(session: &mut DiceSession, frame_dt: f32) -> usize {
    let frame_dt = if frame_dt.is_finite() {
        frame_dt.clamp(0.0, session.settings.physics.max_frame_dt)
    } else {
        0.0
    };
    session.clock_ms += frame_dt as f64 * 1000.0;
    session.world.step(frame_dt);

    let now = session.clock_ms;
    let mut newly_settled = Vec::new();
    for (index, die) in session.dice.iter_mut().enumerate() {
        if die.settled {
            continue;
        }
        let Some(body) = session.world.body(die.body) else {
            continue;
        };
        if session
            .rest
            .observe(die, body.linear_speed(), body.angular_speed(), now)
        {
            newly_settled.push(index);
        }
    }

    let mut published = 0;
    for index in newly_settled {
        if settle_die(session, index) {
            published += 1;
        }
    }
    published
}

/// Freeze the die at `index`, read its face and publish whatever that
/// completes. Returns true if a result went out.
fn settle_die(session: &mut DiceSession, index: usize) -> bool {
    let (handle, die_type) = {
        let die = &session.dice[index];
        (die.body, die.die_type)
    };
    let Some(body) = session.world.body(handle) else {
        return false;
    };
    let physics = &session.settings.physics;
    session.world.freeze(
        handle,
        physics.settled_linear_damping,
        physics.settled_angular_damping,
    );
    let orientation = body.orientation;

    let face = session
        .resolver
        .resolve(die_type, orientation, &mut session.rng);
    let die = &mut session.dice[index];
    if !die.record_result(face) {
        return false;
    }
    log::debug!("{} {:?} settled on {}", die_type, die.id, face);

    let result = match die.compound_group {
        None => RollResult {
            roll_group: die.roll_group,
            die_type,
            value: face,
            display_color: die.style.dice_color.clone(),
            profile_label: die.style.profile_label.clone(),
            source: ResultSource::Single(die.id),
        },
        Some(compound) => {
            let id = die.id;
            let Some(value) = session.compounds.member_settled(compound, id, face) else {
                return false;
            };
            let Some(group) = session.compounds.get(compound) else {
                return false;
            };
            let (tens, ones, roll_group) = (group.tens, group.ones, group.roll_group);
            let mut style = None;
            for member in session.dice.iter_mut() {
                if member.id == tens || member.id == ones {
                    member.compound_reported = true;
                    if member.id == tens {
                        style = Some(member.style.clone());
                    }
                }
            }
            let style = style.unwrap_or_else(|| session.settings.style.clone());
            log::info!("Percentile {:?} combined to {}", compound, value);
            RollResult {
                roll_group,
                die_type: DieType::Percentile,
                value,
                display_color: style.dice_color,
                profile_label: style.profile_label,
                source: ResultSource::Compound(compound),
            }
        }
    };
    session.publish(result);
    true
}
