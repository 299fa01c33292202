//! Spawn controller: drops new dice into the tray
//!
//! Dice appear above the front third of the tray in one of three lateral
//! lanes and are thrown toward the back wall, either with a randomized fan-out
//! or with the velocity of the user's swipe.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::BodyDesc;
use super::compound::CompoundGroup;
use super::die_type::DieType;
use super::state::{CompoundGroupId, DiceSession, Die, DieId, RollGroupId};
use crate::consts::{BASE_THROW_STRENGTH, SPAWN_HEIGHT_ABOVE_WALLS, SPIN_BAND};
use crate::settings::TrayDims;

/// Mass of every die
const DIE_MASS: f32 = 1.0;

/// Throw velocity from a swipe gesture, already clamped by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowVelocity {
    /// Sideways speed (+X is right)
    pub lateral: f32,
    /// Speed along Z; negative throws toward the back wall
    pub forward: f32,
}

/// Initial placement and motion of a new die
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    /// 0 = left, 1 = centre, 2 = right
    pub lane: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Pick lane, position and velocities for one die
pub fn plan_spawn<R: Rng + ?Sized>(
    rng: &mut R,
    tray: &TrayDims,
    throw: Option<ThrowVelocity>,
) -> SpawnPlan {
    let lane = rng.random_range(0..3usize);
    let lane_offset = (lane as f32 - 1.0) * (tray.width / 6.0);
    let x = lane_offset + (rng.random::<f32>() - 0.5) * (tray.width * 0.2);

    let front_third_center = tray.half_depth() - tray.depth / 6.0;
    let z = front_third_center + (rng.random::<f32>() - 0.5) * (tray.depth / 12.0);
    let y = tray.wall_height + SPAWN_HEIGHT_ABOVE_WALLS;

    let mut forward = -BASE_THROW_STRENGTH * (0.8 + rng.random::<f32>() * 0.3);
    let mut sideways = (lane as f32 - 1.0) * 2.0 + (rng.random::<f32>() - 0.5) * 1.5;
    let upward = 1.5 + rng.random::<f32>() * 1.5;

    if let Some(throw) = throw {
        sideways = throw.lateral;
        forward = throw.forward;
    }

    // Spin is never taken from the gesture
    let mut spin = || (rng.random::<f32>() - 0.5) * SPIN_BAND;
    let angular_velocity = Vec3::new(spin(), spin(), spin());

    SpawnPlan {
        lane,
        position: Vec3::new(x, y, z),
        velocity: Vec3::new(sideways, upward, forward),
        angular_velocity,
    }
}

impl DiceSession {
    /// Spawn one logical die. A percentile die becomes a tens/ones pair
    /// sharing a fresh compound group. Returns the ids of the bodies created.
    pub fn spawn_die(
        &mut self,
        die_type: DieType,
        throw: Option<ThrowVelocity>,
        roll_group: RollGroupId,
    ) -> Vec<DieId> {
        if die_type == DieType::Percentile {
            let compound = self.alloc_compound_group();
            let tens = self.spawn_body(DieType::PercentileTens, throw, roll_group, Some(compound));
            let ones = self.spawn_body(DieType::PercentileOnes, throw, roll_group, Some(compound));
            self.compounds
                .insert(CompoundGroup::new(compound, roll_group, tens, ones));
            log::debug!("Percentile die {:?} = {:?} + {:?}", compound, tens, ones);
            return vec![tens, ones];
        }
        vec![self.spawn_body(die_type, throw, roll_group, None)]
    }

    fn spawn_body(
        &mut self,
        die_type: DieType,
        throw: Option<ThrowVelocity>,
        roll_group: RollGroupId,
        compound: Option<CompoundGroupId>,
    ) -> DieId {
        let plan = plan_spawn(&mut self.rng, &self.settings.tray, throw);
        let physics = &self.settings.physics;
        let body = BodyDesc::new(die_type.shape(), DIE_MASS)
            .with_position(plan.position)
            .with_velocity(plan.velocity, plan.angular_velocity)
            .with_damping(physics.live_linear_damping, physics.live_angular_damping);
        let handle = self.world.add_body(body);

        let id = self.alloc_die_id();
        let style = self.settings.style.clone();
        self.dice
            .push(Die::new(id, die_type, handle, roll_group, compound, style));
        log::debug!(
            "Spawned {} {:?} in lane {} at {:?}",
            die_type,
            id,
            plan.lane,
            plan.position
        );
        id
    }
}
