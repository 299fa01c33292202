//! Physics world: gravity, tray colliders and the live dice bodies
//!
//! Rigid body dynamics come from rapier3d. This module owns the pipeline,
//! builds the tray, maps stable [`BodyHandle`]s onto engine handles and
//! drives the engine on a fixed substep with an accumulator, capped at a few
//! substeps per frame so a stalled frame cannot explode the simulation.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use glam::{Quat, Vec3};
use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Real,
    RigidBodyHandle, RigidBodySet, Vector,
};
use serde::{Deserialize, Serialize};

use super::body::{BodyDesc, BodyState, from_vector, to_rotation, to_vector};
use crate::settings::{PhysicsTuning, TrayDims};

/// Thickness of the floor slab below y = 0
const FLOOR_THICKNESS: f32 = 1.0;

/// Stable handle to a body in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u32);

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// Last position known to be finite (restored if the body blows up)
    last_good_position: Vec3,
}

/// The rigid body simulation
pub struct World {
    gravity: Vector<Real>,
    tuning: PhysicsTuning,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    tray: Vec<ColliderHandle>,
    /// Live bodies, in handle (spawn) order
    entries: BTreeMap<BodyHandle, BodyEntry>,
    next_handle: u32,
    accumulator: f32,
}

impl World {
    /// Create a world with the tray already in place
    pub fn new(tuning: &PhysicsTuning, tray: &TrayDims) -> Self {
        let mut integration_parameters = IntegrationParameters {
            dt: tuning.fixed_dt,
            ..IntegrationParameters::default()
        };
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(tuning.solver_iterations as usize).unwrap_or(NonZeroUsize::MIN);

        let mut world = Self {
            gravity: Vector::new(0.0, -tuning.gravity, 0.0),
            tuning: tuning.clone(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            tray: Vec::new(),
            entries: BTreeMap::new(),
            next_handle: 1,
            accumulator: 0.0,
        };
        world.build_tray(tray);
        world
    }

    /// Floor, four walls and a lip along the top of each wall
    fn build_tray(&mut self, tray: &TrayDims) {
        let half_w = tray.half_width();
        let half_d = tray.half_depth();
        let t = tray.wall_thickness;
        let h = tray.wall_height;

        let floor = Vec3::new(tray.width + t * 2.0, FLOOR_THICKNESS, tray.depth + t * 2.0);
        self.add_fixed_box(Vec3::new(0.0, -FLOOR_THICKNESS / 2.0, 0.0), floor);

        // Back and front walls span the full width plus the corners
        let long = tray.width + t * 2.0;
        for z in [-half_d - t / 2.0, half_d + t / 2.0] {
            self.add_fixed_box(Vec3::new(0.0, h / 2.0, z), Vec3::new(long, h, t));
        }
        // Side walls (rotated a quarter turn, so depth runs along Z)
        let long = tray.depth + t * 2.0;
        for x in [-half_w - t / 2.0, half_w + t / 2.0] {
            self.add_fixed_box(Vec3::new(x, h / 2.0, 0.0), Vec3::new(t, h, long));
        }

        let lip_y = h - tray.lip_height / 2.0;
        let lip_w = tray.width + t * 1.5;
        for z in [-half_d - t / 2.0, half_d + t / 2.0] {
            self.add_fixed_box(
                Vec3::new(0.0, lip_y, z),
                Vec3::new(lip_w, tray.lip_height, tray.lip_thickness),
            );
        }
        let lip_d = tray.depth + t * 1.5;
        for x in [-half_w - t / 2.0, half_w + t / 2.0] {
            self.add_fixed_box(
                Vec3::new(x, lip_y, 0.0),
                Vec3::new(tray.lip_thickness, tray.lip_height, lip_d),
            );
        }
        log::debug!("Tray built with {} fixed colliders", self.tray.len());
    }

    fn add_fixed_box(&mut self, center: Vec3, size: Vec3) {
        let half = size / 2.0;
        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .translation(to_vector(center))
            .friction(self.tuning.friction)
            .restitution(self.tuning.restitution)
            .build();
        self.tray.push(self.collider_set.insert(collider));
    }

    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    /// Number of fixed colliders making up the tray
    pub fn tray_collider_count(&self) -> usize {
        self.tray.len()
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let body = self.rigid_body_set.insert(desc.rigid_body());
        let collider = desc
            .collider()
            .friction(self.tuning.friction)
            .restitution(self.tuning.restitution)
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        self.entries.insert(
            handle,
            BodyEntry {
                body,
                collider,
                last_good_position: desc.position,
            },
        );
        handle
    }

    /// Remove a body and its collider. Returns false for unknown handles.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(entry) = self.entries.remove(&handle) else {
            return false;
        };
        self.rigid_body_set.remove(
            entry.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        true
    }

    /// Remove every dynamic body, returning how many there were
    pub fn clear_bodies(&mut self) -> usize {
        let handles: Vec<BodyHandle> = self.entries.keys().copied().collect();
        handles
            .into_iter()
            .filter(|&handle| self.remove_body(handle))
            .count()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        let entry = self.entries.get(&handle)?;
        self.rigid_body_set.get(entry.body).map(BodyState::read)
    }

    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Overwrite a body's velocities
    pub fn set_velocity(&mut self, handle: BodyHandle, linear: Vec3, angular: Vec3) -> bool {
        let Some(body) = self
            .entries
            .get(&handle)
            .and_then(|e| self.rigid_body_set.get_mut(e.body))
        else {
            return false;
        };
        body.set_linvel(to_vector(linear), true);
        body.set_angvel(to_vector(angular), true);
        true
    }

    /// Teleport a body to a new pose
    pub fn place(&mut self, handle: BodyHandle, position: Vec3, orientation: Quat) -> bool {
        let Some(entry) = self.entries.get_mut(&handle) else {
            return false;
        };
        let Some(body) = self.rigid_body_set.get_mut(entry.body) else {
            return false;
        };
        body.set_translation(to_vector(position), true);
        body.set_rotation(to_rotation(orientation), true);
        entry.last_good_position = position;
        true
    }

    /// Stop a body dead and switch it to the given damping
    pub fn freeze(&mut self, handle: BodyHandle, linear_damping: f32, angular_damping: f32) -> bool {
        if !self.set_velocity(handle, Vec3::ZERO, Vec3::ZERO) {
            return false;
        }
        let Some(body) = self
            .entries
            .get(&handle)
            .and_then(|e| self.rigid_body_set.get_mut(e.body))
        else {
            return false;
        };
        body.set_linear_damping(linear_damping.max(0.0));
        body.set_angular_damping(angular_damping.max(0.0));
        true
    }

    /// True when the engine reported touching contact between two bodies in
    /// the latest step
    pub fn in_contact(&self, a: BodyHandle, b: BodyHandle) -> bool {
        let (Some(a), Some(b)) = (self.entries.get(&a), self.entries.get(&b)) else {
            return false;
        };
        self.narrow_phase
            .contact_pair(a.collider, b.collider)
            .is_some_and(|pair| pair.has_any_active_contact)
    }

    /// Advance by one frame of wall-clock time.
    ///
    /// Frame time is clamped to `max_frame_dt`, then consumed in fixed
    /// substeps (at most `max_substeps`). Returns the substeps taken.
    pub fn step(&mut self, frame_dt: f32) -> u32 {
        let fixed = self.tuning.fixed_dt;
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.tuning.max_frame_dt)
        } else {
            0.0
        };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= fixed && substeps < self.tuning.max_substeps {
            self.step_fixed(fixed);
            self.accumulator -= fixed;
            substeps += 1;
        }
        // Drop whatever the substep cap could not absorb
        if self.accumulator >= fixed {
            self.accumulator %= fixed;
        }
        substeps
    }

    /// One fixed engine step
    pub fn step_fixed(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.sanitize();
    }

    /// Reset bodies whose state went non-finite to rest at their last good
    /// position. Returns how many were reset.
    fn sanitize(&mut self) -> usize {
        let mut reset = 0;
        for (handle, entry) in self.entries.iter_mut() {
            let Some(body) = self.rigid_body_set.get_mut(entry.body) else {
                continue;
            };
            let state = BodyState::read(body);
            if state.is_finite() {
                entry.last_good_position = state.position;
                continue;
            }
            body.set_translation(to_vector(entry.last_good_position), true);
            body.set_rotation(UnitQuaternion::identity(), true);
            body.set_linvel(Vector::zeros(), true);
            body.set_angvel(Vector::zeros(), true);
            log::warn!("Body {:?} went non-finite, reset to rest", handle);
            reset += 1;
        }
        reset
    }
}
