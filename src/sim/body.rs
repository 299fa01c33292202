//! Die bodies: how a die enters the physics world and what comes back out
//!
//! The engine works in nalgebra types; everything outside `sim::world` sees glam.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::{
    ColliderBuilder, Isometry, Point, Real, RigidBody, RigidBodyBuilder, Vector,
};

use super::die_type::Shape;
use crate::is_finite_vec;

/// Cylinders with fewer sides than this are built as convex prisms
const ROUND_CYLINDER_SEGMENTS: u32 = 8;

#[inline]
pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub(crate) fn from_rotation(q: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Everything needed to drop one die into the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn new(shape: Shape, mass: f32) -> Self {
        Self {
            shape,
            mass,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation.normalize();
        self
    }

    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear.max(0.0);
        self.angular_damping = angular.max(0.0);
        self
    }

    pub(crate) fn rigid_body(&self) -> RigidBody {
        let pose = Isometry::from_parts(
            Translation3::from(to_vector(self.position)),
            to_rotation(self.orientation),
        );
        RigidBodyBuilder::dynamic()
            .position(pose)
            .linvel(to_vector(self.linear_velocity))
            .angvel(to_vector(self.angular_velocity))
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .ccd_enabled(true)
            .build()
    }

    /// Collider matching the die's shape, carrying the whole body mass
    pub(crate) fn collider(&self) -> ColliderBuilder {
        collider_for(self.shape).mass(self.mass)
    }
}

fn collider_for(shape: Shape) -> ColliderBuilder {
    match shape {
        Shape::Box { half_extents: h } => ColliderBuilder::cuboid(h.x, h.y, h.z),
        Shape::Sphere { radius } => ColliderBuilder::ball(radius),
        Shape::Cylinder {
            radius,
            height,
            segments,
        } if segments >= ROUND_CYLINDER_SEGMENTS => ColliderBuilder::cylinder(height / 2.0, radius),
        Shape::Cylinder { radius, height, .. } => {
            let points: Vec<Point<Real>> = shape
                .hull_points()
                .into_iter()
                .map(|p| Point::new(p.x, p.y, p.z))
                .collect();
            ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
                log::warn!("Degenerate prism hull, using a round cylinder");
                ColliderBuilder::cylinder(height / 2.0, radius)
            })
        }
    }
}

/// Pose and motion of a body after the latest step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyState {
    pub(crate) fn read(body: &RigidBody) -> Self {
        Self {
            position: from_vector(body.translation()),
            orientation: from_rotation(body.rotation()),
            linear_velocity: from_vector(body.linvel()),
            angular_velocity: from_vector(body.angvel()),
            linear_damping: body.linear_damping(),
            angular_damping: body.angular_damping(),
        }
    }

    #[inline]
    pub fn linear_speed(&self) -> f32 {
        self.linear_velocity.length()
    }

    #[inline]
    pub fn angular_speed(&self) -> f32 {
        self.angular_velocity.length()
    }

    pub fn is_finite(&self) -> bool {
        is_finite_vec(self.position)
            && is_finite_vec(self.linear_velocity)
            && is_finite_vec(self.angular_velocity)
            && self.orientation.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::DieType;

    #[test]
    fn test_rotation_conversion_matches_glam() {
        let q = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -1.1, 2.0);
        let back = from_rotation(&to_rotation(q));
        assert!(q.dot(back).abs() > 0.99999);

        let v = Vec3::new(0.2, -0.7, 0.4);
        let rotated = from_vector(&(to_rotation(q) * to_vector(v)));
        assert!((rotated - q * v).length() < 1e-5);
    }

    #[test]
    fn test_desc_becomes_dynamic_body() {
        let desc = BodyDesc::new(DieType::D6.shape(), 1.0)
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_velocity(Vec3::X, Vec3::Y * 4.0)
            .with_damping(0.25, 0.3);
        let body = desc.rigid_body();
        assert!(body.is_dynamic());
        let state = BodyState::read(&body);
        assert_eq!(state.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.linear_velocity, Vec3::X);
        assert_eq!(state.angular_speed(), 4.0);
        assert_eq!(state.linear_damping, 0.25);
        assert_eq!(state.angular_damping, 0.3);
        assert!(state.is_finite());
    }

    #[test]
    fn test_negative_damping_is_clamped() {
        let desc = BodyDesc::new(DieType::D4.shape(), 1.0).with_damping(-1.0, -0.5);
        assert_eq!(desc.linear_damping, 0.0);
        assert_eq!(desc.angular_damping, 0.0);
    }

    #[test]
    fn test_every_die_shape_builds_a_collider() {
        for die in DieType::SELECTABLE
            .into_iter()
            .chain([DieType::PercentileTens, DieType::PercentileOnes])
        {
            let collider = BodyDesc::new(die.shape(), 1.0).collider().build();
            assert!((collider.mass() - 1.0).abs() < 1e-4, "{die}");
        }
    }
}
