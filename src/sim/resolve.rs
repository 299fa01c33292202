//! Face resolution: which value a settled die shows
//!
//! Dice with a face-normal table report the face whose world-space normal
//! points most nearly straight up. The coin checks a single axis. Everything
//! else draws a uniform value, since its rendered numbering does not map
//! cleanly onto the simulated geometry.

use glam::Quat;
use rand::Rng;

use super::die_type::{DieType, FaceNormal};
use crate::UP;
use crate::settings::ResolutionProfile;

/// How a die type turns into a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Upward face of a face-normal table
    Table(&'static [FaceNormal]),
    /// Local +Y up is 1, down is 2
    CoinAxis,
    /// Uniform draw over `1..=sides`
    Uniform(u32),
}

/// Maps settled dice to face values under one resolution policy
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceResolver {
    profile: ResolutionProfile,
}

impl FaceResolver {
    pub fn new(profile: ResolutionProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> ResolutionProfile {
        self.profile
    }

    pub fn resolution_for(&self, die_type: DieType) -> Resolution {
        let table = die_type.face_table();
        match (die_type, table, self.profile) {
            (DieType::Coin, _, _) => Resolution::CoinAxis,
            (DieType::D4 | DieType::D6, Some(table), _) => Resolution::Table(table),
            (_, Some(table), ResolutionProfile::Geometric) => Resolution::Table(table),
            _ => Resolution::Uniform(die_type.sides()),
        }
    }

    /// Value shown by a die of `die_type` resting at `orientation`
    pub fn resolve<R: Rng + ?Sized>(&self, die_type: DieType, orientation: Quat, rng: &mut R) -> u32 {
        match self.resolution_for(die_type) {
            Resolution::Table(table) => upward_face(table, orientation),
            Resolution::CoinAxis => coin_face(orientation),
            Resolution::Uniform(sides) => rng.random_range(1..=sides.max(1)),
        }
    }
}

/// Value of the table entry whose rotated normal has the largest dot with up.
/// The first maximum wins.
pub fn upward_face(table: &[FaceNormal], orientation: Quat) -> u32 {
    let mut best_value = table.first().map(|f| f.value).unwrap_or(1);
    let mut best_dot = f32::NEG_INFINITY;
    for face in table {
        let dot = (orientation * face.normal).dot(UP);
        if dot > best_dot {
            best_dot = dot;
            best_value = face.value;
        }
    }
    best_value
}

pub fn coin_face(orientation: Quat) -> u32 {
    if (orientation * UP).dot(UP) >= 0.0 { 1 } else { 2 }
}
