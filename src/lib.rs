//! Dice Tray - physically simulated dice rolling
//!
//! Core modules:
//! - `sim`: Roll-settlement engine (physics, rest detection, face resolution)
//! - `settings`: Tuning, tray dimensions and dice style profiles
//! - `history`: Bounded roll log grouped by roll action

pub mod history;
pub mod settings;
pub mod sim;

pub use history::RollHistory;
pub use settings::{DiceStyle, Profiles, ResolutionProfile, Settings, SettingsError};
pub use sim::{DiceSession, DieType, RollRequest, RollResult};

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame
    pub const MAX_SUBSTEPS: u32 = 3;
    /// Longest wall-clock span a single frame may integrate (stalled tabs, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

    /// Downward gravity magnitude (units/s²)
    pub const GRAVITY: f32 = 30.0;
    /// Contact friction for every die/die and die/tray pair
    pub const FRICTION: f32 = 0.7;
    /// Contact restitution for every die/die and die/tray pair
    pub const RESTITUTION: f32 = 0.08;

    /// Damping while a die is still tumbling
    pub const LIVE_LINEAR_DAMPING: f32 = 0.25;
    pub const LIVE_ANGULAR_DAMPING: f32 = 0.3;
    /// Damping once a result is recorded (locks the die visually)
    pub const SETTLED_LINEAR_DAMPING: f32 = 0.7;
    pub const SETTLED_ANGULAR_DAMPING: f32 = 0.7;

    /// Rest detection thresholds
    pub const SETTLE_LINEAR_THRESHOLD: f32 = 0.15;
    pub const SETTLE_ANGULAR_THRESHOLD: f32 = 0.4;
    /// Continuous time under both thresholds before a die counts as settled
    pub const SETTLE_DWELL_MS: f64 = 700.0;

    /// Tray dimensions (tray is centred on the origin, +Z is the front edge)
    pub const TRAY_WIDTH: f32 = 10.0;
    pub const TRAY_DEPTH: f32 = 10.0;
    pub const TRAY_HEIGHT: f32 = 2.2;
    pub const WALL_THICKNESS: f32 = 0.6;
    pub const LIP_HEIGHT: f32 = 0.2;
    pub const LIP_THICKNESS: f32 = 0.4;

    /// Dice spawn this far above the wall tops
    pub const SPAWN_HEIGHT_ABOVE_WALLS: f32 = 3.0;
    /// Forward throw strength when no gesture velocity is supplied
    pub const BASE_THROW_STRENGTH: f32 = 7.0;
    /// Per-axis spin band: spin is drawn from ±SPIN_BAND/2
    pub const SPIN_BAND: f32 = 15.0;

    /// Most dice a single roll may request
    pub const MAX_DICE_PER_ROLL: usize = 20;
    /// Entries kept in the roll log
    pub const MAX_HISTORY_ENTRIES: usize = 20;
}

/// World up axis
pub const UP: Vec3 = Vec3::Y;

/// Rotation that carries `from` onto `to` (both need not be unit length)
#[cfg(test)]
pub(crate) fn rotation_between(from: Vec3, to: Vec3) -> glam::Quat {
    glam::Quat::from_rotation_arc(from.normalize(), to.normalize())
}

/// True when every component of `v` is finite
#[inline]
pub fn is_finite_vec(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
