//! Deterministic roll-settlement core
//!
//! Everything that decides what a roll shows lives here:
//! - Fixed timestep only
//! - Seeded RNG only, owned by the session
//! - Stable iteration order (dice in spawn order)
//! - No rendering or platform dependencies

pub mod body;
pub mod compound;
pub mod die_type;
pub mod resolve;
pub mod rest;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod world;

pub use body::{BodyDesc, BodyState};
pub use compound::{CompoundGroup, CompoundMember, CompoundState, CompoundTracker, combine_percentile};
pub use die_type::{DieType, FaceNormal, Shape};
pub use resolve::{FaceResolver, Resolution};
pub use rest::RestDetector;
pub use spawn::{SpawnPlan, ThrowVelocity, plan_spawn};
pub use state::{
    CompoundGroupId, DiceSession, Die, DieId, DieSnapshot, ResultObserver, ResultSource,
    RollGroupId, RollResult,
};
pub use tick::{RollRequest, Selection, advance};
pub use world::{BodyHandle, World};
