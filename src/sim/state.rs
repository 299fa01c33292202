//! Session state and core roll types
//!
//! A [`DiceSession`] owns everything a dice tray needs: the physics world,
//! the live dice, open compound groups, the RNG and the outgoing result queue.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::compound::CompoundTracker;
use super::die_type::DieType;
use super::resolve::FaceResolver;
use super::rest::RestDetector;
use super::world::{BodyHandle, World};
use crate::settings::{DiceStyle, Settings};

/// Identifier of one spawned die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DieId(pub u32);

/// Ties together the dice thrown by one roll action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RollGroupId(pub u32);

/// Ties together the sub-dice of one compound die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompoundGroupId(pub u32);

impl fmt::Display for RollGroupId {
    /// `r` followed by the id in base 36
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut n = self.0;
        let mut buf = Vec::new();
        loop {
            buf.push(DIGITS[(n % 36) as usize]);
            n /= 36;
            if n == 0 {
                break;
            }
        }
        buf.reverse();
        write!(f, "r{}", String::from_utf8_lossy(&buf))
    }
}

/// One physical die in the tray
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Die {
    pub id: DieId,
    pub die_type: DieType,
    pub body: BodyHandle,
    pub settled: bool,
    /// Time (ms) the die first dropped under the rest thresholds, reset on motion
    pub settled_since: Option<f64>,
    pub result_value: Option<u32>,
    pub roll_group: RollGroupId,
    pub compound_group: Option<CompoundGroupId>,
    pub compound_reported: bool,
    /// Appearance at spawn time
    pub style: DiceStyle,
}

impl Die {
    pub fn new(
        id: DieId,
        die_type: DieType,
        body: BodyHandle,
        roll_group: RollGroupId,
        compound_group: Option<CompoundGroupId>,
        style: DiceStyle,
    ) -> Self {
        Self {
            id,
            die_type,
            body,
            settled: false,
            settled_since: None,
            result_value: None,
            roll_group,
            compound_group,
            compound_reported: false,
            style,
        }
    }

    /// Store the face value. Only the first call has any effect.
    pub fn record_result(&mut self, value: u32) -> bool {
        if self.result_value.is_some() {
            return false;
        }
        self.result_value = Some(value);
        true
    }
}

/// What produced a published result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    Single(DieId),
    Compound(CompoundGroupId),
}

/// A published roll outcome: one per plain die, one per compound die
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub roll_group: RollGroupId,
    pub die_type: DieType,
    pub value: u32,
    pub display_color: String,
    pub profile_label: Option<String>,
    pub source: ResultSource,
}

/// Receives results as they are published
pub trait ResultObserver {
    fn on_result(&mut self, result: &RollResult);
}

impl<T: ResultObserver> ResultObserver for Rc<RefCell<T>> {
    fn on_result(&mut self, result: &RollResult) {
        self.borrow_mut().on_result(result);
    }
}

/// Read-only transform of one die, for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DieSnapshot {
    pub id: DieId,
    pub die_type: DieType,
    pub position: Vec3,
    pub orientation: Quat,
    pub settled: bool,
    pub value: Option<u32>,
}

/// The dice tray: physics, dice, compound bookkeeping and the result channel
pub struct DiceSession {
    pub(crate) settings: Settings,
    pub(crate) world: World,
    /// Live dice, in spawn order
    pub(crate) dice: Vec<Die>,
    pub(crate) compounds: CompoundTracker,
    pub(crate) rest: RestDetector,
    pub(crate) resolver: FaceResolver,
    pub(crate) rng: Pcg32,
    /// Simulated time (ms) since the session started
    pub(crate) clock_ms: f64,
    pub(crate) events: Vec<RollResult>,
    observers: Vec<Box<dyn ResultObserver>>,
    seed: u64,
    next_die_id: u32,
    next_roll_group: u32,
    next_compound_group: u32,
}

impl DiceSession {
    pub fn new(settings: Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        log::info!(
            "Dice session starting with seed {} ({} resolution)",
            seed,
            settings.resolution.as_str()
        );
        Self {
            world: World::new(&settings.physics, &settings.tray),
            rest: RestDetector::new(&settings.settle),
            resolver: FaceResolver::new(settings.resolution),
            rng: Pcg32::seed_from_u64(seed),
            settings,
            dice: Vec::new(),
            compounds: CompoundTracker::default(),
            clock_ms: 0.0,
            events: Vec::new(),
            observers: Vec::new(),
            seed,
            next_die_id: 1,
            next_roll_group: 1,
            next_compound_group: 1,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn die(&self, id: DieId) -> Option<&Die> {
        self.dice.iter().find(|d| d.id == id)
    }

    pub fn compounds(&self) -> &CompoundTracker {
        &self.compounds
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Dice that have not yet produced a value
    pub fn rolling_count(&self) -> usize {
        self.dice.iter().filter(|d| !d.settled).count()
    }

    /// Style used for dice spawned from now on
    pub fn apply_style(&mut self, style: DiceStyle) {
        self.settings.style = style;
    }

    /// Register an observer notified of every published result
    pub fn subscribe(&mut self, observer: Box<dyn ResultObserver>) {
        self.observers.push(observer);
    }

    /// Take every result published since the last drain
    pub fn drain_events(&mut self) -> Vec<RollResult> {
        std::mem::take(&mut self.events)
    }

    /// Transforms of all live dice
    pub fn snapshots(&self) -> Vec<DieSnapshot> {
        self.dice
            .iter()
            .filter_map(|die| {
                let body = self.world.body(die.body)?;
                Some(DieSnapshot {
                    id: die.id,
                    die_type: die.die_type,
                    position: body.position,
                    orientation: body.orientation,
                    settled: die.settled,
                    value: die.result_value,
                })
            })
            .collect()
    }

    /// Remove every die and its body. Pending settles and open compound
    /// groups are dropped without publishing anything.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.dice.len();
        let groups = self.compounds.len();
        for die in self.dice.drain(..) {
            self.world.remove_body(die.body);
        }
        // Anything the dice list did not know about goes too
        self.world.clear_bodies();
        self.compounds.clear();
        log::info!("Cleared {} dice ({} compound groups)", removed, groups);
        removed
    }

    pub(crate) fn alloc_die_id(&mut self) -> DieId {
        let id = DieId(self.next_die_id);
        self.next_die_id += 1;
        id
    }

    pub(crate) fn alloc_roll_group(&mut self) -> RollGroupId {
        let id = RollGroupId(self.next_roll_group);
        self.next_roll_group += 1;
        id
    }

    pub(crate) fn alloc_compound_group(&mut self) -> CompoundGroupId {
        let id = CompoundGroupId(self.next_compound_group);
        self.next_compound_group += 1;
        id
    }

    /// Queue a result and notify observers
    pub(crate) fn publish(&mut self, result: RollResult) {
        log::info!(
            "Roll {}: {} = {}{}",
            result.roll_group,
            result.die_type,
            result.value,
            result
                .profile_label
                .as_deref()
                .map(|p| format!(" ({})", p))
                .unwrap_or_default()
        );
        for observer in &mut self.observers {
            observer.on_result(&result);
        }
        self.events.push(result);
    }
}
