//! Compound dice: one logical percentile die built from a tens die and a ones die
//!
//! Each group is a small state machine fed by its members' settle events, so
//! the combined value is published exactly once no matter how the two
//! settles are spread across frames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::{CompoundGroupId, DieId, RollGroupId};

/// Which half of a percentile pair a die is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundMember {
    Tens,
    Ones,
}

impl CompoundMember {
    fn other(self) -> Self {
        match self {
            CompoundMember::Tens => CompoundMember::Ones,
            CompoundMember::Ones => CompoundMember::Tens,
        }
    }
}

/// Progress of a compound group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundState {
    WaitingBoth,
    /// One member has settled with `face`
    WaitingOne { settled: CompoundMember, face: u32 },
    Combined { value: u32 },
}

/// A tens/ones pair rolled as one percentile die
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundGroup {
    pub id: CompoundGroupId,
    pub roll_group: RollGroupId,
    pub tens: DieId,
    pub ones: DieId,
    pub state: CompoundState,
}

impl CompoundGroup {
    pub fn new(id: CompoundGroupId, roll_group: RollGroupId, tens: DieId, ones: DieId) -> Self {
        Self {
            id,
            roll_group,
            tens,
            ones,
            state: CompoundState::WaitingBoth,
        }
    }

    pub fn member_of(&self, die: DieId) -> Option<CompoundMember> {
        if die == self.tens {
            Some(CompoundMember::Tens)
        } else if die == self.ones {
            Some(CompoundMember::Ones)
        } else {
            None
        }
    }

    /// Record a member's settled face (1..=10).
    /// Returns the combined value on the transition into `Combined`, never again.
    pub fn member_settled(&mut self, member: CompoundMember, face: u32) -> Option<u32> {
        match self.state {
            CompoundState::WaitingBoth => {
                self.state = CompoundState::WaitingOne {
                    settled: member,
                    face,
                };
                None
            }
            CompoundState::WaitingOne {
                settled,
                face: first,
            } if settled == member.other() => {
                let (tens, ones) = match member {
                    CompoundMember::Tens => (face, first),
                    CompoundMember::Ones => (first, face),
                };
                let value = combine_percentile(tens, ones);
                self.state = CompoundState::Combined { value };
                Some(value)
            }
            CompoundState::WaitingOne { .. } => {
                log::warn!("Compound {:?}: {:?} reported twice", self.id, member);
                None
            }
            CompoundState::Combined { .. } => None,
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self.state, CompoundState::Combined { .. })
    }
}

/// Combine tens and ones faces (each 1..=10, where 10 reads as digit 0).
/// "00" means 100.
pub fn combine_percentile(tens_face: u32, ones_face: u32) -> u32 {
    let tens = tens_face % 10;
    let ones = ones_face % 10;
    match tens * 10 + ones {
        0 => 100,
        value => value,
    }
}

/// Open and finished compound groups of a session
#[derive(Debug, Clone, Default)]
pub struct CompoundTracker {
    groups: BTreeMap<CompoundGroupId, CompoundGroup>,
}

impl CompoundTracker {
    pub fn insert(&mut self, group: CompoundGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn get(&self, id: CompoundGroupId) -> Option<&CompoundGroup> {
        self.groups.get(&id)
    }

    /// Route a settled member to its group. Returns the combined value once.
    pub fn member_settled(&mut self, id: CompoundGroupId, die: DieId, face: u32) -> Option<u32> {
        let group = self.groups.get_mut(&id)?;
        let member = group.member_of(die)?;
        group.member_settled(member, face)
    }

    pub fn pending(&self) -> usize {
        self.groups.values().filter(|g| !g.is_combined()).count()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drop every group (their dice are gone)
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> CompoundGroup {
        CompoundGroup::new(CompoundGroupId(1), RollGroupId(1), DieId(10), DieId(11))
    }

    #[test]
    fn test_combine_percentile() {
        assert_eq!(combine_percentile(10, 10), 100);
        assert_eq!(combine_percentile(3, 10), 30);
        assert_eq!(combine_percentile(1, 5), 15);
        assert_eq!(combine_percentile(10, 7), 7);
        assert_eq!(combine_percentile(9, 9), 99);
    }

    #[test]
    fn test_combines_once_in_either_order() {
        let mut g = group();
        assert_eq!(g.member_settled(CompoundMember::Ones, 5), None);
        assert_eq!(
            g.state,
            CompoundState::WaitingOne {
                settled: CompoundMember::Ones,
                face: 5
            }
        );
        assert_eq!(g.member_settled(CompoundMember::Tens, 1), Some(15));
        assert!(g.is_combined());
        assert_eq!(g.member_settled(CompoundMember::Tens, 1), None);
        assert_eq!(g.member_settled(CompoundMember::Ones, 5), None);

        let mut g = group();
        assert_eq!(g.member_settled(CompoundMember::Tens, 3), None);
        assert_eq!(g.member_settled(CompoundMember::Ones, 10), Some(30));
    }

    #[test]
    fn test_same_member_twice_does_not_combine() {
        let mut g = group();
        assert_eq!(g.member_settled(CompoundMember::Tens, 3), None);
        assert_eq!(g.member_settled(CompoundMember::Tens, 4), None);
        assert!(!g.is_combined());
    }

    #[test]
    fn test_tracker_routes_by_die() {
        let mut tracker = CompoundTracker::default();
        tracker.insert(group());
        assert_eq!(tracker.pending(), 1);
        // Unknown die or group: ignored
        assert_eq!(tracker.member_settled(CompoundGroupId(1), DieId(99), 4), None);
        assert_eq!(tracker.member_settled(CompoundGroupId(2), DieId(10), 4), None);

        assert_eq!(tracker.member_settled(CompoundGroupId(1), DieId(10), 10), None);
        assert_eq!(tracker.member_settled(CompoundGroupId(1), DieId(11), 10), Some(100));
        assert_eq!(tracker.pending(), 0);
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
