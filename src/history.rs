//! Roll history log
//!
//! Keeps the most recent results, oldest first, and groups them by the roll
//! action that produced them.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_HISTORY_ENTRIES;
use crate::sim::{DieType, ResultObserver, RollGroupId, RollResult};

/// A single logged result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub roll_group: RollGroupId,
    pub die_type: DieType,
    pub value: u32,
    /// Dice color at spawn time
    pub color: String,
    pub profile_label: Option<String>,
}

impl HistoryEntry {
    /// Chip text, e.g. `Emp's dice d20: 17`
    pub fn chip_text(&self) -> String {
        match &self.profile_label {
            Some(label) if !label.is_empty() => {
                format!("{} {}: {}", label, self.die_type, self.value)
            }
            _ => format!("{}: {}", self.die_type, self.value),
        }
    }
}

impl From<&RollResult> for HistoryEntry {
    fn from(result: &RollResult) -> Self {
        Self {
            roll_group: result.roll_group,
            die_type: result.die_type,
            value: result.value,
            color: result.display_color.clone(),
            profile_label: result.profile_label.clone(),
        }
    }
}

/// Bounded roll log
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RollHistory {
    pub entries: Vec<HistoryEntry>,
}

impl RollHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a result, dropping the oldest entry past the limit
    pub fn record(&mut self, result: &RollResult) {
        self.entries.push(HistoryEntry::from(result));
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let overflow = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(..overflow);
        }
    }

    /// Entries grouped by roll, groups in order of first appearance
    pub fn groups(&self) -> Vec<(RollGroupId, Vec<&HistoryEntry>)> {
        let mut groups: Vec<(RollGroupId, Vec<&HistoryEntry>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(id, _)| *id == entry.roll_group) {
                Some((_, items)) => items.push(entry),
                None => groups.push((entry.roll_group, vec![entry])),
            }
        }
        groups
    }

    /// Most recent entry (the headline result)
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ResultObserver for RollHistory {
    fn on_result(&mut self, result: &RollResult) {
        self.record(result);
    }
}
