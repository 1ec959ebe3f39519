//! Stake-history sysvar: per-epoch totals of effective, activating and
//! deactivating stake, newest epoch first, capped at `MAX_ENTRIES`.

use crate::clock::Epoch;

pub const MAX_ENTRIES: usize = 512;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StakeHistoryEntry {
    pub effective: u64,
    pub activating: u64,
    pub deactivating: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StakeHistory(Vec<(Epoch, StakeHistoryEntry)>);

impl StakeHistory {
    pub fn new(entries: &[(Epoch, StakeHistoryEntry)]) -> Self {
        let mut v = entries.to_vec();
        v.truncate(MAX_ENTRIES);
        Self(v)
    }

    pub fn get(&self, epoch: &Epoch) -> Option<&StakeHistoryEntry> {
        self.0.iter().find(|(e, _)| e == epoch).map(|(_, entry)| entry)
    }

    pub fn as_slice(&self) -> &[(Epoch, StakeHistoryEntry)] {
        &self.0
    }
}
