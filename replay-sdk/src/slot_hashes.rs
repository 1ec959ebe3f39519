//! Slot-hashes sysvar: the most recent slot/blockhash pairs, newest first,
//! capped at `MAX_ENTRIES`.

use crate::{clock::Slot, hash::Hash};

pub const MAX_ENTRIES: usize = 512;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotHashes(Vec<(Slot, Hash)>);

impl SlotHashes {
    pub fn new(entries: &[(Slot, Hash)]) -> Self {
        let mut v = entries.to_vec();
        v.truncate(MAX_ENTRIES);
        Self(v)
    }

    pub fn get(&self, slot: &Slot) -> Option<&Hash> {
        self.0.iter().find(|(s, _)| s == slot).map(|(_, h)| h)
    }

    pub fn as_slice(&self) -> &[(Slot, Hash)] {
        &self.0
    }
}
