//! Recent-blockhashes sysvar: the most recent blockhashes and their fee
//! calculators, newest first, capped at `MAX_ENTRIES`.

use crate::hash::Hash;

pub const MAX_ENTRIES: usize = 150;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeeCalculator {
    pub lamports_per_signature: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecentBlockhashesEntry {
    pub blockhash: Hash,
    pub fee_calculator: FeeCalculator,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecentBlockhashes(Vec<RecentBlockhashesEntry>);

impl RecentBlockhashes {
    pub fn new(entries: &[RecentBlockhashesEntry]) -> Self {
        let mut v = entries.to_vec();
        v.truncate(MAX_ENTRIES);
        Self(v)
    }

    pub fn as_slice(&self) -> &[RecentBlockhashesEntry] {
        &self.0
    }

    pub fn most_recent(&self) -> Option<&RecentBlockhashesEntry> {
        self.0.first()
    }
}
