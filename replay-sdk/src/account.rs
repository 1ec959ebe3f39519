//! The account record: owner, lamports, data, executable bit and rent epoch
//! (spec.md §3 "Account"). `MAX_PERMITTED_DATA_LENGTH` is the consensus cap
//! a borrowed account's data may never exceed (spec.md §6).

use {crate::pubkey::Pubkey, serde::{Deserialize, Serialize}};

pub const MAX_PERMITTED_DATA_LENGTH: u64 = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub lamports: u64,
    pub data: Vec<u8>,
    pub owner: Pubkey,
    pub executable: bool,
    pub rent_epoch: u64,
}

impl Account {
    pub fn new(lamports: u64, space: usize, owner: &Pubkey) -> Self {
        Self {
            lamports,
            data: vec![0; space],
            owner: *owner,
            executable: false,
            rent_epoch: 0,
        }
    }

    pub fn is_zeroed(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

impl Default for Account {
    fn default() -> Self {
        Self {
            lamports: 0,
            data: Vec::new(),
            owner: Pubkey::default(),
            executable: false,
            rent_epoch: 0,
        }
    }
}

/// External collaborator interface (spec.md §1/§6): the on-disk account
/// index this core consumes but does not implement.
pub trait AccountLoader {
    fn get_account(&self, pubkey: &Pubkey) -> Option<Account>;
}
