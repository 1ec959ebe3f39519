//! Build-once, read-only view over the sysvar accounts an `AccountLoader`
//! exposes (spec.md §4.J, §9 "Sysvar panic on not present"). Constructed up
//! front from the account loader and handed to the transaction context;
//! entries that were not present in the loader are simply absent rather
//! than causing `fill` to fail, and accessors return a typed error instead
//! of panicking.

use {
    crate::{clock, epoch_rewards, epoch_schedule, error::SysvarError, last_restart_slot,
        recent_blockhashes, rent, slot_hashes, stake_history},
    replay_sdk::{
        clock::Clock, epoch_rewards::EpochRewards, epoch_schedule::EpochSchedule,
        last_restart_slot::LastRestartSlot, recent_blockhashes::RecentBlockhashes, rent::Rent,
        slot_hashes::SlotHashes, stake_history::StakeHistory, Account, AccountLoader,
    },
};

#[derive(Clone, Debug, Default)]
pub struct SysvarCache {
    clock: Option<Clock>,
    rent: Option<Rent>,
    epoch_schedule: Option<EpochSchedule>,
    last_restart_slot: Option<LastRestartSlot>,
    epoch_rewards: Option<EpochRewards>,
    slot_hashes: Option<SlotHashes>,
    stake_history: Option<StakeHistory>,
    recent_blockhashes: Option<RecentBlockhashes>,
}

fn load<T>(
    loader: &dyn AccountLoader,
    id: replay_sdk::Pubkey,
    decode: impl FnOnce(&Account) -> Result<T, SysvarError>,
) -> Option<T> {
    let account = loader.get_account(&id)?;
    decode(&account).ok()
}

impl SysvarCache {
    pub fn fill(loader: &dyn AccountLoader) -> Self {
        Self {
            clock: load(loader, clock::id(), clock::from_account),
            rent: load(loader, rent::id(), rent::from_account),
            epoch_schedule: load(loader, epoch_schedule::id(), epoch_schedule::from_account),
            last_restart_slot: load(
                loader,
                last_restart_slot::id(),
                last_restart_slot::from_account,
            ),
            epoch_rewards: load(loader, epoch_rewards::id(), epoch_rewards::from_account),
            slot_hashes: load(loader, slot_hashes::id(), slot_hashes::from_account),
            stake_history: load(loader, stake_history::id(), stake_history::from_account),
            recent_blockhashes: load(
                loader,
                recent_blockhashes::id(),
                recent_blockhashes::from_account,
            ),
        }
    }

    pub fn get_clock(&self) -> Result<&Clock, SysvarError> {
        self.clock.as_ref().ok_or(SysvarError::Missing("clock"))
    }

    pub fn get_rent(&self) -> Result<&Rent, SysvarError> {
        self.rent.as_ref().ok_or(SysvarError::Missing("rent"))
    }

    pub fn get_epoch_schedule(&self) -> Result<&EpochSchedule, SysvarError> {
        self.epoch_schedule
            .as_ref()
            .ok_or(SysvarError::Missing("epoch_schedule"))
    }

    pub fn get_last_restart_slot(&self) -> Result<&LastRestartSlot, SysvarError> {
        self.last_restart_slot
            .as_ref()
            .ok_or(SysvarError::Missing("last_restart_slot"))
    }

    pub fn get_epoch_rewards(&self) -> Result<&EpochRewards, SysvarError> {
        self.epoch_rewards
            .as_ref()
            .ok_or(SysvarError::Missing("epoch_rewards"))
    }

    pub fn get_slot_hashes(&self) -> Result<&SlotHashes, SysvarError> {
        self.slot_hashes
            .as_ref()
            .ok_or(SysvarError::Missing("slot_hashes"))
    }

    pub fn get_stake_history(&self) -> Result<&StakeHistory, SysvarError> {
        self.stake_history
            .as_ref()
            .ok_or(SysvarError::Missing("stake_history"))
    }

    pub fn get_recent_blockhashes(&self) -> Result<&RecentBlockhashes, SysvarError> {
        self.recent_blockhashes
            .as_ref()
            .ok_or(SysvarError::Missing("recent_blockhashes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeLoader(HashMap<replay_sdk::Pubkey, Account>);

    impl AccountLoader for FakeLoader {
        fn get_account(&self, pubkey: &replay_sdk::Pubkey) -> Option<Account> {
            self.0.get(pubkey).cloned()
        }
    }

    #[test]
    fn missing_sysvar_is_a_typed_error_not_a_panic() {
        let loader = FakeLoader(HashMap::new());
        let cache = SysvarCache::fill(&loader);
        assert_eq!(cache.get_clock().unwrap_err(), SysvarError::Missing("clock"));
    }

    #[test]
    fn present_sysvar_round_trips_through_the_cache() {
        let clock = Clock { slot: 77, ..Default::default() };
        let mut account = Account::new(1, 40, &clock::id());
        clock::to_account(&clock, &mut account).unwrap();
        let mut accounts = HashMap::new();
        accounts.insert(clock::id(), account);
        let loader = FakeLoader(accounts);
        let cache = SysvarCache::fill(&loader);
        assert_eq!(cache.get_clock().unwrap(), &clock);
    }
}
