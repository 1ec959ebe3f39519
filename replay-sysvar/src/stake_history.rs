//! Stake-history sysvar: per-epoch totals of effective, activating and
//! deactivating stake.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{stake_history::StakeHistory, Account, Pubkey},
};

pub const ID: &str = "SysvarStakeHistory1111111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<StakeHistory, SysvarError> {
    bincode::deserialize(&account.data)
        .map_err(|e| SysvarError::Decode("stake_history", e.to_string()))
}

pub fn to_account(value: &StakeHistory, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(value)
        .map_err(|e| SysvarError::Decode("stake_history", e.to_string()))?;
    if bytes.len() > account.data.len() {
        account.data.resize(bytes.len(), 0);
    }
    account.data[..bytes.len()].copy_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_sdk::stake_history::StakeHistoryEntry;

    #[test]
    fn round_trips_through_an_account() {
        let value = StakeHistory::new(&[(
            5,
            StakeHistoryEntry {
                effective: 100,
                activating: 10,
                deactivating: 0,
            },
        )]);
        let mut account = Account::new(1, 256, &id());
        to_account(&value, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), value);
    }
}
