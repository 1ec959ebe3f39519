//! Epoch-rewards sysvar: status of the in-progress partitioned reward
//! distribution, if any.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{epoch_rewards::EpochRewards, Account, Pubkey},
};

pub const ID: &str = "SysvarEpochRewards1111111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<EpochRewards, SysvarError> {
    bincode::deserialize(&account.data)
        .map_err(|e| SysvarError::Decode("epoch_rewards", e.to_string()))
}

pub fn to_account(value: &EpochRewards, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(value)
        .map_err(|e| SysvarError::Decode("epoch_rewards", e.to_string()))?;
    if bytes.len() > account.data.len() {
        account.data.resize(bytes.len(), 0);
    }
    account.data[..bytes.len()].copy_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_an_account() {
        let value = EpochRewards {
            distribution_starting_block_height: 100,
            num_partitions: 4,
            parent_blockhash: Default::default(),
            total_points: 1_000_000,
            total_rewards: 500,
            distributed_rewards: 125,
            active: true,
        };
        let mut account = Account::new(1, 81, &id());
        to_account(&value, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), value);
    }
}
