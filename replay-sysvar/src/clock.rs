//! Clock sysvar (spec.md §4.J): slot, epoch and wall-clock time as of the
//! bank this transaction is replayed against.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{clock::Clock, Account, Pubkey},
};

pub const ID: &str = "SysvarC1ock11111111111111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<Clock, SysvarError> {
    bincode::deserialize(&account.data).map_err(|e| SysvarError::Decode("clock", e.to_string()))
}

pub fn to_account(clock: &Clock, account: &mut Account) -> Result<(), SysvarError> {
    let bytes =
        bincode::serialize(clock).map_err(|e| SysvarError::Decode("clock", e.to_string()))?;
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
        let clock = Clock {
            slot: 1337,
            epoch_start_timestamp: 10,
            epoch: 3,
            leader_schedule_epoch: 4,
            unix_timestamp: 12345,
        };
        let mut account = Account::new(1, 40, &id());
        to_account(&clock, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), clock);
    }
}
