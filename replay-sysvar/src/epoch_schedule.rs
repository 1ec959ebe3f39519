//! Epoch-schedule sysvar: how slots map onto epochs for the running cluster.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{epoch_schedule::EpochSchedule, Account, Pubkey},
};

pub const ID: &str = "SysvarEpochSchedu1e111111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<EpochSchedule, SysvarError> {
    bincode::deserialize(&account.data)
        .map_err(|e| SysvarError::Decode("epoch_schedule", e.to_string()))
}

pub fn to_account(schedule: &EpochSchedule, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(schedule)
        .map_err(|e| SysvarError::Decode("epoch_schedule", e.to_string()))?;
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
        let schedule = EpochSchedule::default();
        let mut account = Account::new(1, 33, &id());
        to_account(&schedule, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), schedule);
    }
}
