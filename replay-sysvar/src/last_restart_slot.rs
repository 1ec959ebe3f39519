//! Last-restart-slot sysvar.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{last_restart_slot::LastRestartSlot, Account, Pubkey},
};

pub const ID: &str = "SysvarLastRestartS1ot1111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<LastRestartSlot, SysvarError> {
    bincode::deserialize(&account.data)
        .map_err(|e| SysvarError::Decode("last_restart_slot", e.to_string()))
}

pub fn to_account(value: &LastRestartSlot, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(value)
        .map_err(|e| SysvarError::Decode("last_restart_slot", e.to_string()))?;
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
        let value = LastRestartSlot { last_restart_slot: 42 };
        let mut account = Account::new(1, 8, &id());
        to_account(&value, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), value);
    }
}
