//! Slot-hashes sysvar: the most recent slot/blockhash pairs.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{slot_hashes::SlotHashes, Account, Pubkey},
};

pub const ID: &str = "SysvarS1otHashes111111111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<SlotHashes, SysvarError> {
    bincode::deserialize(&account.data)
        .map_err(|e| SysvarError::Decode("slot_hashes", e.to_string()))
}

pub fn to_account(value: &SlotHashes, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(value)
        .map_err(|e| SysvarError::Decode("slot_hashes", e.to_string()))?;
    if bytes.len() > account.data.len() {
        account.data.resize(bytes.len(), 0);
    }
    account.data[..bytes.len()].copy_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_sdk::hash::Hash;

    #[test]
    fn round_trips_through_an_account() {
        let value = SlotHashes::new(&[(10, Hash::new_from_array([1; 32])), (9, Hash::new_from_array([2; 32]))]);
        let mut account = Account::new(1, 256, &id());
        to_account(&value, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), value);
    }
}
