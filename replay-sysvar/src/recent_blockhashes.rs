//! Recent-blockhashes sysvar: the most recent blockhashes and fee
//! calculators, newest first.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{recent_blockhashes::RecentBlockhashes, Account, Pubkey},
};

pub const ID: &str = "SysvarRecentB1ockHashes11111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<RecentBlockhashes, SysvarError> {
    bincode::deserialize(&account.data)
        .map_err(|e| SysvarError::Decode("recent_blockhashes", e.to_string()))
}

pub fn to_account(value: &RecentBlockhashes, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(value)
        .map_err(|e| SysvarError::Decode("recent_blockhashes", e.to_string()))?;
    if bytes.len() > account.data.len() {
        account.data.resize(bytes.len(), 0);
    }
    account.data[..bytes.len()].copy_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_sdk::{hash::Hash, recent_blockhashes::{FeeCalculator, RecentBlockhashesEntry}};

    #[test]
    fn round_trips_through_an_account() {
        let value = RecentBlockhashes::new(&[RecentBlockhashesEntry {
            blockhash: Hash::new_from_array([7; 32]),
            fee_calculator: FeeCalculator { lamports_per_signature: 5000 },
        }]);
        let mut account = Account::new(1, 256, &id());
        to_account(&value, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), value);
    }
}
