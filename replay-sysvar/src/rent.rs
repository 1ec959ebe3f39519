//! Rent sysvar: the rent parameters in effect for the current epoch.

use {
    crate::{error::SysvarError, id::from_base58},
    replay_sdk::{rent::Rent, Account, Pubkey},
};

pub const ID: &str = "SysvarRent111111111111111111111111111111111";

pub fn id() -> Pubkey {
    from_base58(ID)
}

pub fn from_account(account: &Account) -> Result<Rent, SysvarError> {
    bincode::deserialize(&account.data).map_err(|e| SysvarError::Decode("rent", e.to_string()))
}

pub fn to_account(rent: &Rent, account: &mut Account) -> Result<(), SysvarError> {
    let bytes = bincode::serialize(rent).map_err(|e| SysvarError::Decode("rent", e.to_string()))?;
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
        let rent = Rent::default();
        let mut account = Account::new(1, 17, &id());
        to_account(&rent, &mut account).unwrap();
        assert_eq!(from_account(&account).unwrap(), rent);
    }
}
