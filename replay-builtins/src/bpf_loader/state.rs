//! On-chain encoding of Upgradeable Loader-owned accounts (spec.md §4.I).
//! A `Buffer`/`ProgramData` account's bytes are this header followed by the
//! program's raw ELF image; a `Program` account's bytes are just the header.

use {replay_sdk::Pubkey, serde::{Deserialize, Serialize}};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeableLoaderState {
    Uninitialized,
    Buffer {
        authority_address: Option<Pubkey>,
    },
    Program {
        programdata_address: Pubkey,
    },
    ProgramData {
        slot: u64,
        upgrade_authority_address: Option<Pubkey>,
    },
}

impl UpgradeableLoaderState {
    /// Bytes occupied by a `Buffer` header before the program image begins:
    /// 4-byte variant tag + 1-byte `Option` tag + 32-byte `Pubkey`, matching
    /// bincode's enum-variant (u32) and `Option` (u8) encodings.
    pub const BUFFER_METADATA_SIZE: usize = 4 + 1 + 32;

    /// Bytes occupied by a `ProgramData` header: outer variant tag, 8-byte
    /// `slot`, then the same authority `Option<Pubkey>` as `Buffer`'s.
    pub const PROGRAM_DATA_METADATA_SIZE: usize = 4 + 8 + 1 + 32;

    pub fn deserialize(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    pub fn serialize_into(&self, data: &mut [u8]) -> Result<(), bincode::Error> {
        let bytes = bincode::serialize(self)?;
        data[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_metadata_size_matches_wire_encoding() {
        let state = UpgradeableLoaderState::Buffer {
            authority_address: Some(Pubkey::new_from_array([9u8; 32])),
        };
        let bytes = bincode::serialize(&state).unwrap();
        assert_eq!(bytes.len(), UpgradeableLoaderState::BUFFER_METADATA_SIZE);
    }

    #[test]
    fn program_data_metadata_size_matches_wire_encoding() {
        let state = UpgradeableLoaderState::ProgramData {
            slot: 1337,
            upgrade_authority_address: Some(Pubkey::new_from_array([3u8; 32])),
        };
        let bytes = bincode::serialize(&state).unwrap();
        assert_eq!(bytes.len(), UpgradeableLoaderState::PROGRAM_DATA_METADATA_SIZE);
    }

    #[test]
    fn uninitialized_round_trips() {
        let mut buf = vec![0u8; 500];
        UpgradeableLoaderState::Uninitialized.serialize_into(&mut buf).unwrap();
        assert_eq!(UpgradeableLoaderState::deserialize(&buf).unwrap(), UpgradeableLoaderState::Uninitialized);
    }
}
