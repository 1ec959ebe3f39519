//! Wire format of an Upgradeable Loader instruction (spec.md §6 "Builtin
//! instruction data": little-endian u32 variant tag, bincode-style
//! payload). Variants mirror spec.md §4.I's listed operation set;
//! `ExtendProgram`/`Migrate` (present in the teacher's real loader but not
//! named in spec.md) are out of scope, so tags here are compacted rather
//! than reproducing the teacher's historical gaps.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeableLoaderInstruction {
    /// Marks an all-zero account as a `Buffer` ready to receive `Write`s.
    InitializeBuffer,
    /// Writes `bytes` into the buffer's program-image region starting at
    /// `offset` (relative to the end of the buffer header).
    Write { offset: u32, bytes: Vec<u8> },
    /// Moves a buffer's program image into a fresh `Program`/`ProgramData`
    /// pair, marking the program account executable.
    DeployWithMaxDataLen { max_data_len: u64 },
    /// Replaces a deployed program's code from a buffer, bumping
    /// `ProgramData::slot` to the current clock slot.
    Upgrade,
    /// Rotates or clears (`None`) the upgrade authority.
    SetAuthority,
    /// Like `SetAuthority`, but the new authority must also sign.
    SetAuthorityChecked,
    /// Reclaims an account's lamports and resets it to `Uninitialized`.
    Close,
}

impl UpgradeableLoaderInstruction {
    pub fn deserialize(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_buffer_tag_is_zero() {
        let bytes = UpgradeableLoaderInstruction::InitializeBuffer.serialize().unwrap();
        assert_eq!(&bytes[..4], &0u32.to_le_bytes());
    }

    #[test]
    fn write_round_trips() {
        let ix = UpgradeableLoaderInstruction::Write { offset: 12, bytes: vec![1, 2, 3] };
        let bytes = ix.serialize().unwrap();
        assert_eq!(UpgradeableLoaderInstruction::deserialize(&bytes).unwrap(), ix);
    }
}
