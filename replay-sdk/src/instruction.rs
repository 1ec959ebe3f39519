//! Host-side `Instruction`/`AccountMeta` shapes, and the exact guest-memory
//! layouts a BPF program marshals them into for CPI (spec.md §4.E "Cross
//! program invocation"). Field order/sizes here are load-bearing: they are
//! taken from `original_source/pkg/sealevel/types.go`'s `SolInstruction`,
//! `AccountMeta`, and `SolAccountMeta` and must not be reordered.

use crate::pubkey::Pubkey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// On-wire size of a `SolAccountMeta` as laid out in guest memory:
/// 8 (addr) + 1 (is_signer) + 1 (is_writable) = 10, unpadded, matching
/// `SOL_ACCOUNT_INFO_SIZE`'s convention below.
pub const SOL_ACCOUNT_META_SIZE: usize = 10;

/// Guest-memory pointer/length descriptor for an `Instruction` as the BPF
/// ABI passes it to `sol_invoke_signed_c` (`SolInstruction` in
/// `original_source`).
pub const SOL_INSTRUCTION_STRUCT_SIZE: usize = 40;

/// Guest-memory shape of a translated `AccountInfo` (`SolAccountInfo` in
/// `original_source`); `KeyAddr, LamportsAddr, DataLen, DataAddr, OwnerAddr,
/// RentEpoch` are each 8 bytes, followed by three 1-byte bools.
pub const SOL_ACCOUNT_INFO_SIZE: usize = 51;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new_with_bytes(program_id: Pubkey, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }
}

/// A message-level instruction: indices into the transaction's account-key
/// table rather than full `Pubkey`s, the wire form once a message is
/// compiled for sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}
