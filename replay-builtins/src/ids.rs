//! Well-known builtin program addresses, decoded the same way
//! `replay_sysvar::id` decodes sysvar addresses: base58 literals, not a
//! generated `declare_id!`.

use replay_sdk::Pubkey;

fn from_base58(s: &'static str) -> Pubkey {
    let bytes = bs58::decode(s)
        .into_vec()
        .unwrap_or_else(|e| panic!("malformed program id literal {s:?}: {e}"));
    Pubkey::try_from(bytes.as_slice())
        .unwrap_or_else(|_| panic!("program id literal {s:?} is not 32 bytes"))
}

pub const BPF_LOADER_UPGRADEABLE_ID: &str = "BPFLoaderUpgradeab1e11111111111111111111111";
pub const CONFIG_PROGRAM_ID: &str = "Config1111111111111111111111111111111111111";
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

pub fn bpf_loader_upgradeable_id() -> Pubkey {
    from_base58(BPF_LOADER_UPGRADEABLE_ID)
}

pub fn config_program_id() -> Pubkey {
    from_base58(CONFIG_PROGRAM_ID)
}

pub fn system_program_id() -> Pubkey {
    from_base58(SYSTEM_PROGRAM_ID)
}
