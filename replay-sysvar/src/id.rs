//! Well-known sysvar addresses are base58 literals, same as
//! `original_source/pkg/sealevel/sysvar_clock.go`'s `SysvarClockAddrStr`.
//! Each sysvar module decodes its own constant through this helper rather
//! than a generated `declare_id!`, since the ids never change at runtime.

use replay_sdk::Pubkey;

pub fn from_base58(s: &'static str) -> Pubkey {
    let bytes = bs58::decode(s)
        .into_vec()
        .unwrap_or_else(|e| panic!("malformed sysvar id literal {s:?}: {e}"));
    Pubkey::try_from(bytes.as_slice())
        .unwrap_or_else(|_| panic!("sysvar id literal {s:?} is not 32 bytes"))
}
