//! 32-byte account addresses, PDA derivation, and the on-curve check used
//! to reject derived addresses that happen to collide with a real keypair.

use {
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
    std::{convert::TryFrom, fmt},
    thiserror::Error,
};

pub const PUBKEY_BYTES: usize = 32;
pub const MAX_SEED_LEN: usize = 32;
pub const MAX_SEEDS: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PubkeyError {
    #[error("Length of the seed is too long for address generation")]
    MaxSeedLengthExceeded,
    #[error("Provided seeds differ from derived key")]
    InvalidSeeds,
    #[error("Provided owner is not allowed")]
    IllegalOwner,
}

#[derive(Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub fn as_ref(&self) -> &[u8] {
        &self.0
    }

    /// Used by the loader's "derived address must not be a real pubkey"
    /// check: a point that fails to decompress to a valid curve25519 point
    /// is off-curve, i.e. it cannot be anyone's ed25519 public key.
    pub fn is_on_curve(&self) -> bool {
        curve25519_dalek::edwards::CompressedEdwardsY::from_slice(&self.0)
            .ok()
            .and_then(|p| p.decompress())
            .is_some()
    }

    /// Derives `PDA = sha256(seeds... || program_id || "ProgramDerivedAddress")`,
    /// rejecting the result if it lies on the ed25519 curve (in which case a
    /// real keypair could exist for it and the derivation would not be
    /// exclusive to the program).
    pub fn create_program_address(
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<Pubkey, PubkeyError> {
        if seeds.len() > MAX_SEEDS {
            return Err(PubkeyError::MaxSeedLengthExceeded);
        }
        for seed in seeds.iter() {
            if seed.len() > MAX_SEED_LEN {
                return Err(PubkeyError::MaxSeedLengthExceeded);
            }
        }
        let mut hasher = Sha256::new();
        for seed in seeds.iter() {
            hasher.update(seed);
        }
        hasher.update(program_id.as_ref());
        hasher.update(b"ProgramDerivedAddress");
        let hash = hasher.finalize();
        let key = Pubkey::new_from_array(hash.into());
        if key.is_on_curve() {
            return Err(PubkeyError::InvalidSeeds);
        }
        Ok(key)
    }

    /// Iterates the bump seed from 255 down to 0 looking for the first seed
    /// combination that derives an off-curve address, per spec.md's
    /// `try_find_program_address` syscall description.
    pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Option<(Pubkey, u8)> {
        let mut bump_seed = [u8::MAX];
        for _ in 0..u8::MAX {
            {
                let mut seeds_with_bump = seeds.to_vec();
                seeds_with_bump.push(&bump_seed);
                if let Ok(address) = Self::create_program_address(&seeds_with_bump, program_id) {
                    return Some((address, bump_seed[0]));
                }
            }
            bump_seed[0] = bump_seed[0].saturating_sub(1);
            if bump_seed[0] == 0 && seeds.is_empty() {
                break;
            }
        }
        None
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = std::array::TryFromSliceError;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; PUBKEY_BYTES]>::try_from(value).map(Self::new_from_array)
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(feature = "rand")]
impl Pubkey {
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let mut bytes = [0u8; PUBKEY_BYTES];
        let i = COUNTER.fetch_add(1, Ordering::Relaxed);
        bytes[..8].copy_from_slice(&i.to_le_bytes());
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_bs58() {
        let pk = Pubkey::new_from_array([1u8; 32]);
        let s = pk.to_string();
        let decoded = bs58::decode(s).into_vec().unwrap();
        assert_eq!(decoded, pk.to_bytes());
    }

    #[test]
    fn create_program_address_rejects_seeds_too_long() {
        let program_id = Pubkey::new_from_array([7u8; 32]);
        let huge_seed = [0u8; MAX_SEED_LEN + 1];
        let err = Pubkey::create_program_address(&[&huge_seed], &program_id).unwrap_err();
        assert_eq!(err, PubkeyError::MaxSeedLengthExceeded);
    }

    #[test]
    fn find_program_address_is_off_curve_and_deterministic() {
        let program_id = Pubkey::new_from_array([9u8; 32]);
        let (addr, bump) = Pubkey::find_program_address(&[b"seed"], &program_id).unwrap();
        assert!(!addr.is_on_curve());
        let recomputed =
            Pubkey::create_program_address(&[b"seed", &[bump]], &program_id).unwrap();
        assert_eq!(addr, recomputed);
    }
}
