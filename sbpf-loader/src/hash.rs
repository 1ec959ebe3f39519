//! Deterministic 32-bit hashing used to address intra-program call targets
//! and syscall imports (spec.md GLOSSARY: "PC-hash", "Syscall"). The
//! reference toolchain hashes both symbol names and PC targets with
//! Murmur3-32 (seed 0); reproduced here as a small self-contained routine
//! since no crate in the workspace's dependency stack already provides it.

const MURMUR3_C1: u32 = 0xcc9e_2d51;
const MURMUR3_C2: u32 = 0x1b87_3593;

fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut hash = seed;
    let chunks = data.chunks_exact(4);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let mut k = u32::from_le_bytes(chunk.try_into().unwrap());
        k = k.wrapping_mul(MURMUR3_C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(MURMUR3_C2);

        hash ^= k;
        hash = hash.rotate_left(13);
        hash = hash.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let mut k = 0u32;
    for (i, &byte) in remainder.iter().enumerate() {
        k |= (byte as u32) << (8 * i);
    }
    if !remainder.is_empty() {
        k = k.wrapping_mul(MURMUR3_C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(MURMUR3_C2);
        hash ^= k;
    }

    hash ^= data.len() as u32;
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    hash
}

/// Hash of a syscall's symbol name (spec.md §4.B "syscall import").
pub fn symbol_hash(name: &[u8]) -> u32 {
    murmur3_32(name, 0)
}

/// Hash of an intra-program call's target slot index (spec.md §4.B
/// "PC-hash"). The target is hashed as its little-endian bytes so that
/// two different targets practically never collide.
pub fn pc_hash(target_slot: u64) -> u32 {
    murmur3_32(&target_slot.to_le_bytes(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pc_hash_is_deterministic_and_distinguishes_targets() {
        assert_eq!(pc_hash(42), pc_hash(42));
        assert_ne!(pc_hash(42), pc_hash(43));
    }

    #[test]
    fn symbol_hash_is_deterministic() {
        assert_eq!(symbol_hash(b"sol_log_"), symbol_hash(b"sol_log_"));
        assert_ne!(symbol_hash(b"sol_log_"), symbol_hash(b"sol_panic_"));
    }
}
