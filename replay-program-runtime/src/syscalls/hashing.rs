//! Hashing syscalls (spec.md §4.E "Hashing"): sha256, blake3, keccak256,
//! poseidon, alt_bn128 group ops, secp256k1_recover. Each reads a
//! descriptor array of `(addr, len)` pairs out of guest memory, hashes (or
//! otherwise transforms) the referenced byte ranges, and writes a fixed-size
//! result into an out-pointer.

use {
    super::{charge, read_descriptor_vals},
    crate::invoke_context::InvokeContext,
    ark_bn254::{Fr as Bn254Fr, G1Affine, G1Projective},
    ark_ec::{AffineRepr, CurveGroup},
    ark_ff::{BigInteger, PrimeField},
    light_poseidon::{Poseidon, PoseidonBytesHasher},
    sbpf_vm::{memory::MemoryMapping, EbpfError},
    sha2::{Digest, Sha256},
    sha3::Keccak256,
};

pub fn sol_sha256(
    ctx: &mut InvokeContext<'_>,
    vals_addr: u64,
    vals_len: u64,
    result_addr: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.sha256_base_cost)?;
    let vals = read_descriptor_vals(memory_mapping, vals_addr, vals_len)?;
    let mut hasher = Sha256::new();
    for val in &vals {
        charge(ctx, ctx.compute_budget.sha256_byte_cost.saturating_mul(val.len() as u64))?;
        hasher.update(val);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    memory_mapping.store(result_addr, &digest)?;
    Ok(0)
}

pub fn sol_blake3(
    ctx: &mut InvokeContext<'_>,
    vals_addr: u64,
    vals_len: u64,
    result_addr: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.sha256_base_cost)?;
    let vals = read_descriptor_vals(memory_mapping, vals_addr, vals_len)?;
    let mut hasher = blake3::Hasher::new();
    for val in &vals {
        charge(ctx, ctx.compute_budget.sha256_byte_cost.saturating_mul(val.len() as u64))?;
        hasher.update(val);
    }
    let digest: [u8; 32] = *hasher.finalize().as_bytes();
    memory_mapping.store(result_addr, &digest)?;
    Ok(0)
}

pub fn sol_keccak256(
    ctx: &mut InvokeContext<'_>,
    vals_addr: u64,
    vals_len: u64,
    result_addr: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.sha256_base_cost)?;
    let vals = read_descriptor_vals(memory_mapping, vals_addr, vals_len)?;
    let mut hasher = Keccak256::new();
    for val in &vals {
        charge(ctx, ctx.compute_budget.sha256_byte_cost.saturating_mul(val.len() as u64))?;
        hasher.update(val);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    memory_mapping.store(result_addr, &digest)?;
    Ok(0)
}

pub fn sol_poseidon(
    ctx: &mut InvokeContext<'_>,
    vals_addr: u64,
    vals_len: u64,
    result_addr: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.sha256_base_cost.saturating_mul(4))?;
    let vals = read_descriptor_vals(memory_mapping, vals_addr, vals_len)?;
    let refs: Vec<&[u8]> = vals.iter().map(|v| v.as_slice()).collect();
    let mut hasher = Poseidon::<Bn254Fr>::new_circom(refs.len())
        .map_err(|e| EbpfError::Panic(e.to_string(), 0))?;
    let digest = hasher
        .hash_bytes_be(&refs)
        .map_err(|e| EbpfError::Panic(e.to_string(), 0))?;
    memory_mapping.store(result_addr, &digest)?;
    Ok(0)
}

/// alt_bn128 group operations (spec.md §4.E): `op` selects ADD (0) or MUL
/// (any other value) over the bn254 curve's G1 group, each point encoded as
/// two 32-byte big-endian field elements.
pub fn sol_alt_bn128_group_op(
    ctx: &mut InvokeContext<'_>,
    op: u64,
    input_addr: u64,
    input_len: u64,
    result_addr: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.sha256_base_cost.saturating_mul(10))?;
    let input = memory_mapping.translate(input_addr, input_len)?.to_vec();
    let expected_len: usize = match op {
        0 => 128,
        1 => 96,
        _ => return Err(EbpfError::Panic(format!("unsupported alt_bn128 op {op}"), 0)),
    };
    if input.len() < expected_len {
        return Err(EbpfError::Panic("alt_bn128 input too short".to_string(), 0));
    }
    match op {
        // ADD: two 64-byte G1 points, each coordinate a 32-byte big-endian
        // field element.
        0 => {
            let a = decode_g1(&input[0..64])?;
            let b = decode_g1(&input[64..128])?;
            let sum = (a + b).into_affine();
            memory_mapping.store(result_addr, &encode_g1(&sum))?;
        }
        // MUL: a 64-byte G1 point followed by a 32-byte big-endian scalar.
        _ => {
            let a = decode_g1(&input[0..64])?;
            let scalar = Bn254Fr::from_be_bytes_mod_order(&input[64..96]);
            let product = (a * scalar).into_affine();
            memory_mapping.store(result_addr, &encode_g1(&product))?;
        }
    }
    Ok(0)
}

fn decode_g1(bytes: &[u8]) -> Result<G1Projective, EbpfError> {
    let x = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[0..32]);
    let y = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[32..64]);
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(EbpfError::Panic("point not on alt_bn128 curve".to_string(), 0));
    }
    Ok(point.into_group())
}

fn encode_g1(point: &G1Affine) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[0..32].copy_from_slice(&point.x().unwrap().into_bigint().to_bytes_be());
    out[32..64].copy_from_slice(&point.y().unwrap().into_bigint().to_bytes_be());
    out
}

pub fn sol_secp256k1_recover(
    ctx: &mut InvokeContext<'_>,
    hash_addr: u64,
    recovery_id: u64,
    signature_addr: u64,
    result_addr: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.sha256_base_cost.saturating_mul(20))?;
    let hash: [u8; 32] = memory_mapping.load(hash_addr)?;
    let signature: [u8; 64] = memory_mapping.load(signature_addr)?;
    let message = libsecp256k1::Message::parse(&hash);
    let sig = libsecp256k1::Signature::parse_standard(&signature)
        .map_err(|e| EbpfError::Panic(format!("{e:?}"), 0))?;
    let recovery_id = libsecp256k1::RecoveryId::parse(recovery_id as u8)
        .map_err(|e| EbpfError::Panic(format!("{e:?}"), 0))?;
    let pubkey = libsecp256k1::recover(&message, &sig, &recovery_id)
        .map_err(|e| EbpfError::Panic(format!("{e:?}"), 0))?;
    // Solana's wire form drops the leading 0x04 uncompressed-point tag.
    let serialized = pubkey.serialize();
    memory_mapping.store(result_addr, &serialized[1..])?;
    Ok(0)
}

