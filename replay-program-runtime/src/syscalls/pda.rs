//! Address-derivation syscalls (spec.md §4.E "Address derivation"):
//! `create_program_address` (fails when the derived key lands on-curve)
//! and `try_find_program_address` (bump search 255→0).

use {
    super::{charge, read_descriptor_vals},
    crate::invoke_context::InvokeContext,
    replay_sdk::Pubkey,
    sbpf_vm::{memory::MemoryMapping, EbpfError},
};

pub fn sol_create_program_address(
    ctx: &mut InvokeContext<'_>,
    seeds_addr: u64,
    seeds_count: u64,
    program_id_addr: u64,
    address_out_addr: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.create_program_address_units)?;
    let seeds = read_descriptor_vals(memory_mapping, seeds_addr, seeds_count)?;
    let seed_refs: Vec<&[u8]> = seeds.iter().map(|s| s.as_slice()).collect();
    let program_id_bytes: [u8; 32] = memory_mapping.load(program_id_addr)?;
    let program_id = Pubkey::new_from_array(program_id_bytes);
    match Pubkey::create_program_address(&seed_refs, &program_id) {
        Ok(address) => {
            memory_mapping.store(address_out_addr, &address.to_bytes())?;
            Ok(0)
        }
        // The guest ABI signals "no valid address" via a non-zero r0
        // rather than a VM fault (spec.md §4.E): a failed derivation is an
        // expected outcome, not a host-side failure.
        Err(_) => Ok(1),
    }
}

pub fn sol_try_find_program_address(
    ctx: &mut InvokeContext<'_>,
    seeds_addr: u64,
    seeds_count: u64,
    program_id_addr: u64,
    address_out_addr: u64,
    bump_seed_out_addr: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.create_program_address_units)?;
    let seeds = read_descriptor_vals(memory_mapping, seeds_addr, seeds_count)?;
    let seed_refs: Vec<&[u8]> = seeds.iter().map(|s| s.as_slice()).collect();
    let program_id_bytes: [u8; 32] = memory_mapping.load(program_id_addr)?;
    let program_id = Pubkey::new_from_array(program_id_bytes);
    match Pubkey::find_program_address(&seed_refs, &program_id) {
        Some((address, bump_seed)) => {
            memory_mapping.store(address_out_addr, &address.to_bytes())?;
            memory_mapping.store(bump_seed_out_addr, &[bump_seed])?;
            Ok(0)
        }
        None => Ok(1),
    }
}
