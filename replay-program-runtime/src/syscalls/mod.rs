//! Name-hash → handler table (spec.md §4.E). Built once per loader instance
//! and shared read-only across every transaction replay (spec.md §5).
//!
//! Each handler is a plain `fn` item, never a closure: `sbpf_vm`'s
//! `BuiltinFunction<C>` is a bare function pointer, so a handler written
//! with an elided lifetime on its `&mut InvokeContext<'_>` parameter is
//! universally quantified over that lifetime and unifies against whatever
//! `'a` [`create_registry`] is instantiated with — no `unsafe` lifetime
//! erasure needed, unlike the teacher's `BuiltinFunctionWithContext =
//! BuiltinFunction<InvokeContext<'static>>` alias.

mod context;
mod control;
mod cpi;
mod hashing;
mod logging;
mod memory_ops;
mod pda;

use {
    crate::invoke_context::InvokeContext,
    sbpf_loader::hash::symbol_hash,
    sbpf_vm::{memory::MemoryMapping, ContextObject, EbpfError, FunctionRegistry},
};

/// Charges `amount` compute units against the running instruction, failing
/// with `ExceededMaxInstructions` if the budget is now exhausted (spec.md
/// §4.E: "first charges a fixed or length-proportional CU cost").
pub(crate) fn charge(ctx: &mut InvokeContext<'_>, amount: u64) -> Result<(), EbpfError> {
    ctx.consume(amount);
    if ctx.get_remaining() == 0 {
        return Err(EbpfError::ExceededMaxInstructions);
    }
    Ok(())
}

const DESCRIPTOR_SIZE: u64 = 16;

/// Reads `count` `(addr, len)` descriptors starting at `vals_addr` and
/// returns the concatenated byte ranges they describe, copied out of the
/// mapping so the caller is free to borrow it mutably afterward. Shared by
/// the hashing and PDA-derivation syscalls, both of which take a guest
/// `&[&[u8]]`-shaped argument.
pub(crate) fn read_descriptor_vals(
    memory_mapping: &MemoryMapping,
    vals_addr: u64,
    count: u64,
) -> Result<Vec<Vec<u8>>, EbpfError> {
    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count {
        let entry_addr = vals_addr.saturating_add(i.saturating_mul(DESCRIPTOR_SIZE));
        let entry = memory_mapping.load::<16>(entry_addr)?;
        let addr = u64::from_le_bytes(entry[0..8].try_into().unwrap());
        let len = u64::from_le_bytes(entry[8..16].try_into().unwrap());
        out.push(memory_mapping.translate(addr, len)?.to_vec());
    }
    Ok(out)
}

pub fn create_registry<'a>() -> FunctionRegistry<InvokeContext<'a>> {
    let mut registry = FunctionRegistry::default();

    registry.register(symbol_hash(b"sol_log_"), logging::sol_log);
    registry.register(symbol_hash(b"sol_log_64_"), logging::sol_log_64);
    registry.register(symbol_hash(b"sol_log_compute_units_"), logging::sol_log_compute_units);
    registry.register(symbol_hash(b"sol_log_pubkey"), logging::sol_log_pubkey);

    registry.register(symbol_hash(b"memcpy"), memory_ops::memcpy);
    registry.register(symbol_hash(b"memmove"), memory_ops::memmove);
    registry.register(symbol_hash(b"memcmp"), memory_ops::memcmp);
    registry.register(symbol_hash(b"memset"), memory_ops::memset);

    registry.register(symbol_hash(b"sol_sha256"), hashing::sol_sha256);
    registry.register(symbol_hash(b"sol_blake3"), hashing::sol_blake3);
    registry.register(symbol_hash(b"sol_keccak256"), hashing::sol_keccak256);
    registry.register(symbol_hash(b"sol_poseidon"), hashing::sol_poseidon);
    registry.register(symbol_hash(b"sol_alt_bn128_group_op"), hashing::sol_alt_bn128_group_op);
    registry.register(symbol_hash(b"sol_secp256k1_recover"), hashing::sol_secp256k1_recover);

    registry.register(symbol_hash(b"sol_create_program_address"), pda::sol_create_program_address);
    registry.register(symbol_hash(b"sol_try_find_program_address"), pda::sol_try_find_program_address);

    registry.register(symbol_hash(b"sol_panic_"), control::sol_panic);
    registry.register(symbol_hash(b"abort"), control::abort);

    registry.register(symbol_hash(b"sol_get_stack_height"), context::sol_get_stack_height);
    registry.register(symbol_hash(b"sol_get_return_data"), context::sol_get_return_data);
    registry.register(symbol_hash(b"sol_set_return_data"), context::sol_set_return_data);
    registry.register(symbol_hash(b"sol_get_clock_sysvar"), context::sol_get_clock_sysvar);
    registry.register(symbol_hash(b"sol_get_rent_sysvar"), context::sol_get_rent_sysvar);
    registry.register(symbol_hash(b"sol_get_epoch_schedule_sysvar"), context::sol_get_epoch_schedule_sysvar);
    registry.register(symbol_hash(b"sol_get_last_restart_slot"), context::sol_get_last_restart_slot);
    registry.register(symbol_hash(b"sol_get_epoch_rewards_sysvar"), context::sol_get_epoch_rewards_sysvar);

    registry.register(symbol_hash(b"sol_invoke_signed_c"), cpi::sol_invoke_signed_c);

    registry
}
