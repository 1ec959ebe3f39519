//! Logging syscalls (spec.md §4.E "Logging"): raw bytes, five u64
//! registers, a compute-unit dump, and a pubkey.

use {
    super::charge,
    crate::invoke_context::InvokeContext,
    replay_sdk::Pubkey,
    sbpf_vm::{memory::MemoryMapping, ContextObject, EbpfError},
};

pub fn sol_log(
    ctx: &mut InvokeContext<'_>,
    addr: u64,
    len: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost.saturating_add(len))?;
    let bytes = memory_mapping.translate(addr, len)?;
    let message = std::str::from_utf8(bytes).map_err(|_| EbpfError::InvalidString)?;
    ctx.log(message);
    Ok(0)
}

pub fn sol_log_64(
    ctx: &mut InvokeContext<'_>,
    r1: u64,
    r2: u64,
    r3: u64,
    r4: u64,
    r5: u64,
    _memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.log_64_units)?;
    ctx.log(&format!("{r1:#x}, {r2:#x}, {r3:#x}, {r4:#x}, {r5:#x}"));
    Ok(0)
}

pub fn sol_log_compute_units(
    ctx: &mut InvokeContext<'_>,
    _r1: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    _memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let remaining = ctx.get_remaining();
    ctx.log(&format!("Program consumption: {remaining} units remaining"));
    Ok(0)
}

pub fn sol_log_pubkey(
    ctx: &mut InvokeContext<'_>,
    addr: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.log_pubkey_units)?;
    let bytes: [u8; 32] = memory_mapping.load(addr)?;
    let pubkey = Pubkey::new_from_array(bytes);
    ctx.log(&format!("{pubkey}"));
    Ok(0)
}
