//! Control syscalls (spec.md §4.E "Control"): `panic` reports the guest's
//! file/line and aborts the interpreter with a `Panic` VM fault (spec.md §8
//! `Interpreter.panic`: `"exception at 16: SBF program Panicked in
//! some_file_1234.c at 1337:10"`); `abort` aborts with no detail at all.

use {
    super::charge,
    crate::invoke_context::InvokeContext,
    sbpf_vm::{memory::MemoryMapping, EbpfError},
};

pub fn sol_panic(
    ctx: &mut InvokeContext<'_>,
    file_addr: u64,
    file_len: u64,
    line: u64,
    column: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let file_bytes = memory_mapping.translate(file_addr, file_len)?;
    let file = std::str::from_utf8(file_bytes).map_err(|_| EbpfError::InvalidString)?;
    Err(EbpfError::Panic(format!("{file} at {line}:{column}"), 0))
}

pub fn abort(
    ctx: &mut InvokeContext<'_>,
    _r1: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    _memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    Err(EbpfError::Panic("abort".to_string(), 0))
}
