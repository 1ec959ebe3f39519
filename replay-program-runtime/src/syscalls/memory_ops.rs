//! Memory syscalls (spec.md §4.E "Memory"): memcpy (overlap is fatal),
//! memmove, memcmp (lexicographic diff via an out-pointer), memset.

use {
    super::charge,
    crate::invoke_context::InvokeContext,
    sbpf_vm::{memory::MemoryMapping, EbpfError},
};

fn ranges_overlap(a_start: u64, b_start: u64, len: u64) -> bool {
    if len == 0 {
        return false;
    }
    let Some(a_end) = a_start.checked_add(len) else {
        return true;
    };
    let Some(b_end) = b_start.checked_add(len) else {
        return true;
    };
    a_start < b_end && b_start < a_end
}

fn mem_cost(ctx: &InvokeContext<'_>, len: u64) -> u64 {
    ctx.compute_budget.mem_op_base_cost.saturating_add(len)
}

pub fn memcpy(
    ctx: &mut InvokeContext<'_>,
    dst_addr: u64,
    src_addr: u64,
    n: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, mem_cost(ctx, n))?;
    if ranges_overlap(dst_addr, src_addr, n) {
        return Err(EbpfError::OverlappingCopy);
    }
    let src = memory_mapping.translate(src_addr, n)?.to_vec();
    memory_mapping.translate_mut(dst_addr, n)?.copy_from_slice(&src);
    Ok(0)
}

pub fn memmove(
    ctx: &mut InvokeContext<'_>,
    dst_addr: u64,
    src_addr: u64,
    n: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, mem_cost(ctx, n))?;
    let src = memory_mapping.translate(src_addr, n)?.to_vec();
    memory_mapping.translate_mut(dst_addr, n)?.copy_from_slice(&src);
    Ok(0)
}

pub fn memcmp(
    ctx: &mut InvokeContext<'_>,
    a_addr: u64,
    b_addr: u64,
    n: u64,
    out_addr: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, mem_cost(ctx, n))?;
    let a = memory_mapping.translate(a_addr, n)?.to_vec();
    let b = memory_mapping.translate(b_addr, n)?;
    let result: i32 = match a.as_slice().cmp(b) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    memory_mapping.store(out_addr, &result.to_le_bytes())?;
    Ok(0)
}

pub fn memset(
    ctx: &mut InvokeContext<'_>,
    dst_addr: u64,
    value: u64,
    n: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, mem_cost(ctx, n))?;
    let dst = memory_mapping.translate_mut(dst_addr, n)?;
    dst.fill(value as u8);
    Ok(0)
}
