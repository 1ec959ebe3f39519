//! Context-introspection syscalls (spec.md §4.E "Context introspection"):
//! stack height, return data, and the sysvar family.

use {
    super::charge,
    crate::invoke_context::InvokeContext,
    replay_sdk::instruction_error::InstructionError,
    sbpf_vm::{memory::MemoryMapping, EbpfError},
};

fn to_fault(err: InstructionError) -> EbpfError {
    EbpfError::CpiFailed(err.to_string())
}

fn current_program_id(ctx: &InvokeContext<'_>) -> Result<replay_sdk::Pubkey, EbpfError> {
    let instruction_context = ctx
        .transaction_context
        .get_current_instruction_context()
        .map_err(to_fault)?;
    let index = instruction_context
        .get_last_program_account_index()
        .map_err(to_fault)?;
    Ok(*ctx.transaction_context.get_key_of_account_at_index(index))
}

pub fn sol_get_stack_height(
    ctx: &mut InvokeContext<'_>,
    _r1: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    _memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    Ok(ctx.get_stack_height() as u64)
}

pub fn sol_get_return_data(
    ctx: &mut InvokeContext<'_>,
    data_out_addr: u64,
    data_out_max_len: u64,
    program_id_out_addr: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let (program_id, data) = ctx.get_return_data();
    let copy_len = data.len().min(data_out_max_len as usize);
    if copy_len > 0 {
        memory_mapping.store(data_out_addr, &data[..copy_len])?;
        memory_mapping.store(program_id_out_addr, &program_id.to_bytes())?;
    }
    Ok(data.len() as u64)
}

pub fn sol_set_return_data(
    ctx: &mut InvokeContext<'_>,
    data_addr: u64,
    data_len: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost.saturating_add(data_len))?;
    let data = memory_mapping.translate(data_addr, data_len)?.to_vec();
    let program_id = current_program_id(ctx)?;
    ctx.set_return_data(program_id, data).map_err(to_fault)?;
    Ok(0)
}

pub fn sol_get_clock_sysvar(
    ctx: &mut InvokeContext<'_>,
    out_addr: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let clock = ctx
        .sysvar_cache
        .get_clock()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let bytes =
        bincode::serialize(clock).map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    memory_mapping.store(out_addr, &bytes)?;
    Ok(0)
}

pub fn sol_get_rent_sysvar(
    ctx: &mut InvokeContext<'_>,
    out_addr: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let rent = ctx
        .sysvar_cache
        .get_rent()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let bytes = bincode::serialize(rent).map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    memory_mapping.store(out_addr, &bytes)?;
    Ok(0)
}

pub fn sol_get_epoch_schedule_sysvar(
    ctx: &mut InvokeContext<'_>,
    out_addr: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let epoch_schedule = ctx
        .sysvar_cache
        .get_epoch_schedule()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let bytes =
        bincode::serialize(epoch_schedule).map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    memory_mapping.store(out_addr, &bytes)?;
    Ok(0)
}

pub fn sol_get_last_restart_slot(
    ctx: &mut InvokeContext<'_>,
    out_addr: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let last_restart_slot = ctx
        .sysvar_cache
        .get_last_restart_slot()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let bytes = bincode::serialize(last_restart_slot)
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    memory_mapping.store(out_addr, &bytes)?;
    Ok(0)
}

pub fn sol_get_epoch_rewards_sysvar(
    ctx: &mut InvokeContext<'_>,
    out_addr: u64,
    _r2: u64,
    _r3: u64,
    _r4: u64,
    _r5: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.syscall_base_cost)?;
    let epoch_rewards = ctx
        .sysvar_cache
        .get_epoch_rewards()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let bytes =
        bincode::serialize(epoch_rewards).map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    memory_mapping.store(out_addr, &bytes)?;
    Ok(0)
}
