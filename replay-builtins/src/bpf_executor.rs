//! Runs a loaded SBPF program against the current instruction (spec.md §4.C
//! "Virtual address map", §4.H invocation context). Builds the four fixed
//! memory regions, drives `sbpf_vm::EbpfVm` to completion, then copies
//! guest-mutated account state back through the borrow layer — the
//! entry-time mirror of `sol_invoke_signed_c`'s mid-execution CPI account
//! translation in `replay-program-runtime/src/syscalls/cpi.rs`, but no
//! literal grounding file in the retrieval pack describes the exact
//! entry-time wire layout, so the format below (account table, then
//! instruction data, then program id) is this crate's own design, built from
//! general knowledge of how the real runtime hands accounts to a BPF
//! program.

use {
    replay_program_runtime::{create_registry, InvokeContext},
    replay_sdk::instruction_error::InstructionError,
    sbpf_loader::LoadedProgram,
    sbpf_vm::{
        config::Config,
        memory::{MemoryMapping, MemoryRegion, MM_HEAP_START, MM_INPUT_START, MM_PROGRAM_START, MM_STACK_START},
        vm::EbpfVm,
    },
};

/// One account's view as handed to the guest: a transaction-level index plus
/// the host buffer the guest's writes should land in and then be copied back
/// out of.
pub struct ExecutorAccount<'a> {
    pub key: [u8; 32],
    pub owner: [u8; 32],
    pub lamports: u64,
    pub data: &'a mut Vec<u8>,
    pub is_signer: bool,
    pub is_writable: bool,
    pub is_executable: bool,
}

fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn pad_to_8(buf: &mut Vec<u8>) {
    while buf.len() % 8 != 0 {
        buf.push(0);
    }
}

/// Serializes the account table + instruction data + program id into the
/// input region, returning the buffer and the byte offset each account's
/// `data` field starts at (needed to copy mutations back out afterward).
fn serialize_input(
    accounts: &[ExecutorAccount<'_>],
    instruction_data: &[u8],
    program_id: &[u8; 32],
) -> (Vec<u8>, Vec<usize>) {
    let mut buf = Vec::new();
    let mut data_offsets = Vec::with_capacity(accounts.len());

    write_u64(&mut buf, accounts.len() as u64);
    for account in accounts {
        buf.push(account.is_signer as u8);
        buf.push(account.is_writable as u8);
        buf.push(account.is_executable as u8);
        buf.extend_from_slice(&[0u8; 5]);
        buf.extend_from_slice(&account.key);
        buf.extend_from_slice(&account.owner);
        write_u64(&mut buf, account.lamports);
        write_u64(&mut buf, account.data.len() as u64);
        data_offsets.push(buf.len());
        buf.extend_from_slice(account.data);
        pad_to_8(&mut buf);
        write_u64(&mut buf, 0); // rent_epoch; not modeled per-account here
    }
    write_u64(&mut buf, instruction_data.len() as u64);
    buf.extend_from_slice(instruction_data);
    buf.extend_from_slice(program_id);

    (buf, data_offsets)
}

/// Reads each account's (possibly resized) data back out of the input
/// region buffer after execution, using the `data_len` field written
/// immediately before each account's bytes (the guest may have rewritten
/// that length in place, e.g. via `sol_set_return_data`-style realloc).
fn deserialize_output(buf: &[u8], data_offsets: &[usize], accounts: &mut [ExecutorAccount<'_>]) {
    for (account, &data_start) in accounts.iter_mut().zip(data_offsets) {
        let len_start = data_start.saturating_sub(8);
        let Some(len_bytes) = buf.get(len_start..data_start) else { continue };
        let len = u64::from_le_bytes(len_bytes.try_into().unwrap_or_default()) as usize;
        if let Some(slice) = buf.get(data_start..data_start.saturating_add(len)) {
            account.data.clear();
            account.data.extend_from_slice(slice);
        }
    }
}

/// Runs `program` with `accounts`/`instruction_data` visible in the input
/// region, returning the VM's `r0` on success or the mapped
/// `InstructionError` on any guest fault (spec.md §7: "a VM fault aborts the
/// instruction that triggered it").
pub fn execute(
    ctx: &mut InvokeContext<'_>,
    program: &LoadedProgram,
    program_id: &[u8; 32],
    accounts: &mut [ExecutorAccount<'_>],
    instruction_data: &[u8],
) -> Result<u64, InstructionError> {
    let config = Config::default();
    let (mut input_buf, data_offsets) = serialize_input(accounts, instruction_data, program_id);

    let mut stack = vec![0u8; config.stack_size()];
    let mut heap = vec![0u8; config.heap_max];

    let regions = vec![
        MemoryRegion::new_readonly(&program.rodata, MM_PROGRAM_START),
        MemoryRegion::new_writable(&mut stack, MM_STACK_START),
        MemoryRegion::new_writable(&mut heap, MM_HEAP_START),
        MemoryRegion::new_writable(&mut input_buf, MM_INPUT_START),
    ];
    let memory_mapping = MemoryMapping::new(regions);
    let syscalls = create_registry();

    let mut vm = EbpfVm::new(program, &config, &mut *ctx, memory_mapping, &syscalls);
    let (_instruction_count, result) = vm.execute_program();
    drop(vm);

    deserialize_output(&input_buf, &data_offsets, accounts);

    result.map_err(|fault| {
        ctx.log(&format!("BPF program failed: {fault}"));
        InstructionError::ProgramFailedToComplete
    })
}
