//! spec.md §8's `Interpreter.*` scenarios, driven directly against
//! `sbpf_vm::EbpfVm` with the real syscall registry
//! (`replay_program_runtime::create_registry`) rather than a
//! `TestContextObject` — these four exercise the interpreter/syscall
//! integration the unit tests in `sbpf-vm` deliberately stub out.
//!
//! No `.so` fixture files ship in this workspace, so each scenario's guest
//! program is hand-assembled from raw instruction slots, mirroring the
//! `program_from_slots` helper in `sbpf-vm/src/tests.rs`.

use {
    replay_program_runtime::{create_registry, ComputeBudget, InvokeContext, LogCollector},
    replay_sdk::{Account, Pubkey},
    replay_sysvar::SysvarCache,
    replay_transaction_context::TransactionContext,
    sbpf_loader::{hash::symbol_hash, program::SbpfVersion, LoadedProgram, VADDR_PROGRAM},
    sbpf_vm::{
        opcode::*, Config, EbpfError, MemoryMapping, MemoryRegion, MM_HEAP_START, MM_INPUT_START,
        MM_STACK_START,
    },
    std::{
        collections::{HashMap, HashSet},
        rc::Rc,
    },
};

fn slot(op: u8, dst: u8, src: u8, off: i16, imm: i32) -> [u8; 8] {
    let mut b = [0u8; 8];
    b[0] = op;
    b[1] = (src << 4) | (dst & 0x0f);
    b[2..4].copy_from_slice(&off.to_le_bytes());
    b[4..8].copy_from_slice(&imm.to_le_bytes());
    b
}

fn ld_dw(dst: u8, value: u64) -> [[u8; 8]; 2] {
    let low = (value & 0xffff_ffff) as u32 as i32;
    let high = (value >> 32) as u32 as i32;
    [slot(LD_DW_IMM, dst, 0, 0, low), slot(0, 0, 0, 0, high)]
}

fn mov_imm(dst: u8, imm: i32) -> [u8; 8] {
    slot(BPF_ALU64 | BPF_MOV | BPF_K, dst, 0, 0, imm)
}

fn call_hash(name: &[u8]) -> [u8; 8] {
    slot(CALL, 0, 0, 0, symbol_hash(name) as i32)
}

fn exit() -> [u8; 8] {
    slot(EXIT, 0, 0, 0, 0)
}

fn program_from_slots(slots: Vec<[u8; 8]>) -> LoadedProgram {
    let mut rodata = Vec::new();
    for s in &slots {
        rodata.extend_from_slice(s);
    }
    let len = rodata.len();
    LoadedProgram {
        rodata,
        text_range: 0..len,
        entry_pc: 0,
        function_table: HashMap::new(),
        syscalls_used: HashSet::new(),
        version: SbpfVersion { v2: false },
    }
}

/// Runs `program` to completion against a fresh stack/heap/input region,
/// with `input` pre-seeded by the caller. Returns the instruction count and
/// the VM's outcome; `input` is left holding whatever the guest wrote.
fn run(ctx: &mut InvokeContext<'_>, program: &LoadedProgram, input: &mut Vec<u8>) -> (u64, Result<u64, EbpfError>) {
    let config = Config::default();
    let mut stack = vec![0u8; config.stack_size()];
    let mut heap = vec![0u8; config.heap_max];
    let registry = create_registry();
    let mapping = MemoryMapping::new(vec![
        MemoryRegion::new_readonly(&program.rodata, VADDR_PROGRAM),
        MemoryRegion::new_writable(&mut stack, MM_STACK_START),
        MemoryRegion::new_writable(&mut heap, MM_HEAP_START),
        MemoryRegion::new_writable(input, MM_INPUT_START),
    ]);
    let mut vm = sbpf_vm::EbpfVm::new(program, &config, ctx, mapping, &registry);
    vm.execute_program()
}

fn empty_invoke_context<'a>(txn: &'a TransactionContext, sysvars: &'a SysvarCache) -> InvokeContext<'a> {
    InvokeContext::new(txn, sysvars, None, ComputeBudget::default())
}

#[test]
fn memcpy_match() {
    let src_addr = MM_INPUT_START;
    let dst_addr = MM_INPUT_START + 32;
    let result_addr = MM_INPUT_START + 44;
    let msg_addr = MM_INPUT_START + 48;
    let message = b"Strings matched after copy.";

    let mut slots = Vec::new();
    slots.extend(ld_dw(1, dst_addr));
    slots.extend(ld_dw(2, src_addr));
    slots.push(mov_imm(3, 11));
    slots.push(call_hash(b"memcpy"));
    slots.extend(ld_dw(1, dst_addr));
    slots.extend(ld_dw(2, src_addr));
    slots.push(mov_imm(3, 11));
    slots.extend(ld_dw(4, result_addr));
    slots.push(call_hash(b"memcmp"));
    slots.push(slot(BPF_LDX | BPF_W | BPF_MEM, 5, 4, 0, 0));
    slots.push(slot(BPF_JMP | BPF_JNE | BPF_K, 5, 0, 4, 0));
    slots.extend(ld_dw(1, msg_addr));
    slots.push(mov_imm(2, message.len() as i32));
    slots.push(call_hash(b"sol_log_"));
    slots.push(exit());
    let program = program_from_slots(slots);

    let txn = TransactionContext::new(vec![], vec![], 1_000_000);
    let sysvars = SysvarCache::default();
    let log_collector = LogCollector::new_ref(None);
    let mut ctx = InvokeContext::new(&txn, &sysvars, Some(Rc::clone(&log_collector)), ComputeBudget::default());

    let mut input = vec![0u8; 96];
    input[0..11].copy_from_slice(b"hello world");
    input[48..48 + message.len()].copy_from_slice(message);

    let (_count, result) = run(&mut ctx, &program, &mut input);
    result.expect("memcpy_match should run to completion");

    assert_eq!(&input[32..43], b"hello world");
    let recorded = log_collector.borrow();
    assert_eq!(
        recorded.get_recorded_content().to_vec(),
        vec!["Program log: Strings matched after copy.".to_string()]
    );
}

#[test]
fn memcpy_overlap() {
    let src_addr = MM_INPUT_START;
    let dst_addr = MM_INPUT_START + 5; // overlaps the 11-byte source range

    let mut slots = Vec::new();
    slots.extend(ld_dw(1, dst_addr));
    slots.extend(ld_dw(2, src_addr));
    slots.push(mov_imm(3, 11));
    slots.push(call_hash(b"memcpy"));
    slots.push(exit());
    let program = program_from_slots(slots);

    let txn = TransactionContext::new(vec![], vec![], 1_000_000);
    let sysvars = SysvarCache::default();
    let mut ctx = empty_invoke_context(&txn, &sysvars);

    let mut input = vec![0u8; 32];
    input[0..11].copy_from_slice(b"hello world");

    let (_count, result) = run(&mut ctx, &program, &mut input);
    assert_eq!(result.unwrap_err(), EbpfError::OverlappingCopy);
}

#[test]
fn panic() {
    let file = b"some_file_1234.c";
    let file_addr = MM_INPUT_START;

    let mut slots = Vec::new();
    for _ in 0..11 {
        slots.push(mov_imm(0, 0));
    }
    slots.extend(ld_dw(1, file_addr));
    slots.push(mov_imm(2, file.len() as i32));
    slots.push(mov_imm(3, 1337));
    slots.push(mov_imm(4, 10));
    slots.push(call_hash(b"sol_panic_"));
    slots.push(exit());
    let program = program_from_slots(slots);

    let txn = TransactionContext::new(vec![], vec![], 1_000_000);
    let sysvars = SysvarCache::default();
    let mut ctx = empty_invoke_context(&txn, &sysvars);

    let mut input = vec![0u8; 32];
    input[0..file.len()].copy_from_slice(file);

    let (count, result) = run(&mut ctx, &program, &mut input);
    assert_eq!(count, 16);
    let message = match result.unwrap_err() {
        EbpfError::Panic(message, _) => message,
        other => panic!("expected a Panic fault, got {other:?}"),
    };
    let diagnostic = format!("exception at {count}: SBF program Panicked in {message}");
    assert_eq!(diagnostic, "exception at 16: SBF program Panicked in some_file_1234.c at 1337:10");
}

#[test]
fn return_data() {
    let program_id = Pubkey::new_from_array([7u8; 32]);
    let account = Account::new(0, 0, &program_id);
    let txn = TransactionContext::new(vec![program_id], vec![account], 1_000_000);
    txn.push(vec![0], vec![], vec![]).expect("pushing the top-level instruction context");

    let sysvars = SysvarCache::default();
    let mut ctx = empty_invoke_context(&txn, &sysvars);

    let message = b"the quick brown fox jumps over the lazy dog\0";
    assert_eq!(message.len(), 44);
    let data_addr = MM_INPUT_START;

    let mut slots = Vec::new();
    slots.extend(ld_dw(1, data_addr));
    slots.push(mov_imm(2, message.len() as i32));
    slots.push(call_hash(b"sol_set_return_data"));
    slots.push(exit());
    let program = program_from_slots(slots);

    let mut input = vec![0u8; 64];
    input[..message.len()].copy_from_slice(message);

    let (_count, result) = run(&mut ctx, &program, &mut input);
    result.expect("sol_set_return_data should succeed");
    txn.pop(true).expect("popping the top-level instruction context");

    let (returned_program_id, returned_data) = txn.get_return_data();
    assert_eq!(returned_program_id, program_id);
    assert_eq!(returned_data, message);
}
