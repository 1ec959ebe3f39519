use {
    crate::{
        config::Config,
        context::TestContextObject,
        error::EbpfError,
        memory::{MemoryMapping, MemoryRegion, MM_HEAP_START, MM_INPUT_START, MM_STACK_START},
        opcode::*,
        program_registry::FunctionRegistry,
        vm::EbpfVm,
    },
    sbpf_loader::{program::SbpfVersion, LoadedProgram},
    std::collections::{HashMap, HashSet},
};

fn slot(op: u8, dst: u8, src: u8, off: i16, imm: i32) -> [u8; 8] {
    let mut b = [0u8; 8];
    b[0] = op;
    b[1] = (src << 4) | (dst & 0x0f);
    b[2..4].copy_from_slice(&off.to_le_bytes());
    b[4..8].copy_from_slice(&imm.to_le_bytes());
    b
}

fn program_from_slots(slots: Vec<[u8; 8]>) -> LoadedProgram {
    program_from_slots_with_funcs(slots, HashMap::new())
}

fn program_from_slots_with_funcs(slots: Vec<[u8; 8]>, function_table: HashMap<u32, u64>) -> LoadedProgram {
    let mut rodata = Vec::new();
    for s in &slots {
        rodata.extend_from_slice(s);
    }
    let len = rodata.len();
    LoadedProgram {
        rodata,
        text_range: 0..len,
        entry_pc: 0,
        function_table,
        syscalls_used: HashSet::new(),
        version: SbpfVersion { v2: false },
    }
}

struct Fixture {
    config: Config,
    ctx: TestContextObject,
    stack: Vec<u8>,
    heap: Vec<u8>,
    input: Vec<u8>,
}

impl Fixture {
    fn new(budget: u64) -> Self {
        let config = Config::default();
        Self {
            stack: vec![0u8; config.stack_size()],
            heap: vec![0u8; config.heap_max],
            input: vec![0u8; 64],
            config,
            ctx: TestContextObject::new(budget),
        }
    }

    fn mapping<'a>(&'a mut self, program: &'a LoadedProgram) -> MemoryMapping<'a> {
        MemoryMapping::new(vec![
            MemoryRegion::new_readonly(&program.rodata, sbpf_loader::VADDR_PROGRAM),
            MemoryRegion::new_writable(&mut self.stack, MM_STACK_START),
            MemoryRegion::new_writable(&mut self.heap, MM_HEAP_START),
            MemoryRegion::new_writable(&mut self.input, MM_INPUT_START),
        ])
    }
}

#[test]
fn mov_imm_then_exit_returns_value() {
    let program = program_from_slots(vec![
        slot(BPF_ALU64 | BPF_MOV | BPF_K, 0, 0, 0, 7),
        slot(EXIT, 0, 0, 0, 0),
    ]);
    let mut fx = Fixture::new(100);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    let (count, result) = vm.execute_program();
    assert_eq!(result.unwrap(), 7);
    assert_eq!(count, 2);
}

#[test]
fn add_imm_accumulates() {
    let program = program_from_slots(vec![
        slot(BPF_ALU64 | BPF_MOV | BPF_K, 1, 0, 0, 5),
        slot(BPF_ALU64 | BPF_ADD | BPF_K, 1, 0, 0, 3),
        slot(BPF_ALU64 | BPF_MOV | BPF_X, 0, 1, 0, 0),
        slot(EXIT, 0, 0, 0, 0),
    ]);
    let mut fx = Fixture::new(100);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    assert_eq!(vm.execute_program().1.unwrap(), 8);
}

#[test]
fn division_by_zero_is_fatal() {
    let program = program_from_slots(vec![
        slot(BPF_ALU64 | BPF_MOV | BPF_K, 0, 0, 0, 10),
        slot(BPF_ALU64 | BPF_MOV | BPF_K, 1, 0, 0, 0),
        slot(BPF_ALU64 | BPF_DIV | BPF_X, 0, 1, 0, 0),
        slot(EXIT, 0, 0, 0, 0),
    ]);
    let mut fx = Fixture::new(100);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    assert_eq!(vm.execute_program().1.unwrap_err(), EbpfError::DivideByZero);
}

#[test]
fn stack_store_then_load_round_trips() {
    let program = program_from_slots(vec![
        slot(BPF_ALU64 | BPF_MOV | BPF_K, 1, 0, 0, 42),
        slot(BPF_STX | BPF_DW | BPF_MEM, 10, 1, -8, 0),
        slot(BPF_LDX | BPF_DW | BPF_MEM, 0, 10, -8, 0),
        slot(EXIT, 0, 0, 0, 0),
    ]);
    let mut fx = Fixture::new(100);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    assert_eq!(vm.execute_program().1.unwrap(), 42);
}

#[test]
fn exceeding_compute_budget_faults() {
    let program = program_from_slots(vec![slot(BPF_JMP | BPF_JA, 0, 0, -1, 0)]);
    let mut fx = Fixture::new(3);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    assert_eq!(
        vm.execute_program().1.unwrap_err(),
        EbpfError::ExceededMaxInstructions
    );
}

#[test]
fn call_to_unknown_hash_is_fatal() {
    let program = program_from_slots(vec![slot(CALL, 0, 0, 0, 0xdead_beefu32 as i32)]);
    let mut fx = Fixture::new(100);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    assert_eq!(
        vm.execute_program().1.unwrap_err(),
        EbpfError::UnresolvedFunction(0xdead_beef)
    );
}

#[test]
fn internal_call_preserves_callee_saved_registers_and_returns() {
    // slot 0: mov r6, 99
    // slot 1: call hash(=1) -> jumps to slot 3
    // slot 2: mov r0, r6 ; exit   (resumed after the callee returns)
    // slot 3: mov r0, 1 ; exit    (the callee: return value ignored by caller)
    let mut function_table = HashMap::new();
    function_table.insert(1u32, 4u64);
    let program = program_from_slots_with_funcs(
        vec![
            slot(BPF_ALU64 | BPF_MOV | BPF_K, 6, 0, 0, 99),
            slot(CALL, 0, 0, 0, 1),
            slot(BPF_ALU64 | BPF_MOV | BPF_X, 0, 6, 0, 0),
            slot(EXIT, 0, 0, 0, 0),
            slot(BPF_ALU64 | BPF_MOV | BPF_K, 0, 0, 0, 1),
            slot(EXIT, 0, 0, 0, 0),
        ],
        function_table,
    );
    let mut fx = Fixture::new(100);
    let mapping = fx.mapping(&program);
    let syscalls: FunctionRegistry<TestContextObject> = FunctionRegistry::default();
    let mut vm = EbpfVm::new(&program, &fx.config, &mut fx.ctx, mapping, &syscalls);
    assert_eq!(vm.execute_program().1.unwrap(), 99);
}
