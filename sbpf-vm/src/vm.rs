//! The virtual machine: register file, call stack and memory mapping
//! tied together (spec.md §4.C, §4.D). Grounded on the teacher's
//! `EbpfVm`, trimmed to the fields this interpreter (no JIT, no
//! debugger) actually needs.

use crate::{
    call_frame::CallFrame,
    config::Config,
    context::ContextObject,
    error::EbpfError,
    interpreter,
    memory::MemoryMapping,
    program_registry::FunctionRegistry,
};

pub const SCRATCH_REGS: usize = 11;

pub struct EbpfVm<'a, C: ContextObject> {
    pub registers: [u64; SCRATCH_REGS],
    pub pc: u64,
    pub memory_mapping: MemoryMapping<'a>,
    pub call_frames: Vec<CallFrame>,
    pub call_depth: usize,
    pub context_object: &'a mut C,
    pub config: &'a Config,
    pub program: &'a sbpf_loader::LoadedProgram,
    pub syscalls: &'a FunctionRegistry<C>,
}

impl<'a, C: ContextObject> EbpfVm<'a, C> {
    pub fn new(
        program: &'a sbpf_loader::LoadedProgram,
        config: &'a Config,
        context_object: &'a mut C,
        memory_mapping: MemoryMapping<'a>,
        syscalls: &'a FunctionRegistry<C>,
    ) -> Self {
        let mut registers = [0u64; SCRATCH_REGS];
        registers[10] = crate::memory::MM_STACK_START + config.stack_size() as u64;
        Self {
            registers,
            pc: program.entry_pc,
            memory_mapping,
            call_frames: vec![CallFrame::default(); config.max_call_depth],
            call_depth: 0,
            context_object,
            config,
            program,
            syscalls,
        }
    }

    /// Runs to completion. Returns the number of instructions executed and
    /// either the guest's `r0` or the fault that ended execution.
    pub fn execute_program(&mut self) -> (u64, Result<u64, EbpfError>) {
        interpreter::run(self)
    }
}
