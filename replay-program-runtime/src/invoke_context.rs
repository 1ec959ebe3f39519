//! The context object threaded through every syscall and through the VM's
//! [`sbpf_vm::ContextObject`] hook (spec.md §4.E/§4.H). Grounded on the
//! `InvokeContext` shape used by program-runtime implementations in this
//! corpus, adapted to this workspace's `&self`-based `TransactionContext`
//! (spec.md §9: accounts are leased through interior mutability, so this
//! struct can hold a shared reference rather than the teacher's `&'a mut`).

use {
    crate::{compute_budget::ComputeBudget, log_collector::LogCollector},
    replay_sdk::{instruction_error::InstructionError, Instruction, Pubkey},
    replay_sysvar::SysvarCache,
    replay_transaction_context::TransactionContext,
    sbpf_vm::{context::ContextObject, memory::MM_HEAP_START},
    std::{alloc::Layout, cell::RefCell, fmt, rc::Rc},
};

/// Recursive entry point for cross-program invocation (spec.md §4.E "Cross
/// program invocation"), supplied by the top-level dispatcher (the
/// `Program = Builtin | BPF` sum described in spec.md §9) so this crate
/// never has to depend on the builtins/verifier crates that implement it.
/// `extra_signers` carries the PDAs authorized by the caller's seeds.
pub type Dispatcher<'a> =
    dyn Fn(&InvokeContext<'a>, Instruction, &[Pubkey]) -> Result<(), InstructionError> + 'a;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AllocErr;

impl fmt::Display for AllocErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("heap allocator out of space")
    }
}

impl std::error::Error for AllocErr {}

/// Bump allocator over the guest heap region (spec.md §4.D memory map),
/// backing the `sol_alloc_free_` syscall. Never frees; a program that
/// allocates past `heap_size` faults instead of silently wrapping.
pub struct BpfAllocator {
    len: u64,
    pos: u64,
}

impl BpfAllocator {
    pub fn new(len: u64) -> Self {
        Self { len, pos: 0 }
    }

    pub fn alloc(&mut self, layout: Layout) -> Result<u64, AllocErr> {
        let align_offset = (self.pos as *const u8).align_offset(layout.align()) as u64;
        let end = self
            .pos
            .checked_add(align_offset)
            .and_then(|p| p.checked_add(layout.size() as u64))
            .ok_or(AllocErr)?;
        if end > self.len {
            return Err(AllocErr);
        }
        let addr = MM_HEAP_START.saturating_add(self.pos.saturating_add(align_offset));
        self.pos = end;
        Ok(addr)
    }
}

/// Everything a syscall handler or the interpreter needs for the lifetime of
/// one transaction's execution (spec.md §4.H: one `InvokeContext` per
/// replayed transaction, reused across every CPI frame via `push`/`pop`).
pub struct InvokeContext<'a> {
    pub transaction_context: &'a TransactionContext,
    pub sysvar_cache: &'a SysvarCache,
    pub log_collector: Option<Rc<RefCell<LogCollector>>>,
    pub compute_budget: ComputeBudget,
    pub heap_allocator: BpfAllocator,
    pub dispatch: Option<&'a Dispatcher<'a>>,
    trace_log: Vec<[u64; 12]>,
}

impl<'a> InvokeContext<'a> {
    pub fn new(
        transaction_context: &'a TransactionContext,
        sysvar_cache: &'a SysvarCache,
        log_collector: Option<Rc<RefCell<LogCollector>>>,
        compute_budget: ComputeBudget,
    ) -> Self {
        let heap_allocator = BpfAllocator::new(compute_budget.heap_size as u64);
        Self {
            transaction_context,
            sysvar_cache,
            log_collector,
            compute_budget,
            heap_allocator,
            dispatch: None,
            trace_log: Vec::new(),
        }
    }

    pub fn with_dispatcher(mut self, dispatch: &'a Dispatcher<'a>) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn trace_log(&self) -> &[[u64; 12]] {
        &self.trace_log
    }

    pub fn get_stack_height(&self) -> usize {
        self.transaction_context.get_instruction_context_stack_height()
    }

    pub fn set_return_data(&self, program_id: Pubkey, data: Vec<u8>) -> Result<(), InstructionError> {
        self.transaction_context.set_return_data(program_id, data)
    }

    pub fn get_return_data(&self) -> (Pubkey, Vec<u8>) {
        self.transaction_context.get_return_data()
    }

    /// Writes a line to the attached log collector, if any (spec.md §1
    /// ambient stack). A no-op when logging wasn't requested for this run.
    pub fn log(&self, message: &str) {
        crate::stable_log::program_log(&self.log_collector, message);
    }
}

impl<'a> ContextObject for InvokeContext<'a> {
    fn trace(&mut self, state: [u64; 12]) {
        self.trace_log.push(state);
    }

    fn consume(&mut self, amount: u64) {
        // `ContextObject::consume` is infallible; exhaustion is surfaced
        // separately by the interpreter checking `get_remaining() == 0`
        // (spec.md §4.D compute metering).
        let _ = self.transaction_context.consume_compute_units(amount);
    }

    fn get_remaining(&self) -> u64 {
        self.transaction_context.remaining_compute_units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_hands_out_increasing_aligned_addresses() {
        let mut allocator = BpfAllocator::new(64);
        let first = allocator.alloc(Layout::from_size_align(8, 8).unwrap()).unwrap();
        let second = allocator.alloc(Layout::from_size_align(8, 8).unwrap()).unwrap();
        assert_eq!(first, MM_HEAP_START);
        assert_eq!(second, MM_HEAP_START.saturating_add(8));
    }

    #[test]
    fn allocator_rejects_overflow() {
        let mut allocator = BpfAllocator::new(8);
        assert!(allocator.alloc(Layout::from_size_align(16, 8).unwrap()).is_err());
    }
}
