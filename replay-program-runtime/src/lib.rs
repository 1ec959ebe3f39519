#![deny(clippy::arithmetic_side_effects)]

//! Ties the SBPF loader/VM (`sbpf-loader`, `sbpf-vm`) to the transaction
//! context (`replay-transaction-context`) and sysvar store
//! (`replay-sysvar`): the invocation context every syscall runs against,
//! the compute budget, the log collector/`stable_log` formatter, and the
//! syscall registry itself (spec.md §4.E, §4.H).

pub mod compute_budget;
pub mod invoke_context;
pub mod log_collector;
pub mod stable_log;
pub mod syscalls;

pub use {
    compute_budget::ComputeBudget,
    invoke_context::{BpfAllocator, Dispatcher, InvokeContext},
    log_collector::LogCollector,
    syscalls::create_registry,
};
