//! Virtual memory model and bytecode interpreter (spec.md §4.C, §4.D).
//! Consumes a [`sbpf_loader::LoadedProgram`] and a syscall
//! [`program_registry::FunctionRegistry`] supplied by
//! `replay-program-runtime`, and executes it to completion.

pub mod call_frame;
pub mod config;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod opcode;
pub mod program_registry;
pub mod vm;

pub use {
    config::Config,
    context::ContextObject,
    error::EbpfError,
    memory::{MemoryMapping, MemoryRegion, MM_HEAP_START, MM_INPUT_START, MM_PROGRAM_START, MM_STACK_START},
    program_registry::{BuiltinFunction, FunctionRegistry},
    vm::EbpfVm,
};

#[cfg(test)]
mod tests;
