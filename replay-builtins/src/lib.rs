#![deny(clippy::arithmetic_side_effects)]

//! Native builtin programs plus the top-level builtin-vs-BPF dispatcher
//! (spec.md §4.I, §9). Everything here sits one layer above
//! `replay-program-runtime`: it owns the `Program` sum type, the program
//! cache, and the three native processors the replayer needs to resolve a
//! transaction without ever touching BPF bytecode.

pub mod bpf_executor;
pub mod bpf_loader;
pub mod config;
pub mod dispatcher;
pub mod ids;
pub mod system;

pub use dispatcher::{make_dispatcher, process_top_level_instruction, Program, ProgramCache};
