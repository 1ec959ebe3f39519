//! The fully linked, relocated program ready to execute (spec.md §3,
//! "Loaded Program").

use std::collections::{HashMap, HashSet};

/// Base of the program's own rodata/text region in the unified virtual
/// address space (spec.md §6 "Virtual address map"). The other three base
/// addresses (stack/heap/input) live in `sbpf-vm`, which owns the rest of
/// the memory model.
pub const VADDR_PROGRAM: u64 = 0x1_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbpfVersion {
    /// Always V1 here: `spec.md` §4.A rejects `EF_SBPF_V2` at load time, so
    /// this tag exists only to be asserted, never branched on.
    pub v2: bool,
}

pub struct LoadedProgram {
    /// Contiguous bytes containing `.text`, indexed directly by virtual
    /// address (the loader requires `p_offset == p_vaddr` for the sole
    /// loadable segment, so file offsets double as addresses).
    pub rodata: Vec<u8>,
    pub text_range: std::ops::Range<usize>,
    pub entry_pc: u64,
    pub function_table: HashMap<u32, u64>,
    pub syscalls_used: HashSet<u32>,
    pub version: SbpfVersion,
}

impl LoadedProgram {
    pub fn text_slot_count(&self) -> u64 {
        (self.text_range.len() / crate::slot::SLOT_SIZE) as u64
    }
}
