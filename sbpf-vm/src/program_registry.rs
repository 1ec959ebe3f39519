//! The syscall registry's shape, as seen from the interpreter (spec.md
//! §4.E): a symbol-hash keyed table of host functions. `replay-program-
//! runtime` owns the actual handler implementations and the `C` context
//! type; this crate only needs the calling convention.

use {crate::error::EbpfError, std::collections::HashMap};

/// A host function reachable from the guest via `CALL <symbol-hash>`.
/// Mirrors the teacher's `BuiltinFunction<C>`: up to five register
/// arguments, mutable access to the context object and the memory
/// mapping, returning the value written into `r0` or a fault.
pub type BuiltinFunction<C> =
    fn(&mut C, u64, u64, u64, u64, u64, &mut crate::memory::MemoryMapping) -> Result<u64, EbpfError>;

pub struct FunctionRegistry<C> {
    entries: HashMap<u32, BuiltinFunction<C>>,
}

impl<C> Default for FunctionRegistry<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C> FunctionRegistry<C> {
    pub fn register(&mut self, hash: u32, function: BuiltinFunction<C>) {
        self.entries.insert(hash, function);
    }

    pub fn lookup(&self, hash: u32) -> Option<BuiltinFunction<C>> {
        self.entries.get(&hash).copied()
    }

    pub fn contains(&self, hash: u32) -> bool {
        self.entries.contains_key(&hash)
    }
}

impl<C> sbpf_loader::SyscallLookup for FunctionRegistry<C> {
    fn exists_by_hash(&self, hash: u32) -> bool {
        self.contains(hash)
    }
}
