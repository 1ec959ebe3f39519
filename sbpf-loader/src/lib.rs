//! SBPF container parser, relocator and linker (spec.md §4.A, §4.B).
//!
//! Parses a position-independent 64-bit little-endian ELF-style container,
//! validates it against strict consensus rules, and links it into a
//! [`program::LoadedProgram`] ready for `sbpf-vm` to execute.

pub mod elf;
pub mod error;
pub mod hash;
pub mod program;
pub mod raw;
pub mod relocate;
pub mod slot;
pub mod table_iter;

pub use {
    elf::Elf,
    error::ElfError,
    program::{LoadedProgram, SbpfVersion, VADDR_PROGRAM},
    relocate::{link, SyscallLookup},
};

/// Parses and links a container in one call: the common case for
/// `replay-program-runtime`'s loader cache.
pub fn load(data: Vec<u8>, syscalls: &dyn SyscallLookup, deploy_checks: bool) -> Result<LoadedProgram, ElfError> {
    let elf = Elf::parse(data)?;
    link(elf, syscalls, deploy_checks)
}

#[cfg(test)]
mod tests;
