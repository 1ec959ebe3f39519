//! Relocator & Linker (spec.md §4.B). Fixes up `CALL` immediates to
//! PC-hashes, applies dynamic relocations, and assembles the final
//! `LoadedProgram`. Grounded on
//! `original_source/pkg/sbpf/loader/relocate.go`.

use {
    crate::{
        elf::Elf,
        error::ElfError,
        hash::{pc_hash, symbol_hash},
        program::{LoadedProgram, SbpfVersion, VADDR_PROGRAM},
        raw::{Elf64Rel, STT_FUNC},
        slot::{Slot, OP_CALL, SLOT_SIZE},
    },
    std::collections::{HashMap, HashSet},
};

/// The relocator's only dependency on the syscall registry: whether a given
/// symbol hash is a known import (spec.md §4.E is built on top of this
/// crate, not the other way around, so this is a narrow trait rather than
/// a dependency on `replay-program-runtime`).
pub trait SyscallLookup {
    fn exists_by_hash(&self, hash: u32) -> bool;
}

impl SyscallLookup for () {
    fn exists_by_hash(&self, _hash: u32) -> bool {
        false
    }
}

struct Registrar {
    funcs: HashMap<u32, u64>,
}

impl Registrar {
    fn register(&mut self, target: u64, syscalls: &dyn SyscallLookup) -> Result<u32, ElfError> {
        let hash = pc_hash(target);
        if syscalls.exists_by_hash(hash) {
            return Err(ElfError::SymbolHashCollision);
        }
        if let Some(&existing) = self.funcs.get(&hash) {
            if existing != target {
                return Err(ElfError::SymbolHashCollision);
            }
        } else {
            self.funcs.insert(hash, target);
        }
        Ok(hash)
    }
}

fn read_u32(data: &[u8], off: usize) -> Result<u32, ElfError> {
    let bytes = data
        .get(off..off.checked_add(4).ok_or(ElfError::ValueOutOfBounds)?)
        .ok_or(ElfError::ValueOutOfBounds)?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

fn write_u32(data: &mut [u8], off: usize, val: u32) -> Result<(), ElfError> {
    let end = off.checked_add(4).ok_or(ElfError::ValueOutOfBounds)?;
    let slice = data.get_mut(off..end).ok_or(ElfError::ValueOutOfBounds)?;
    slice.copy_from_slice(&val.to_le_bytes());
    Ok(())
}

fn write_reloc_address(data: &mut [u8], off: usize, addr: u64) -> Result<(), ElfError> {
    write_u32(data, off.checked_add(4).ok_or(ElfError::ValueOutOfBounds)?, addr as u32)?;
    write_u32(
        data,
        off.checked_add(12).ok_or(ElfError::ValueOutOfBounds)?,
        (addr >> 32) as u32,
    )
}

/// `clampAddUint64` in the reference implementation: saturating add, since
/// an address that would wrap is simply clamped rather than treated as a
/// fatal error (the overflow check that matters is the subsequent bounds
/// check against the text range).
fn clamp_add(a: u64, b: u64) -> u64 {
    a.saturating_add(b)
}

fn fixup_relative_calls(
    elf: &mut Elf,
    registrar: &mut Registrar,
    syscalls: &dyn SyscallLookup,
) -> Result<(), ElfError> {
    let text_range = elf.text_range();
    let slot_count = (text_range.len() / SLOT_SIZE) as u64;
    let text_start = text_range.start;
    for i in 0..slot_count {
        let off = text_start + (i as usize) * SLOT_SIZE;
        let slot = Slot::from_bytes(&elf.bytes()[off..off + SLOT_SIZE]);
        if slot.op() != OP_CALL || slot.imm() == -1 {
            continue;
        }
        let target = (i as i64)
            .checked_add(1)
            .and_then(|v| v.checked_add(slot.imm() as i64))
            .ok_or(ElfError::InvalidRelocation("call target overflow".to_string()))?;
        if target < 0 || target as u64 >= slot_count {
            return Err(ElfError::InvalidRelocation("call target out of bounds".to_string()));
        }
        let hash = registrar.register(target as u64, syscalls)?;
        write_u32(elf.bytes_mut(), off + 4, hash)?;
    }
    Ok(())
}

fn apply_reloc(
    elf: &mut Elf,
    reloc: &Elf64Rel,
    registrar: &mut Registrar,
    syscalls: &dyn SyscallLookup,
    deploy_checks: bool,
    syscalls_used: &mut HashSet<u32>,
) -> Result<(), ElfError> {
    const R_BPF_64_64: u32 = 1;
    const R_BPF_64_RELATIVE: u32 = 8;
    const R_BPF_64_32: u32 = 10;

    let r_off = reloc.r_offset as usize;
    let text_range = elf.text_range();

    match reloc.r_type() {
        R_BPF_64_64 => {
            let sym = elf.get_dynsym(reloc.r_sym())?;
            let rel_addr = read_u32(elf.bytes(), r_off + 4)?;
            let mut addr = clamp_add(sym.st_value, rel_addr as u64);
            if addr < VADDR_PROGRAM {
                addr = clamp_add(addr, VADDR_PROGRAM);
            }
            write_reloc_address(elf.bytes_mut(), r_off, addr)?;
        }
        R_BPF_64_RELATIVE => {
            if text_range.contains(&r_off) {
                let imm_low = read_u32(elf.bytes(), r_off + 4)?;
                let imm_hi = read_u32(elf.bytes(), r_off + 12)?;
                let mut addr = ((imm_hi as u64) << 32) | imm_low as u64;
                if addr == 0 {
                    return Err(ElfError::InvalidRelocation(
                        "invalid R_BPF_64_RELATIVE".to_string(),
                    ));
                }
                if addr < VADDR_PROGRAM {
                    addr = clamp_add(addr, VADDR_PROGRAM);
                }
                write_reloc_address(elf.bytes_mut(), r_off, addr)?;
            } else {
                // V1 only: the V2 8-byte-value branch is dead code per
                // spec.md §9's second Design Note ("V2 rejected at load
                // time" makes the V2 relocation arm unreachable) and is
                // intentionally not ported.
                let addr = clamp_add(read_u32(elf.bytes(), r_off + 4)? as u64, VADDR_PROGRAM);
                let end = r_off.checked_add(8).ok_or(ElfError::ValueOutOfBounds)?;
                let slice = elf
                    .bytes_mut()
                    .get_mut(r_off..end)
                    .ok_or(ElfError::ValueOutOfBounds)?;
                slice.copy_from_slice(&addr.to_le_bytes());
            }
        }
        R_BPF_64_32 => {
            let sym = elf.get_dynsym(reloc.r_sym())?;
            let name = elf.get_dynstr(sym.st_name)?;
            let hash = if sym.st_type() == STT_FUNC && sym.st_value != 0 {
                if !text_range.contains(&(sym.st_value as usize)) {
                    return Err(ElfError::InvalidRelocation(
                        "out-of-bounds R_BPF_64_32 function ref".to_string(),
                    ));
                }
                let target = (sym.st_value - text_range.start as u64) / SLOT_SIZE as u64;
                registrar.register(target, syscalls)?
            } else {
                let hash = symbol_hash(name.as_bytes());
                if deploy_checks && !syscalls.exists_by_hash(hash) {
                    return Err(ElfError::InvalidRelocation(
                        "deployment check failure: unknown syscall".to_string(),
                    ));
                }
                syscalls_used.insert(hash);
                hash
            };
            write_u32(elf.bytes_mut(), r_off + 4, hash)?;
        }
        other => {
            return Err(ElfError::InvalidRelocation(format!("unsupported reloc type {other}")))
        }
    }
    Ok(())
}

/// Links a parsed container into an executable `LoadedProgram`:
/// rewrites intra-program calls, applies dynamic relocations, and records
/// every syscall symbol referenced.
pub fn link(
    mut elf: Elf,
    syscalls: &dyn SyscallLookup,
    deploy_checks: bool,
) -> Result<LoadedProgram, ElfError> {
    let mut registrar = Registrar {
        funcs: HashMap::new(),
    };
    let mut syscalls_used = HashSet::new();

    fixup_relative_calls(&mut elf, &mut registrar, syscalls)?;

    let relocs: Vec<Elf64Rel> = match elf.relocations() {
        Some(mut it) => {
            let items: Vec<Elf64Rel> = (&mut it).collect();
            if let Some(err) = it.err() {
                return Err(err.clone());
            }
            items
        }
        None => Vec::new(),
    };
    for reloc in &relocs {
        apply_reloc(
            &mut elf,
            reloc,
            &mut registrar,
            syscalls,
            deploy_checks,
            &mut syscalls_used,
        )?;
    }

    let text_range = elf.text_range();
    let entry_pc = elf.entry_pc;
    Ok(LoadedProgram {
        rodata: elf.bytes().to_vec(),
        text_range,
        entry_pc,
        function_table: registrar.funcs,
        syscalls_used,
        version: SbpfVersion { v2: false },
    })
}
