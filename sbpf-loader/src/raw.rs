//! Raw on-disk ELF64 structures, laid out exactly as the file format
//! specifies so they can be reinterpreted directly from a byte slice with
//! `bytemuck` (zero-copy, matching the reference toolchain's own
//! `elf_parser` style). Field names follow the standard ELF64 spec, not
//! Rust convention, since they are a wire format, not an API.

#![allow(non_camel_case_types)]

use bytemuck::{Pod, Zeroable};

pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_OSABI: usize = 7;

pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const EV_CURRENT: u8 = 1;
pub const ELFOSABI_NONE: u8 = 0;
pub const ET_DYN: u16 = 3;
pub const EM_BPF: u16 = 247;
pub const EM_SBPF: u16 = 263;
pub const EF_SBPF_V2: u32 = 32;

pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;

pub const SHT_NULL: u32 = 0;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_DYNSYM: u32 = 11;

pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;

pub const STT_FUNC: u8 = 2;

pub const DT_NULL: i64 = 0;
pub const DT_SYMTAB: i64 = 6;
pub const DT_REL: i64 = 17;
pub const DT_RELSZ: i64 = 18;
pub const DT_RELENT: i64 = 19;
/// `DT_NUM` in the reference implementation: dynamic tags at or above this
/// value are not tracked in the sparse tag table.
pub const DT_NUM: i64 = 35;

pub const EH_LEN: usize = 0x40;
pub const PH_ENT_LEN: usize = 0x38;
pub const SH_ENT_LEN: usize = 0x40;
pub const DYN_LEN: usize = 0x10;
pub const REL_LEN: usize = 0x10;
pub const SYM_LEN: usize = 0x18;

pub const MAX_SECTION_NAME_LEN: usize = 16;
pub const MAX_SYMBOL_NAME_LEN: usize = 1024;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Elf64Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Elf64Phdr {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Elf64Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Elf64Sym {
    pub st_name: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

impl Elf64Sym {
    pub fn st_type(&self) -> u8 {
        self.st_info & 0xf
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Elf64Rel {
    pub r_offset: u64,
    pub r_info: u64,
}

impl Elf64Rel {
    pub fn r_type(&self) -> u32 {
        self.r_info as u32
    }

    pub fn r_sym(&self) -> u32 {
        (self.r_info >> 32) as u32
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Elf64Dyn {
    pub d_tag: i64,
    pub d_val: u64,
}
