//! Container parser (spec.md §4.A). Validates a 64-bit little-endian
//! ELF-style file against the consensus rules and indexes its header,
//! section, segment and dynamic tables. Grounded on
//! `original_source/pkg/sbpf/loader/parse.go`.

use {
    crate::{
        error::ElfError,
        raw::*,
        table_iter::{lookup_from_table, TableIter},
    },
    std::collections::HashMap,
};

fn is_overlap(start_a: u64, size_a: u64, start_b: u64, size_b: u64) -> Result<bool, ElfError> {
    let (start_a, size_a, start_b, size_b) = if start_a > start_b {
        (start_b, size_b, start_a, size_a)
    } else {
        (start_a, size_a, start_b, size_b)
    };
    let end_a = start_a.checked_add(size_a).ok_or(ElfError::ValueOutOfBounds)?;
    let end_b = start_b.checked_add(size_b).ok_or(ElfError::ValueOutOfBounds)?;
    Ok(size_a != 0 && size_b != 0 && (start_a == start_b || end_a > end_b))
}

/// A parsed-and-validated container: the raw file bytes plus the header
/// tables the relocator and interpreter need. File offsets double as
/// virtual addresses for the single loadable segment, matching the SBF
/// toolchain's requirement that `p_offset == p_vaddr`.
pub struct Elf {
    pub(crate) data: Vec<u8>,
    pub ehdr: Elf64Ehdr,
    pub ph_load: Option<Elf64Phdr>,
    pub ph_dynamic: Option<Elf64Phdr>,
    pub sh_shstrtab: Elf64Shdr,
    pub sh_dynamic: Option<Elf64Shdr>,
    pub sh_text: Elf64Shdr,
    pub sh_symtab: Option<Elf64Shdr>,
    pub sh_strtab: Option<Elf64Shdr>,
    pub sh_dynstr: Option<Elf64Shdr>,
    pub sh_dynsym: Option<Elf64Shdr>,
    pub(crate) dynamic: HashMap<i64, u64>,
    pub(crate) reloc_table: Option<(usize, usize)>,
    pub entry_pc: u64,
}

impl Elf {
    pub fn parse(data: Vec<u8>) -> Result<Self, ElfError> {
        let file_size = data.len() as u64;
        let ehdr = read_header(&data)?;
        validate_elf_header(&ehdr, file_size)?;

        let ph_table = read_program_header_table(&data, &ehdr)?;
        let (ph_load, ph_dynamic) = scan_program_headers(&ph_table, file_size)?;

        let sh_table = read_section_header_table(&data, &ehdr)?;
        let sh_shstrtab = find_shstrtab(&sh_table, &ehdr, file_size)?;

        let mut sections = Sections::default();
        scan_sections(&data, &sh_table, &sh_shstrtab, &mut sections)?;

        let mut dynamic = HashMap::new();
        let mut reloc_table = None;
        if let Some((off, size)) =
            dynamic_table_range(&ph_dynamic, &sections.sh_dynamic, file_size)?
        {
            parse_dynamic_tags(&data, off, size, &mut dynamic)?;
            reloc_table = parse_relocs_range(&data, &ph_table, &sh_table, &dynamic, file_size)?;
        }
        let sh_dynsym = find_dynsym(&sh_table, &dynamic, file_size)?;

        let sh_text = sections.sh_text.ok_or(ElfError::MissingText)?;
        let entry_pc = check_entrypoint(&sh_text, ehdr.e_entry)?;

        Ok(Self {
            data,
            ehdr,
            ph_load,
            ph_dynamic,
            sh_shstrtab,
            sh_dynamic: sections.sh_dynamic,
            sh_text,
            sh_symtab: sections.sh_symtab,
            sh_strtab: sections.sh_strtab,
            sh_dynstr: sections.sh_dynstr,
            sh_dynsym,
            dynamic,
            reloc_table,
            entry_pc,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn text_range(&self) -> std::ops::Range<usize> {
        let start = self.sh_text.sh_addr as usize;
        let end = start + self.sh_text.sh_size as usize;
        start..end
    }

    pub fn get_string(
        &self,
        strtab: &Elf64Shdr,
        stroff: u32,
        max_len: usize,
    ) -> Result<String, ElfError> {
        get_string(&self.data, strtab, stroff, max_len)
    }

    pub fn get_dynsym(&self, idx: u32) -> Result<Elf64Sym, ElfError> {
        let sh = self.sh_dynsym.as_ref().ok_or(ElfError::InvalidRelocation(
            "no dynamic symbol table".to_string(),
        ))?;
        lookup_from_table(
            &self.data,
            sh.sh_offset as usize,
            sh.sh_size as usize,
            idx,
            SYM_LEN,
        )
    }

    pub fn get_dynstr(&self, name: u32) -> Result<String, ElfError> {
        let sh = self
            .sh_dynstr
            .as_ref()
            .ok_or(ElfError::InvalidRelocation("no .dynstr".to_string()))?;
        self.get_string(sh, name, MAX_SYMBOL_NAME_LEN)
    }

    pub fn relocations(&self) -> Option<TableIter<'_, Elf64Rel>> {
        self.reloc_table
            .map(|(off, size)| TableIter::new(&self.data, off, (size / REL_LEN) as u32, REL_LEN))
    }
}

fn read_header(data: &[u8]) -> Result<Elf64Ehdr, ElfError> {
    let bytes = data.get(0..EH_LEN).ok_or(ElfError::NotAnELF)?;
    bytemuck::try_pod_read_unaligned::<Elf64Ehdr>(bytes).map_err(|_| ElfError::NotAnELF)
}

fn validate_elf_header(eh: &Elf64Ehdr, file_size: u64) -> Result<(), ElfError> {
    if &eh.e_ident[0..4] != b"\x7fELF" {
        return Err(ElfError::NotAnELF);
    }
    if eh.e_ident[EI_CLASS] != ELFCLASS64
        || eh.e_ident[EI_DATA] != ELFDATA2LSB
        || eh.e_ident[EI_VERSION] != EV_CURRENT
        || eh.e_ident[EI_OSABI] != ELFOSABI_NONE
        || eh.e_type != ET_DYN
        || (eh.e_machine != EM_BPF && eh.e_machine != EM_SBPF)
        || eh.e_version != 1
    {
        return Err(ElfError::IncompatibleBinary);
    }
    if eh.e_ehsize as usize != EH_LEN
        || eh.e_phentsize as usize != PH_ENT_LEN
        || eh.e_shentsize as usize != SH_ENT_LEN
        || eh.e_shstrndx >= eh.e_shnum
    {
        return Err(ElfError::InvalidELF);
    }
    if eh.e_flags == EF_SBPF_V2 {
        return Err(ElfError::UnsupportedSBPFVersion);
    }
    if eh.e_phoff < EH_LEN as u64 || eh.e_shoff < EH_LEN as u64 {
        return Err(ElfError::OverlappingRegions);
    }
    let ph_table_size = (eh.e_phnum as u64).saturating_mul(PH_ENT_LEN as u64);
    let sh_table_size = (eh.e_shnum as u64).saturating_mul(SH_ENT_LEN as u64);
    if is_overlap(eh.e_phoff, ph_table_size, eh.e_shoff, sh_table_size)? {
        return Err(ElfError::OverlappingRegions);
    }
    let ph_end = eh.e_phoff.checked_add(ph_table_size).ok_or(ElfError::ValueOutOfBounds)?;
    let sh_end = eh.e_shoff.checked_add(sh_table_size).ok_or(ElfError::ValueOutOfBounds)?;
    if ph_end > file_size || sh_end > file_size {
        return Err(ElfError::SegmentOutOfBounds);
    }
    Ok(())
}

fn read_program_header_table(data: &[u8], eh: &Elf64Ehdr) -> Result<Vec<Elf64Phdr>, ElfError> {
    let iter: TableIter<'_, Elf64Phdr> = TableIter::new(
        data,
        eh.e_phoff as usize,
        eh.e_phnum as u32,
        PH_ENT_LEN,
    );
    collect_checked(iter)
}

fn read_section_header_table(data: &[u8], eh: &Elf64Ehdr) -> Result<Vec<Elf64Shdr>, ElfError> {
    let iter: TableIter<'_, Elf64Shdr> = TableIter::new(
        data,
        eh.e_shoff as usize,
        eh.e_shnum as u32,
        SH_ENT_LEN,
    );
    collect_checked(iter)
}

fn collect_checked<T: bytemuck::Pod>(mut iter: TableIter<'_, T>) -> Result<Vec<T>, ElfError> {
    let mut out = Vec::new();
    for item in &mut iter {
        out.push(item);
    }
    if let Some(err) = iter.err() {
        return Err(err.clone());
    }
    Ok(out)
}

fn scan_program_headers(
    ph_table: &[Elf64Phdr],
    file_size: u64,
) -> Result<(Option<Elf64Phdr>, Option<Elf64Phdr>), ElfError> {
    let mut ph_dynamic = None;
    let mut ph_load: Option<Elf64Phdr> = None;
    for ph in ph_table {
        match ph.p_type {
            PT_DYNAMIC => {
                if ph_dynamic.is_none() {
                    ph_dynamic = Some(*ph);
                }
            }
            PT_LOAD => {
                if let Some(prev) = &ph_load {
                    if ph.p_vaddr < prev.p_vaddr {
                        return Err(ElfError::InvalidELF);
                    }
                }
                let segment_end = ph
                    .p_offset
                    .checked_add(ph.p_filesz)
                    .ok_or(ElfError::SegmentOutOfBounds)?;
                if segment_end > file_size {
                    return Err(ElfError::SegmentOutOfBounds);
                }
                ph_load = Some(*ph);
            }
            _ => {}
        }
    }
    Ok((ph_load, ph_dynamic))
}

fn find_shstrtab(
    sh_table: &[Elf64Shdr],
    eh: &Elf64Ehdr,
    _file_size: u64,
) -> Result<Elf64Shdr, ElfError> {
    let first = sh_table.first().ok_or(ElfError::InvalidELF)?;
    if first.sh_type != SHT_NULL {
        return Err(ElfError::InvalidELF);
    }
    let sh = sh_table
        .get(eh.e_shstrndx as usize)
        .ok_or(ElfError::InvalidELF)?;
    if sh.sh_type != SHT_STRTAB {
        return Err(ElfError::InvalidELF);
    }
    Ok(*sh)
}

#[derive(Default)]
struct Sections {
    sh_text: Option<Elf64Shdr>,
    sh_symtab: Option<Elf64Shdr>,
    sh_strtab: Option<Elf64Shdr>,
    sh_dynstr: Option<Elf64Shdr>,
    sh_dynamic: Option<Elf64Shdr>,
}

fn scan_sections(
    data: &[u8],
    sh_table: &[Elf64Shdr],
    shstrtab: &Elf64Shdr,
    sections: &mut Sections,
) -> Result<(), ElfError> {
    let mut prev_end = 0u64;
    for (i, sh) in sh_table.iter().enumerate() {
        if sh.sh_type == SHT_DYNAMIC && sections.sh_dynamic.is_none() {
            sections.sh_dynamic = Some(*sh);
        }
        if sh.sh_type == SHT_NOBITS {
            // .bss-equivalent sections have no backing file range to check.
        } else {
            let sh_end = sh
                .sh_offset
                .checked_add(sh.sh_size)
                .ok_or(ElfError::ValueOutOfBounds)?;
            if i != 0 && sh.sh_offset < EH_LEN as u64 {
                return Err(ElfError::OverlappingRegions);
            }
            if sh_end > data.len() as u64 {
                return Err(ElfError::SegmentOutOfBounds);
            }
            if sh.sh_offset < prev_end {
                // Sections are expected in file-offset order; a later
                // section starting before the previous one ended is an
                // overlap.
                return Err(ElfError::OverlappingRegions);
            }
            prev_end = sh_end;
        }

        if i == 0 {
            continue;
        }
        let name = get_string(data, shstrtab, sh.sh_name, MAX_SECTION_NAME_LEN)?;
        if name == ".bss" || name.starts_with(".bss") {
            return Err(ElfError::WritableSectionNotSupported(name));
        }
        let writable_alloc = (sh.sh_flags & (SHF_ALLOC | SHF_WRITE)) == (SHF_ALLOC | SHF_WRITE);
        if writable_alloc && name.starts_with(".data") && !name.starts_with(".data.rel") {
            return Err(ElfError::WritableSectionNotSupported(name));
        }
        match name.as_str() {
            ".text" => set_once(&mut sections.sh_text, sh, &name)?,
            ".symtab" => set_once(&mut sections.sh_symtab, sh, &name)?,
            ".strtab" => set_once(&mut sections.sh_strtab, sh, &name)?,
            ".dynstr" => set_once(&mut sections.sh_dynstr, sh, &name)?,
            _ => {}
        }
    }
    Ok(())
}

fn set_once(slot: &mut Option<Elf64Shdr>, sh: &Elf64Shdr, name: &str) -> Result<(), ElfError> {
    if slot.is_some() {
        return Err(ElfError::DuplicateSection(name.to_string()));
    }
    *slot = Some(*sh);
    Ok(())
}

fn get_string(
    data: &[u8],
    strtab: &Elf64Shdr,
    stroff: u32,
    max_len: usize,
) -> Result<String, ElfError> {
    if strtab.sh_type != SHT_STRTAB {
        return Err(ElfError::InvalidELF);
    }
    let start = strtab
        .sh_offset
        .checked_add(stroff as u64)
        .ok_or(ElfError::ValueOutOfBounds)? as usize;
    let end = start.checked_add(max_len).ok_or(ElfError::ValueOutOfBounds)?;
    let bytes = data.get(start..end.min(data.len())).ok_or(ElfError::ValueOutOfBounds)?;
    let nul = bytes.iter().position(|&b| b == 0).ok_or(ElfError::ValueOutOfBounds)?;
    String::from_utf8(bytes[..nul].to_vec()).map_err(|_| ElfError::InvalidELF)
}

fn dynamic_table_range(
    ph_dynamic: &Option<Elf64Phdr>,
    sh_dynamic: &Option<Elf64Shdr>,
    file_size: u64,
) -> Result<Option<(u64, u64)>, ElfError> {
    let (off, size) = if let Some(ph) = ph_dynamic {
        (ph.p_offset, ph.p_filesz)
    } else if let Some(sh) = sh_dynamic {
        (sh.sh_offset, sh.sh_size)
    } else {
        return Ok(None);
    };
    let end = off.checked_add(size).ok_or(ElfError::ValueOutOfBounds)?;
    if end > file_size {
        return Err(ElfError::ValueOutOfBounds);
    }
    Ok(Some((off, size)))
}

fn parse_dynamic_tags(
    data: &[u8],
    off: u64,
    size: u64,
    dynamic: &mut HashMap<i64, u64>,
) -> Result<(), ElfError> {
    let count = (size / DYN_LEN as u64) as u32;
    let iter: TableIter<'_, Elf64Dyn> = TableIter::new(data, off as usize, count, DYN_LEN);
    for dyn_entry in iter {
        if dyn_entry.d_tag == DT_NULL {
            break;
        }
        if dyn_entry.d_tag >= DT_NUM {
            continue;
        }
        dynamic.insert(dyn_entry.d_tag, dyn_entry.d_val);
    }
    Ok(())
}

fn section_at(sh_table: &[Elf64Shdr], vaddr: u64) -> Option<Elf64Shdr> {
    sh_table.iter().find(|sh| sh.sh_addr == vaddr).copied()
}

fn segment_by_vaddr(ph_table: &[Elf64Phdr], vaddr: u64) -> Result<Option<Elf64Phdr>, ElfError> {
    for ph in ph_table {
        let end = ph
            .p_vaddr
            .checked_add(ph.p_memsz)
            .ok_or(ElfError::ValueOutOfBounds)?;
        if ph.p_vaddr <= vaddr && vaddr < end {
            return Ok(Some(*ph));
        }
    }
    Ok(None)
}

/// Locates the `.rel.dyn`-equivalent relocation table via `DT_REL`,
/// resolving its virtual address to a file offset. Retains the source's
/// subtract-then-add-back sanity bound on the segment-relative offset
/// (spec.md §9, "Open question" — see DESIGN.md for the resolution).
fn parse_relocs_range(
    data: &[u8],
    ph_table: &[Elf64Phdr],
    sh_table: &[Elf64Shdr],
    dynamic: &HashMap<i64, u64>,
    file_size: u64,
) -> Result<Option<(usize, usize)>, ElfError> {
    let vaddr = match dynamic.get(&DT_REL) {
        Some(&v) if v != 0 => v,
        _ => return Ok(None),
    };
    if dynamic.get(&DT_RELENT).copied() != Some(REL_LEN as u64) {
        return Err(ElfError::InvalidRelocation("bad DT_RELENT".to_string()));
    }
    let size = dynamic.get(&DT_RELSZ).copied().unwrap_or(0);
    if size == 0 || size % REL_LEN as u64 != 0 || size > u32::MAX as u64 {
        return Err(ElfError::InvalidRelocation("bad DT_RELSZ".to_string()));
    }

    let offset = if let Some(ph) = segment_by_vaddr(ph_table, vaddr)? {
        let relative = vaddr
            .checked_sub(ph.p_vaddr)
            .ok_or(ElfError::ValueOutOfBounds)?;
        relative
            .checked_add(ph.p_vaddr)
            .ok_or(ElfError::ValueOutOfBounds)?
    } else {
        let sh = section_at(sh_table, vaddr)
            .ok_or_else(|| ElfError::InvalidRelocation("DT_REL not in any segment".to_string()))?;
        sh.sh_offset
    };
    let end = offset.checked_add(size).ok_or(ElfError::ValueOutOfBounds)?;
    if end > file_size {
        return Err(ElfError::ValueOutOfBounds);
    }
    Ok(Some((offset as usize, size as usize)))
}

fn find_dynsym(
    sh_table: &[Elf64Shdr],
    dynamic: &HashMap<i64, u64>,
    _file_size: u64,
) -> Result<Option<Elf64Shdr>, ElfError> {
    let vaddr = match dynamic.get(&DT_SYMTAB) {
        Some(&v) if v != 0 => v,
        _ => return Ok(None),
    };
    let sh = section_at(sh_table, vaddr)
        .ok_or_else(|| ElfError::InvalidRelocation("cannot find DT_SYMTAB section".to_string()))?;
    if sh.sh_type != SHT_SYMTAB && sh.sh_type != SHT_DYNSYM {
        return Err(ElfError::InvalidRelocation("not a symtab section".to_string()));
    }
    Ok(Some(sh))
}

/// `offset = entry_point − text.start`; must be 8-aligned and inside text
/// (spec.md Invariant 1).
fn check_entrypoint(sh_text: &Elf64Shdr, entry: u64) -> Result<u64, ElfError> {
    let start = sh_text.sh_addr;
    let end = start.checked_add(sh_text.sh_size).unwrap_or(u64::MAX);
    if entry < start || entry >= end {
        return Err(ElfError::InvalidEntrypoint);
    }
    let offset = entry - start;
    if offset % 8 != 0 {
        return Err(ElfError::InvalidEntrypoint);
    }
    Ok(offset / 8)
}
