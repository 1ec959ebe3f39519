use {
    crate::{elf::Elf, error::ElfError, raw::*},
    bytemuck::bytes_of,
};

/// Assembles the smallest container that `Elf::parse` accepts: one `.text`
/// section holding a single `EXIT` instruction, identity-mapped (file
/// offset == virtual address) as the SBF toolchain requires, and no
/// program headers (no `PT_LOAD`/`PT_DYNAMIC` segments — parsing does not
/// require them, only `.text` and a valid entrypoint).
fn build_minimal_container(mutate_ehdr: impl FnOnce(&mut Elf64Ehdr)) -> Vec<u8> {
    let mut shstrtab_data = vec![0u8];
    let text_name_off = shstrtab_data.len() as u32;
    shstrtab_data.extend_from_slice(b".text\0");
    let shstrtab_name_off = shstrtab_data.len() as u32;
    shstrtab_data.extend_from_slice(b".shstrtab\0");

    let text_data: Vec<u8> = vec![0x95, 0, 0, 0, 0, 0, 0, 0]; // EXIT, imm=0

    let text_off = EH_LEN as u64;
    let text_size = text_data.len() as u64;
    let shstrtab_off = text_off + text_size;
    let shstrtab_size = shstrtab_data.len() as u64;
    let sh_off = shstrtab_off + shstrtab_size;

    let sh_null = Elf64Shdr::default();
    let sh_text = Elf64Shdr {
        sh_name: text_name_off,
        sh_type: 1, // SHT_PROGBITS
        sh_flags: SHF_ALLOC,
        sh_addr: text_off,
        sh_offset: text_off,
        sh_size: text_size,
        sh_link: 0,
        sh_info: 0,
        sh_addralign: 8,
        sh_entsize: 0,
    };
    let sh_shstrtab = Elf64Shdr {
        sh_name: shstrtab_name_off,
        sh_type: SHT_STRTAB,
        sh_flags: 0,
        sh_addr: 0,
        sh_offset: shstrtab_off,
        sh_size: shstrtab_size,
        sh_link: 0,
        sh_info: 0,
        sh_addralign: 1,
        sh_entsize: 0,
    };

    let mut ehdr = Elf64Ehdr::default();
    ehdr.e_ident[0..4].copy_from_slice(b"\x7fELF");
    ehdr.e_ident[EI_CLASS] = ELFCLASS64;
    ehdr.e_ident[EI_DATA] = ELFDATA2LSB;
    ehdr.e_ident[EI_VERSION] = EV_CURRENT;
    ehdr.e_ident[EI_OSABI] = ELFOSABI_NONE;
    ehdr.e_type = ET_DYN;
    ehdr.e_machine = EM_SBPF;
    ehdr.e_version = 1;
    ehdr.e_entry = text_off;
    ehdr.e_phoff = EH_LEN as u64;
    ehdr.e_shoff = sh_off;
    ehdr.e_flags = 0;
    ehdr.e_ehsize = EH_LEN as u16;
    ehdr.e_phentsize = PH_ENT_LEN as u16;
    ehdr.e_phnum = 0;
    ehdr.e_shentsize = SH_ENT_LEN as u16;
    ehdr.e_shnum = 3;
    ehdr.e_shstrndx = 2;
    mutate_ehdr(&mut ehdr);

    let mut data = Vec::new();
    data.extend_from_slice(bytes_of(&ehdr));
    data.extend_from_slice(&text_data);
    data.extend_from_slice(&shstrtab_data);
    data.extend_from_slice(bytes_of(&sh_null));
    data.extend_from_slice(bytes_of(&sh_text));
    data.extend_from_slice(bytes_of(&sh_shstrtab));
    data
}

#[test]
fn parses_minimal_valid_container() {
    let data = build_minimal_container(|_| {});
    let elf = Elf::parse(data).unwrap();
    assert_eq!(elf.entry_pc, 0);
    assert_eq!(elf.text_range(), 64..72);
}

#[test]
fn rejects_bad_magic() {
    let mut data = build_minimal_container(|_| {});
    data[0] = 0;
    assert_eq!(Elf::parse(data).unwrap_err(), ElfError::NotAnELF);
}

#[test]
fn rejects_sbpf_v2_flag() {
    let data = build_minimal_container(|eh| eh.e_flags = EF_SBPF_V2);
    assert_eq!(
        Elf::parse(data).unwrap_err(),
        ElfError::UnsupportedSBPFVersion
    );
}

#[test]
fn rejects_wrong_machine() {
    let data = build_minimal_container(|eh| eh.e_machine = 0);
    assert_eq!(Elf::parse(data).unwrap_err(), ElfError::IncompatibleBinary);
}

#[test]
fn rejects_misaligned_entrypoint() {
    let data = build_minimal_container(|eh| eh.e_entry += 1);
    assert_eq!(Elf::parse(data).unwrap_err(), ElfError::InvalidEntrypoint);
}

#[test]
fn rejects_truncated_header() {
    let data = build_minimal_container(|_| {})[..32].to_vec();
    assert_eq!(Elf::parse(data).unwrap_err(), ElfError::NotAnELF);
}
