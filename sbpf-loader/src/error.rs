//! Loader error taxonomy (spec.md §7, "Loader errors"). Mirrors the
//! teacher's `thiserror`-derived style: one `#[error("...")]` variant per
//! distinct failure, `PartialEq`/`Eq`/`Clone` so conformance tests can
//! assert on the exact tag.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ElfError {
    #[error("not an ELF file")]
    NotAnELF,

    #[error("incompatible binary")]
    IncompatibleBinary,

    #[error("invalid ELF file")]
    InvalidELF,

    #[error("unsupported SBPF version")]
    UnsupportedSBPFVersion,

    #[error("overlapping regions")]
    OverlappingRegions,

    #[error("segment out of bounds")]
    SegmentOutOfBounds,

    #[error("value out of bounds")]
    ValueOutOfBounds,

    #[error("writable section not supported: {0}")]
    WritableSectionNotSupported(String),

    #[error("invalid entrypoint")]
    InvalidEntrypoint,

    #[error("duplicate section: {0}")]
    DuplicateSection(String),

    #[error("missing .text section")]
    MissingText,

    #[error("symbol hash collision")]
    SymbolHashCollision,

    #[error("invalid relocation: {0}")]
    InvalidRelocation(String),
}
