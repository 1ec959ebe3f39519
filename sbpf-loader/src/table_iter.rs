//! Lazy, finite, non-restartable iterator over a densely packed table of
//! fixed-size records inside the file (spec.md §4.A "exposes iterators...
//! each a finite, non-restartable lazy sequence with explicit `next`/
//! `index`/`error` semantics"; spec.md §9 Design Notes "Iterator style").
//! Grounded on `original_source/pkg/sbpf/loader/parse.go`'s `tableIter[T]`.

use {crate::error::ElfError, bytemuck::Pod, std::marker::PhantomData};

pub struct TableIter<'a, T> {
    data: &'a [u8],
    off: usize,
    index: u32,
    count: u32,
    elem_size: usize,
    err: Option<ElfError>,
    _marker: PhantomData<T>,
}

impl<'a, T: Pod> TableIter<'a, T> {
    /// Builds an iterator over `count` elements of `elem_size` bytes each,
    /// starting at byte offset `off` in `data`. Does not itself bounds
    /// check `off + count * elem_size` against `data.len()` — that happens
    /// lazily, one `next()` at a time, matching the reference's behavior of
    /// surfacing an out-of-bounds read as an iteration error rather than a
    /// constructor error.
    pub fn new(data: &'a [u8], off: usize, count: u32, elem_size: usize) -> Self {
        Self {
            data,
            off,
            index: 0,
            count,
            elem_size,
            err: None,
            _marker: PhantomData,
        }
    }

    /// Like `new`, but bounds-checks `[start, end)` against `data.len()`
    /// and the element size evenly dividing the range up front (mirrors
    /// `newTableIteratorChecked`).
    pub fn new_checked(
        data: &'a [u8],
        start: usize,
        end: usize,
        elem_size: usize,
    ) -> Result<Self, ElfError> {
        if end < start || end > data.len() {
            return Err(ElfError::ValueOutOfBounds);
        }
        let size = end - start;
        if elem_size == 0 || size % elem_size != 0 {
            return Err(ElfError::InvalidELF);
        }
        let count = (size / elem_size) as u32;
        Ok(Self::new(data, start, count, elem_size))
    }

    pub fn err(&self) -> Option<&ElfError> {
        self.err.as_ref()
    }

    /// Current 0-based table index; valid only after `next()` returned
    /// `Some`.
    pub fn index(&self) -> u32 {
        self.index.saturating_sub(1)
    }
}

impl<'a, T: Pod> Iterator for TableIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.err.is_some() || self.index >= self.count {
            return None;
        }
        let end = match self.off.checked_add(self.elem_size) {
            Some(end) => end,
            None => {
                self.err = Some(ElfError::ValueOutOfBounds);
                return None;
            }
        };
        let bytes = match self.data.get(self.off..end) {
            Some(bytes) => bytes,
            None => {
                self.err = Some(ElfError::ValueOutOfBounds);
                return None;
            }
        };
        let item = match bytemuck::try_pod_read_unaligned::<T>(bytes) {
            Ok(item) => item,
            Err(_) => {
                self.err = Some(ElfError::InvalidELF);
                return None;
            }
        };
        self.off = end;
        self.index = self.index.saturating_add(1);
        Some(item)
    }
}

/// Point-select into a densely packed table without building an iterator
/// (mirrors `lookupFromTable`).
pub fn lookup_from_table<T: Pod>(
    data: &[u8],
    table_off: usize,
    table_size: usize,
    index: u32,
    elem_size: usize,
) -> Result<T, ElfError> {
    let off = (index as usize)
        .checked_mul(elem_size)
        .ok_or(ElfError::ValueOutOfBounds)?;
    if off >= table_size {
        return Err(ElfError::ValueOutOfBounds);
    }
    let start = table_off.checked_add(off).ok_or(ElfError::ValueOutOfBounds)?;
    let end = start.checked_add(elem_size).ok_or(ElfError::ValueOutOfBounds)?;
    let bytes = data.get(start..end).ok_or(ElfError::ValueOutOfBounds)?;
    bytemuck::try_pod_read_unaligned::<T>(bytes).map_err(|_| ElfError::InvalidELF)
}
