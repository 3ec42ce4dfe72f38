use core::{iter::FusedIterator, ops::Range};

use dataview::{DataView, Pod};
use endian::Be;

use super::Fdt;
use crate::{Assumptions, FdtErrorKind, Result};

/// An entry of the memory reservation block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod)]
pub struct ReserveEntry {
    address: Be<u64>,
    size: Be<u64>,
}

impl ReserveEntry {
    #[must_use]
    pub fn new(address: u64, size: u64) -> Self {
        Self {
            address: address.into(),
            size: size.into(),
        }
    }

    #[must_use]
    pub fn address(&self) -> u64 {
        self.address.read()
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size.read()
    }

    /// Whether this entry ends the reservation list.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.size() == 0
    }

    #[must_use]
    pub fn address_range(&self) -> Range<u64> {
        let start = self.address();
        start..start.saturating_add(self.size())
    }
}

impl<'blob> Fdt<'blob> {
    fn reserve_entry(&self, n: usize) -> Option<ReserveEntry> {
        let entry_size = size_of::<ReserveEntry>();
        let absolute = n
            .checked_mul(entry_size)?
            .checked_add(self.header().memory_reservation_block_offset())?;
        if !self.can_assume(Assumptions::VALID_INPUT)
            && absolute.checked_add(entry_size)? > self.total_size()
        {
            return None;
        }
        let bytes = self.as_bytes().get(absolute..)?;
        DataView::from(bytes).try_read::<ReserveEntry>(0)
    }

    /// Returns the `n`-th memory reservation entry.
    ///
    /// The index is not checked against the terminator.
    pub fn mem_rsv(&self, n: usize) -> Result<ReserveEntry> {
        self.probe()?;
        self.reserve_entry(n)
            .ok_or_else(|| FdtErrorKind::BadOffset { offset: n }.into())
    }

    /// Counts the memory reservation entries before the terminator.
    pub fn num_mem_rsv(&self) -> Result<usize> {
        let mut n = 0;
        loop {
            let entry = self.reserve_entry(n).ok_or(FdtErrorKind::Truncated)?;
            if entry.is_terminator() {
                return Ok(n);
            }
            n += 1;
        }
    }

    /// Returns an iterator over the memory reservation entries.
    #[must_use]
    pub fn reserve_entries(&self) -> ReserveEntries<'blob> {
        ReserveEntries {
            fdt: *self,
            index: 0,
            done: false,
        }
    }
}

/// Iterator returned by [`Fdt::reserve_entries`].
///
/// Yields one [`FdtErrorKind::Truncated`] error if the list runs off the
/// end of the blob before its terminator.
#[derive(Debug, Clone)]
pub struct ReserveEntries<'blob> {
    fdt: Fdt<'blob>,
    index: usize,
    done: bool,
}

impl Iterator for ReserveEntries<'_> {
    type Item = Result<ReserveEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(entry) = self.fdt.reserve_entry(self.index) else {
            self.done = true;
            return Some(Err(FdtErrorKind::Truncated.into()));
        };
        if entry.is_terminator() {
            self.done = true;
            return None;
        }
        self.index += 1;
        Some(Ok(entry))
    }
}

impl FusedIterator for ReserveEntries<'_> {}
