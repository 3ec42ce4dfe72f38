use crate::{
    Assumptions, Fdt, FdtErrorKind, Result,
    blob::{FDT_MAGIC, FDT_SW_MAGIC},
};

/// Finds `needle` as a complete NUL-terminated string in `table`.
///
/// Returns the offset of the first occurrence of `needle` followed by a NUL
/// byte. The match may begin in the middle of a longer string, so `"ame"`
/// is found inside `"name\0"`.
#[must_use]
pub fn find_string(table: &[u8], needle: &[u8]) -> Option<usize> {
    table.windows(needle.len() + 1).position(|window| {
        window
            .split_last()
            .is_some_and(|(&nul, s)| nul == 0 && s == needle)
    })
}

impl<'blob> Fdt<'blob> {
    /// Reads the NUL-terminated string at `offset` in the strings block.
    ///
    /// The returned slice excludes the terminator.
    pub fn get_string(&self, offset: usize) -> Result<&'blob [u8]> {
        let bytes = self.as_bytes();
        let absolute = self
            .header()
            .strings_block_offset()
            .checked_add(offset)
            .ok_or(FdtErrorKind::BadOffset { offset })?;
        let mut end = bytes.len();

        if !self.can_assume(Assumptions::VALID_INPUT) {
            let total_size = self.probe()?;
            ensure!(absolute < total_size, FdtErrorKind::BadOffset { offset });
            end = end.min(total_size);
            match self.magic() {
                FDT_MAGIC => {
                    if self.has_struct_size() {
                        let size = self.header().strings_block_size();
                        ensure!(offset < size, FdtErrorKind::BadOffset { offset });
                        end = end.min(absolute.saturating_add(size - offset));
                    }
                }
                FDT_SW_MAGIC => bail!(FdtErrorKind::BadState),
                magic => bail!(FdtErrorKind::BadMagic { magic }),
            }
        }

        let s = bytes.get(absolute..end).ok_or(FdtErrorKind::Truncated)?;
        let len = s
            .iter()
            .position(|&b| b == 0)
            .ok_or(FdtErrorKind::Truncated)?;
        Ok(&s[..len])
    }
}
