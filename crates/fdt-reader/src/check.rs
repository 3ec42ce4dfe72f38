use crate::{Fdt, FdtErrorKind, Result, cursor::Tag};

impl Fdt<'_> {
    /// Validates the whole blob.
    ///
    /// On top of [`Fdt::check_header`], this checks that the blob fits in the
    /// given bytes, that the memory reservation list is terminated, and that
    /// the structure block is a single tree with an unnamed root whose tags,
    /// property names, and values all decode.
    pub fn check_full(&self) -> Result<()> {
        let len = self.as_bytes().len();
        ensure!(len >= self.header_size(), FdtErrorKind::Truncated);
        self.check_header()?;
        ensure!(len >= self.total_size(), FdtErrorKind::Truncated);
        self.num_mem_rsv()?;

        let mut depth = 0_usize;
        let mut expect_end = false;
        let mut next_offset = 0;
        loop {
            let offset = next_offset;
            let next = self.next_tag(offset)?;
            next_offset = next.next_offset;

            if next.tag.is_nop() {
                continue;
            }
            // anything after the root node other than END is a second tree
            ensure!(
                !expect_end || next.tag.is_end(),
                FdtErrorKind::BadStructure { offset }
            );
            match next.tag {
                Tag::Nop => {}
                Tag::End => {
                    ensure!(depth == 0, FdtErrorKind::BadStructure { offset });
                    return Ok(());
                }
                Tag::BeginNode { .. } => {
                    depth += 1;
                    if depth == 1 {
                        let name = self.get_name(offset)?;
                        ensure!(name.is_empty(), FdtErrorKind::BadStructure { offset });
                    }
                }
                Tag::EndNode => {
                    ensure!(depth > 0, FdtErrorKind::BadStructure { offset });
                    depth -= 1;
                    expect_end = depth == 0;
                }
                Tag::Prop { .. } => {
                    self.get_property_by_offset(offset)?;
                }
            }
        }
    }
}
