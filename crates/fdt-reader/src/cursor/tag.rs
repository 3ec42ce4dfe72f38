use bstr::BStr;
use dataview::{DataView, Pod};
use endian::Be;
use platform_cast::CastFrom as _;

use crate::{
    Assumptions, Fdt, FdtErrorKind, Result, blob::MAX_TOTAL_SIZE, debug::HexDebug as _,
};

/// Starts a node; followed by the NUL-terminated node name.
pub const FDT_BEGIN_NODE: u32 = 0x0000_0001;
/// Ends the innermost open node.
pub const FDT_END_NODE: u32 = 0x0000_0002;
/// A property; followed by a [`PropertyHeader`] and the value.
pub const FDT_PROP: u32 = 0x0000_0003;
/// Padding.
pub const FDT_NOP: u32 = 0x0000_0004;
/// Ends the structure block.
pub const FDT_END: u32 = 0x0000_0009;

/// Size and alignment of a structure-block tag.
pub const FDT_TAG_SIZE: usize = size_of::<u32>();

/// The fixed part of a property record following [`FDT_PROP`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod)]
pub struct PropertyHeader {
    len: Be<u32>,
    name_offset: Be<u32>,
}

impl PropertyHeader {
    #[must_use]
    pub fn new(len: u32, name_offset: u32) -> Self {
        Self {
            len: len.into(),
            name_offset: name_offset.into(),
        }
    }

    #[must_use]
    #[expect(clippy::len_without_is_empty)]
    pub fn len(&self) -> u32 {
        self.len.read()
    }

    #[must_use]
    pub fn name_offset(&self) -> u32 {
        self.name_offset.read()
    }
}

/// A decoded structure-block tag.
#[derive(derive_more::Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Tag<'blob> {
    BeginNode {
        /// The node name, without its NUL terminator.
        #[debug("{:?}", BStr::new(name))]
        name: &'blob [u8],
    },
    EndNode,
    Prop {
        len: u32,
        name_offset: u32,
        #[debug("{:?}", value.hex_debug(16))]
        value: &'blob [u8],
    },
    Nop,
    End,
}

impl Tag<'_> {
    /// Returns the wire value of this tag.
    #[must_use]
    pub fn raw(&self) -> u32 {
        match self {
            Self::BeginNode { .. } => FDT_BEGIN_NODE,
            Self::EndNode => FDT_END_NODE,
            Self::Prop { .. } => FDT_PROP,
            Self::Nop => FDT_NOP,
            Self::End => FDT_END,
        }
    }
}

/// A tag together with the offset of the tag following it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextTag<'blob> {
    pub tag: Tag<'blob>,
    /// Offset of the next tag, aligned to [`FDT_TAG_SIZE`].
    pub next_offset: usize,
}

impl<'blob> Fdt<'blob> {
    /// Decodes the tag at structure-block offset `offset`.
    ///
    /// Fails with [`FdtErrorKind::Truncated`] if the tag or its payload runs
    /// past the structure block, and with [`FdtErrorKind::BadStructure`] on
    /// an unknown tag value.
    ///
    /// In blobs older than version 0x10, property values of 8 bytes or more
    /// start at the next 8-byte boundary of the structure block.
    pub fn next_tag(&self, offset: usize) -> Result<NextTag<'blob>> {
        let start = offset;
        let tag_bytes = self
            .offset_ptr(start, FDT_TAG_SIZE)
            .ok_or(FdtErrorKind::Truncated)?;
        let raw = endian::read_be_u32(tag_bytes, 0).ok_or(FdtErrorKind::Truncated)?;
        let mut offset = start + FDT_TAG_SIZE;

        let tag = match raw {
            FDT_BEGIN_NODE => {
                let tail = self.struct_tail(offset).ok_or(FdtErrorKind::Truncated)?;
                let name_len = tail
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(FdtErrorKind::Truncated)?;
                offset += name_len + 1;
                Tag::BeginNode {
                    name: &tail[..name_len],
                }
            }
            FDT_PROP => {
                let header_bytes = self
                    .offset_ptr(offset, size_of::<PropertyHeader>())
                    .ok_or(FdtErrorKind::Truncated)?;
                let header = DataView::from(header_bytes)
                    .try_read::<PropertyHeader>(0)
                    .ok_or(FdtErrorKind::Truncated)?;
                let len = usize::cast_from(header.len());
                if !self.can_assume(Assumptions::VALID_DTB) {
                    ensure!(
                        offset
                            .checked_add(len)
                            .is_some_and(|sum| sum < MAX_TOTAL_SIZE),
                        FdtErrorKind::Truncated
                    );
                }
                let mut value_offset = offset + size_of::<PropertyHeader>();
                if self.is_legacy() && len >= 8 && !value_offset.is_multiple_of(8) {
                    value_offset += 4;
                }
                let value = self
                    .offset_ptr(value_offset, len)
                    .ok_or(FdtErrorKind::Truncated)?;
                offset = value_offset + len;
                Tag::Prop {
                    len: header.len(),
                    name_offset: header.name_offset(),
                    value,
                }
            }
            FDT_END_NODE => Tag::EndNode,
            FDT_NOP => Tag::Nop,
            FDT_END => Tag::End,
            _ => bail!(FdtErrorKind::BadStructure { offset: start }),
        };

        ensure!(
            self.offset_ptr(start, offset - start).is_some(),
            FdtErrorKind::Truncated
        );
        let next_offset = offset
            .checked_next_multiple_of(FDT_TAG_SIZE)
            .ok_or(FdtErrorKind::Truncated)?;
        Ok(NextTag { tag, next_offset })
    }
}
