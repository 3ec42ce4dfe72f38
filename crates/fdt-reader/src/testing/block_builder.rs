use alloc::{collections::btree_map::BTreeMap, vec::Vec};
use core::iter;

use dataview::PodMethods as _;

use crate::cursor::{
    FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_NOP, FDT_PROP, FDT_TAG_SIZE, PropertyHeader,
};

/// Assembles a structure block and its strings block tag by tag.
///
/// Property names are interned in the strings block. Tags are padded to
/// [`FDT_TAG_SIZE`] automatically; everything else is written verbatim, so
/// malformed blocks can be built as easily as well-formed ones.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    struct_block: Vec<u8>,
    strings_block: Vec<u8>,
    name_offsets: BTreeMap<Vec<u8>, u32>,
    legacy_value_alignment: bool,
}

impl BlockBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aligns property values of 8 bytes or more to 8 bytes, as blobs older
    /// than version 0x10 do.
    pub fn legacy_value_alignment(&mut self, enabled: bool) -> &mut Self {
        self.legacy_value_alignment = enabled;
        self
    }

    /// Appends bytes to the structure block without any padding.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.struct_block.extend_from_slice(bytes);
        self
    }

    /// Appends bytes to the strings block.
    pub fn raw_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.strings_block.extend_from_slice(bytes);
        self
    }

    pub fn pad_to(&mut self, align: usize) -> &mut Self {
        let rem = self.struct_block.len() % align;
        if rem != 0 {
            self.struct_block.extend(iter::repeat_n(0, align - rem));
        }
        self
    }

    pub fn token(&mut self, token: u32) -> &mut Self {
        self.pad_to(FDT_TAG_SIZE).raw(&token.to_be_bytes())
    }

    pub fn begin_node(&mut self, name: &[u8]) -> &mut Self {
        self.token(FDT_BEGIN_NODE).raw(name).raw(&[0])
    }

    pub fn end_node(&mut self) -> &mut Self {
        self.token(FDT_END_NODE)
    }

    /// Appends a property whose name is at `name_offset` in the strings block.
    pub fn prop_raw(&mut self, name_offset: u32, value: &[u8]) -> &mut Self {
        #[expect(clippy::missing_panics_doc)]
        let len = u32::try_from(value.len()).unwrap();
        self.token(FDT_PROP)
            .raw(PropertyHeader::new(len, name_offset).as_bytes());
        if self.legacy_value_alignment && value.len() >= 8 {
            self.pad_to(8);
        }
        self.raw(value)
    }

    pub fn prop(&mut self, name: &[u8], value: &[u8]) -> &mut Self {
        let name_offset = self.intern(name);
        self.prop_raw(name_offset, value)
    }

    /// Returns the strings block offset of `name`, adding it if necessary.
    pub fn intern(&mut self, name: &[u8]) -> u32 {
        if let Some(&offset) = self.name_offsets.get(name) {
            return offset;
        }
        #[expect(clippy::missing_panics_doc)]
        let offset = u32::try_from(self.strings_block.len()).unwrap();
        self.strings_block.extend_from_slice(name);
        self.strings_block.push(0);
        self.name_offsets.insert(name.to_vec(), offset);
        offset
    }

    pub fn nop(&mut self) -> &mut Self {
        self.token(FDT_NOP)
    }

    pub fn end(&mut self) -> &mut Self {
        self.token(FDT_END)
    }

    #[must_use]
    pub fn struct_block(&self) -> &[u8] {
        &self.struct_block
    }

    #[must_use]
    pub fn strings_block(&self) -> &[u8] {
        &self.strings_block
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_to() {
        let mut builder = BlockBuilder::new();
        builder.raw(&[1, 2, 3]).pad_to(4);
        assert_eq!(builder.struct_block(), [1, 2, 3, 0]);
        builder.pad_to(4);
        assert_eq!(builder.struct_block().len(), 4);
    }

    #[test]
    fn test_begin_and_end_node() {
        let mut builder = BlockBuilder::new();
        builder.begin_node(b"cpus").end_node();
        assert_eq!(
            builder.struct_block(),
            [0, 0, 0, 1, b'c', b'p', b'u', b's', 0, 0, 0, 0, 0, 0, 0, 2]
        );
    }

    #[test]
    fn test_prop_interns_names() {
        let mut builder = BlockBuilder::new();
        builder
            .prop(b"reg", &[0, 0, 0, 1])
            .prop(b"status", b"okay\0")
            .prop(b"reg", &[0, 0, 0, 2]);
        assert_eq!(builder.strings_block(), b"reg\0status\0");
        assert_eq!(builder.intern(b"status"), 4);
        assert_eq!(&builder.struct_block()[..12], [0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_legacy_value_alignment() {
        let mut builder = BlockBuilder::new();
        builder
            .legacy_value_alignment(true)
            .begin_node(b"")
            .prop(b"reg", &[0xff; 8]);
        // value would start at 20 and is moved to 24
        assert_eq!(builder.struct_block().len(), 32);
        assert_eq!(&builder.struct_block()[20..24], [0; 4]);

        let mut builder = BlockBuilder::new();
        builder
            .legacy_value_alignment(true)
            .begin_node(b"")
            .prop(b"reg", &[0xff; 4]);
        assert_eq!(builder.struct_block().len(), 24);
    }
}
