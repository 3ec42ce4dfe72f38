pub use self::{tag::*, tags::*};

mod tag;
mod tags;

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use alloc::{format, vec::Vec};

    use dataview::PodMethods as _;

    use super::*;
    use crate::{
        Assumptions, Fdt, FdtErrorKind,
        testing::{BlobBuilder, BlockBuilder},
    };

    fn build(block: &BlockBuilder, version: u32) -> crate::testing::AlignedBlob {
        BlobBuilder::new().version(version).blocks(block).build()
    }

    #[test]
    fn test_property_header() {
        let header = PropertyHeader::new(42, 100);
        assert_eq!(header.len(), 42);
        assert_eq!(header.name_offset(), 100);
        assert_eq!(header.as_bytes(), &[0, 0, 0, 42, 0, 0, 0, 100]);
    }

    #[test]
    fn test_next_tag_sequence() {
        let mut block = BlockBuilder::new();
        block
            .begin_node(b"")
            .prop(b"compatible", b"acme,board\0")
            .nop()
            .begin_node(b"cpus")
            .end_node()
            .end_node()
            .end();
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();

        let next = fdt.next_tag(0).unwrap();
        assert_eq!(next.tag, Tag::BeginNode { name: b"" });
        assert_eq!(next.next_offset, 8);

        let next = fdt.next_tag(8).unwrap();
        let Tag::Prop {
            len,
            name_offset,
            value,
        } = next.tag
        else {
            panic!("expected a property: {next:?}");
        };
        assert_eq!(len, 11);
        assert_eq!(name_offset, 0);
        assert_eq!(value, b"acme,board\0");
        // tag + header + 11 byte value, padded to 4
        assert_eq!(next.next_offset, 8 + 12 + 12);

        let kinds = fdt
            .tags()
            .map(|res| res.map(|(_, tag)| tag.raw()))
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            kinds,
            [
                FDT_BEGIN_NODE,
                FDT_PROP,
                FDT_NOP,
                FDT_BEGIN_NODE,
                FDT_END_NODE,
                FDT_END_NODE,
                FDT_END,
            ]
        );
    }

    #[test]
    fn test_next_offset_is_aligned() {
        let mut block = BlockBuilder::new();
        block
            .begin_node(b"")
            .begin_node(b"a")
            .prop(b"x", b"\x01")
            .prop(b"y", b"\x01\x02\x03\x04\x05")
            .end_node()
            .end_node()
            .end();
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        let mut offset = 0;
        loop {
            let next = fdt.next_tag(offset).unwrap();
            assert!(next.next_offset > offset);
            assert_eq!(next.next_offset % FDT_TAG_SIZE, 0);
            if next.tag.is_end() {
                break;
            }
            offset = next.next_offset;
        }
    }

    #[test]
    fn test_unknown_tag() {
        let mut block = BlockBuilder::new();
        block.begin_node(b"").token(0x42).end();
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        let err = fdt.next_tag(8).unwrap_err();
        assert_eq!(err, FdtErrorKind::BadStructure { offset: 8 });

        let mut tags = fdt.tags();
        assert!(tags.next().unwrap().is_ok());
        assert!(tags.next().unwrap().is_err());
        assert!(tags.next().is_none());
    }

    #[test]
    fn test_truncated_name() {
        let mut block = BlockBuilder::new();
        block.token(FDT_BEGIN_NODE).raw(b"abcd");
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.next_tag(0).unwrap_err(), FdtErrorKind::Truncated);
    }

    #[test]
    fn test_truncated_property_value() {
        let mut block = BlockBuilder::new();
        block
            .token(FDT_PROP)
            .raw(PropertyHeader::new(64, 0).as_bytes())
            .raw(&[0; 8]);
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.next_tag(0).unwrap_err(), FdtErrorKind::Truncated);
    }

    #[test]
    fn test_overflowing_property_length() {
        let mut block = BlockBuilder::new();
        block
            .token(FDT_PROP)
            .raw(PropertyHeader::new(u32::MAX - 2, 0).as_bytes());
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.next_tag(0).unwrap_err(), FdtErrorKind::Truncated);
    }

    #[test]
    fn test_tag_past_struct_block() {
        let mut block = BlockBuilder::new();
        block.begin_node(b"").end_node().end();
        let blob = build(&block, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        let size = fdt.header().struct_block_size();
        assert_eq!(fdt.next_tag(size).unwrap_err(), FdtErrorKind::Truncated);
        assert_eq!(
            fdt.next_tag(usize::MAX - 1).unwrap_err(),
            FdtErrorKind::Truncated
        );
    }

    #[test]
    fn test_legacy_value_padding() {
        let value = 0x0102_0304_0506_0708_u64.to_be_bytes();
        let mut legacy = BlockBuilder::new();
        legacy
            .legacy_value_alignment(true)
            .begin_node(b"")
            .prop(b"reg", &value)
            .end_node()
            .end();
        let blob = build(&legacy, 0x0f);
        let fdt = Fdt::with_assumptions(&blob, Assumptions::VALID_DTB).unwrap();
        // root tag + empty name occupies 8 bytes, so the value starts at 20
        // and is moved to 24
        let next = fdt.next_tag(8).unwrap();
        let Tag::Prop { value: read, .. } = next.tag else {
            panic!("expected a property: {next:?}");
        };
        assert_eq!(read, value);
        assert_eq!(next.next_offset, 32);

        // the same bytes read as a version 0x11 blob have no padding
        let mut latest = BlockBuilder::new();
        latest.begin_node(b"").prop(b"reg", &value).end_node().end();
        let blob = build(&latest, 0x11);
        let fdt = Fdt::new(&blob).unwrap();
        let next = fdt.next_tag(8).unwrap();
        let Tag::Prop { value: read, .. } = next.tag else {
            panic!("expected a property: {next:?}");
        };
        assert_eq!(read, value);
        assert_eq!(next.next_offset, 28);
    }

    #[test]
    fn test_tag_debug() {
        let tag = Tag::BeginNode { name: b"cpu@0" };
        assert_eq!(format!("{tag:?}"), r#"BeginNode { name: "cpu@0" }"#);
        let tag = Tag::Prop {
            len: 2,
            name_offset: 4,
            value: &[0xab, 0xcd],
        };
        assert_eq!(
            format!("{tag:?}"),
            "Prop { len: 2, name_offset: 4, value: [ab cd] }"
        );
    }
}
