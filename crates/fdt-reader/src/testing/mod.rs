//! Builders for hand-crafted devicetree blobs.

pub use self::{blob_builder::*, block_builder::*};
pub use crate::AlignedBlob;
use crate::blob::ReserveEntry;

mod blob_builder;
mod block_builder;

/// Builds a small but complete board description.
///
/// ```text
/// /memreserve/ 0x80000000 0x10000;
/// / {
///     #address-cells = <2>;
///     #size-cells = <2>;
///     model = "acme,board";
///     compatible = "acme,board", "acme,soc";
///     aliases {
///         serial0 = "/soc/serial@10000000";
///     };
///     chosen {
///         stdout-path = "serial0";
///     };
///     cpus {
///         cpu@0 { device_type = "cpu"; reg = <0>; };
///         cpu@1 { device_type = "cpu"; reg = <1>; };
///     };
///     memory@80000000 {
///         device_type = "memory";
///         reg = <0x0 0x80000000 0x0 0x8000000>;
///     };
///     soc {
///         serial@10000000 { compatible = "ns16550a"; };
///     };
/// };
/// ```
#[must_use]
pub fn sample_blob() -> AlignedBlob {
    let mut block = BlockBuilder::new();
    block
        .begin_node(b"")
        .prop(b"#address-cells", &2_u32.to_be_bytes())
        .prop(b"#size-cells", &2_u32.to_be_bytes())
        .prop(b"model", b"acme,board\0")
        .prop(b"compatible", b"acme,board\0acme,soc\0")
        .begin_node(b"aliases")
        .prop(b"serial0", b"/soc/serial@10000000\0")
        .end_node()
        .begin_node(b"chosen")
        .prop(b"stdout-path", b"serial0\0")
        .end_node()
        .begin_node(b"cpus");
    for (name, reg) in [(&b"cpu@0"[..], 0_u32), (&b"cpu@1"[..], 1)] {
        block
            .begin_node(name)
            .prop(b"device_type", b"cpu\0")
            .prop(b"reg", &reg.to_be_bytes())
            .end_node();
    }
    block
        .end_node()
        .begin_node(b"memory@80000000")
        .prop(b"device_type", b"memory\0")
        .prop(
            b"reg",
            &[
                0, 0, 0, 0, 0x80, 0, 0, 0, 0, 0, 0, 0, 0x08, 0, 0, 0,
            ],
        )
        .end_node()
        .begin_node(b"soc")
        .begin_node(b"serial@10000000")
        .prop(b"compatible", b"ns16550a\0")
        .end_node()
        .end_node()
        .end_node()
        .end();

    BlobBuilder::new()
        .reserve(ReserveEntry::new(0x8000_0000, 0x1_0000))
        .blocks(&block)
        .build()
}
