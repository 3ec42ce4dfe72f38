use core::fmt;

use super::header::{
    self, FDT_ALIGNMENT, FDT_MAGIC, FDT_SW_MAGIC, FIRST_SUPPORTED_VERSION, Header,
    LAST_SUPPORTED_VERSION, MAX_TOTAL_SIZE,
};
use crate::{
    Assumptions, FdtErrorKind, Result,
    debug::HexDebug as _,
    polyfill,
};

/// Version from which the header carries `size_dt_struct`.
const STRUCT_SIZE_VERSION: u32 = 0x11;

/// A read-only view of a Flattened Devicetree blob.
///
/// `Fdt` is a cheap, copyable wrapper around the blob bytes and a decoded
/// copy of its header. Nothing is validated on construction beyond the
/// presence of a header; use [`Fdt::from_bytes`] for a checked view or call
/// [`Fdt::check_header`] / [`Fdt::check_full`] explicitly.
///
/// Every operation reads only the bytes it needs, never writes, and never
/// reads outside the slice it was given, whatever the blob contents are.
#[derive(Clone, Copy)]
pub struct Fdt<'blob> {
    bytes: &'blob [u8],
    header: Header,
    assumptions: Assumptions,
}

impl fmt::Debug for Fdt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fdt")
            .field("header", &self.header)
            .field("assumptions", &self.assumptions)
            .field("bytes", &self.bytes.hex_debug(16))
            .finish()
    }
}

impl<'blob> Fdt<'blob> {
    /// Creates an unchecked view of `bytes`.
    ///
    /// Only [`Assumptions::COMPILED`] are in effect.
    pub fn new(bytes: &'blob [u8]) -> Result<Self> {
        Self::with_assumptions(bytes, Assumptions::empty())
    }

    /// Creates an unchecked view of `bytes` which skips the checks covered
    /// by `assumptions` in addition to [`Assumptions::COMPILED`].
    pub fn with_assumptions(bytes: &'blob [u8], assumptions: Assumptions) -> Result<Self> {
        let header = Header::read_from(bytes).ok_or(FdtErrorKind::Truncated)?;
        Ok(Self {
            bytes,
            header,
            assumptions: assumptions | Assumptions::COMPILED,
        })
    }

    /// Creates a view of `bytes` after validating the header.
    ///
    /// The view is limited to the first `total_size` bytes.
    pub fn from_bytes(bytes: &'blob [u8]) -> Result<Self> {
        let fdt = Self::new(bytes)?;
        fdt.check_header()?;
        let total_size = fdt.header.total_size();
        let bytes = bytes.get(..total_size).ok_or(FdtErrorKind::Truncated)?;
        Ok(Self { bytes, ..fdt })
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'blob [u8] {
        self.bytes
    }

    #[must_use]
    pub fn assumptions(&self) -> Assumptions {
        self.assumptions
    }

    #[must_use]
    pub fn magic(&self) -> u32 {
        self.header.magic()
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.header.version()
    }

    #[must_use]
    pub fn total_size(&self) -> usize {
        self.header.total_size()
    }

    pub(crate) fn can_assume(&self, assumptions: Assumptions) -> bool {
        self.assumptions.contains(assumptions)
    }

    /// Whether the blob predates the version 0x10 layout.
    pub(crate) fn is_legacy(&self) -> bool {
        !self.can_assume(Assumptions::LATEST) && self.header.version() < FIRST_SUPPORTED_VERSION
    }

    /// Whether the header bounds the structure block with `size_dt_struct`.
    pub(crate) fn has_struct_size(&self) -> bool {
        self.can_assume(Assumptions::LATEST) || self.header.version() >= STRUCT_SIZE_VERSION
    }

    fn check_alignment(&self) -> Result<()> {
        ensure!(
            polyfill::ptr_is_aligned_to(self.bytes.as_ptr(), FDT_ALIGNMENT),
            FdtErrorKind::Alignment {
                address: self.bytes.as_ptr().addr(),
            }
        );
        Ok(())
    }

    fn check_version(&self) -> Result<()> {
        let version = self.header.version();
        let last_compatible_version = self.header.last_compatible_version();
        ensure!(
            version >= FIRST_SUPPORTED_VERSION && last_compatible_version <= LAST_SUPPORTED_VERSION,
            FdtErrorKind::BadVersion {
                version,
                last_compatible_version,
            }
        );
        Ok(())
    }

    /// Performs the cheap checks every read operation starts with and returns
    /// `total_size`.
    ///
    /// Finished blobs must carry a supported version; sequential-write blobs
    /// are accepted once their structure block is non-empty.
    pub fn probe(&self) -> Result<usize> {
        let total_size = self.header.total_size();
        if self.can_assume(Assumptions::VALID_DTB) {
            return Ok(total_size);
        }

        self.check_alignment()?;
        match self.header.magic() {
            FDT_MAGIC => {
                if !self.can_assume(Assumptions::LATEST) {
                    self.check_version()?;
                }
            }
            FDT_SW_MAGIC => {
                ensure!(self.header.struct_block_size() != 0, FdtErrorKind::BadState);
            }
            magic => bail!(FdtErrorKind::BadMagic { magic }),
        }
        ensure!(total_size < MAX_TOTAL_SIZE, FdtErrorKind::Truncated);
        Ok(total_size)
    }

    /// Returns the header size implied by the blob's version.
    #[must_use]
    pub fn header_size(&self) -> usize {
        if self.can_assume(Assumptions::LATEST) {
            return header::header_size(STRUCT_SIZE_VERSION);
        }
        header::header_size(self.header.version())
    }

    /// Validates the header of a finished blob.
    ///
    /// Checks alignment, magic, and versions, then (unless
    /// [`Assumptions::VALID_DTB`] is in effect) that every block lies between
    /// the end of the header and `total_size`.
    pub fn check_header(&self) -> Result<()> {
        self.check_alignment()?;
        let magic = self.header.magic();
        ensure!(magic == FDT_MAGIC, FdtErrorKind::BadMagic { magic });

        let version = self.header.version();
        let last_compatible_version = self.header.last_compatible_version();
        if !self.can_assume(Assumptions::LATEST) {
            self.check_version()?;
            ensure!(
                version >= last_compatible_version,
                FdtErrorKind::BadVersion {
                    version,
                    last_compatible_version,
                }
            );
        }

        if self.can_assume(Assumptions::VALID_DTB) {
            return Ok(());
        }

        let header_size = self.header_size();
        let total_size = self.header.total_size();
        ensure!(
            total_size >= header_size && total_size <= MAX_TOTAL_SIZE,
            FdtErrorKind::Truncated
        );
        ensure!(
            header::offset_in_bounds(
                header_size,
                total_size,
                self.header.memory_reservation_block_offset()
            ),
            FdtErrorKind::Truncated
        );

        let struct_offset = self.header.struct_block_offset();
        let struct_in_bounds = if self.has_struct_size() {
            header::block_in_bounds(
                header_size,
                total_size,
                struct_offset,
                self.header.struct_block_size(),
            )
        } else {
            header::offset_in_bounds(header_size, total_size, struct_offset)
        };
        ensure!(struct_in_bounds, FdtErrorKind::Truncated);

        ensure!(
            header::block_in_bounds(
                header_size,
                total_size,
                self.header.strings_block_offset(),
                self.header.strings_block_size(),
            ),
            FdtErrorKind::Truncated
        );
        Ok(())
    }

    /// Resolves `len` bytes at structure-block offset `offset`.
    ///
    /// Returns `None` if the range leaves the blob (unless
    /// [`Assumptions::VALID_INPUT`]) or, when the header carries
    /// `size_dt_struct`, the structure block.
    #[must_use]
    pub fn offset_ptr(&self, offset: usize, len: usize) -> Option<&'blob [u8]> {
        let absolute = offset.checked_add(self.header.struct_block_offset())?;
        if !self.can_assume(Assumptions::VALID_INPUT) {
            let end = absolute.checked_add(len)?;
            if end > self.header.total_size() {
                return None;
            }
        }
        if self.has_struct_size() {
            let end = offset.checked_add(len)?;
            if end > self.header.struct_block_size() {
                return None;
            }
        }
        self.bytes.get(absolute..)?.get(..len)
    }

    /// Returns the readable remainder of the structure block from `offset`.
    pub(crate) fn struct_tail(&self, offset: usize) -> Option<&'blob [u8]> {
        let struct_offset = self.header.struct_block_offset();
        let absolute = offset.checked_add(struct_offset)?;
        let mut end = self.bytes.len();
        if !self.can_assume(Assumptions::VALID_INPUT) {
            end = end.min(self.header.total_size());
        }
        if self.has_struct_size() {
            end = end.min(struct_offset.saturating_add(self.header.struct_block_size()));
        }
        self.bytes.get(absolute..end)
    }

    /// Copies the whole blob (`total_size` bytes) to the start of `dst`.
    pub fn move_to(&self, dst: &mut [u8]) -> Result<()> {
        let total_size = self.probe()?;
        ensure!(
            dst.len() >= total_size,
            FdtErrorKind::NoSpace {
                needed: total_size,
                available: dst.len(),
            }
        );
        let src = self
            .bytes
            .get(..total_size)
            .ok_or(FdtErrorKind::Truncated)?;
        dst[..total_size].copy_from_slice(src);
        Ok(())
    }
}

/// Moves the blob starting at `buf[src..]` to `buf[dst..]`.
///
/// The source and destination ranges may overlap.
pub fn move_within(buf: &mut [u8], src: usize, dst: usize) -> Result<()> {
    let source = buf.get(src..).ok_or(FdtErrorKind::Truncated)?;
    let source_len = source.len();
    let total_size = Fdt::new(source)?.probe()?;
    ensure!(source_len >= total_size, FdtErrorKind::Truncated);

    let available = buf.len().saturating_sub(dst);
    ensure!(
        available >= total_size,
        FdtErrorKind::NoSpace {
            needed: total_size,
            available,
        }
    );
    buf.copy_within(src..src + total_size, dst);
    Ok(())
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use alloc::{format, vec};

    use super::*;
    use crate::testing::{AlignedBlob, BlobBuilder, BlockBuilder, sample_blob};

    fn minimal() -> BlobBuilder {
        let mut block = BlockBuilder::new();
        block.begin_node(b"").end_node().end();
        let mut builder = BlobBuilder::new();
        builder.blocks(&block);
        builder
    }

    #[test]
    fn test_new_requires_header() {
        let blob = AlignedBlob::new_zeroed(27);
        assert_eq!(Fdt::new(&blob).unwrap_err(), FdtErrorKind::Truncated);
        let blob = AlignedBlob::new_zeroed(28);
        assert!(Fdt::new(&blob).is_ok());
    }

    #[test]
    fn test_probe() {
        let blob = minimal().build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.probe().unwrap(), blob.len());
        assert_eq!(fdt.probe().unwrap(), blob.len());
    }

    #[test]
    fn test_probe_bad_magic() {
        let blob = minimal().magic(0xdead_beef).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(
            fdt.probe().unwrap_err(),
            FdtErrorKind::BadMagic { magic: 0xdead_beef }
        );
    }

    #[test]
    fn test_probe_bad_version() {
        let blob = minimal().version(0x0f).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert!(fdt.probe().unwrap_err().kind().is_bad_version());

        let blob = minimal().last_compatible_version(0x12).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(
            fdt.probe().unwrap_err(),
            FdtErrorKind::BadVersion {
                version: 0x11,
                last_compatible_version: 0x12
            }
        );

        let fdt = Fdt::with_assumptions(&blob, Assumptions::LATEST).unwrap();
        assert!(fdt.probe().is_ok());
    }

    #[test]
    fn test_newer_compatible_version() {
        // a newer blob is readable while it stays compatible with 0x11
        let blob = minimal()
            .version(0x12)
            .last_compatible_version(0x10)
            .build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.probe().unwrap(), blob.len());
        fdt.check_header().unwrap();
    }

    #[test]
    fn test_probe_sequential_write() {
        let blob = minimal().magic(FDT_SW_MAGIC).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.probe().unwrap(), blob.len());

        let blob = minimal().magic(FDT_SW_MAGIC).struct_block_size(0).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.probe().unwrap_err(), FdtErrorKind::BadState);
    }

    #[test]
    fn test_probe_total_size_limit() {
        let blob = minimal().total_size(0x7fff_ffff).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.probe().unwrap_err(), FdtErrorKind::Truncated);

        let blob = minimal().total_size(0x7fff_fffe).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.probe().unwrap(), 0x7fff_fffe);
    }

    #[test]
    fn test_probe_alignment() {
        let blob = minimal().build();
        let mut shifted = AlignedBlob::new_zeroed(blob.len() + 4);
        shifted[4..].copy_from_slice(&blob);
        let fdt = Fdt::new(&shifted[4..]).unwrap();
        assert!(fdt.probe().unwrap_err().kind().is_alignment());
        assert!(fdt.check_header().unwrap_err().kind().is_alignment());

        let fdt = Fdt::with_assumptions(&shifted[4..], Assumptions::VALID_DTB).unwrap();
        assert_eq!(fdt.probe().unwrap(), blob.len());
    }

    #[test]
    fn test_check_header() {
        let blob = minimal().build();
        Fdt::new(&blob).unwrap().check_header().unwrap();
        Fdt::from_bytes(&blob).unwrap();
    }

    #[test]
    fn test_check_header_rejects_sequential_write() {
        let blob = minimal().magic(FDT_SW_MAGIC).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(
            fdt.check_header().unwrap_err(),
            FdtErrorKind::BadMagic {
                magic: FDT_SW_MAGIC
            }
        );
    }

    #[test]
    fn test_check_header_version_order() {
        let blob = minimal().version(0x10).last_compatible_version(0x11).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert!(fdt.check_header().unwrap_err().kind().is_bad_version());
    }

    #[test]
    fn test_check_header_block_bounds() {
        let blob = minimal().total_size(20).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.check_header().unwrap_err(), FdtErrorKind::Truncated);

        let blob = minimal().struct_block_size(0x1000).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.check_header().unwrap_err(), FdtErrorKind::Truncated);
        let fdt = Fdt::with_assumptions(&blob, Assumptions::VALID_DTB).unwrap();
        assert!(fdt.check_header().is_ok());

        let blob = minimal().strings_block_size(0x1000).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.check_header().unwrap_err(), FdtErrorKind::Truncated);
    }

    #[test]
    fn test_from_bytes_trims_trailing_bytes() {
        let blob = minimal().trailing_bytes(64).build();
        let fdt = Fdt::from_bytes(&blob).unwrap();
        assert_eq!(fdt.as_bytes().len(), blob.len() - 64);
    }

    #[test]
    fn test_from_bytes_short_buffer() {
        let blob = minimal().build();
        let err = Fdt::from_bytes(&blob[..blob.len() - 1]).unwrap_err();
        assert_eq!(err, FdtErrorKind::Truncated);
    }

    #[test]
    fn test_header_size() {
        let blob = minimal().build();
        assert_eq!(Fdt::new(&blob).unwrap().header_size(), 40);
        let blob = minimal().version(0x10).build();
        assert_eq!(Fdt::new(&blob).unwrap().header_size(), 36);
        let fdt = Fdt::with_assumptions(&blob, Assumptions::LATEST).unwrap();
        assert_eq!(fdt.header_size(), 40);
    }

    #[test]
    fn test_offset_ptr() {
        let blob = minimal().build();
        let fdt = Fdt::new(&blob).unwrap();
        let size = fdt.header().struct_block_size();
        assert_eq!(fdt.offset_ptr(0, 4), Some(&[0, 0, 0, 1][..]));
        assert_eq!(fdt.offset_ptr(size - 4, 4), Some(&[0, 0, 0, 9][..]));
        assert_eq!(fdt.offset_ptr(size, 0), Some(&[][..]));
        assert_eq!(fdt.offset_ptr(size - 3, 4), None);
        assert_eq!(fdt.offset_ptr(usize::MAX, 1), None);
        assert_eq!(fdt.offset_ptr(0, usize::MAX), None);
    }

    #[test]
    fn test_offset_ptr_without_struct_size() {
        // version 0x10 headers do not bound the structure block, only the blob
        let blob = minimal().version(0x10).build();
        let fdt = Fdt::new(&blob).unwrap();
        let size = fdt.header().struct_block_size();
        let remaining = blob.len() - fdt.header().struct_block_offset();
        assert_eq!(remaining, size);
        assert!(fdt.offset_ptr(size - 4, 4).is_some());
        assert!(fdt.offset_ptr(size - 4, 8).is_none());
    }

    #[test]
    fn test_offset_ptr_valid_input() {
        let blob = minimal().total_size(48).version(0x10).build();
        let fdt = Fdt::new(&blob).unwrap();
        assert!(fdt.offset_ptr(0, 4).is_none());
        let fdt = Fdt::with_assumptions(&blob, Assumptions::VALID_INPUT).unwrap();
        assert_eq!(fdt.offset_ptr(0, 4), Some(&[0, 0, 0, 1][..]));
        // the slice itself is never overrun
        assert!(fdt.offset_ptr(0, blob.len()).is_none());
    }

    #[test]
    fn test_move_to() {
        let blob = sample_blob();
        let fdt = Fdt::new(&blob).unwrap();
        let mut dst = vec![0xff_u8; blob.len() + 8];
        fdt.move_to(&mut dst).unwrap();
        assert_eq!(dst[..blob.len()], *blob);
        assert!(dst[blob.len()..].iter().all(|&b| b == 0xff));

        let mut small = vec![0_u8; blob.len() - 1];
        assert_eq!(
            fdt.move_to(&mut small).unwrap_err(),
            FdtErrorKind::NoSpace {
                needed: blob.len(),
                available: blob.len() - 1,
            }
        );
    }

    #[test]
    fn test_move_within() {
        let blob = sample_blob();
        let len = blob.len();

        // forward, overlapping
        let mut buf = AlignedBlob::new_zeroed(len + 16);
        buf[..len].copy_from_slice(&blob);
        move_within(&mut buf, 0, 16).unwrap();
        assert_eq!(buf[16..], *blob);

        // backward, overlapping
        move_within(&mut buf, 16, 0).unwrap();
        assert_eq!(buf[..len], *blob);

        assert_eq!(
            move_within(&mut buf, 0, 17).unwrap_err(),
            FdtErrorKind::NoSpace {
                needed: len,
                available: len - 1,
            }
        );
        assert_eq!(
            move_within(&mut buf, len + 17, 0).unwrap_err(),
            FdtErrorKind::Truncated
        );
    }

    #[test]
    fn test_debug() {
        let blob = minimal().build();
        let fdt = Fdt::new(&blob).unwrap();
        let debug = format!("{fdt:?}");
        assert!(debug.starts_with("Fdt { header: Header { magic: 3490578157,"));
        assert!(debug.contains("bytes: [d0 0d fe ed"));
    }
}
