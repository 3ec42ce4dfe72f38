use dataview::{DataView, Pod};
use endian::Be;
use platform_cast::CastFrom as _;

/// Magic number of a finished devicetree blob.
pub const FDT_MAGIC: u32 = 0xd00d_feed;
/// Magic number of a blob still being assembled by a sequential writer.
pub const FDT_SW_MAGIC: u32 = !FDT_MAGIC;

/// Oldest format version this crate reads.
pub const FIRST_SUPPORTED_VERSION: u32 = 0x10;
/// Newest format version this crate reads.
pub const LAST_SUPPORTED_VERSION: u32 = 0x11;

/// Required alignment of the blob base address.
pub const FDT_ALIGNMENT: usize = 8;

/// Largest `total_size` the reader accepts.
pub(crate) const MAX_TOTAL_SIZE: usize = 0x7fff_ffff;

const V1_HEADER_SIZE: usize = 7 * size_of::<u32>();
const V2_HEADER_SIZE: usize = V1_HEADER_SIZE + size_of::<u32>();
const V3_HEADER_SIZE: usize = V2_HEADER_SIZE + size_of::<u32>();
const V17_HEADER_SIZE: usize = V3_HEADER_SIZE + size_of::<u32>();

const _: () = assert!(V17_HEADER_SIZE == size_of::<Header>());

/// Returns the size of the header used by the given format version.
///
/// Version 1 headers end after `last_compatible_version`, version 2 adds
/// `boot_cpuid_phys`, version 3 adds `size_dt_strings` and version 17 adds
/// `size_dt_struct`.
#[must_use]
pub fn header_size(version: u32) -> usize {
    match version {
        ..=1 => V1_HEADER_SIZE,
        2 => V2_HEADER_SIZE,
        3..=16 => V3_HEADER_SIZE,
        _ => V17_HEADER_SIZE,
    }
}

/// The devicetree blob header.
///
/// All fields are stored big-endian. Fields which are absent in the blob's
/// format version read as zero.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod)]
pub struct Header {
    pub(crate) magic: Be<u32>,
    pub(crate) total_size: Be<u32>,
    pub(crate) off_dt_struct: Be<u32>,
    pub(crate) off_dt_strings: Be<u32>,
    pub(crate) off_mem_rsvmap: Be<u32>,
    pub(crate) version: Be<u32>,
    pub(crate) last_compatible_version: Be<u32>,
    pub(crate) boot_cpuid_phys: Be<u32>,
    pub(crate) size_dt_strings: Be<u32>,
    pub(crate) size_dt_struct: Be<u32>,
}

impl Header {
    /// Decodes the header at the start of `bytes`.
    ///
    /// Returns `None` if `bytes` cannot hold even the oldest header layout.
    /// A shorter-than-latest slice leaves the trailing fields zeroed.
    #[must_use]
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < V1_HEADER_SIZE {
            return None;
        }
        let mut raw = [0_u8; size_of::<Self>()];
        let len = bytes.len().min(raw.len());
        raw[..len].copy_from_slice(&bytes[..len]);
        DataView::from(&raw[..]).try_read::<Self>(0)
    }

    #[must_use]
    pub fn magic(&self) -> u32 {
        self.magic.read()
    }

    #[must_use]
    pub fn total_size(&self) -> usize {
        usize::cast_from(self.total_size.read())
    }

    #[must_use]
    pub fn struct_block_offset(&self) -> usize {
        usize::cast_from(self.off_dt_struct.read())
    }

    #[must_use]
    pub fn strings_block_offset(&self) -> usize {
        usize::cast_from(self.off_dt_strings.read())
    }

    #[must_use]
    pub fn memory_reservation_block_offset(&self) -> usize {
        usize::cast_from(self.off_mem_rsvmap.read())
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version.read()
    }

    #[must_use]
    pub fn last_compatible_version(&self) -> u32 {
        self.last_compatible_version.read()
    }

    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.boot_cpuid_phys.read()
    }

    #[must_use]
    pub fn strings_block_size(&self) -> usize {
        usize::cast_from(self.size_dt_strings.read())
    }

    #[must_use]
    pub fn struct_block_size(&self) -> usize {
        usize::cast_from(self.size_dt_struct.read())
    }
}

/// Whether `offset` lies between the end of the header and the end of the blob.
pub(crate) fn offset_in_bounds(header_size: usize, total_size: usize, offset: usize) -> bool {
    offset >= header_size && offset <= total_size
}

/// Whether the block `base..base + size` lies between the end of the header
/// and the end of the blob.
pub(crate) fn block_in_bounds(
    header_size: usize,
    total_size: usize,
    base: usize,
    size: usize,
) -> bool {
    offset_in_bounds(header_size, total_size, base)
        && base
            .checked_add(size)
            .is_some_and(|end| offset_in_bounds(header_size, total_size, end))
}
