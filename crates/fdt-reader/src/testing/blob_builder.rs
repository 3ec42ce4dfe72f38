use alloc::vec::Vec;

use dataview::DataView;

use super::BlockBuilder;
use crate::{
    AlignedBlob,
    blob::{FDT_MAGIC, Header, LAST_SUPPORTED_VERSION, ReserveEntry},
};

const HEADER_SIZE: usize = size_of::<Header>();

/// Assembles a complete blob: header, memory reservation block, structure
/// block and strings block, in that order.
///
/// Header fields default to a well-formed version 0x11 blob; each can be
/// overridden to produce damaged input.
#[derive(Debug, Clone)]
pub struct BlobBuilder {
    magic: u32,
    version: u32,
    last_compatible_version: u32,
    boot_cpuid_phys: u32,
    reserve_entries: Vec<ReserveEntry>,
    terminate_reserve_map: bool,
    struct_block: Vec<u8>,
    strings_block: Vec<u8>,
    total_size: Option<u32>,
    struct_block_size: Option<u32>,
    strings_block_size: Option<u32>,
    trailing_bytes: usize,
}

impl Default for BlobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: FDT_MAGIC,
            version: LAST_SUPPORTED_VERSION,
            last_compatible_version: 0x10,
            boot_cpuid_phys: 0,
            reserve_entries: Vec::new(),
            terminate_reserve_map: true,
            struct_block: Vec::new(),
            strings_block: Vec::new(),
            total_size: None,
            struct_block_size: None,
            strings_block_size: None,
            trailing_bytes: 0,
        }
    }

    pub fn magic(&mut self, magic: u32) -> &mut Self {
        self.magic = magic;
        self
    }

    pub fn version(&mut self, version: u32) -> &mut Self {
        self.version = version;
        self
    }

    pub fn last_compatible_version(&mut self, version: u32) -> &mut Self {
        self.last_compatible_version = version;
        self
    }

    pub fn boot_cpuid_phys(&mut self, cpuid: u32) -> &mut Self {
        self.boot_cpuid_phys = cpuid;
        self
    }

    pub fn reserve(&mut self, entry: ReserveEntry) -> &mut Self {
        self.reserve_entries.push(entry);
        self
    }

    /// Whether to write the all-zero entry ending the reservation list.
    pub fn terminate_reserve_map(&mut self, terminate: bool) -> &mut Self {
        self.terminate_reserve_map = terminate;
        self
    }

    /// Uses the structure and strings blocks of `blocks`.
    pub fn blocks(&mut self, blocks: &BlockBuilder) -> &mut Self {
        self.struct_block = blocks.struct_block().to_vec();
        self.strings_block = blocks.strings_block().to_vec();
        self
    }

    /// Overrides the `total_size` header field.
    pub fn total_size(&mut self, size: u32) -> &mut Self {
        self.total_size = Some(size);
        self
    }

    /// Overrides the `size_dt_struct` header field.
    pub fn struct_block_size(&mut self, size: u32) -> &mut Self {
        self.struct_block_size = Some(size);
        self
    }

    /// Overrides the `size_dt_strings` header field.
    pub fn strings_block_size(&mut self, size: u32) -> &mut Self {
        self.strings_block_size = Some(size);
        self
    }

    /// Appends zero bytes after the blob which `total_size` does not cover.
    pub fn trailing_bytes(&mut self, len: usize) -> &mut Self {
        self.trailing_bytes = len;
        self
    }

    #[must_use]
    pub fn build(&self) -> AlignedBlob {
        let entry_count = self.reserve_entries.len() + usize::from(self.terminate_reserve_map);
        let off_mem_rsvmap = HEADER_SIZE;
        let off_dt_struct = off_mem_rsvmap + entry_count * size_of::<ReserveEntry>();
        let off_dt_strings = off_dt_struct + self.struct_block.len();
        let len = off_dt_strings + self.strings_block.len();

        #[expect(clippy::missing_panics_doc)]
        let to_u32 = |n: usize| u32::try_from(n).unwrap();
        let header = Header {
            magic: self.magic.into(),
            total_size: self.total_size.unwrap_or_else(|| to_u32(len)).into(),
            off_dt_struct: to_u32(off_dt_struct).into(),
            off_dt_strings: to_u32(off_dt_strings).into(),
            off_mem_rsvmap: to_u32(off_mem_rsvmap).into(),
            version: self.version.into(),
            last_compatible_version: self.last_compatible_version.into(),
            boot_cpuid_phys: self.boot_cpuid_phys.into(),
            size_dt_strings: self
                .strings_block_size
                .unwrap_or_else(|| to_u32(self.strings_block.len()))
                .into(),
            size_dt_struct: self
                .struct_block_size
                .unwrap_or_else(|| to_u32(self.struct_block.len()))
                .into(),
        };

        let mut blob = AlignedBlob::new_zeroed(len + self.trailing_bytes);
        let data = DataView::from_mut(blob.as_mut_slice());
        data.write(0, &header);
        for (i, entry) in self.reserve_entries.iter().enumerate() {
            data.write(off_mem_rsvmap + i * size_of::<ReserveEntry>(), entry);
        }
        blob[off_dt_struct..off_dt_strings].copy_from_slice(&self.struct_block);
        blob[off_dt_strings..len].copy_from_slice(&self.strings_block);
        blob
    }
}
