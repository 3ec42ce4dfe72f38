use alloc::{vec, vec::Vec};
use core::{
    fmt,
    ops::{Deref, DerefMut},
};

use crate::debug::HexDebug as _;

/// An owned byte buffer starting at an 8-byte aligned address.
///
/// Blobs must be 8-byte aligned to pass [`Fdt::probe`](crate::Fdt::probe);
/// copying file contents into an `AlignedBlob` guarantees that.
#[derive(Clone, PartialEq, Eq)]
pub struct AlignedBlob {
    words: Vec<u64>,
    len: usize,
}

impl fmt::Debug for AlignedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AlignedBlob")
            .field(&self.as_slice().hex_debug(32))
            .finish()
    }
}

impl AlignedBlob {
    #[must_use]
    pub fn new_zeroed(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(size_of::<u64>())],
            len,
        }
    }

    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut blob = Self::new_zeroed(bytes.len());
        blob.copy_from_slice(bytes);
        blob
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &dataview::bytes(self.words.as_slice())[..self.len]
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut dataview::bytes_mut(self.words.as_mut_slice())[..self.len]
    }
}

impl Deref for AlignedBlob {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl DerefMut for AlignedBlob {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blob::FDT_ALIGNMENT, polyfill};

    #[test]
    fn test_alignment() {
        for len in [0, 1, 7, 8, 41] {
            let blob = AlignedBlob::new_zeroed(len);
            assert_eq!(blob.len(), len);
            assert!(polyfill::ptr_is_aligned_to(blob.as_ptr(), FDT_ALIGNMENT));
        }
    }

    #[test]
    fn test_from_slice() {
        let mut blob = AlignedBlob::from_slice(&[1, 2, 3]);
        assert_eq!(&*blob, [1, 2, 3]);
        blob[1] = 9;
        assert_eq!(blob.as_slice(), [1, 9, 3]);
    }
}
