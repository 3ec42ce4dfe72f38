//! Big-endian wire values.
//!
//! Binary formats such as the Flattened Devicetree store every integer in
//! big-endian byte order regardless of the host. This crate provides the
//! [`Be`] wrapper for such fields inside `#[repr(C)]` layouts, and
//! bounds-checked decoders reading them from arbitrary (possibly unaligned)
//! byte offsets.

#![cfg_attr(not(test), no_std)]

use core::fmt;

use dataview::{DataView, Pod};

/// Integers that can be converted to and from big-endian byte order.
pub trait ByteOrder: Pod + Copy {
    /// Converts a value from big-endian to native endianness.
    #[must_use]
    fn from_be(be: Self) -> Self;

    /// Converts a value from native endianness to big-endian.
    #[must_use]
    fn to_be(self) -> Self;
}

macro_rules! impl_byte_order {
    ($($t:ty),+) => {
        $(
            impl ByteOrder for $t {
                fn from_be(be: Self) -> Self {
                    Self::from_be(be)
                }

                fn to_be(self) -> Self {
                    Self::to_be(self)
                }
            }
        )+
    };
}

impl_byte_order!(u16, u32, u64);

/// A value stored in big-endian byte order.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Be<T>(T);

unsafe impl<T> Pod for Be<T> where T: Pod {}

impl<T> Be<T>
where
    T: ByteOrder,
{
    /// Wraps a native-endian value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self(value.to_be())
    }

    /// Reads the value, converting it to native endianness.
    #[must_use]
    pub fn read(&self) -> T {
        T::from_be(self.0)
    }

    /// Overwrites the stored value.
    pub fn write(&mut self, value: T) {
        self.0 = value.to_be();
    }
}

impl<T> From<T> for Be<T>
where
    T: ByteOrder,
{
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

macro_rules! impl_fmt_traits {
    ($($trait:tt),+) => {
        $(
            impl<T> fmt::$trait for Be<T>
            where
                T: ByteOrder + fmt::$trait
            {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::$trait::fmt(&self.read(), f)
                }
            }
        )+
    };
}

impl_fmt_traits!(Debug, Display, LowerHex, UpperHex);

/// Decodes a big-endian `T` at `offset` in `bytes`.
///
/// The offset does not need to be aligned. Returns `None` if
/// `offset + size_of::<T>()` exceeds `bytes`.
#[must_use]
pub fn read_be<T>(bytes: &[u8], offset: usize) -> Option<T>
where
    T: ByteOrder,
{
    let end = offset.checked_add(size_of::<T>())?;
    if end > bytes.len() {
        return None;
    }
    let value = DataView::from(bytes).try_read::<Be<T>>(offset)?;
    Some(value.read())
}

/// Decodes a big-endian `u32` at `offset` in `bytes`.
#[must_use]
pub fn read_be_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    read_be(bytes, offset)
}

/// Decodes a big-endian `u64` at `offset` in `bytes`.
#[must_use]
pub fn read_be_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    read_be(bytes, offset)
}
