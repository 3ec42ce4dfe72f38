//! A read-only parser for Flattened Devicetree (FDT) blobs.
//!
//! The [`Fdt`] type borrows a blob and gives random access to its header,
//! memory reservation block, structure block, and strings block. Nodes and
//! properties are addressed by their byte offset inside the structure block,
//! the same handles the traversal operations return:
//!
//! ```
//! # fn main() -> Result<(), fdt_reader::FdtError> {
//! # let blob = fdt_reader::testing::sample_blob();
//! use fdt_reader::Fdt;
//!
//! let fdt = Fdt::from_bytes(&blob)?;
//! let uart = fdt.path_offset(b"/soc/serial")?;
//! let compatible = fdt.get_property(uart, b"compatible")?;
//! assert_eq!(compatible.as_str(), Some(&b"ns16550a"[..]));
//! # Ok(())
//! # }
//! ```
//!
//! No operation allocates, writes to the blob, or reads outside the slice it
//! was given. Malformed blobs are reported as [`FdtError`]s; the validation
//! steps can be relaxed for trusted input with [`Assumptions`].
//!
//! # Features
//!
//! - `alloc`: enables [`AlignedBlob`], an owned buffer suitable for blobs read
//!   from files.
//! - `testing`: exposes the [`testing`] blob builders.
//! - `error-with-location`: records where each [`FdtError`] was created.
//! - `assume-valid-dtb`, `assume-valid-input`, `assume-latest`,
//!   `assume-perfect`: compile [`Assumptions`] in for every view.

#![cfg_attr(
    feature = "unstable-provider-api",
    feature(error_generic_member_access)
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[macro_use]
mod macros;

#[cfg(any(test, feature = "alloc"))]
pub use self::aligned_blob::AlignedBlob;
pub use self::{
    assume::{Assumptions, ParseAssumptionsError},
    blob::*,
    cursor::*,
    error::{FdtError, FdtErrorKind, Result},
    node::{Nodes, Subnodes},
    property::{Properties, Property},
    strings::find_string,
};

#[cfg(any(test, feature = "alloc"))]
mod aligned_blob;
mod assume;
mod blob;
mod check;
mod cursor;
mod debug;
mod error;
mod node;
mod polyfill;
mod property;
mod strings;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
