use core::{fmt, panic::Location};

/// The kinds of errors reported while reading a devicetree blob.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
#[non_exhaustive]
pub enum FdtErrorKind {
    #[display("devicetree header has an unknown magic number: magic={magic:#x}")]
    BadMagic { magic: u32 },
    #[display(
        "devicetree has a version which can't be handled: version={version:#x}, \
         last_compatible_version={last_compatible_version:#x}"
    )]
    BadVersion {
        version: u32,
        last_compatible_version: u32,
    },
    #[display("devicetree is an unfinished sequential-write blob")]
    BadState,
    #[display("devicetree base address is not 8-byte aligned: address={address:#x}")]
    Alignment { address: usize },
    #[display("devicetree or one of its blocks is improperly terminated")]
    Truncated,
    #[display("devicetree has a corrupt structure block: offset={offset}")]
    BadStructure { offset: usize },
    #[display("structure block offset is out of bounds or invalid: offset={offset}")]
    BadOffset { offset: usize },
    #[display("requested node or property does not exist")]
    NotFound,
    #[display("insufficient buffer space: needed={needed}, available={available}")]
    NoSpace { needed: usize, available: usize },
    #[display("badly formatted path")]
    BadPath,
}

/// The error type returned by every fallible operation of this crate.
///
/// With the `error-with-location` feature the error also remembers the
/// source location where it was raised.
#[derive(Clone, Copy)]
pub struct FdtError {
    kind: FdtErrorKind,
    #[cfg(feature = "error-with-location")]
    location: &'static Location<'static>,
}

impl FdtError {
    #[track_caller]
    #[must_use]
    pub fn new(kind: FdtErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "error-with-location")]
            location: Location::caller(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FdtErrorKind {
        self.kind
    }

    #[cfg(feature = "error-with-location")]
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Debug for FdtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("FdtError");
        d.field("kind", &self.kind);
        #[cfg(feature = "error-with-location")]
        d.field("location", &self.location);
        d.finish()
    }
}

impl fmt::Display for FdtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl From<FdtErrorKind> for FdtError {
    #[track_caller]
    fn from(kind: FdtErrorKind) -> Self {
        Self::new(kind)
    }
}

impl PartialEq<FdtErrorKind> for FdtError {
    fn eq(&self, other: &FdtErrorKind) -> bool {
        self.kind == *other
    }
}

impl core::error::Error for FdtError {
    #[cfg(all(feature = "unstable-provider-api", feature = "error-with-location"))]
    fn provide<'a>(&'a self, request: &mut core::error::Request<'a>) {
        request.provide_ref::<Location<'static>>(self.location);
    }
}

pub type Result<T, E = FdtError> = core::result::Result<T, E>;
