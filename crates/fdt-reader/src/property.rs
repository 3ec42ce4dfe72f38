use core::iter::FusedIterator;

use bstr::BStr;
use platform_cast::CastFrom as _;

use crate::{
    Assumptions, Fdt, FdtErrorKind, Result,
    cursor::{FDT_TAG_SIZE, NextTag, Tag},
    debug::HexDebug as _,
};

/// A property: a name from the strings block and a raw value.
#[derive(derive_more::Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property<'blob> {
    #[debug("{:?}", BStr::new(name))]
    name: &'blob [u8],
    #[debug("{:?}", value.hex_debug(16))]
    value: &'blob [u8],
}

impl<'blob> Property<'blob> {
    #[must_use]
    pub fn name(&self) -> &'blob [u8] {
        self.name
    }

    #[must_use]
    pub fn value(&self) -> &'blob [u8] {
        self.value
    }

    /// Returns the value as a single string, without its NUL terminator.
    ///
    /// Returns `None` unless the value holds exactly one NUL, at its end.
    #[must_use]
    pub fn as_str(&self) -> Option<&'blob [u8]> {
        let (&last, s) = self.value.split_last()?;
        (last == 0 && !s.contains(&0)).then_some(s)
    }

    /// Returns the value as a big-endian `u32` if it is 4 bytes long.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        (self.value.len() == 4)
            .then(|| endian::read_be_u32(self.value, 0))
            .flatten()
    }

    /// Returns the value as a big-endian `u64` if it is 8 bytes long.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        (self.value.len() == 8)
            .then(|| endian::read_be_u64(self.value, 0))
            .flatten()
    }
}

impl<'blob> Fdt<'blob> {
    fn prop_tag(&self, offset: usize) -> Result<(u32, &'blob [u8], usize)> {
        if !self.can_assume(Assumptions::VALID_INPUT) {
            ensure!(
                offset.is_multiple_of(FDT_TAG_SIZE),
                FdtErrorKind::BadOffset { offset }
            );
        }
        match self.next_tag(offset) {
            Ok(NextTag {
                tag: Tag::Prop {
                    name_offset, value, ..
                },
                next_offset,
            }) => Ok((name_offset, value, next_offset)),
            _ => bail!(FdtErrorKind::BadOffset { offset }),
        }
    }

    /// Verifies that `offset` holds a property and returns the offset of the
    /// tag following it.
    pub fn check_prop_offset(&self, offset: usize) -> Result<usize> {
        self.prop_tag(offset)
            .map(|(_, _, next_offset)| next_offset)
    }

    /// Skips `NOP` tags from `offset` up to the next property of the same
    /// node.
    fn next_property(&self, offset: usize) -> Result<usize> {
        let mut offset = offset;
        loop {
            let next = self.next_tag(offset)?;
            match next.tag {
                Tag::Prop { .. } => return Ok(offset),
                Tag::Nop => offset = next.next_offset,
                Tag::End => bail!(FdtErrorKind::BadStructure { offset }),
                Tag::BeginNode { .. } | Tag::EndNode => bail!(FdtErrorKind::NotFound),
            }
        }
    }

    /// Returns the offset of the first property of the node at `node`.
    pub fn first_property_offset(&self, node: usize) -> Result<usize> {
        let offset = self.check_node_offset(node)?;
        self.next_property(offset)
    }

    /// Returns the offset of the property following the one at `offset`.
    pub fn next_property_offset(&self, offset: usize) -> Result<usize> {
        let offset = self.check_prop_offset(offset)?;
        self.next_property(offset)
    }

    /// Decodes the property at `offset`.
    pub fn get_property_by_offset(&self, offset: usize) -> Result<Property<'blob>> {
        let (name_offset, value, _) = self.prop_tag(offset)?;
        let name = self.get_string(usize::cast_from(name_offset))?;
        Ok(Property { name, value })
    }

    /// Finds the property called `name` of the node at `node`.
    pub fn get_property(&self, node: usize, name: &[u8]) -> Result<Property<'blob>> {
        let mut offset = self.first_property_offset(node)?;
        loop {
            let (name_offset, value, _) = self.prop_tag(offset)?;
            if let Ok(prop_name) = self.get_string(usize::cast_from(name_offset))
                && prop_name == name
            {
                return Ok(Property {
                    name: prop_name,
                    value,
                });
            }
            offset = self.next_property_offset(offset)?;
        }
    }

    /// Returns an iterator over the properties of the node at `node`.
    #[must_use]
    pub fn properties(&self, node: usize) -> Properties<'blob> {
        Properties {
            fdt: *self,
            state: PropertiesState::First(node),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PropertiesState {
    First(usize),
    Next(usize),
    Done,
}

/// Iterator returned by [`Fdt::properties`].
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct Properties<'blob> {
    fdt: Fdt<'blob>,
    state: PropertiesState,
}

impl<'blob> Iterator for Properties<'blob> {
    type Item = Result<Property<'blob>>;

    fn next(&mut self) -> Option<Self::Item> {
        let res = match self.state {
            PropertiesState::First(node) => self.fdt.first_property_offset(node),
            PropertiesState::Next(prev) => self.fdt.next_property_offset(prev),
            PropertiesState::Done => return None,
        };
        let offset = match res {
            Ok(offset) => offset,
            Err(err) => {
                self.state = PropertiesState::Done;
                return (!err.kind().is_not_found()).then_some(Err(err));
            }
        };
        self.state = PropertiesState::Next(offset);
        let prop = self.fdt.get_property_by_offset(offset);
        if prop.is_err() {
            self.state = PropertiesState::Done;
        }
        Some(prop)
    }
}

impl FusedIterator for Properties<'_> {}
