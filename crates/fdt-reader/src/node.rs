use core::iter::FusedIterator;

use crate::{
    Assumptions, Fdt, FdtErrorKind, Result,
    cursor::{FDT_TAG_SIZE, NextTag, Tag},
    polyfill,
};

const PATH_SEPARATOR: u8 = b'/';
const UNIT_ADDRESS_SEPARATOR: u8 = b'@';

/// Whether a node called `name` is addressed by `query`.
///
/// A query without a unit address also matches `query@<unit-address>`.
fn node_name_matches(name: &[u8], query: &[u8]) -> bool {
    match name.strip_prefix(query) {
        Some([]) => true,
        Some([UNIT_ADDRESS_SEPARATOR, ..]) => !query.contains(&UNIT_ADDRESS_SEPARATOR),
        _ => false,
    }
}

impl<'blob> Fdt<'blob> {
    fn begin_node(&self, offset: usize) -> Result<(&'blob [u8], usize)> {
        if !self.can_assume(Assumptions::VALID_INPUT) {
            ensure!(
                offset.is_multiple_of(FDT_TAG_SIZE),
                FdtErrorKind::BadOffset { offset }
            );
        }
        match self.next_tag(offset) {
            Ok(NextTag {
                tag: Tag::BeginNode { name },
                next_offset,
            }) => Ok((name, next_offset)),
            _ => bail!(FdtErrorKind::BadOffset { offset }),
        }
    }

    /// Verifies that `offset` holds a node and returns the offset just past
    /// its `BEGIN_NODE` tag and name.
    pub fn check_node_offset(&self, offset: usize) -> Result<usize> {
        self.begin_node(offset).map(|(_, next_offset)| next_offset)
    }

    /// Advances to the next node in preorder.
    ///
    /// Starts from the node at `offset`, or from the beginning of the
    /// structure block if `offset` is `None`. With a depth tracker, the
    /// depth is incremented for every node entered and decremented for every
    /// node left, and the walk fails with [`FdtErrorKind::NotFound`] once the
    /// depth drops below zero. Reaching the end of the structure block also
    /// yields `NotFound`.
    pub fn next_node(&self, offset: Option<usize>, mut depth: Option<&mut i32>) -> Result<usize> {
        let mut next_offset = match offset {
            Some(offset) => self.check_node_offset(offset)?,
            None => 0,
        };

        loop {
            let offset = next_offset;
            let next = match self.next_tag(offset) {
                Ok(next) => next,
                Err(err) if depth.is_none() && err.kind().is_truncated() => {
                    bail!(FdtErrorKind::NotFound)
                }
                Err(err) => return Err(err),
            };
            next_offset = next.next_offset;

            match next.tag {
                Tag::BeginNode { .. } => {
                    if let Some(depth) = depth.as_deref_mut() {
                        *depth += 1;
                    }
                    return Ok(offset);
                }
                Tag::EndNode => {
                    if let Some(depth) = depth.as_deref_mut() {
                        *depth -= 1;
                        ensure!(*depth >= 0, FdtErrorKind::NotFound);
                    }
                }
                Tag::End => bail!(FdtErrorKind::NotFound),
                Tag::Prop { .. } | Tag::Nop => {}
            }
        }
    }

    /// Returns the first direct child of `parent`.
    ///
    /// `None` stands for the position before the root node, whose only
    /// child is the root itself.
    pub fn first_subnode(&self, parent: Option<usize>) -> Result<usize> {
        let mut depth = 0;
        let offset = self.next_node(parent, Some(&mut depth))?;
        ensure!(depth == 1, FdtErrorKind::NotFound);
        Ok(offset)
    }

    /// Returns the next sibling of the node at `offset`.
    pub fn next_subnode(&self, offset: usize) -> Result<usize> {
        let mut depth = 1;
        let mut offset = offset;
        loop {
            offset = self.next_node(Some(offset), Some(&mut depth))?;
            ensure!(depth >= 1, FdtErrorKind::NotFound);
            if depth == 1 {
                return Ok(offset);
            }
        }
    }

    fn node_name(&self, offset: usize) -> Result<&'blob [u8]> {
        let (name, _) = self.begin_node(offset)?;
        if !self.is_legacy() {
            return Ok(name);
        }
        // older blobs store the full path of every node
        let (_, leaf) = polyfill::slice_rsplit_once(name, |&b| b == PATH_SEPARATOR)
            .ok_or(FdtErrorKind::BadStructure { offset })?;
        Ok(leaf)
    }

    /// Returns the name of the node at `offset`, including any unit address.
    ///
    /// The root node's name is empty.
    pub fn get_name(&self, offset: usize) -> Result<&'blob [u8]> {
        self.probe()?;
        self.node_name(offset)
    }

    /// Finds the direct child of `parent` called `name`.
    ///
    /// A `name` without a unit address also matches `name@<unit-address>`;
    /// the first match in blob order wins.
    pub fn subnode_offset(&self, parent: usize, name: &[u8]) -> Result<usize> {
        self.probe()?;
        let mut depth = 0;
        let mut offset = parent;
        loop {
            if depth == 1 && node_name_matches(self.node_name(offset)?, name) {
                return Ok(offset);
            }
            offset = self.next_node(Some(offset), Some(&mut depth))?;
        }
    }

    /// Resolves a node path such as `/soc/serial@10000000`.
    ///
    /// A path not starting with `/` begins with an alias name, which is
    /// looked up in `/aliases`. Repeated separators are ignored.
    pub fn path_offset(&self, path: &[u8]) -> Result<usize> {
        self.probe()?;
        if !self.can_assume(Assumptions::VALID_INPUT) {
            ensure!(!path.is_empty(), FdtErrorKind::BadPath);
        }

        let mut offset = 0;
        let mut rest = path;
        if path.first() != Some(&PATH_SEPARATOR) {
            let (alias, tail) = polyfill::slice_split_once(path, |&b| b == PATH_SEPARATOR)
                .unwrap_or((path, &b""[..]));
            let Ok(target) = self.get_alias(alias) else {
                bail!(FdtErrorKind::BadPath);
            };
            // aliases must hold absolute paths, which also rules out cycles
            ensure!(
                target.first() == Some(&PATH_SEPARATOR),
                FdtErrorKind::BadPath
            );
            offset = self.path_offset(target)?;
            rest = tail;
        }

        for component in rest.split(|&b| b == PATH_SEPARATOR) {
            if !component.is_empty() {
                offset = self.subnode_offset(offset, component)?;
            }
        }
        Ok(offset)
    }

    /// Returns the path an alias in `/aliases` stands for.
    pub fn get_alias(&self, name: &[u8]) -> Result<&'blob [u8]> {
        let aliases = self.path_offset(b"/aliases")?;
        let value = self.get_property(aliases, name)?.value();
        Ok(value
            .split(|&b| b == 0)
            .next()
            .unwrap_or_default())
    }

    /// Returns an iterator over every node in preorder, with its depth.
    ///
    /// The root node has depth 0.
    #[must_use]
    pub fn nodes(&self) -> Nodes<'blob> {
        Nodes {
            fdt: *self,
            offset: None,
            depth: -1,
            done: false,
        }
    }

    /// Returns an iterator over the direct children of `parent`.
    #[must_use]
    pub fn subnodes(&self, parent: usize) -> Subnodes<'blob> {
        Subnodes {
            fdt: *self,
            state: SubnodesState::First(parent),
        }
    }
}

/// Iterator returned by [`Fdt::nodes`].
///
/// Yields `(offset, depth)` pairs and stops after the first error.
#[derive(Debug, Clone)]
pub struct Nodes<'blob> {
    fdt: Fdt<'blob>,
    offset: Option<usize>,
    depth: i32,
    done: bool,
}

impl Iterator for Nodes<'_> {
    type Item = Result<(usize, i32)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fdt.next_node(self.offset, Some(&mut self.depth)) {
            Ok(offset) => {
                self.offset = Some(offset);
                Some(Ok((offset, self.depth)))
            }
            Err(err) => {
                self.done = true;
                (!err.kind().is_not_found()).then_some(Err(err))
            }
        }
    }
}

impl FusedIterator for Nodes<'_> {}

#[derive(Debug, Clone, Copy)]
enum SubnodesState {
    First(usize),
    Next(usize),
    Done,
}

/// Iterator returned by [`Fdt::subnodes`].
///
/// Yields child offsets and stops after the first error.
#[derive(Debug, Clone)]
pub struct Subnodes<'blob> {
    fdt: Fdt<'blob>,
    state: SubnodesState,
}

impl Iterator for Subnodes<'_> {
    type Item = Result<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let res = match self.state {
            SubnodesState::First(parent) => self.fdt.first_subnode(Some(parent)),
            SubnodesState::Next(prev) => self.fdt.next_subnode(prev),
            SubnodesState::Done => return None,
        };
        match res {
            Ok(offset) => {
                self.state = SubnodesState::Next(offset);
                Some(Ok(offset))
            }
            Err(err) => {
                self.state = SubnodesState::Done;
                (!err.kind().is_not_found()).then_some(Err(err))
            }
        }
    }
}

impl FusedIterator for Subnodes<'_> {}
