//! Flat binary encoding of a [`KDTree`].
//!
//! Layout, in native byte order like the other flat index buffers:
//!
//! - `[0]` magic byte
//! - `[1]` format version in the high nibble, coordinate type in the low nibble
//! - `[2..6]` dimensionality, `u32`
//! - `[6..10]` number of points, `u32`
//! - the nodes in pre-order. A leaf is the tag `0` followed by its `u32` point index. An interior
//!   node is the tag `1`, its `u32` split axis and its split value, followed by its left subtree and
//!   then its right subtree.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bytemuck::{bytes_of, pod_read_unaligned, AnyBitPattern};
use log::debug;

use crate::error::{KdIndexError, Result};
use crate::geometry::Hyperplane;
use crate::kdtree::constants::{
    INTERIOR_TAG, KDTREE_HEADER_SIZE, KDTREE_MAGIC, KDTREE_VERSION, LEAF_TAG,
};
use crate::kdtree::index::KDTreeMetadata;
use crate::kdtree::{KDTree, Node};
use crate::r#type::IndexableNum;

const LEAF_BYTE_SIZE: usize = 1 + 4;

impl<N: IndexableNum> KDTree<N> {
    /// The length of the buffer produced by [`KDTree::to_bytes`].
    pub fn serialized_len(&self) -> usize {
        let num_items = self.metadata.num_items as usize;
        let interior_byte_size = 1 + 4 + N::BYTES_PER_ELEMENT;
        KDTREE_HEADER_SIZE + num_items * LEAF_BYTE_SIZE + (num_items - 1) * interior_byte_size
    }

    /// Encode the tree into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.serialized_len());

        // Set data header
        data.push(KDTREE_MAGIC);
        data.push((KDTREE_VERSION << 4) + N::TYPE_INDEX);
        data.extend_from_slice(bytes_of(&(self.metadata.dimensionality as u32)));
        data.extend_from_slice(bytes_of(&self.metadata.num_items));

        write_node(&self.root, &mut data);
        data
    }

    /// Encode the tree into `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Write the tree to a file, replacing anything already there.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.write_to(BufWriter::new(File::create(path)?))?;
        debug!(
            "saved kd-tree with {} points to {}",
            self.metadata.num_items,
            path.display()
        );
        Ok(())
    }

    /// Decode a tree written by [`KDTree::to_bytes`].
    ///
    /// The whole buffer must be exactly one well-formed tree with coordinates of type `N`;
    /// anything else is an error and no tree is returned.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        let metadata = read_header::<N>(&mut reader)?;

        // every point needs at least its leaf
        let min_len = (metadata.num_items as usize).saturating_mul(LEAF_BYTE_SIZE);
        if reader.remaining() < min_len {
            return Err(KdIndexError::Truncated {
                offset: reader.pos,
                needed: min_len - reader.remaining(),
            });
        }

        let mut decoder = NodeDecoder {
            reader,
            metadata,
            seen: vec![false; metadata.num_items as usize],
            num_leaves: 0,
        };
        let root = decoder.read_tree()?;

        if decoder.num_leaves != metadata.num_items as usize {
            return Err(KdIndexError::Corrupt(format!(
                "Header declares {} points but the tree holds {}.",
                metadata.num_items, decoder.num_leaves
            )));
        }
        if decoder.reader.remaining() != 0 {
            return Err(KdIndexError::Corrupt(format!(
                "{} trailing bytes after the tree.",
                decoder.reader.remaining()
            )));
        }

        Ok(Self { metadata, root })
    }

    /// Decode a tree from everything `reader` yields.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = vec![];
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Read a tree from a file written by [`KDTree::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let tree = Self::read_from(BufReader::new(File::open(path)?))?;
        debug!(
            "loaded kd-tree with {} points of dimensionality {} from {}",
            tree.metadata.num_items,
            tree.metadata.dimensionality,
            path.display()
        );
        Ok(tree)
    }
}

fn write_node<N: IndexableNum>(root: &Node<N>, data: &mut Vec<u8>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Node::Leaf { point_index } => {
                data.push(LEAF_TAG);
                data.extend_from_slice(bytes_of(point_index));
            }
            Node::Interior {
                hyperplane,
                left,
                right,
            } => {
                data.push(INTERIOR_TAG);
                data.extend_from_slice(bytes_of(&(hyperplane.axis as u32)));
                data.extend_from_slice(bytes_of(&hyperplane.value));
                // pushed in backwards order to what gets popped
                stack.push(right);
                stack.push(left);
            }
        }
    }
}

fn read_header<N: IndexableNum>(reader: &mut ByteReader) -> Result<KDTreeMetadata> {
    if reader.read::<u8>()? != KDTREE_MAGIC {
        return Err(KdIndexError::Corrupt(
            "Data not in kd-index format.".to_string(),
        ));
    }

    let version_and_type = reader.read::<u8>()?;
    let version = version_and_type >> 4;
    if version != KDTREE_VERSION {
        return Err(KdIndexError::Corrupt(format!(
            "Got v{} data when expected v{}.",
            version, KDTREE_VERSION
        )));
    }

    let type_ = version_and_type & 0x0f;
    if type_ != N::TYPE_INDEX {
        return Err(KdIndexError::Corrupt(format!(
            "Got type {} data when expected type {}.",
            type_,
            N::TYPE_INDEX
        )));
    }

    let dimensionality = reader.read::<u32>()? as usize;
    let num_items = reader.read::<u32>()?;
    if dimensionality == 0 || num_items == 0 {
        return Err(KdIndexError::Corrupt(format!(
            "Empty tree: dimensionality {}, {} points.",
            dimensionality, num_items
        )));
    }

    Ok(KDTreeMetadata::new(dimensionality, num_items))
}

/// A cursor over a byte slice that never reads past its end.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(KdIndexError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read<T: AnyBitPattern>(&mut self) -> Result<T> {
        Ok(pod_read_unaligned(self.take(std::mem::size_of::<T>())?))
    }
}

struct NodeDecoder<'a> {
    reader: ByteReader<'a>,
    metadata: KDTreeMetadata,
    /// Leaf indices already decoded
    seen: Vec<bool>,
    num_leaves: usize,
}

/// An interior node whose children are still being decoded.
struct PartialNode<N: IndexableNum> {
    hyperplane: Hyperplane<N>,
    left: Option<Node<N>>,
}

impl NodeDecoder<'_> {
    /// Decode one complete subtree in pre-order.
    ///
    /// Nesting is tracked on the heap, so hostile input cannot exhaust the call stack.
    fn read_tree<N: IndexableNum>(&mut self) -> Result<Node<N>> {
        let mut stack: Vec<PartialNode<N>> = vec![];

        loop {
            // n leaves cannot sit deeper than n - 1
            if stack.len() >= self.metadata.num_items as usize {
                return Err(KdIndexError::Corrupt(format!(
                    "Tree nested deeper than its {} points allow.",
                    self.metadata.num_items
                )));
            }

            let offset = self.reader.pos;
            let mut node = match self.reader.read::<u8>()? {
                LEAF_TAG => self.read_leaf()?,
                INTERIOR_TAG => {
                    let hyperplane = self.read_hyperplane(offset)?;
                    stack.push(PartialNode {
                        hyperplane,
                        left: None,
                    });
                    continue;
                }
                tag => return Err(KdIndexError::UnknownNodeTag { tag, offset }),
            };

            // attach the finished subtree to its parent, closing every parent it completes
            loop {
                match stack.pop() {
                    None => return Ok(node),
                    Some(PartialNode {
                        hyperplane,
                        left: None,
                    }) => {
                        stack.push(PartialNode {
                            hyperplane,
                            left: Some(node),
                        });
                        break;
                    }
                    Some(PartialNode {
                        hyperplane,
                        left: Some(left),
                    }) => node = Node::interior(hyperplane, left, node),
                }
            }
        }
    }

    fn read_leaf<N: IndexableNum>(&mut self) -> Result<Node<N>> {
        let point_index = self.reader.read::<u32>()?;
        match self.seen.get_mut(point_index as usize) {
            Some(true) => {
                return Err(KdIndexError::Corrupt(format!(
                    "Point {} stored in more than one leaf.",
                    point_index
                )))
            }
            Some(seen) => *seen = true,
            None => {
                return Err(KdIndexError::Corrupt(format!(
                    "Leaf index {} out of range for {} points.",
                    point_index, self.metadata.num_items
                )))
            }
        }
        self.num_leaves += 1;
        Ok(Node::Leaf { point_index })
    }

    fn read_hyperplane<N: IndexableNum>(&mut self, offset: usize) -> Result<Hyperplane<N>> {
        let axis = self.reader.read::<u32>()? as usize;
        if axis >= self.metadata.dimensionality {
            return Err(KdIndexError::Corrupt(format!(
                "Split axis {} out of range for dimensionality {}.",
                axis, self.metadata.dimensionality
            )));
        }
        let value = self.reader.read::<N>()?;
        if !value.is_finite() {
            return Err(KdIndexError::Corrupt(format!(
                "Non-finite split value at offset {}.",
                offset
            )));
        }
        Ok(Hyperplane::new(axis, value))
    }
}
