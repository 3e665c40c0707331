/// First byte of every serialized tree.
pub(crate) const KDTREE_MAGIC: u8 = 0x6b;

/// Format version, stored in the high nibble of the second header byte.
pub(crate) const KDTREE_VERSION: u8 = 1;

/// magic, version/type, dimensionality (u32), point count (u32)
pub(crate) const KDTREE_HEADER_SIZE: usize = 10;

pub(crate) const LEAF_TAG: u8 = 0;
pub(crate) const INTERIOR_TAG: u8 = 1;
