use std::ops::Range;

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

/// Type-tagged handle into a hierarchy. `Empty` fills unused child slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeRef {
    #[default]
    Empty,
    Internal(u32),
    Leaf(LeafRange)
}

/// Contiguous range of primitives owned by the primitive intersector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LeafRange {
    pub first: u32,
    pub count: u32
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl NodeRef {
    #[inline]
    pub fn leaf(first: u32, count: u32) -> Self {
        NodeRef::Leaf(LeafRange::new(first, count))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeRef::Leaf(_))
    }

    #[inline]
    pub fn as_internal(&self) -> Option<u32> {
        match self {
            NodeRef::Internal(index) => Some(*index),
            _ => None
        }
    }

    #[inline]
    pub fn as_leaf_range(&self) -> Option<LeafRange> {
        match self {
            NodeRef::Leaf(range) => Some(*range),
            _ => None
        }
    }
}

impl LeafRange {
    #[inline]
    pub fn new(first: u32, count: u32) -> Self {
        LeafRange {
            first,
            count
        }
    }

    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }
}

impl From<LeafRange> for NodeRef {
    fn from(value: LeafRange) -> Self {
        NodeRef::Leaf(value)
    }
}
