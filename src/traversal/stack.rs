use super::RayMask;
use crate::acc_structures::NodeRef;

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

/// Something the child traverser can push for a hit child.
pub trait StackEntry: Copy {
    fn from_child(node: NodeRef, mask: RayMask, dist: f32) -> Self;
    fn node(&self) -> NodeRef;
    fn is_valid(&self) -> bool;
}

/// Packet traversal entry: the subtree and the rays still relevant to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackItemMask {
    pub node: NodeRef,
    pub mask: RayMask
}

/// Single-ray traversal entry: the subtree and its entry distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackItemDist {
    pub node: NodeRef,
    pub dist: f32
}

/// Fixed-capacity stack allocated once per traversal call.
#[derive(Clone, Debug)]
pub struct TraversalStack<E: StackEntry> {
    items: Vec<E>,
    capacity: usize,
    pushes: u32
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl StackEntry for StackItemMask {
    #[inline]
    fn from_child(node: NodeRef, mask: RayMask, _dist: f32) -> Self {
        StackItemMask {
            node,
            mask
        }
    }

    #[inline]
    fn node(&self) -> NodeRef {
        self.node
    }

    #[inline]
    fn is_valid(&self) -> bool {
        !self.node.is_empty() && !self.mask.is_empty()
    }
}

impl StackEntry for StackItemDist {
    #[inline]
    fn from_child(node: NodeRef, _mask: RayMask, dist: f32) -> Self {
        StackItemDist {
            node,
            dist
        }
    }

    #[inline]
    fn node(&self) -> NodeRef {
        self.node
    }

    #[inline]
    fn is_valid(&self) -> bool {
        !self.node.is_empty() && !self.dist.is_nan()
    }
}

impl<E: StackEntry> TraversalStack<E> {
    pub fn with_capacity(capacity: usize) -> Self {
        TraversalStack {
            items: Vec::with_capacity(capacity),
            capacity,
            pushes: 0
        }
    }

    #[inline]
    pub fn push(&mut self, entry: E) {
        debug_assert!(entry.is_valid(), "pushed an empty subtree");
        debug_assert!(self.items.len() < self.capacity, "traversal stack overflow");
        self.items.push(entry);
        self.pushes += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Option<E> {
        self.items.pop()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pushes since creation.
    #[inline]
    pub fn pushes(&self) -> u32 {
        self.pushes
    }

    /// Entries bottom to top.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }
}
