use std::ops::{Add, AddAssign};

use bitmask_enum::bitmask;

use crate::acc_structures::LeafRange;
use crate::primitives::Ray;

pub mod mask;
pub use mask::*;
pub mod near_far;
pub use near_far::*;
pub mod ray_context;
pub use ray_context::*;
pub mod stack;
pub use stack::*;
pub mod node_traverser;
pub use node_traverser::*;
pub mod stream_intersector;
pub use stream_intersector::*;
pub mod stream;

/// Rays per packet, bounded by the width of `RayMask`.
pub const MAX_STREAM_WIDTH: usize = RayMask::WIDTH;

/// Opaque to traversal, forwarded to the primitive intersector.
#[bitmask(u32)]
pub enum TraversalFlags {
    // skip back-facing primitives
    CullBackfaces,
    // group stream rays by direction octant before packetizing
    Coherent
}

/// Leaf-level collaborator. `active` selects entries of `rays`/`contexts`.
pub trait PrimitiveIntersector: Sync {
    /// Returns the rays whose hit improved. For those the implementation has
    /// already shrunk `tfar` and written `intersection`.
    fn intersect(&self,
        rays: &mut [&mut Ray], contexts: &[RayContext],
        active: RayMask, leaf: LeafRange, flags: TraversalFlags
    ) -> RayMask;

    /// Returns the rays with any blocking hit inside `[tnear, tfar)`.
    fn occluded(&self,
        rays: &[&mut Ray], contexts: &[RayContext],
        active: RayMask, leaf: LeafRange, flags: TraversalFlags
    ) -> RayMask;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub nodes_visited: u32,
    pub leaves_visited: u32,
    pub stack_pushes: u32
}

impl Add for TraversalStats {
    type Output = TraversalStats;

    fn add(self, rhs: TraversalStats) -> TraversalStats {
        TraversalStats {
            nodes_visited: self.nodes_visited + rhs.nodes_visited,
            leaves_visited: self.leaves_visited + rhs.leaves_visited,
            stack_pushes: self.stack_pushes + rhs.stack_pushes
        }
    }
}

impl AddAssign for TraversalStats {
    fn add_assign(&mut self, rhs: TraversalStats) {
        *self = *self + rhs;
    }
}
