use crate::primitives::AABB;

pub mod node_ref;
pub use node_ref::*;
pub mod wide_bvh;
pub use wide_bvh::*;
