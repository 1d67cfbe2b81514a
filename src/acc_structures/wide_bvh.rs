use log::debug;
use thiserror::Error;

use super::{NodeRef, AABB};

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

pub struct BranchingFactor<const N: usize>;

/// Fan-outs the traversal is written for. `INDEX_BITS` low bits of a child's
/// sort key hold its slot index.
pub trait SupportedBranchingFactor {
    const INDEX_BITS: u32;
}

impl SupportedBranchingFactor for BranchingFactor<2> { const INDEX_BITS: u32 = 1; }
impl SupportedBranchingFactor for BranchingFactor<4> { const INDEX_BITS: u32 = 2; }
impl SupportedBranchingFactor for BranchingFactor<8> { const INDEX_BITS: u32 = 3; }
impl SupportedBranchingFactor for BranchingFactor<16> { const INDEX_BITS: u32 = 4; }

/// Rows of `WideNode::bounds`, one lane per child slot.
pub const MIN_X: usize = 0;
pub const MAX_X: usize = 1;
pub const MIN_Y: usize = 2;
pub const MAX_Y: usize = 3;
pub const MIN_Z: usize = 4;
pub const MAX_Z: usize = 5;

#[derive(Clone, Copy, Debug)]
pub struct WideNode<const N: usize> {
    pub children: [NodeRef; N],
    pub bounds: [[f32; N]; 6]
}

/// Read-only view the traversal needs of a hierarchy.
pub trait Hierarchy<const N: usize>: Sync {
    fn root(&self) -> NodeRef;
    fn node(&self, index: u32) -> &WideNode<N>;
    /// Upper bound on internal nodes along any root-to-leaf path.
    fn max_depth(&self) -> usize;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("internal node needs at least one non-empty child")]
    NoChildren,
    #[error("internal node has {count} children, fan-out is {max}")]
    TooManyChildren { count: usize, max: usize },
    #[error("node {0} does not exist")]
    UnknownNode(u32),
    #[error("hierarchy depth {depth} exceeds the supported maximum of {max}")]
    DepthExceeded { depth: usize, max: usize }
}

/// N-wide hierarchy assembled bottom-up from already known leaves and nodes.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug)]
pub struct WideBVH<const N: usize>
where BranchingFactor<N>: SupportedBranchingFactor {
    nodes: Vec<WideNode<N>>,
    depths: Vec<usize>,
    root: NodeRef
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl<const N: usize> WideNode<N> {
    pub fn new() -> Self {
        let mut bounds = [[f32::INFINITY; N]; 6];
        bounds[MAX_X] = [f32::NEG_INFINITY; N];
        bounds[MAX_Y] = [f32::NEG_INFINITY; N];
        bounds[MAX_Z] = [f32::NEG_INFINITY; N];

        WideNode {
            children: [NodeRef::Empty; N],
            bounds
        }
    }

    #[inline]
    pub fn child(&self, slot: usize) -> NodeRef {
        self.children[slot]
    }

    pub fn set_child(&mut self, slot: usize, child: NodeRef, bounds: &AABB) {
        self.children[slot] = child;
        self.bounds[MIN_X][slot] = bounds.min.x;
        self.bounds[MAX_X][slot] = bounds.max.x;
        self.bounds[MIN_Y][slot] = bounds.min.y;
        self.bounds[MAX_Y][slot] = bounds.max.y;
        self.bounds[MIN_Z][slot] = bounds.min.z;
        self.bounds[MAX_Z][slot] = bounds.max.z;
    }

    pub fn child_bounds(&self, slot: usize) -> AABB {
        AABB {
            min: glam::Vec3::new(self.bounds[MIN_X][slot], self.bounds[MIN_Y][slot], self.bounds[MIN_Z][slot]),
            max: glam::Vec3::new(self.bounds[MAX_X][slot], self.bounds[MAX_Y][slot], self.bounds[MAX_Z][slot])
        }
    }
}

impl<const N: usize> Default for WideNode<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> WideBVH<N>
where BranchingFactor<N>: SupportedBranchingFactor {
    pub const MAX_DEPTH: usize = 32;

    pub fn new() -> Self {
        WideBVH {
            nodes: vec![],
            depths: vec![],
            root: NodeRef::Empty
        }
    }

    /// Hierarchy consisting of a single leaf.
    pub fn from_leaf(leaf: NodeRef) -> Self {
        let mut bvh = Self::new();
        bvh.root = leaf;
        bvh
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds an internal node over `children`, skipping empty refs. Children
    /// must be leaves or nodes added earlier, which keeps the graph acyclic.
    pub fn add_node(&mut self, children: &[(NodeRef, AABB)]) -> Result<NodeRef, HierarchyError> {
        let used: Vec<&(NodeRef, AABB)> = children.iter().filter(|(child, _)| !child.is_empty()).collect();
        if used.is_empty() {
            return Err(HierarchyError::NoChildren);
        }
        if used.len() > N {
            return Err(HierarchyError::TooManyChildren { count: used.len(), max: N });
        }

        let mut node = WideNode::new();
        let mut depth = 1;
        for (slot, (child, bounds)) in used.into_iter().enumerate() {
            depth = depth.max(self.depth_of(*child)? + 1);
            node.set_child(slot, *child, bounds);
        }
        if depth > Self::MAX_DEPTH {
            return Err(HierarchyError::DepthExceeded { depth, max: Self::MAX_DEPTH });
        }

        self.nodes.push(node);
        self.depths.push(depth);
        Ok(NodeRef::Internal(self.nodes.len() as u32 - 1))
    }

    pub fn set_root(&mut self, root: NodeRef) -> Result<(), HierarchyError> {
        let depth = self.depth_of(root)?;
        self.root = root;
        debug!("wide bvh ({}-ary): {} nodes, depth {}", N, self.nodes.len(), depth);
        Ok(())
    }

    /// Internal levels below and including `node`.
    pub fn depth_of(&self, node: NodeRef) -> Result<usize, HierarchyError> {
        match node {
            NodeRef::Internal(index) => self.depths
                .get(index as usize)
                .copied()
                .ok_or(HierarchyError::UnknownNode(index)),
            _ => Ok(0)
        }
    }
}

impl<const N: usize> Default for WideBVH<N>
where BranchingFactor<N>: SupportedBranchingFactor {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Hierarchy<N> for WideBVH<N>
where BranchingFactor<N>: SupportedBranchingFactor {
    #[inline]
    fn root(&self) -> NodeRef {
        self.root
    }

    #[inline]
    fn node(&self, index: u32) -> &WideNode<N> {
        &self.nodes[index as usize]
    }

    #[inline]
    fn max_depth(&self) -> usize {
        Self::MAX_DEPTH
    }
}
