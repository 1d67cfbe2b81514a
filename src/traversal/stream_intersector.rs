use super::*;
use crate::acc_structures::{BranchingFactor, Hierarchy, NodeRef, SupportedBranchingFactor, WideNode};
use crate::primitives::Ray;

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

/// Traverses ray streams through an N-wide hierarchy, handing leaves to a
/// primitive intersector.
pub struct StreamIntersector<'a, H, P, const N: usize>
where H: Hierarchy<N>, P: PrimitiveIntersector,
    BranchingFactor<N>: SupportedBranchingFactor {
    bvh: &'a H,
    primitives: &'a P
}

/// Slab test result of one node against the active rays.
#[derive(Clone, Copy, Debug)]
pub struct NodeHits<const N: usize> {
    pub hit: ChildMask,
    pub t_near: [f32; N],
    pub t_mask: [RayMask; N]
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

/// Tests every active ray against all child boxes of `node`. A child counts as
/// hit when its entry distance does not exceed its exit distance within the
/// ray's `[tnear, tfar]`; `t_near` keeps the closest entry over those rays.
pub fn intersect_node<const N: usize>(
    node: &WideNode<N>,
    contexts: &[RayContext],
    near_far: &[NearFarPreCompute],
    active: RayMask
) -> NodeHits<N> {
    let mut t_near = [f32::INFINITY; N];
    let mut t_mask = [RayMask::EMPTY; N];

    for i in active {
        let context = &contexts[i];
        let order = &near_far[i];
        let (rdir, org_rdir) = (context.rdir, context.org_rdir);

        let near_x = &node.bounds[order.near[0]];
        let near_y = &node.bounds[order.near[1]];
        let near_z = &node.bounds[order.near[2]];
        let far_x = &node.bounds[order.far[0]];
        let far_y = &node.bounds[order.far[1]];
        let far_z = &node.bounds[order.far[2]];

        for slot in 0..N {
            let t0 = (near_x[slot] * rdir.x - org_rdir.x)
                .max(near_y[slot] * rdir.y - org_rdir.y)
                .max(near_z[slot] * rdir.z - org_rdir.z)
                .max(context.tnear());
            let t1 = (far_x[slot] * rdir.x - org_rdir.x)
                .min(far_y[slot] * rdir.y - org_rdir.y)
                .min(far_z[slot] * rdir.z - org_rdir.z)
                .min(context.tfar());
            if t0 <= t1 {
                t_mask[slot].insert(i);
                t_near[slot] = t_near[slot].min(t0);
            }
        }
    }

    let mut hit = ChildMask::EMPTY;
    for slot in 0..N {
        if !t_mask[slot].is_empty() && !node.child(slot).is_empty() {
            hit.insert(slot);
        }
    }

    NodeHits {
        hit,
        t_near,
        t_mask
    }
}

impl<'a, H, P, const N: usize> StreamIntersector<'a, H, P, N>
where H: Hierarchy<N>, P: PrimitiveIntersector,
    BranchingFactor<N>: SupportedBranchingFactor {
    pub fn new(bvh: &'a H, primitives: &'a P) -> Self {
        StreamIntersector {
            bvh,
            primitives
        }
    }

    #[inline]
    pub fn bvh(&self) -> &'a H {
        self.bvh
    }

    /// Stack capacity for packet traversal.
    #[inline]
    pub fn stack_size_chunk(&self) -> usize {
        N * self.bvh.max_depth() + 1
    }

    /// Stack capacity for single-ray traversal.
    #[inline]
    pub fn stack_size_single(&self) -> usize {
        1 + (N - 1) * self.bvh.max_depth()
    }

    /// Closest-hit query for up to `MAX_STREAM_WIDTH` rays.
    pub fn intersect(&self, rays: &mut [&mut Ray], flags: TraversalFlags) -> TraversalStats {
        debug_assert!(rays.len() <= MAX_STREAM_WIDTH, "ray stream wider than the active-ray mask");
        let count = rays.len().min(MAX_STREAM_WIDTH);
        let rays = &mut rays[..count];

        let mut contexts = [RayContext::default(); MAX_STREAM_WIDTH];
        let mut near_far = [NearFarPreCompute::default(); MAX_STREAM_WIDTH];
        let live = init_ray_contexts(&mut contexts, &mut near_far, rays);

        let mut stats = TraversalStats::default();
        let root = self.bvh.root();
        if live.is_empty() || root.is_empty() {
            return stats;
        }

        let mut heat = [0u32; MAX_STREAM_WIDTH];
        let mut stack = TraversalStack::<StackItemMask>::with_capacity(self.stack_size_chunk());
        stack.push(StackItemMask { node: root, mask: live });

        while let Some(entry) = stack.pop() {
            let mut cur = entry.node;
            let mut m_trav_active = entry.mask;

            loop {
                match cur {
                    NodeRef::Internal(index) => {
                        stats.nodes_visited += 1;
                        for i in m_trav_active {
                            heat[i] += 1;
                        }

                        let node = self.bvh.node(index);
                        let hits = intersect_node(node, &contexts, &near_far, m_trav_active);
                        if hits.hit.is_empty() {
                            break;
                        }
                        (cur, m_trav_active) = traverse_closest_hit(
                            node, hits.hit, &hits.t_near, &hits.t_mask, &mut stack
                        );
                    },
                    NodeRef::Leaf(leaf) => {
                        stats.leaves_visited += 1;
                        let improved = self.primitives.intersect(rays, &contexts[..count], m_trav_active, leaf, flags);
                        for i in improved {
                            contexts[i].set_tfar(rays[i].tfar);
                        }
                        break;
                    },
                    NodeRef::Empty => break
                }
            }
        }

        for i in live {
            rays[i].intersection.heat = heat[i];
        }
        stats.stack_pushes = stack.pushes();
        stats
    }

    /// Occlusion query for up to `MAX_STREAM_WIDTH` rays. A ray found occluded
    /// drops out of every mask tested afterwards.
    pub fn occluded(&self, rays: &mut [&mut Ray], flags: TraversalFlags) -> TraversalStats {
        debug_assert!(rays.len() <= MAX_STREAM_WIDTH, "ray stream wider than the active-ray mask");
        let count = rays.len().min(MAX_STREAM_WIDTH);
        let rays = &mut rays[..count];

        let mut contexts = [RayContext::default(); MAX_STREAM_WIDTH];
        let mut near_far = [NearFarPreCompute::default(); MAX_STREAM_WIDTH];
        let mut m_active = init_ray_contexts(&mut contexts, &mut near_far, rays);

        let mut stats = TraversalStats::default();
        let root = self.bvh.root();
        if m_active.is_empty() || root.is_empty() {
            return stats;
        }

        let mut stack = TraversalStack::<StackItemMask>::with_capacity(self.stack_size_chunk());
        stack.push(StackItemMask { node: root, mask: m_active });

        while let Some(entry) = stack.pop() {
            let mut cur = entry.node;
            let mut m_trav_active = entry.mask & m_active;
            if m_trav_active.is_empty() {
                continue;
            }

            loop {
                match cur {
                    NodeRef::Internal(index) => {
                        stats.nodes_visited += 1;
                        let node = self.bvh.node(index);
                        let hits = intersect_node(node, &contexts, &near_far, m_trav_active);
                        if hits.hit.is_empty() {
                            break;
                        }
                        (cur, m_trav_active) = traverse_any_hit(node, hits.hit, &hits.t_mask, &mut stack);
                    },
                    NodeRef::Leaf(leaf) => {
                        stats.leaves_visited += 1;
                        let blocked = self.primitives.occluded(rays, &contexts[..count], m_trav_active, leaf, flags);
                        for i in blocked {
                            rays[i].occluded = true;
                        }
                        m_active &= !blocked;
                        break;
                    },
                    NodeRef::Empty => break
                }
            }

            if m_active.is_empty() {
                break;
            }
        }

        stats.stack_pushes = stack.pushes();
        stats
    }

    /// Closest-hit query for one ray on a distance-keyed stack; subtrees whose
    /// entry distance lies beyond the current hit are skipped.
    pub fn intersect_single(&self, ray: &mut Ray, flags: TraversalFlags) -> TraversalStats {
        let mut stats = TraversalStats::default();
        let root = self.bvh.root();
        if !ray.is_traversable() || root.is_empty() {
            return stats;
        }

        let mut context = [RayContext::new(ray)];
        let near_far = [NearFarPreCompute::new(&ray.direction)];
        let one = RayMask::single(0);

        let mut stack = TraversalStack::<StackItemDist>::with_capacity(self.stack_size_single());
        stack.push(StackItemDist { node: root, dist: ray.tnear });

        while let Some(entry) = stack.pop() {
            if entry.dist > context[0].tfar() {
                continue;
            }

            let mut cur = entry.node;
            loop {
                match cur {
                    NodeRef::Internal(index) => {
                        stats.nodes_visited += 1;
                        let node = self.bvh.node(index);
                        let hits = intersect_node(node, &context, &near_far, one);
                        if hits.hit.is_empty() {
                            break;
                        }
                        (cur, _) = traverse_closest_hit(node, hits.hit, &hits.t_near, &hits.t_mask, &mut stack);
                    },
                    NodeRef::Leaf(leaf) => {
                        stats.leaves_visited += 1;
                        let improved = {
                            let mut rays = [&mut *ray];
                            self.primitives.intersect(&mut rays, &context, one, leaf, flags)
                        };
                        if !improved.is_empty() {
                            context[0].set_tfar(ray.tfar);
                        }
                        break;
                    },
                    NodeRef::Empty => break
                }
            }
        }

        ray.intersection.heat = stats.nodes_visited;
        stats.stack_pushes = stack.pushes();
        stats
    }

    /// Occlusion query for one ray; returns on the first blocking leaf.
    pub fn occluded_single(&self, ray: &mut Ray, flags: TraversalFlags) -> TraversalStats {
        let mut stats = TraversalStats::default();
        let root = self.bvh.root();
        if !ray.is_traversable() || root.is_empty() {
            return stats;
        }

        let context = [RayContext::new(ray)];
        let near_far = [NearFarPreCompute::new(&ray.direction)];
        let one = RayMask::single(0);

        let mut stack = TraversalStack::<StackItemDist>::with_capacity(self.stack_size_single());
        stack.push(StackItemDist { node: root, dist: ray.tnear });

        'traversal: while let Some(entry) = stack.pop() {
            let mut cur = entry.node;
            loop {
                match cur {
                    NodeRef::Internal(index) => {
                        stats.nodes_visited += 1;
                        let node = self.bvh.node(index);
                        let hits = intersect_node(node, &context, &near_far, one);
                        if hits.hit.is_empty() {
                            break;
                        }
                        (cur, _) = traverse_any_hit(node, hits.hit, &hits.t_mask, &mut stack);
                    },
                    NodeRef::Leaf(leaf) => {
                        stats.leaves_visited += 1;
                        let blocked = {
                            let rays = [&mut *ray];
                            self.primitives.occluded(&rays, &context, one, leaf, flags)
                        };
                        if !blocked.is_empty() {
                            ray.occluded = true;
                            break 'traversal;
                        }
                        break;
                    },
                    NodeRef::Empty => break
                }
            }
        }

        stats.stack_pushes = stack.pushes();
        stats
    }
}
