//! Shared scene helpers for the traversal integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use glam::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wide_bvh_stream::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Geometry
// ============================================================================

/// Triangle in the plane `z`, covering `center` when seen along +z.
pub fn triangle_at(center: Vec2, z: f32, size: f32) -> Triangle {
    Triangle::new(
        &Vec3::new(center.x - size, center.y - size, z),
        &Vec3::new(center.x, center.y + size, z),
        &Vec3::new(center.x + size, center.y - size, z)
    )
}

pub fn random_triangles(rng: &mut StdRng, count: usize) -> Vec<Triangle> {
    (0..count)
        .map(|_| {
            let p = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
            let e1 = Vec3::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
            let e2 = Vec3::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
            Triangle::new(&p, &(p + e1), &(p + e2))
        })
        .collect()
}

pub fn random_rays(rng: &mut StdRng, count: usize) -> Vec<Ray> {
    (0..count)
        .map(|_| {
            let origin = Vec3::new(rng.gen_range(-14.0..14.0), rng.gen_range(-14.0..14.0), rng.gen_range(-14.0..14.0));
            let target = Vec3::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0));
            Ray::new(&origin, &(target - origin).normalize())
        })
        .collect()
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

// ============================================================================
// Hierarchy assembly
// ============================================================================

/// One leaf per triangle, grouped N at a time level by level.
pub fn assemble<const N: usize>(mesh: &mut TriangleMesh, triangles: &[Triangle]) -> WideBVH<N>
where BranchingFactor<N>: SupportedBranchingFactor {
    let mut level: Vec<(NodeRef, AABB)> = triangles
        .iter()
        .map(|triangle| {
            let leaf = mesh.push_leaf(std::slice::from_ref(triangle));
            (NodeRef::from(leaf), mesh.bounds(leaf))
        })
        .collect();

    let mut bvh = WideBVH::<N>::new();
    while level.len() > 1 {
        level = level
            .chunks(N)
            .map(|group| {
                let mut bounds = AABB::default();
                for (_, child_bounds) in group {
                    bounds.grow_aabb(child_bounds);
                }
                (bvh.add_node(group).expect("valid group"), bounds)
            })
            .collect();
    }
    if let Some((root, _)) = level.first() {
        bvh.set_root(*root).expect("known root");
    }
    bvh
}

// ============================================================================
// Reference results
// ============================================================================

pub fn brute_force_closest(triangles: &[Triangle], ray: &Ray) -> Option<(u32, f32)> {
    let mut closest = None;
    let mut tmax = ray.tfar;
    for (prim, triangle) in triangles.iter().enumerate() {
        if let Some(hit) = triangle.intersect(ray, false, ray.tnear, tmax) {
            tmax = hit.t;
            closest = Some((prim as u32, hit.t));
        }
    }
    closest
}

pub fn brute_force_occluded(triangles: &[Triangle], ray: &Ray) -> bool {
    triangles.iter().any(|triangle| triangle.intersect(ray, false, ray.tnear, ray.tfar).is_some())
}

// ============================================================================
// Instrumented collaborators
// ============================================================================

/// Forwards to a mesh and records every leaf call.
pub struct RecordingIntersector<'a> {
    pub mesh: &'a TriangleMesh,
    pub calls: AtomicUsize,
    /// (active mask, rays reported) per call, in call order.
    pub log: Mutex<Vec<(RayMask, RayMask)>>
}

impl<'a> RecordingIntersector<'a> {
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        RecordingIntersector {
            mesh,
            calls: AtomicUsize::new(0),
            log: Mutex::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> Vec<(RayMask, RayMask)> {
        self.log.lock().expect("log lock").clone()
    }
}

impl<'a> PrimitiveIntersector for RecordingIntersector<'a> {
    fn intersect(&self,
        rays: &mut [&mut Ray], contexts: &[RayContext],
        active: RayMask, leaf: LeafRange, flags: TraversalFlags
    ) -> RayMask {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let improved = self.mesh.intersect(rays, contexts, active, leaf, flags);
        self.log.lock().expect("log lock").push((active, improved));
        improved
    }

    fn occluded(&self,
        rays: &[&mut Ray], contexts: &[RayContext],
        active: RayMask, leaf: LeafRange, flags: TraversalFlags
    ) -> RayMask {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let blocked = self.mesh.occluded(rays, contexts, active, leaf, flags);
        self.log.lock().expect("log lock").push((active, blocked));
        blocked
    }
}
