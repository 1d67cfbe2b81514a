use glam::*;

use super::{Ray, AABB, Intersection};
use crate::acc_structures::LeafRange;
use crate::traversal::{PrimitiveIntersector, RayContext, RayMask, TraversalFlags};

const EPSILON: f32 = 0.00000001;

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3
}

/// Triangle soup addressed by the leaf ranges of a hierarchy.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl Triangle {
    #[inline]
    pub fn new(p0: &Vec3, p1: &Vec3, p2: &Vec3) -> Self {
        Triangle {
            p0: *p0,
            p1: *p1,
            p2: *p2
        }
    }

    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.p0 + self.p1 + self.p2) * 0.33333333
    }

    #[inline]
    pub fn expand_aabb(&self, aabb: &mut AABB) {
        aabb.grow_triangle(self);
    }

    /// Möller-Trumbore. Returns the hit when it lies within `[tmin, tmax)`.
    #[allow(clippy::manual_range_contains)]
    pub fn intersect(&self, ray: &Ray, cull: bool, tmin: f32, tmax: f32) -> Option<Intersection> {
        let edge1 = self.p1 - self.p0;
        let edge2 = self.p2 - self.p0;
        let pvec = ray.direction.cross(edge2);
        let det = edge1.dot(pvec);

        let (t, u, v);
        if cull {
            if det < EPSILON {
                return None;
            }

            let tvec = ray.origin - self.p0;
            let u_scaled = tvec.dot(pvec);
            if u_scaled < 0.0 || u_scaled > det {
                return None;
            }

            let qvec = tvec.cross(edge1);
            let v_scaled = ray.direction.dot(qvec);
            if v_scaled < 0.0 || u_scaled + v_scaled > det {
                return None;
            }

            let inv_det = 1.0 / det;
            t = edge2.dot(qvec) * inv_det;
            u = u_scaled * inv_det;
            v = v_scaled * inv_det;
        } else {
            if det > -EPSILON && det < EPSILON {
                return None;
            }
            let inv_det = 1.0 / det;

            let tvec = ray.origin - self.p0;
            u = tvec.dot(pvec) * inv_det;
            if u < 0.0 || u > 1.0 {
                return None;
            }

            let qvec = tvec.cross(edge1);
            v = ray.direction.dot(qvec) * inv_det;
            if v < 0.0 || u + v > 1.0 {
                return None;
            }

            t = edge2.dot(qvec) * inv_det;
        }

        if t < tmin || t >= tmax {
            return None;
        }

        Some(Intersection {
            t,
            uv: Vec2::new(u, v),
            ..Default::default()
        })
    }
}

impl TriangleMesh {
    #[inline]
    pub fn new(triangles: Vec<Triangle>) -> Self {
        TriangleMesh {
            triangles
        }
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Appends triangles and returns the leaf range that addresses them.
    pub fn push_leaf(&mut self, triangles: &[Triangle]) -> LeafRange {
        let first = self.triangles.len() as u32;
        self.triangles.extend_from_slice(triangles);
        LeafRange::new(first, triangles.len() as u32)
    }

    pub fn bounds(&self, leaf: LeafRange) -> AABB {
        let mut bounds = AABB::default();
        for triangle in &self.triangles[leaf.as_range()] {
            triangle.expand_aabb(&mut bounds);
        }
        bounds
    }

    fn closest_in_leaf(&self, ray: &Ray, leaf: LeafRange, cull: bool) -> Option<Intersection> {
        let mut closest: Option<Intersection> = None;
        let mut tmax = ray.tfar;
        for prim in leaf.as_range() {
            if let Some(mut hit) = self.triangles[prim].intersect(ray, cull, ray.tnear, tmax) {
                hit.prim = prim as u32;
                tmax = hit.t;
                closest = Some(hit);
            }
        }
        closest
    }
}

impl PrimitiveIntersector for TriangleMesh {
    fn intersect(&self,
        rays: &mut [&mut Ray], _contexts: &[RayContext],
        active: RayMask, leaf: LeafRange, flags: TraversalFlags
    ) -> RayMask {
        let cull = flags.contains(TraversalFlags::CullBackfaces);
        let mut improved = RayMask::EMPTY;
        for i in active {
            let ray = &mut *rays[i];
            if let Some(hit) = self.closest_in_leaf(ray, leaf, cull) {
                ray.tfar = hit.t;
                ray.intersection = Intersection {
                    heat: ray.intersection.heat,
                    ..hit
                };
                improved.insert(i);
            }
        }
        improved
    }

    fn occluded(&self,
        rays: &[&mut Ray], _contexts: &[RayContext],
        active: RayMask, leaf: LeafRange, flags: TraversalFlags
    ) -> RayMask {
        let cull = flags.contains(TraversalFlags::CullBackfaces);
        let mut blocked = RayMask::EMPTY;
        for i in active {
            let ray = &*rays[i];
            let any = self.triangles[leaf.as_range()]
                .iter()
                .any(|triangle| triangle.intersect(ray, cull, ray.tnear, ray.tfar).is_some());
            if any {
                blocked.insert(i);
            }
        }
        blocked
    }
}
