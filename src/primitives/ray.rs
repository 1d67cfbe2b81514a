use glam::*;

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

/// A ray owned by the caller. Traversal reads `origin`, `direction`, `tnear`
/// and `tfar`; the primitive intersector shrinks `tfar` and fills in
/// `intersection`, occlusion queries set `occluded`.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub tnear: f32,
    pub tfar: f32,
    pub intersection: Intersection,
    pub occluded: bool
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub t: f32,
    pub uv: Vec2,
    pub prim: u32,
    pub heat: u32
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl Ray {
    #[inline]
    pub fn new(origin: &Vec3, direction: &Vec3) -> Self {
        Self::with_bounds(origin, direction, 0.0, f32::INFINITY)
    }

    #[inline]
    pub fn with_bounds(origin: &Vec3, direction: &Vec3, tnear: f32, tfar: f32) -> Self {
        Ray {
            origin: *origin,
            direction: *direction,
            tnear,
            tfar,
            intersection: Intersection::default(),
            occluded: false
        }
    }

    /// Rays with an empty interval or non-finite geometry take no part in traversal.
    #[inline]
    pub fn is_traversable(&self) -> bool {
        self.tnear <= self.tfar && self.origin.is_finite() && self.direction.is_finite()
    }

    /// Index 0..8 built from the sign bits of the direction, x in bit 0.
    #[inline]
    pub fn octant(&self) -> usize {
        (self.direction.x < 0.0) as usize
            | ((self.direction.y < 0.0) as usize) << 1
            | ((self.direction.z < 0.0) as usize) << 2
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Ray::new(&Vec3::ZERO, &Vec3::Z)
    }
}

impl Intersection {
    pub const NO_PRIM: u32 = u32::MAX;

    #[inline]
    pub fn hit(&self) -> bool {
        self.prim != Self::NO_PRIM
    }
}

impl Default for Intersection {
    #[inline]
    fn default() -> Self {
        Intersection {
            t: f32::INFINITY,
            uv: Vec2::ZERO,
            prim: Self::NO_PRIM,
            heat: 0
        }
    }
}
