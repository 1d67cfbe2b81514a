use glam::*;

use super::Triangle;

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3
}

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl AABB {
    #[inline]
    pub fn new(min: &Vec3, max: &Vec3) -> Self {
        AABB {
            min: *min,
            max: *max
        }
    }

    /// True for the default (inverted) box that nothing was grown into yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn grow_aabb(&mut self, aabb: &AABB) {
        if aabb.is_empty() {
            return;
        }

        self.grow_vec3(&aabb.min);
        self.grow_vec3(&aabb.max);
    }

    #[inline]
    pub fn grow_triangle(&mut self, triangle: &Triangle) {
        self.grow_vec3(&triangle.p0);
        self.grow_vec3(&triangle.p1);
        self.grow_vec3(&triangle.p2);
    }

    #[inline]
    pub fn grow_vec3(&mut self, p: &Vec3) {
        self.min = p.min(self.min);
        self.max = p.max(self.max);
    }

    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.max + self.min) * 0.5
    }
}

impl Default for AABB {
    #[inline]
    fn default() -> Self {
        AABB {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY)
        }
    }
}
