use glam::*;

use super::{NearFarPreCompute, RayMask};
use crate::primitives::Ray;

/// Magnitudes below this are clamped before taking the reciprocal.
pub const MIN_RCP_INPUT: f32 = 1e-18;

/// Per-ray slab test data, `rdir.w` holds tnear and `org_rdir.w` holds tfar.
#[repr(C, align(32))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayContext {
    pub rdir: Vec4,
    pub org_rdir: Vec4
}

/// Reciprocal that saturates instead of producing infinities. Tiny values keep
/// the sign the near/far ordering sees, so -0.0 maps to the positive side.
#[inline]
pub fn rcp_safe(x: f32) -> f32 {
    if x.abs() >= MIN_RCP_INPUT {
        1.0 / x
    } else if x < 0.0 {
        -1.0 / MIN_RCP_INPUT
    } else {
        1.0 / MIN_RCP_INPUT
    }
}

#[inline]
pub fn rcp_safe_vec3(v: &Vec3) -> Vec3 {
    Vec3::new(rcp_safe(v.x), rcp_safe(v.y), rcp_safe(v.z))
}

impl RayContext {
    #[inline]
    pub fn new(ray: &Ray) -> Self {
        let rdir = rcp_safe_vec3(&ray.direction);
        let org_rdir = ray.origin * rdir;

        RayContext {
            rdir: Vec4::from((rdir, ray.tnear)),
            org_rdir: Vec4::from((org_rdir, ray.tfar))
        }
    }

    #[inline]
    pub fn tnear(&self) -> f32 {
        self.rdir.w
    }

    #[inline]
    pub fn tfar(&self) -> f32 {
        self.org_rdir.w
    }

    #[inline]
    pub fn set_tfar(&mut self, tfar: f32) {
        self.org_rdir.w = tfar;
    }
}

/// Fills contexts and near/far orderings for `rays` and returns the mask of
/// rays that take part in traversal.
pub fn init_ray_contexts(
    contexts: &mut [RayContext], near_far: &mut [NearFarPreCompute],
    rays: &[&mut Ray]
) -> RayMask {
    debug_assert!(contexts.len() >= rays.len() && near_far.len() >= rays.len());

    let mut live = RayMask::EMPTY;
    for (i, ray) in rays.iter().enumerate() {
        contexts[i] = RayContext::new(ray);
        near_far[i] = NearFarPreCompute::new(&ray.direction);
        if ray.is_traversable() {
            live.insert(i);
        }
    }
    live
}
