use glam::*;

use crate::acc_structures::{MIN_X, MIN_Y, MIN_Z};

/// Rows of a wide node's bounds holding the near and far plane per axis for
/// one ray direction. A negative component makes the max row the near one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NearFarPreCompute {
    pub near: [usize; 3],
    pub far: [usize; 3]
}

impl NearFarPreCompute {
    #[inline]
    pub fn new(direction: &Vec3) -> Self {
        let near_x = MIN_X + (direction.x < 0.0) as usize;
        let near_y = MIN_Y + (direction.y < 0.0) as usize;
        let near_z = MIN_Z + (direction.z < 0.0) as usize;

        // min/max rows are adjacent with the min row even
        NearFarPreCompute {
            near: [near_x, near_y, near_z],
            far: [near_x ^ 1, near_y ^ 1, near_z ^ 1]
        }
    }
}
