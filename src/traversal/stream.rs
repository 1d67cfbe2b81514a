use log::{debug, trace};
use rayon::prelude::*;

use super::*;
use crate::acc_structures::{BranchingFactor, Hierarchy, SupportedBranchingFactor};
use crate::primitives::Ray;
use crate::Timer;

/// Splits an arbitrary number of rays into packets of at most
/// `MAX_STREAM_WIDTH`, grouped by direction octant when `Coherent` is set.
fn packetize(rays: &mut [Ray], flags: TraversalFlags) -> Vec<&mut Ray> {
    let mut refs: Vec<&mut Ray> = rays.iter_mut().collect();
    if flags.contains(TraversalFlags::Coherent) {
        refs.sort_by_key(|ray| ray.octant());
    }
    refs
}

impl<'a, H, P, const N: usize> StreamIntersector<'a, H, P, N>
where H: Hierarchy<N>, P: PrimitiveIntersector,
    BranchingFactor<N>: SupportedBranchingFactor {
    pub fn intersect_stream(&self, rays: &mut [Ray], flags: TraversalFlags) -> TraversalStats {
        let mut refs = packetize(rays, flags);
        let mut stats = TraversalStats::default();
        for packet in refs.chunks_mut(MAX_STREAM_WIDTH) {
            stats += self.intersect(packet, flags);
        }
        trace!("intersect_stream: {} rays, {:?}", refs.len(), stats);
        stats
    }

    pub fn occluded_stream(&self, rays: &mut [Ray], flags: TraversalFlags) -> TraversalStats {
        let mut refs = packetize(rays, flags);
        let mut stats = TraversalStats::default();
        for packet in refs.chunks_mut(MAX_STREAM_WIDTH) {
            stats += self.occluded(packet, flags);
        }
        trace!("occluded_stream: {} rays, {:?}", refs.len(), stats);
        stats
    }

    /// Same as `intersect_stream` with packets spread over the rayon pool.
    pub fn par_intersect_stream(&self, rays: &mut [Ray], flags: TraversalFlags) -> TraversalStats {
        let timer = Timer::new();
        let mut refs = packetize(rays, flags);
        let stats = refs
            .par_chunks_mut(MAX_STREAM_WIDTH)
            .map(|packet| self.intersect(packet, flags))
            .reduce(TraversalStats::default, |a, b| a + b);
        debug!("par_intersect_stream: {} rays in {:.2}ms", refs.len(), timer.elapsed() * 1000.0);
        stats
    }

    pub fn par_occluded_stream(&self, rays: &mut [Ray], flags: TraversalFlags) -> TraversalStats {
        let timer = Timer::new();
        let mut refs = packetize(rays, flags);
        let stats = refs
            .par_chunks_mut(MAX_STREAM_WIDTH)
            .map(|packet| self.occluded(packet, flags))
            .reduce(TraversalStats::default, |a, b| a + b);
        debug!("par_occluded_stream: {} rays in {:.2}ms", refs.len(), timer.elapsed() * 1000.0);
        stats
    }
}
