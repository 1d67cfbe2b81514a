use super::{ChildMask, RayMask, StackEntry, TraversalStack};
use crate::acc_structures::{BranchingFactor, NodeRef, SupportedBranchingFactor, WideNode};

/// Maps a float to an unsigned key with the same ordering. NaN is never fed in.
#[inline]
pub fn ordered_bits(t: f32) -> u32 {
    let bits = t.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

/// Sort key for a hit child: distance in the high bits, slot in the low ones.
#[inline]
pub fn child_sort_key<const N: usize>(t_near: f32, slot: usize) -> u32
where BranchingFactor<N>: SupportedBranchingFactor {
    let index_mask = (1u32 << BranchingFactor::<N>::INDEX_BITS) - 1;
    (ordered_bits(t_near) & !index_mask) | slot as u32
}

/// Picks the child to continue with for a closest-hit query and pushes the
/// other hit children so that they pop nearest first. Returns the continued
/// child with its active rays.
pub fn traverse_closest_hit<const N: usize, E: StackEntry>(
    node: &WideNode<N>,
    hit: ChildMask,
    t_near: &[f32; N],
    t_mask: &[RayMask; N],
    stack: &mut TraversalStack<E>
) -> (NodeRef, RayMask)
where BranchingFactor<N>: SupportedBranchingFactor {
    debug_assert!(!hit.is_empty());

    let mut slots = hit.iter();
    let Some(r0) = slots.next() else {
        return (NodeRef::Empty, RayMask::EMPTY);
    };
    let c0 = node.child(r0);
    debug_assert!(!c0.is_empty() && !t_mask[r0].is_empty());

    // one child is hit, continue with that child
    let Some(r1) = slots.next() else {
        return (c0, t_mask[r0]);
    };
    let c1 = node.child(r1);
    debug_assert!(!c1.is_empty() && !t_mask[r1].is_empty());

    // two children are hit, push the far child and continue with the closer one
    if slots.len() == 0 {
        let (d0, d1) = (ordered_bits(t_near[r0]), ordered_bits(t_near[r1]));
        return if d0 <= d1 {
            stack.push(E::from_child(c1, t_mask[r1], t_near[r1]));
            (c0, t_mask[r0])
        } else {
            stack.push(E::from_child(c0, t_mask[r0], t_near[r0]));
            (c1, t_mask[r1])
        };
    }

    // more than two hits: sort by key, push far to near, continue with the nearest
    let mut keys = [u32::MAX; N];
    let mut hits = 0;
    for slot in hit {
        keys[hits] = child_sort_key::<N>(t_near[slot], slot);
        hits += 1;
    }
    insertion_sort(&mut keys[..hits]);

    let index_mask = (1u32 << BranchingFactor::<N>::INDEX_BITS) - 1;
    for key in keys[1..hits].iter().rev() {
        let slot = (key & index_mask) as usize;
        let child = node.child(slot);
        debug_assert!(!child.is_empty() && !t_mask[slot].is_empty());
        stack.push(E::from_child(child, t_mask[slot], t_near[slot]));
    }

    let nearest = (keys[0] & index_mask) as usize;
    (node.child(nearest), t_mask[nearest])
}

/// Occlusion variant: children are visited in slot order, the first is
/// continued with and the rest are pushed so they pop lowest slot first.
pub fn traverse_any_hit<const N: usize, E: StackEntry>(
    node: &WideNode<N>,
    hit: ChildMask,
    t_mask: &[RayMask; N],
    stack: &mut TraversalStack<E>
) -> (NodeRef, RayMask) {
    debug_assert!(!hit.is_empty());

    let mut rest = hit;
    let mut slots = hit.iter();
    let Some(first) = slots.next() else {
        return (NodeRef::Empty, RayMask::EMPTY);
    };
    rest.remove(first);

    let mut pending = [0usize; N];
    let mut count = 0;
    for slot in rest {
        pending[count] = slot;
        count += 1;
    }
    for &slot in pending[..count].iter().rev() {
        let child = node.child(slot);
        debug_assert!(!child.is_empty() && !t_mask[slot].is_empty());
        stack.push(E::from_child(child, t_mask[slot], f32::NEG_INFINITY));
    }

    (node.child(first), t_mask[first])
}

fn insertion_sort(keys: &mut [u32]) {
    for i in 1..keys.len() {
        let key = keys[i];
        let mut j = i;
        while j > 0 && keys[j - 1] > key {
            keys[j] = keys[j - 1];
            j -= 1;
        }
        keys[j] = key;
    }
}
