use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/*****************************************************************************
*                               PUB STRUCTS
******************************************************************************/

/// One bit per ray of a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RayMask(pub u64);

/// One bit per child slot of a wide node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChildMask(pub u32);

/// Yields set bit indices lowest first, clearing each as it goes.
#[derive(Clone, Copy, Debug)]
pub struct SetBits(u64);

/*****************************************************************************
*                               IMPLEMENTATIONS
******************************************************************************/

impl Iterator for SetBits {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(index)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.0.count_ones() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for SetBits {}

macro_rules! impl_bit_set {
    ($name:ident, $bits:ty) => {
        impl $name {
            pub const EMPTY: $name = $name(0);
            pub const WIDTH: usize = <$bits>::BITS as usize;

            /// Bits `0..count` set.
            #[inline]
            pub fn first_n(count: usize) -> Self {
                debug_assert!(count <= Self::WIDTH);
                if count >= Self::WIDTH {
                    $name(<$bits>::MAX)
                } else {
                    $name(((1 as $bits) << count) - 1)
                }
            }

            #[inline]
            pub fn single(index: usize) -> Self {
                debug_assert!(index < Self::WIDTH);
                $name((1 as $bits) << index)
            }

            #[inline]
            pub fn bits(&self) -> $bits {
                self.0
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub fn count(&self) -> usize {
                self.0.count_ones() as usize
            }

            #[inline]
            pub fn contains(&self, index: usize) -> bool {
                self.0 & ((1 as $bits) << index) != 0
            }

            #[inline]
            pub fn insert(&mut self, index: usize) {
                self.0 |= (1 as $bits) << index;
            }

            #[inline]
            pub fn remove(&mut self, index: usize) {
                self.0 &= !((1 as $bits) << index);
            }

            #[inline]
            pub fn iter(&self) -> SetBits {
                SetBits(self.0 as u64)
            }
        }

        impl IntoIterator for $name {
            type Item = usize;
            type IntoIter = SetBits;

            #[inline]
            fn into_iter(self) -> SetBits {
                self.iter()
            }
        }

        impl BitAnd for $name {
            type Output = $name;
            #[inline]
            fn bitand(self, rhs: $name) -> $name { $name(self.0 & rhs.0) }
        }

        impl BitOr for $name {
            type Output = $name;
            #[inline]
            fn bitor(self, rhs: $name) -> $name { $name(self.0 | rhs.0) }
        }

        impl Not for $name {
            type Output = $name;
            #[inline]
            fn not(self) -> $name { $name(!self.0) }
        }

        impl BitAndAssign for $name {
            #[inline]
            fn bitand_assign(&mut self, rhs: $name) { self.0 &= rhs.0; }
        }

        impl BitOrAssign for $name {
            #[inline]
            fn bitor_assign(&mut self, rhs: $name) { self.0 |= rhs.0; }
        }
    };
}

impl_bit_set!(RayMask, u64);
impl_bit_set!(ChildMask, u32);
