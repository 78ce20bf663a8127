//! Vector values and per-lane masks.

use std::fmt;
use std::ops::Index;

use crate::error::{Error, Result};
use crate::lane::Lane;

/// `N` lanes of `T`, held by value.
///
/// Aligned for the widest register any backend loads it into. Equality
/// compares raw lane bits.
#[derive(Clone, Copy)]
#[repr(C, align(64))]
pub struct Vector<T, const N: usize>([T; N]);

impl<T: Lane, const N: usize> Vector<T, N> {
    pub const LANES: usize = N;

    pub const fn from_array(lanes: [T; N]) -> Self {
        Self(lanes)
    }

    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        Self(std::array::from_fn(f))
    }

    pub fn splat(value: T) -> Self {
        Self([value; N])
    }

    /// Loads the first `N` lanes of `lanes`.
    pub fn from_slice(lanes: &[T]) -> Result<Self> {
        match lanes.get(..N) {
            Some(head) => Ok(Self::from_fn(|i| head[i])),
            None => Err(Error::LengthMismatch {
                expected: N,
                actual: lanes.len(),
            }),
        }
    }

    pub fn to_array(self) -> [T; N] {
        self.0
    }

    pub fn as_array(&self) -> &[T; N] {
        &self.0
    }

    pub fn lane(&self, i: usize) -> T {
        self.0[i]
    }

    /// Writes all `N` lanes to the front of `dest`.
    pub fn store(&self, dest: &mut [T]) -> Result<()> {
        let actual = dest.len();
        match dest.get_mut(..N) {
            Some(head) => {
                head.copy_from_slice(&self.0);
                Ok(())
            }
            None => Err(Error::DestinationTooShort { needed: N, actual }),
        }
    }

    /// Mask of the lanes for which `pred` holds.
    pub fn mask_where(&self, mut pred: impl FnMut(T) -> bool) -> Mask<N> {
        Mask::from_fn(|i| pred(self.0[i]))
    }

    pub(crate) fn to_bits(self) -> [T::Bits; N] {
        self.0.map(T::to_bits)
    }

    pub(crate) fn from_bits(bits: [T::Bits; N]) -> Self {
        Self(bits.map(T::from_bits))
    }
}

impl<T: Lane, const N: usize> Default for Vector<T, N> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl<T: Lane, const N: usize> From<[T; N]> for Vector<T, N> {
    fn from(lanes: [T; N]) -> Self {
        Self(lanes)
    }
}

impl<T: Lane, const N: usize> Index<usize> for Vector<T, N> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.0[i]
    }
}

impl<T: Lane, const N: usize> PartialEq for Vector<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a.bits_eq(*b))
    }
}

impl<T: Lane, const N: usize> Eq for Vector<T, N> {}

impl<T: Lane, const N: usize> fmt::Debug for Vector<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Per-lane predicate for an `N`-lane vector, kept as an integer code with
/// lane `i` in bit `i`.
///
/// Bits at and above `N` are always zero, so the code indexes permutation
/// tables directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask<const N: usize> {
    code: u64,
}

impl<const N: usize> Mask<N> {
    const VALID: u64 = {
        assert!(N <= 64, "masks cover at most 64 lanes");
        if N == 64 {
            u64::MAX
        } else {
            (1u64 << N) - 1
        }
    };

    pub const fn none() -> Self {
        Self { code: 0 }
    }

    pub const fn all() -> Self {
        Self { code: Self::VALID }
    }

    /// Takes lane `i` from bit `i` of `code`; bits at and above `N` are dropped.
    pub const fn from_code(code: u64) -> Self {
        Self {
            code: code & Self::VALID,
        }
    }

    /// The first `n` lanes, saturating at `N`.
    pub const fn first_n(n: usize) -> Self {
        if n >= 64 {
            Self::all()
        } else {
            Self::from_code((1u64 << n) - 1)
        }
    }

    pub fn from_bools(lanes: [bool; N]) -> Self {
        Self::from_fn(|i| lanes[i])
    }

    pub fn from_fn(mut f: impl FnMut(usize) -> bool) -> Self {
        let mut code = 0;
        for lane in 0..N {
            if f(lane) {
                code |= 1u64 << lane;
            }
        }
        Self::from_code(code)
    }

    pub const fn code(self) -> u64 {
        self.code
    }

    pub const fn test(self, lane: usize) -> bool {
        lane < N && self.code & (1u64 << lane) != 0
    }

    pub const fn count_true(self) -> usize {
        self.code.count_ones() as usize
    }

    pub fn to_bools(self) -> [bool; N] {
        std::array::from_fn(|i| self.test(i))
    }

    /// Indices of the true lanes, ascending.
    pub fn iter_set(self) -> SetLanes {
        SetLanes { rest: self.code }
    }
}

impl<const N: usize> Default for Mask<N> {
    fn default() -> Self {
        Self::none()
    }
}

impl<const N: usize> fmt::Debug for Mask<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mask<{}>({:#b})", N, self.code)
    }
}

/// Iterator over the set lanes of a [`Mask`].
#[derive(Debug, Clone)]
pub struct SetLanes {
    rest: u64,
}

impl Iterator for SetLanes {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.rest == 0 {
            return None;
        }
        // isolate lowest 1-bit
        let toggle = self.rest & self.rest.wrapping_neg();
        let lane = self.rest.trailing_zeros() as usize;
        self.rest ^= toggle;
        Some(lane)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.rest.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SetLanes {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_drops_high_bits() {
        let m = Mask::<4>::from_code(0xff);
        assert_eq!(m.code(), 0xf);
        assert_eq!(m, Mask::all());
        assert!(!m.test(4));
        assert_eq!(Mask::<64>::all().count_true(), 64);
        assert_eq!(Mask::<8>::first_n(3).code(), 0b111);
        assert_eq!(Mask::<8>::first_n(100), Mask::all());
    }

    #[test]
    fn set_lanes_ascending() {
        let m = Mask::<8>::from_bools([false, true, false, true, true, false, false, true]);
        assert_eq!(m.iter_set().collect::<Vec<_>>(), vec![1, 3, 4, 7]);
        assert_eq!(m.iter_set().len(), 4);
        assert!(m.to_bools()[3]);
    }

    #[test]
    fn vector_equality_is_bitwise() {
        let nan = Vector::<f32, 4>::splat(f32::NAN);
        assert_eq!(nan, Vector::splat(f32::NAN));
        assert_ne!(Vector::<f32, 4>::splat(0.0), Vector::splat(-0.0));
    }

    #[test]
    fn from_slice_and_store() {
        let v = Vector::<u32, 4>::from_slice(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(v.to_array(), [1, 2, 3, 4]);
        assert_eq!(
            Vector::<u32, 4>::from_slice(&[1, 2]),
            Err(Error::LengthMismatch {
                expected: 4,
                actual: 2
            })
        );

        let mut out = [0u32; 3];
        assert_eq!(
            v.store(&mut out),
            Err(Error::DestinationTooShort {
                needed: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn mask_where_predicate() {
        let v = Vector::from_array([10u32, 20, 30, 40]);
        assert_eq!(v.mask_where(|x| x > 15 && x != 30).code(), 0b1010);
    }
}
