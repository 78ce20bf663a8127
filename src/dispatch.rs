//! Runtime target selection and the store policies.
//!
//! | Policy                     | Writes                  | Past `count`   |
//! |----------------------------|-------------------------|----------------|
//! | `compress`                 | nothing                 | n/a            |
//! | `compress_store`           | lanes `[0, N)` of dest  | unspecified    |
//! | `compress_blended_store`   | lanes `[0, count)` only | untouched      |
//!
//! `compress_store` is allowed to clobber the whole `N`-lane region; use the
//! blended form when appending into a buffer whose tail must survive. Every
//! store needs room for `N` lanes, since `count` is unknown up front.

use once_cell::sync::Lazy;

use crate::backend::{copy_kept, scalar_backend, Backend, Target};
use crate::error::{Error, Result};
use crate::lane::Lane;
use crate::vector::{Mask, Vector};

mod sealed {
    pub trait Sealed {}
}

/// Lane-bit arrays a backend can compress.
///
/// Implemented for the 128-, 256- and 512-bit shapes of 16-, 32- and 64-bit
/// lanes, and for the partial shapes narrower than 128 bits (u16x1/2/4,
/// u32x1/2, u64x1), which ride in the low lanes of a 128-bit register. Any
/// other `Vector<T, N>` has no compress API.
pub trait NativeShape: Copy + sealed::Sealed {
    #[doc(hidden)]
    fn compress_on(self, backend: &dyn Backend, code: u64) -> Self;

    #[doc(hidden)]
    fn blended_store_on(self, backend: &dyn Backend, code: u64, dest: &mut Self) -> usize;
}

macro_rules! native_shape {
    ($bits:ty, $lanes:literal, $compress:ident) => {
        impl sealed::Sealed for [$bits; $lanes] {}

        impl NativeShape for [$bits; $lanes] {
            #[inline]
            fn compress_on(self, backend: &dyn Backend, code: u64) -> Self {
                backend.$compress(self, code)
            }

            #[inline]
            fn blended_store_on(self, backend: &dyn Backend, code: u64, dest: &mut Self) -> usize {
                copy_kept(&backend.$compress(self, code), code, dest)
            }
        }
    };
    ($bits:ty, $lanes:literal, $compress:ident, $blended:ident) => {
        impl sealed::Sealed for [$bits; $lanes] {}

        impl NativeShape for [$bits; $lanes] {
            #[inline]
            fn compress_on(self, backend: &dyn Backend, code: u64) -> Self {
                backend.$compress(self, code)
            }

            #[inline]
            fn blended_store_on(self, backend: &dyn Backend, code: u64, dest: &mut Self) -> usize {
                backend.$blended(self, code, dest)
            }
        }
    };
    ($bits:ty, $lanes:literal, padded to $full:literal, $compress:ident) => {
        impl sealed::Sealed for [$bits; $lanes] {}

        impl NativeShape for [$bits; $lanes] {
            #[inline]
            fn compress_on(self, backend: &dyn Backend, code: u64) -> Self {
                // `code` has no bits past `$lanes`, so the padding is never kept.
                let mut padded = [0; $full];
                padded[..$lanes].copy_from_slice(&self);
                let packed = backend.$compress(padded, code);
                std::array::from_fn(|i| packed[i])
            }

            #[inline]
            fn blended_store_on(self, backend: &dyn Backend, code: u64, dest: &mut Self) -> usize {
                copy_kept(&self.compress_on(backend, code), code, dest)
            }
        }
    };
}

native_shape!(u16, 1, padded to 8, compress_u16x8);
native_shape!(u16, 2, padded to 8, compress_u16x8);
native_shape!(u16, 4, padded to 8, compress_u16x8);
native_shape!(u32, 1, padded to 4, compress_u32x4);
native_shape!(u32, 2, padded to 4, compress_u32x4);
native_shape!(u64, 1, padded to 2, compress_u64x2);
native_shape!(u16, 8, compress_u16x8);
native_shape!(u16, 16, compress_u16x16);
native_shape!(u16, 32, compress_u16x32);
native_shape!(u32, 4, compress_u32x4, blended_store_u32x4);
native_shape!(u32, 8, compress_u32x8, blended_store_u32x8);
native_shape!(u32, 16, compress_u32x16);
native_shape!(u64, 2, compress_u64x2, blended_store_u64x2);
native_shape!(u64, 4, compress_u64x4, blended_store_u64x4);
native_shape!(u64, 8, compress_u64x8);

/// Targets the running CPU supports, best first. Always ends with
/// [`Target::Scalar`].
pub fn supported_targets() -> Vec<Target> {
    Target::ALL.iter().copied().filter(|t| t.is_supported()).collect()
}

static GLOBAL: Lazy<Dispatcher> = Lazy::new(|| {
    let dispatcher = Dispatcher::detect();
    log::debug!("compress target: {}", dispatcher.target());
    dispatcher
});

/// Compaction bound to one target.
///
/// [`Dispatcher::global`] picks the best supported target once per process;
/// [`Dispatcher::for_target`] pins a specific one, e.g. to test every target
/// the CPU supports.
#[derive(Clone, Copy)]
pub struct Dispatcher {
    backend: &'static dyn Backend,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("target", &self.target())
            .finish()
    }
}

impl Dispatcher {
    /// The process-wide dispatcher. Detection runs on first use only.
    pub fn global() -> Self {
        *GLOBAL
    }

    /// A dispatcher for `target`, or `None` if the CPU lacks it.
    pub fn for_target(target: Target) -> Option<Self> {
        let backend = target.backend();
        if backend.is_none() {
            log::trace!("target {} not supported by this CPU", target);
        }
        backend.map(|backend| Self { backend })
    }

    fn detect() -> Self {
        Target::ALL
            .iter()
            .find_map(|&t| Self::for_target(t))
            .unwrap_or(Self {
                backend: scalar_backend(),
            })
    }

    pub fn target(&self) -> Target {
        self.backend.target()
    }

    /// Moves the lanes selected by `mask` to the front, in order.
    ///
    /// Lanes at and past `mask.count_true()` are unspecified.
    pub fn compress<T: Lane, const N: usize>(&self, v: Vector<T, N>, mask: Mask<N>) -> Vector<T, N>
    where
        [T::Bits; N]: NativeShape,
    {
        Vector::from_bits(v.to_bits().compress_on(self.backend, mask.code()))
    }

    /// Compresses and writes all `N` lanes to `dest`. Returns the count.
    ///
    /// `dest[count..N]` receives unspecified lanes.
    pub fn compress_store<T: Lane, const N: usize>(
        &self,
        v: Vector<T, N>,
        mask: Mask<N>,
        dest: &mut [T],
    ) -> Result<usize>
    where
        [T::Bits; N]: NativeShape,
    {
        let head = region::<T, N>(dest)?;
        *head = self.compress(v, mask).to_array();
        Ok(mask.count_true())
    }

    /// Compresses and writes only the kept lanes to `dest`. Returns the count.
    ///
    /// `dest[count..]` is left byte-for-byte as it was. `dest` must still
    /// hold `N` lanes.
    pub fn compress_blended_store<T: Lane, const N: usize>(
        &self,
        v: Vector<T, N>,
        mask: Mask<N>,
        dest: &mut [T],
    ) -> Result<usize>
    where
        [T::Bits; N]: NativeShape,
    {
        let head = region::<T, N>(dest)?;
        // SAFETY: `Lane` is sealed and every lane type has the size and
        // alignment of its `Bits`.
        let head = unsafe { &mut *(head as *mut [T; N]).cast::<[T::Bits; N]>() };
        Ok(v.to_bits().blended_store_on(self.backend, mask.code(), head))
    }

    /// [`compress`](Self::compress) with the mask read from packed bits.
    pub fn compress_bits<T: Lane, const N: usize>(
        &self,
        v: Vector<T, N>,
        bits: &[u8],
    ) -> Result<Vector<T, N>>
    where
        [T::Bits; N]: NativeShape,
    {
        Ok(self.compress(v, Mask::load_bits(bits)?))
    }

    /// [`compress_store`](Self::compress_store) with the mask read from
    /// packed bits.
    pub fn compress_bits_store<T: Lane, const N: usize>(
        &self,
        v: Vector<T, N>,
        bits: &[u8],
        dest: &mut [T],
    ) -> Result<usize>
    where
        [T::Bits; N]: NativeShape,
    {
        self.compress_store(v, Mask::load_bits(bits)?, dest)
    }

    /// [`compress_blended_store`](Self::compress_blended_store) with the mask
    /// read from packed bits.
    pub fn compress_bits_blended_store<T: Lane, const N: usize>(
        &self,
        v: Vector<T, N>,
        bits: &[u8],
        dest: &mut [T],
    ) -> Result<usize>
    where
        [T::Bits; N]: NativeShape,
    {
        self.compress_blended_store(v, Mask::load_bits(bits)?, dest)
    }
}

fn region<T, const N: usize>(dest: &mut [T]) -> Result<&mut [T; N]> {
    let actual = dest.len();
    dest.get_mut(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or(Error::DestinationTooShort { needed: N, actual })
}

/// [`Dispatcher::compress`] on the global dispatcher.
pub fn compress<T: Lane, const N: usize>(v: Vector<T, N>, mask: Mask<N>) -> Vector<T, N>
where
    [T::Bits; N]: NativeShape,
{
    Dispatcher::global().compress(v, mask)
}

/// [`Dispatcher::compress_store`] on the global dispatcher.
pub fn compress_store<T: Lane, const N: usize>(
    v: Vector<T, N>,
    mask: Mask<N>,
    dest: &mut [T],
) -> Result<usize>
where
    [T::Bits; N]: NativeShape,
{
    Dispatcher::global().compress_store(v, mask, dest)
}

/// [`Dispatcher::compress_blended_store`] on the global dispatcher.
pub fn compress_blended_store<T: Lane, const N: usize>(
    v: Vector<T, N>,
    mask: Mask<N>,
    dest: &mut [T],
) -> Result<usize>
where
    [T::Bits; N]: NativeShape,
{
    Dispatcher::global().compress_blended_store(v, mask, dest)
}

/// [`Dispatcher::compress_bits`] on the global dispatcher.
pub fn compress_bits<T: Lane, const N: usize>(v: Vector<T, N>, bits: &[u8]) -> Result<Vector<T, N>>
where
    [T::Bits; N]: NativeShape,
{
    Dispatcher::global().compress_bits(v, bits)
}

/// [`Dispatcher::compress_bits_store`] on the global dispatcher.
pub fn compress_bits_store<T: Lane, const N: usize>(
    v: Vector<T, N>,
    bits: &[u8],
    dest: &mut [T],
) -> Result<usize>
where
    [T::Bits; N]: NativeShape,
{
    Dispatcher::global().compress_bits_store(v, bits, dest)
}

/// [`Dispatcher::compress_bits_blended_store`] on the global dispatcher.
pub fn compress_bits_blended_store<T: Lane, const N: usize>(
    v: Vector<T, N>,
    bits: &[u8],
    dest: &mut [T],
) -> Result<usize>
where
    [T::Bits; N]: NativeShape,
{
    Dispatcher::global().compress_bits_blended_store(v, bits, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::mask_bytes;

    #[test_log::test]
    fn global_is_best_supported() {
        let targets = supported_targets();
        assert_eq!(Dispatcher::global().target(), targets[0]);
        assert_eq!(targets.last(), Some(&Target::Scalar));
        assert_eq!(Dispatcher::global().target(), Dispatcher::global().target());
    }

    #[test_log::test]
    fn example_on_every_target() {
        for target in supported_targets() {
            let d = Dispatcher::for_target(target).unwrap();
            let v = Vector::from_array([10u32, 20, 30, 40]);
            let m = Mask::from_bools([false, true, false, true]);
            assert_eq!(&d.compress(v, m).as_array()[..2], &[20, 40], "{}", target);

            let mut dest = [9u32; 4];
            assert_eq!(d.compress_blended_store(v, m, &mut dest), Ok(2));
            assert_eq!(dest, [20, 40, 9, 9], "{}", target);

            let mut bits = [0u8; mask_bytes(4)];
            m.store_bits(&mut bits).unwrap();
            assert_eq!(bits[0], 0b0000_1010);
            let mut dest = [0u32; 4];
            assert_eq!(d.compress_bits_store(v, &bits, &mut dest), Ok(2));
            assert_eq!(&dest[..2], &[20, 40]);
        }
    }

    #[test]
    fn short_destination_is_untouched() {
        let v = Vector::from_array([1u64, 2, 3, 4]);
        let mut dest = [7u64; 3];
        let err = Err(Error::DestinationTooShort { needed: 4, actual: 3 });
        assert_eq!(compress_store(v, Mask::all(), &mut dest), err);
        assert_eq!(compress_blended_store(v, Mask::all(), &mut dest), err);
        assert_eq!(dest, [7; 3]);
    }

    #[test]
    fn short_bits_are_reported() {
        let v = Vector::<i16, 8>::splat(-1);
        assert_eq!(
            compress_bits(v, &[0xff; 7]),
            Err(Error::BitsTooShort {
                lanes: 8,
                needed: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn store_may_write_whole_region() {
        let v = Vector::from_array([1u32, 2, 3, 4, 5, 6, 7, 8]);
        let mut dest = [0u32; 10];
        assert_eq!(compress_store(v, Mask::from_code(0b1000_0001), &mut dest), Ok(2));
        assert_eq!(&dest[..2], &[1, 8]);
        assert_eq!(&dest[8..], &[0, 0]);
    }

    #[test]
    fn partial_vectors_on_every_target() {
        for target in supported_targets() {
            let d = Dispatcher::for_target(target).unwrap();

            let v = Vector::from_array([10u32, 20]);
            let out = d.compress(v, Mask::from_bools([false, true]));
            assert_eq!(out.lane(0), 20, "{}", target);

            let mut dest = [9u32; 3];
            assert_eq!(d.compress_blended_store(v, Mask::from_code(0b01), &mut dest), Ok(1));
            assert_eq!(dest, [10, 9, 9], "{}", target);

            let v = Vector::from_array([1i16, -2, 3, -4]);
            let out = d.compress(v, Mask::from_code(0b1010));
            assert_eq!(&out.as_array()[..2], &[-2, -4], "{}", target);

            let v = Vector::from_array([7u64]);
            let mut dest = [0u64; 1];
            assert_eq!(d.compress_store(v, Mask::all(), &mut dest), Ok(1));
            assert_eq!(dest, [7]);
            assert_eq!(d.compress_blended_store(v, Mask::none(), &mut dest), Ok(0));
        }
    }
}
