//! Lane element types.
//!
//! Every lane type is carried around as its raw bit pattern. Compaction
//! never looks at values, and floating lanes are compared bit-for-bit so
//! that NaN payloads and signed zeros survive unchanged.
//!
//! There are no 8-bit lane types: no target has a compaction primitive for
//! them, so asking for one fails to compile.

use std::fmt::{self, Debug};

mod sealed {
    pub trait Sealed {}
}

/// Unsigned integer holding the bits of one lane.
pub trait LaneBits: Copy + Default + Debug + Eq + Send + Sync + 'static + sealed::Sealed {
    /// Truncates `bits` to the width of `Self`.
    fn from_u64(bits: u64) -> Self;
    fn to_u64(self) -> u64;
}

macro_rules! lane_bits {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl LaneBits for $t {
            #[inline]
            fn from_u64(bits: u64) -> Self {
                bits as $t
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }
        }
    )*};
}

lane_bits!(u16, u32, u64);

/// An element type that can live in a compressible vector.
///
/// Sealed: each implementor has exactly the size and alignment of its
/// [`Lane::Bits`], which lets store policies write through a `&mut [T]`
/// as if it were a slice of the bit type.
pub trait Lane: Copy + Default + Debug + Send + Sync + 'static + sealed::Sealed {
    type Bits: LaneBits;

    /// Short name used in diagnostics, e.g. `u32` or `f16`.
    const NAME: &'static str;

    fn to_bits(self) -> Self::Bits;
    fn from_bits(bits: Self::Bits) -> Self;

    /// Equality of raw bit patterns.
    #[inline]
    fn bits_eq(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

macro_rules! lane {
    ($t:ty, $bits:ty, $name:literal, |$x:ident| $to:expr, |$b:ident| $from:expr) => {
        impl Lane for $t {
            type Bits = $bits;
            const NAME: &'static str = $name;

            #[inline]
            fn to_bits(self) -> $bits {
                let $x = self;
                $to
            }

            #[inline]
            fn from_bits($b: $bits) -> Self {
                $from
            }
        }
    };
}

impl sealed::Sealed for i16 {}
impl sealed::Sealed for i32 {}
impl sealed::Sealed for i64 {}
impl sealed::Sealed for f32 {}
impl sealed::Sealed for f64 {}
impl sealed::Sealed for F16 {}

lane!(u16, u16, "u16", |x| x, |b| b);
lane!(i16, u16, "i16", |x| x as u16, |b| b as i16);
lane!(F16, u16, "f16", |x| x.to_bits(), |b| F16::from_bits(b));
lane!(u32, u32, "u32", |x| x, |b| b);
lane!(i32, u32, "i32", |x| x as u32, |b| b as i32);
lane!(f32, u32, "f32", |x| x.to_bits(), |b| f32::from_bits(b));
lane!(u64, u64, "u64", |x| x, |b| b);
lane!(i64, u64, "i64", |x| x as u64, |b| b as i64);
lane!(f64, u64, "f64", |x| x.to_bits(), |b| f64::from_bits(b));

/// IEEE binary16 value, stored and compared as raw bits only.
///
/// There is no arithmetic or numeric conversion: not every target can
/// materialize a half-precision value losslessly, so values are built from
/// bytes or bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct F16(u16);

impl F16 {
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u16 {
        self.0
    }

    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl Debug for F16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F16({:#06x})", self.0)
    }
}
