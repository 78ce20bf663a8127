//! Per-target compaction backends.
//!
//! Every target implements [`Backend`] on raw lane bits. The 128-bit shapes
//! are required; 256-bit shapes default to compressing both halves and
//! joining them at the low half's count, 512-bit shapes default to the
//! table-free network. Targets override whatever they do natively.
//!
//! A SIMD backend is only reachable through [`Target::backend`], which
//! checks the CPU first; that check is what makes the intrinsics inside the
//! safe trait methods sound.

use std::fmt;

use crate::network;

mod scalar;

#[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
mod x86;

#[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
mod arm;

/// Instruction-set variant a backend is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Portable Rust, always available.
    Scalar,
    /// x86_64 with SSSE3 `pshufb`.
    #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
    Ssse3,
    /// x86_64 with AVX2 `vpermd` and masked stores.
    #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
    Avx2,
    /// aarch64 with NEON `tbl`.
    #[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
    Neon,
}

impl Target {
    /// Every target compiled into this build, best first.
    pub const ALL: &'static [Target] = &[
        #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
        Target::Avx2,
        #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
        Target::Ssse3,
        #[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
        Target::Neon,
        Target::Scalar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Target::Scalar => "scalar",
            #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
            Target::Ssse3 => "ssse3",
            #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
            Target::Avx2 => "avx2",
            #[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
            Target::Neon => "neon",
        }
    }

    /// Whether the running CPU can execute this target.
    pub fn is_supported(self) -> bool {
        match self {
            Target::Scalar => true,
            #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
            Target::Ssse3 => is_x86_feature_detected!("ssse3"),
            #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
            Target::Avx2 => {
                is_x86_feature_detected!("avx2")
                    && is_x86_feature_detected!("ssse3")
                    && is_x86_feature_detected!("sse4.2")
            }
            #[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
            Target::Neon => std::arch::is_aarch64_feature_detected!("neon"),
        }
    }

    /// The backend for this target, if the CPU supports it.
    pub(crate) fn backend(self) -> Option<&'static dyn Backend> {
        if !self.is_supported() {
            return None;
        }
        let backend: &'static dyn Backend = match self {
            Target::Scalar => &scalar::SCALAR,
            #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
            Target::Ssse3 => &x86::SSSE3,
            #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
            Target::Avx2 => &x86::AVX2,
            #[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
            Target::Neon => &arm::NEON,
        };
        Some(backend)
    }
}

pub(crate) fn scalar_backend() -> &'static dyn Backend {
    &scalar::SCALAR
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compaction on raw lane bits for one target.
///
/// Public only so [`NativeShape`](crate::NativeShape) can name it; the
/// module is private, so nothing outside the crate can implement or call it.
///
/// `code` has bit `i` set when lane `i` is kept and never has bits at or
/// above the lane count. Lanes past the kept count are unspecified.
pub trait Backend: Send + Sync + fmt::Debug {
    fn target(&self) -> Target;

    fn compress_u16x8(&self, v: [u16; 8], code: u64) -> [u16; 8];
    fn compress_u32x4(&self, v: [u32; 4], code: u64) -> [u32; 4];
    fn compress_u64x2(&self, v: [u64; 2], code: u64) -> [u64; 2];

    fn compress_u16x16(&self, v: [u16; 16], code: u64) -> [u16; 16] {
        join_halves(v, code, |half, c| self.compress_u16x8(half, c))
    }

    fn compress_u32x8(&self, v: [u32; 8], code: u64) -> [u32; 8] {
        join_halves(v, code, |half, c| self.compress_u32x4(half, c))
    }

    fn compress_u64x4(&self, v: [u64; 4], code: u64) -> [u64; 4] {
        join_halves(v, code, |half, c| self.compress_u64x2(half, c))
    }

    fn compress_u16x32(&self, v: [u16; 32], code: u64) -> [u16; 32] {
        network::compact(v, code)
    }

    fn compress_u32x16(&self, v: [u32; 16], code: u64) -> [u32; 16] {
        network::compact(v, code)
    }

    fn compress_u64x8(&self, v: [u64; 8], code: u64) -> [u64; 8] {
        network::compact(v, code)
    }

    // Blended stores write exactly the kept lanes of `dest`.

    fn blended_store_u32x4(&self, v: [u32; 4], code: u64, dest: &mut [u32; 4]) -> usize {
        copy_kept(&self.compress_u32x4(v, code), code, dest)
    }

    fn blended_store_u32x8(&self, v: [u32; 8], code: u64, dest: &mut [u32; 8]) -> usize {
        copy_kept(&self.compress_u32x8(v, code), code, dest)
    }

    fn blended_store_u64x2(&self, v: [u64; 2], code: u64, dest: &mut [u64; 2]) -> usize {
        copy_kept(&self.compress_u64x2(v, code), code, dest)
    }

    fn blended_store_u64x4(&self, v: [u64; 4], code: u64, dest: &mut [u64; 4]) -> usize {
        copy_kept(&self.compress_u64x4(v, code), code, dest)
    }
}

/// Compresses each half of `v` with `half` and packs the high half right
/// behind the kept lanes of the low half.
pub(crate) fn join_halves<T: Copy, const H: usize, const N: usize>(
    v: [T; N],
    code: u64,
    half: impl Fn([T; H], u64) -> [T; H],
) -> [T; N] {
    debug_assert_eq!(N, 2 * H);
    let lo_code = code & ((1u64 << H) - 1);
    let hi_code = code >> H;
    let lo = half(std::array::from_fn(|i| v[i]), lo_code);
    let hi = half(std::array::from_fn(|i| v[H + i]), hi_code);

    let kept_lo = lo_code.count_ones() as usize;
    let mut out = v;
    out[..kept_lo].copy_from_slice(&lo[..kept_lo]);
    out[kept_lo..kept_lo + H].copy_from_slice(&hi);
    out
}

/// Copies the kept prefix of `packed` into `dest`, leaving the rest alone.
pub(crate) fn copy_kept<T: Copy, const N: usize>(
    packed: &[T; N],
    code: u64,
    dest: &mut [T; N],
) -> usize {
    let kept = code.count_ones() as usize;
    dest[..kept].copy_from_slice(&packed[..kept]);
    kept
}
