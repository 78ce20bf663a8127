//! x86_64 backends.
//!
//! SSSE3 left-packs 128-bit vectors with `pshufb` and a byte-index table.
//! AVX2 adds `vpermd` for 256-bit vectors and `vpmaskmov` for blended
//! stores of 32- and 64-bit lanes.

use super::{join_halves, Backend, Target};

/// Only handed out by [`Target::backend`] after SSSE3 was detected.
#[derive(Debug)]
pub(crate) struct Ssse3 {
    _detected: (),
}

pub(crate) static SSSE3: Ssse3 = Ssse3 { _detected: () };

/// Only handed out by [`Target::backend`] after AVX2, SSSE3 and SSE4.2
/// were detected.
#[derive(Debug)]
pub(crate) struct Avx2 {
    _detected: (),
}

pub(crate) static AVX2: Avx2 = Avx2 { _detected: () };

impl Backend for Ssse3 {
    fn target(&self) -> Target {
        Target::Ssse3
    }

    // Safety for every block below: SSSE3 is available, see `Ssse3`.

    fn compress_u16x8(&self, v: [u16; 8], code: u64) -> [u16; 8] {
        unsafe { ssse3::store(ssse3::shuffle_u16x8(ssse3::load(&v), code)) }
    }

    fn compress_u32x4(&self, v: [u32; 4], code: u64) -> [u32; 4] {
        unsafe { ssse3::store(ssse3::shuffle_u32x4(ssse3::load(&v), code)) }
    }

    fn compress_u64x2(&self, v: [u64; 2], code: u64) -> [u64; 2] {
        unsafe { ssse3::store(ssse3::shuffle_u64x2(ssse3::load(&v), code)) }
    }
}

impl Backend for Avx2 {
    fn target(&self) -> Target {
        Target::Avx2
    }

    // Safety for every block below: AVX2 (and with it SSSE3 and SSE4.2) is
    // available, see `Avx2`.

    fn compress_u16x8(&self, v: [u16; 8], code: u64) -> [u16; 8] {
        unsafe { ssse3::store(ssse3::shuffle_u16x8(ssse3::load(&v), code)) }
    }

    fn compress_u32x4(&self, v: [u32; 4], code: u64) -> [u32; 4] {
        unsafe { ssse3::store(ssse3::shuffle_u32x4(ssse3::load(&v), code)) }
    }

    fn compress_u64x2(&self, v: [u64; 2], code: u64) -> [u64; 2] {
        unsafe { ssse3::store(ssse3::shuffle_u64x2(ssse3::load(&v), code)) }
    }

    fn compress_u32x8(&self, v: [u32; 8], code: u64) -> [u32; 8] {
        unsafe { avx2::store(avx2::permute_u32x8(avx2::load(&v), code)) }
    }

    fn compress_u64x4(&self, v: [u64; 4], code: u64) -> [u64; 4] {
        unsafe { avx2::store(avx2::permute_u64x4(avx2::load(&v), code)) }
    }

    fn compress_u32x16(&self, v: [u32; 16], code: u64) -> [u32; 16] {
        join_halves(v, code, |half, c| self.compress_u32x8(half, c))
    }

    fn compress_u64x8(&self, v: [u64; 8], code: u64) -> [u64; 8] {
        join_halves(v, code, |half, c| self.compress_u64x4(half, c))
    }

    fn blended_store_u32x4(&self, v: [u32; 4], code: u64, dest: &mut [u32; 4]) -> usize {
        unsafe { avx2::blended_store_u32x4(v, code, dest) }
    }

    fn blended_store_u32x8(&self, v: [u32; 8], code: u64, dest: &mut [u32; 8]) -> usize {
        unsafe { avx2::blended_store_u32x8(v, code, dest) }
    }

    fn blended_store_u64x2(&self, v: [u64; 2], code: u64, dest: &mut [u64; 2]) -> usize {
        unsafe { avx2::blended_store_u64x2(v, code, dest) }
    }

    fn blended_store_u64x4(&self, v: [u64; 4], code: u64, dest: &mut [u64; 4]) -> usize {
        unsafe { avx2::blended_store_u64x4(v, code, dest) }
    }
}

mod ssse3 {
    use std::arch::x86_64::{
        __m128i, _mm_add_epi8, _mm_load_si128, _mm_loadl_epi64, _mm_loadu_si128, _mm_set1_epi16,
        _mm_shuffle_epi8, _mm_storeu_si128, _mm_unpacklo_epi8,
    };

    use crate::tables::{BYTES_32X4, BYTES_64X2, DOUBLED_16X8};

    #[inline]
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn load<T: Copy, const N: usize>(v: &[T; N]) -> __m128i {
        debug_assert_eq!(std::mem::size_of::<[T; N]>(), 16);
        _mm_loadu_si128(v.as_ptr().cast())
    }

    #[inline]
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn store<T: Copy + Default, const N: usize>(r: __m128i) -> [T; N] {
        debug_assert_eq!(std::mem::size_of::<[T; N]>(), 16);
        let mut out = [T::default(); N];
        _mm_storeu_si128(out.as_mut_ptr().cast(), r);
        out
    }

    #[inline]
    #[target_feature(enable = "ssse3")]
    pub(super) unsafe fn shuffle_u16x8(v: __m128i, code: u64) -> __m128i {
        let doubled = _mm_loadl_epi64(DOUBLED_16X8[code as usize].as_ptr().cast());
        // (2i, 2i) byte pairs, then +1 on the high byte of each pair
        let bytes = _mm_add_epi8(_mm_unpacklo_epi8(doubled, doubled), _mm_set1_epi16(0x0100));
        _mm_shuffle_epi8(v, bytes)
    }

    #[inline]
    #[target_feature(enable = "ssse3")]
    pub(super) unsafe fn shuffle_u32x4(v: __m128i, code: u64) -> __m128i {
        let bytes = _mm_load_si128(BYTES_32X4[code as usize].0.as_ptr().cast());
        _mm_shuffle_epi8(v, bytes)
    }

    #[inline]
    #[target_feature(enable = "ssse3")]
    pub(super) unsafe fn shuffle_u64x2(v: __m128i, code: u64) -> __m128i {
        let bytes = _mm_load_si128(BYTES_64X2[code as usize].0.as_ptr().cast());
        _mm_shuffle_epi8(v, bytes)
    }
}

mod avx2 {
    use std::arch::x86_64::{
        __m256i, _mm256_cmpgt_epi32, _mm256_cmpgt_epi64, _mm256_load_si256, _mm256_loadu_si256,
        _mm256_maskstore_epi32, _mm256_maskstore_epi64, _mm256_permutevar8x32_epi32,
        _mm256_set1_epi32, _mm256_set1_epi64x, _mm256_setr_epi32, _mm256_setr_epi64x,
        _mm256_srlv_epi32, _mm256_storeu_si256, _mm_cmpgt_epi32, _mm_cmpgt_epi64,
        _mm_maskstore_epi32, _mm_maskstore_epi64, _mm_set1_epi32, _mm_set1_epi64x,
        _mm_set_epi64x, _mm_setr_epi32,
    };

    use super::ssse3;
    use crate::tables::{NIBBLES_32X8, PAIRS_64X4};

    #[inline]
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn load<T: Copy, const N: usize>(v: &[T; N]) -> __m256i {
        debug_assert_eq!(std::mem::size_of::<[T; N]>(), 32);
        _mm256_loadu_si256(v.as_ptr().cast())
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn store<T: Copy + Default, const N: usize>(r: __m256i) -> [T; N] {
        debug_assert_eq!(std::mem::size_of::<[T; N]>(), 32);
        let mut out = [T::default(); N];
        _mm256_storeu_si256(out.as_mut_ptr().cast(), r);
        out
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn permute_u32x8(v: __m256i, code: u64) -> __m256i {
        let packed = NIBBLES_32X8[code as usize] as i32;
        let shifts = _mm256_setr_epi32(0, 4, 8, 12, 16, 20, 24, 28);
        // vpermd only reads the low three bits of each index
        let indices = _mm256_srlv_epi32(_mm256_set1_epi32(packed), shifts);
        _mm256_permutevar8x32_epi32(v, indices)
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn permute_u64x4(v: __m256i, code: u64) -> __m256i {
        let indices = _mm256_load_si256(PAIRS_64X4[code as usize].0.as_ptr().cast());
        _mm256_permutevar8x32_epi32(v, indices)
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn blended_store_u32x4(v: [u32; 4], code: u64, dest: &mut [u32; 4]) -> usize {
        let kept = code.count_ones() as i32;
        let packed = ssse3::shuffle_u32x4(ssse3::load(&v), code);
        let active = _mm_cmpgt_epi32(_mm_set1_epi32(kept), _mm_setr_epi32(0, 1, 2, 3));
        _mm_maskstore_epi32(dest.as_mut_ptr().cast(), active, packed);
        kept as usize
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn blended_store_u32x8(v: [u32; 8], code: u64, dest: &mut [u32; 8]) -> usize {
        let kept = code.count_ones() as i32;
        let packed = permute_u32x8(load(&v), code);
        let active = _mm256_cmpgt_epi32(
            _mm256_set1_epi32(kept),
            _mm256_setr_epi32(0, 1, 2, 3, 4, 5, 6, 7),
        );
        _mm256_maskstore_epi32(dest.as_mut_ptr().cast(), active, packed);
        kept as usize
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn blended_store_u64x2(v: [u64; 2], code: u64, dest: &mut [u64; 2]) -> usize {
        let kept = code.count_ones() as i64;
        let packed = ssse3::shuffle_u64x2(ssse3::load(&v), code);
        let active = _mm_cmpgt_epi64(_mm_set1_epi64x(kept), _mm_set_epi64x(1, 0));
        _mm_maskstore_epi64(dest.as_mut_ptr().cast(), active, packed);
        kept as usize
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn blended_store_u64x4(v: [u64; 4], code: u64, dest: &mut [u64; 4]) -> usize {
        let kept = code.count_ones() as i64;
        let packed = permute_u64x4(load(&v), code);
        let active = _mm256_cmpgt_epi64(_mm256_set1_epi64x(kept), _mm256_setr_epi64x(0, 1, 2, 3));
        _mm256_maskstore_epi64(dest.as_mut_ptr().cast(), active, packed);
        kept as usize
    }
}
