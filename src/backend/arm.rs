//! aarch64 backend: `tbl` over the same byte-index tables SSSE3 uses.

use std::arch::aarch64::{
    uint8x16_t, vaddq_u16, vdupq_n_u16, vld1_u8, vld1q_u8, vmovl_u8, vorrq_u16, vqtbl1q_u8,
    vreinterpretq_u8_u16, vshlq_n_u16, vst1q_u8,
};

use super::{Backend, Target};
use crate::tables::{BYTES_32X4, BYTES_64X2, DOUBLED_16X8};

/// Only handed out by [`Target::backend`] after NEON was detected.
#[derive(Debug)]
pub(crate) struct Neon {
    _detected: (),
}

pub(crate) static NEON: Neon = Neon { _detected: () };

impl Backend for Neon {
    fn target(&self) -> Target {
        Target::Neon
    }

    // Safety for every block below: NEON is available, see `Neon`.

    fn compress_u16x8(&self, v: [u16; 8], code: u64) -> [u16; 8] {
        unsafe { table_lookup(v, indices_u16x8(code)) }
    }

    fn compress_u32x4(&self, v: [u32; 4], code: u64) -> [u32; 4] {
        unsafe { table_lookup(v, vld1q_u8(BYTES_32X4[code as usize].0.as_ptr())) }
    }

    fn compress_u64x2(&self, v: [u64; 2], code: u64) -> [u64; 2] {
        unsafe { table_lookup(v, vld1q_u8(BYTES_64X2[code as usize].0.as_ptr())) }
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn indices_u16x8(code: u64) -> uint8x16_t {
    let doubled = vmovl_u8(vld1_u8(DOUBLED_16X8[code as usize].as_ptr()));
    // 2i in both bytes of each lane, then +1 on the high byte
    let pairs = vorrq_u16(doubled, vshlq_n_u16::<8>(doubled));
    vreinterpretq_u8_u16(vaddq_u16(pairs, vdupq_n_u16(0x0100)))
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn table_lookup<T: Copy + Default, const N: usize>(
    v: [T; N],
    indices: uint8x16_t,
) -> [T; N] {
    debug_assert_eq!(std::mem::size_of::<[T; N]>(), 16);
    let packed = vqtbl1q_u8(vld1q_u8(v.as_ptr().cast()), indices);
    let mut out = [T::default(); N];
    vst1q_u8(out.as_mut_ptr().cast(), packed);
    out
}

#[cfg(test)]
mod tests {
    use super::super::scalar::SCALAR;
    use super::*;

    #[test]
    fn matches_scalar() {
        let Some(neon) = Target::Neon.backend() else {
            return;
        };
        let v16: [u16; 8] = std::array::from_fn(|i| 0x8000 | i as u16);
        for code in 0..256u64 {
            let n = code.count_ones() as usize;
            assert_eq!(
                &neon.compress_u16x8(v16, code)[..n],
                &SCALAR.compress_u16x8(v16, code)[..n]
            );
        }
        for code in 0..16u64 {
            let n = code.count_ones() as usize;
            let v = [1u32, 2, 3, 4];
            assert_eq!(&neon.compress_u32x4(v, code)[..n], &SCALAR.compress_u32x4(v, code)[..n]);
            let v = [5u64, 6, 7, 8];
            assert_eq!(&neon.compress_u64x4(v, code)[..n], &SCALAR.compress_u64x4(v, code)[..n]);
        }
    }
}
