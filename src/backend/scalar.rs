use super::{Backend, Target};

/// Portable backend: walks the set bits of the code.
#[derive(Debug)]
pub(crate) struct Scalar;

pub(crate) static SCALAR: Scalar = Scalar;

fn compress_lanes<T: Copy, const N: usize>(v: [T; N], code: u64) -> [T; N] {
    let mut out = v;
    let mut pos = 0;
    let mut rest = code;
    while rest != 0 {
        // Creates a mask with only the lowest 1-bit, see
        // <https://catonmat.net/low-level-bit-hacks> "isolate lowest 1-bit"
        let toggle = rest & rest.wrapping_neg();
        out[pos] = v[rest.trailing_zeros() as usize];
        pos += 1;
        rest ^= toggle;
    }
    out
}

impl Backend for Scalar {
    fn target(&self) -> Target {
        Target::Scalar
    }

    fn compress_u16x8(&self, v: [u16; 8], code: u64) -> [u16; 8] {
        compress_lanes(v, code)
    }

    fn compress_u32x4(&self, v: [u32; 4], code: u64) -> [u32; 4] {
        compress_lanes(v, code)
    }

    fn compress_u64x2(&self, v: [u64; 2], code: u64) -> [u64; 2] {
        compress_lanes(v, code)
    }

    fn compress_u16x16(&self, v: [u16; 16], code: u64) -> [u16; 16] {
        compress_lanes(v, code)
    }

    fn compress_u32x8(&self, v: [u32; 8], code: u64) -> [u32; 8] {
        compress_lanes(v, code)
    }

    fn compress_u64x4(&self, v: [u64; 4], code: u64) -> [u64; 4] {
        compress_lanes(v, code)
    }

    fn compress_u16x32(&self, v: [u16; 32], code: u64) -> [u16; 32] {
        compress_lanes(v, code)
    }

    fn compress_u32x16(&self, v: [u32; 16], code: u64) -> [u32; 16] {
        compress_lanes(v, code)
    }

    fn compress_u64x8(&self, v: [u64; 8], code: u64) -> [u64; 8] {
        compress_lanes(v, code)
    }
}
