//! Packed bit arrays for masks.
//!
//! Lane `i` lives in bit `i % 8` of byte `i / 8`, with no gaps. Buffers are
//! sized by [`mask_bytes`], a whole number of 8-byte words, because loading
//! reads a full little-endian `u64`. Bits past the last lane must be zeroed
//! by the caller before the buffer is handed to [`Mask::load_bits`]; an
//! uninitialized tail is a caller bug and is not detected here.

use crate::error::{Error, Result};
use crate::vector::Mask;

/// Bytes a packed bit array for `lanes` lanes occupies.
///
/// `ceil(lanes / 8)` rounded up to a multiple of 8.
pub const fn mask_bytes(lanes: usize) -> usize {
    let bytes = (lanes + 7) / 8;
    (bytes + 7) / 8 * 8
}

impl<const N: usize> Mask<N> {
    /// Reads the first `N` bits of `bits`.
    pub fn load_bits(bits: &[u8]) -> Result<Self> {
        if N == 0 {
            return Ok(Self::none());
        }
        check_len::<N>(bits.len())?;
        let mut word = [0u8; 8];
        word.copy_from_slice(&bits[..8]);
        Ok(Self::from_code(u64::from_le_bytes(word)))
    }

    /// Writes the mask into the first `ceil(N / 8)` bytes of `out`.
    ///
    /// Bits of the last byte past lane `N - 1`, and every later byte, are
    /// left as they were. Returns the number of bytes touched.
    pub fn store_bits(&self, out: &mut [u8]) -> Result<usize> {
        check_len::<N>(out.len())?;
        let bytes = self.code().to_le_bytes();
        let full = N / 8;
        out[..full].copy_from_slice(&bytes[..full]);

        let rem = N % 8;
        if rem != 0 {
            let valid = (1u8 << rem) - 1;
            out[full] = (out[full] & !valid) | (bytes[full] & valid);
        }
        Ok((N + 7) / 8)
    }
}

fn check_len<const N: usize>(actual: usize) -> Result<()> {
    let needed = mask_bytes(N);
    if actual < needed {
        return Err(Error::BitsTooShort {
            lanes: N,
            needed,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_lengths() {
        assert_eq!(mask_bytes(0), 0);
        assert_eq!(mask_bytes(2), 8);
        assert_eq!(mask_bytes(4), 8);
        assert_eq!(mask_bytes(8), 8);
        assert_eq!(mask_bytes(16), 8);
        assert_eq!(mask_bytes(64), 8);
        assert_eq!(mask_bytes(65), 16);
    }

    #[test]
    fn four_lanes_pack_into_one_byte() {
        let m = Mask::<4>::from_bools([false, true, false, true]);
        let mut bits = [0u8; mask_bytes(4)];
        assert_eq!(bits.len(), 8);
        assert_eq!(m.store_bits(&mut bits), Ok(1));
        assert_eq!(bits, [0b0000_1010, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Mask::<4>::load_bits(&bits), Ok(m));
    }

    #[test]
    fn store_leaves_bits_past_last_lane() {
        let mut bits = [0xffu8; 8];
        Mask::<4>::none().store_bits(&mut bits).unwrap();
        assert_eq!(bits[0], 0xf0);
        assert!(bits[1..].iter().all(|&b| b == 0xff));

        let mut bits = [0xaau8; 8];
        Mask::<16>::all().store_bits(&mut bits).unwrap();
        assert_eq!(bits, [0xff, 0xff, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa]);
    }

    #[test]
    fn load_reads_only_lane_bits() {
        let bits = [0xffu8; 8];
        assert_eq!(Mask::<2>::load_bits(&bits).unwrap().code(), 0b11);
        assert_eq!(Mask::<0>::load_bits(&[]), Ok(Mask::none()));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let mut bits = [0u8; 4];
        let err = Error::BitsTooShort {
            lanes: 8,
            needed: 8,
            actual: 4,
        };
        assert_eq!(Mask::<8>::load_bits(&bits), Err(err.clone()));
        assert_eq!(Mask::<8>::all().store_bits(&mut bits), Err(err));
        assert_eq!(bits, [0; 4]);
    }

    #[test]
    fn round_trip_every_16_lane_mask() {
        let mut bits = [0u8; 8];
        for code in 0..=u16::MAX as u64 {
            let m = Mask::<16>::from_code(code);
            bits.fill(0);
            m.store_bits(&mut bits).unwrap();
            assert_eq!(Mask::<16>::load_bits(&bits).unwrap(), m);
        }
    }
}
