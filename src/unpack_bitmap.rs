//! Unpacking a bitmap. Convert a bitmap to a list of the indices of its set
//! bits.
//!
//! The scalar version is the reference for the compress-based one, which
//! treats each byte of a word as the mask of an 8-lane `u32` vector holding
//! the byte's bit indices.

use rand::seq::index;
use rand::Rng;

use crate::dispatch::Dispatcher;
use crate::vector::{Mask, Vector};

/// Appends the set-bit indices of `bitmap` to `out`, one set bit at a time.
pub fn bitmap_ones_scalar(bitmap: &[u64], out: &mut Vec<u32>) {
    for (word_index, word) in bitmap.iter().enumerate() {
        let base = (word_index * 64) as u32;
        out.extend(Mask::<64>::from_code(*word).iter_set().map(|bit| base + bit as u32));
    }
}

/// Appends the set-bit indices of `bitmap` to `out` using `dispatcher`.
///
/// Every byte compresses a full 8-lane store into the tail of `out`, which
/// is then cut back to the kept lanes, so `out` briefly grows by 8.
pub fn bitmap_ones_compress(dispatcher: &Dispatcher, bitmap: &[u64], out: &mut Vec<u32>) {
    out.reserve(bitmap_ones(bitmap) as usize + 8);
    let mut len = out.len();
    for (word_index, word) in bitmap.iter().enumerate() {
        if *word == 0 {
            continue;
        }
        for (byte_index, byte) in word.to_le_bytes().into_iter().enumerate() {
            if byte == 0 {
                continue;
            }
            let base = (word_index * 64 + byte_index * 8) as u32;
            let indices = Vector::<u32, 8>::from_fn(|i| base + i as u32);
            out.resize(len + 8, 0);
            let mask = Mask::from_code(u64::from(byte));
            let kept = match dispatcher.compress_store(indices, mask, &mut out[len..]) {
                Ok(kept) => kept,
                Err(e) => crate::abort!("bitmap_ones_compress: {}", e),
            };
            len += kept;
            out.truncate(len);
        }
    }
}

/// A bitmap of `num_bits` bits with `round(num_bits * density)` of them set,
/// at distinct random positions.
///
/// # Panics
///
/// If `density` is not in `[0, 1]`.
pub fn random_bitmap(rng: &mut impl Rng, num_bits: usize, density: f64) -> Vec<u64> {
    assert!((0.0..=1.0).contains(&density), "density {} outside [0, 1]", density);
    let num_ones = (num_bits as f64 * density).round() as usize;
    let mut bits = vec![0_u64; (num_bits + 63) / 64];
    for i in index::sample(rng, num_bits, num_ones).iter() {
        bits[i >> 6] |= 1 << (i & 0x3f);
    }
    bits
}

/// Number of set bits in `bitmap`.
pub fn bitmap_ones(bitmap: &[u64]) -> u32 {
    bitmap.iter().map(|b| b.count_ones()).sum()
}
