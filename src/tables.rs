//! Left-pack permutation tables.
//!
//! ```text
//!          ┌────┬────┬────┬────┐
//! Input    │ 10 │ 20 │ 30 │ 40 │
//!          └────┴────┴────┴────┘
//!          ┌────┬────┬────┬────┐
//! Mask     │  n │  Y │  n │  Y │    code = 0b1010
//!          └────┴────┴────┴────┘
//!          ┌────┬────┬────┬────┐
//! Lanes    │  1 │  3 │  0 │  0 │    source lane per output lane
//!          └────┴────┴────┴────┘
//!          ┌────┬────┬────┬────┐
//! Output   │ 20 │ 40 │ XX │ XX │
//!          └────┴────┴────┴────┘
//! ```
//!
//! Every table is indexed by the mask code and built by the same rule: the
//! set bits of the code, ascending, name the source lanes; the rest point at
//! lane 0. Only the encoding differs, to match what the consuming shuffle
//! instruction reads. Everything is computed at compile time.

use crate::error::{Error, Result};

// Custom types to ensure table rows are aligned for vector loads.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
pub(crate) struct Align16<T>(pub T);

#[derive(Clone, Copy)]
#[repr(C, align(32))]
pub(crate) struct Align32<T>(pub T);

/// Source lane for each of the `N` output lanes under mask `code`.
///
/// Lanes past the number of set bits map to lane 0.
pub const fn source_lanes<const N: usize>(code: u64) -> [u8; N] {
    let mut lanes = [0u8; N];
    let mut pos = 0;
    let mut lane = 0;
    while lane < N {
        if code & (1u64 << lane) != 0 {
            lanes[pos] = lane as u8;
            pos += 1;
        }
        lane += 1;
    }
    lanes
}

/// 16 `pshufb`/`tbl` byte indices per code, for 16-byte vectors of `N` lanes.
const fn byte_indices<const N: usize, const CODES: usize>() -> [Align16<[u8; 16]>; CODES] {
    assert!(CODES == 1 << N);
    let size = 16 / N;
    let mut table = [Align16([0u8; 16]); CODES];
    let mut code = 0;
    while code < CODES {
        let lanes = source_lanes::<N>(code as u64);
        let mut byte = 0;
        while byte < 16 {
            table[code].0[byte] = (lanes[byte / size] as usize * size + byte % size) as u8;
            byte += 1;
        }
        code += 1;
    }
    table
}

/// Doubled lane indices (the byte offset of each 16-bit lane), 8 per code.
const fn doubled_lanes() -> [[u8; 8]; 256] {
    let mut table = [[0u8; 8]; 256];
    let mut code = 0;
    while code < 256 {
        let lanes = source_lanes::<8>(code as u64);
        let mut i = 0;
        while i < 8 {
            table[code][i] = 2 * lanes[i];
            i += 1;
        }
        code += 1;
    }
    table
}

/// Eight 4-bit lane indices packed into one word per code.
const fn nibbles() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut code = 0;
    while code < 256 {
        let lanes = source_lanes::<8>(code as u64);
        let mut packed = 0u32;
        let mut i = 0;
        while i < 8 {
            packed |= (lanes[i] as u32) << (4 * i);
            i += 1;
        }
        table[code] = packed;
        code += 1;
    }
    table
}

/// 64-bit lanes as pairs of 32-bit lane indices.
const fn lane_pairs() -> [Align32<[u32; 8]>; 16] {
    let mut table = [Align32([0u32; 8]); 16];
    let mut code = 0;
    while code < 16 {
        let lanes = source_lanes::<4>(code as u64);
        let mut i = 0;
        while i < 4 {
            table[code].0[2 * i] = 2 * lanes[i] as u32;
            table[code].0[2 * i + 1] = 2 * lanes[i] as u32 + 1;
            i += 1;
        }
        code += 1;
    }
    table
}

// 16 * 16B = 256B
pub(crate) static BYTES_32X4: [Align16<[u8; 16]>; 16] = byte_indices::<4, 16>();
// 4 * 16B = 64B
pub(crate) static BYTES_64X2: [Align16<[u8; 16]>; 4] = byte_indices::<2, 4>();
// 256 * 8B = 2KiB
pub(crate) static DOUBLED_16X8: [[u8; 8]; 256] = doubled_lanes();
// 256 * 4B = 1KiB
pub(crate) static NIBBLES_32X8: [u32; 256] = nibbles();
// 16 * 32B = 512B
pub(crate) static PAIRS_64X4: [Align32<[u32; 8]>; 16] = lane_pairs();

/// How a table row encodes its permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One byte index per byte of a 16-byte vector.
    ByteIndices,
    /// One byte per 16-bit lane holding twice the source lane.
    DoubledLanes,
    /// A little `u32` of 4-bit source lanes, lane 0 in the low nibble.
    Nibbles,
    /// Eight `u32`: each 64-bit lane as its even and odd 32-bit halves.
    LanePairs,
}

/// Read-only view of one permutation table.
#[derive(Debug, Clone, Copy)]
pub struct PermutationTable {
    width_bits: usize,
    lanes: usize,
    encoding: Encoding,
    row_bytes: usize,
    data: &'static [u8],
}

impl PermutationTable {
    /// The table for `lanes` lanes of `width_bits` bits.
    ///
    /// Shapes without a table (8-bit lanes, or more lanes than a table can
    /// enumerate) are rejected.
    pub fn lookup(width_bits: usize, lanes: usize) -> Result<Self> {
        let (encoding, row_bytes, data) = match (width_bits, lanes) {
            (16, 8) => (Encoding::DoubledLanes, 8, as_bytes(&DOUBLED_16X8[..])),
            (32, 4) => (Encoding::ByteIndices, 16, as_bytes(&BYTES_32X4[..])),
            (32, 8) => (Encoding::Nibbles, 4, as_bytes(&NIBBLES_32X8[..])),
            (64, 2) => (Encoding::ByteIndices, 16, as_bytes(&BYTES_64X2[..])),
            (64, 4) => (Encoding::LanePairs, 32, as_bytes(&PAIRS_64X4[..])),
            _ => return Err(Error::UnsupportedShape { width_bits, lanes }),
        };
        Ok(Self {
            width_bits,
            lanes,
            encoding,
            row_bytes,
            data,
        })
    }

    pub fn width_bits(&self) -> usize {
        self.width_bits
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of rows, one per mask code.
    pub fn codes(&self) -> usize {
        1 << self.lanes
    }

    /// Raw row for `code`, or `None` past the last code.
    pub fn row(&self, code: u64) -> Option<&'static [u8]> {
        let start = usize::try_from(code).ok()?.checked_mul(self.row_bytes)?;
        self.data.get(start..start + self.row_bytes)
    }

    /// Decodes the row for `code` back into source lanes.
    pub fn decode(&self, code: u64) -> Option<Vec<usize>> {
        let row = self.row(code)?;
        let word = |i: usize| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&row[4 * i..4 * i + 4]);
            u32::from_ne_bytes(bytes) as usize
        };
        let lanes = (0..self.lanes).map(|i| match self.encoding {
            Encoding::ByteIndices => {
                let size = 16 / self.lanes;
                row[i * size] as usize / size
            }
            Encoding::DoubledLanes => row[i] as usize / 2,
            Encoding::Nibbles => (word(0) >> (4 * i)) & 0xf,
            Encoding::LanePairs => word(2 * i) / 2,
        });
        Some(lanes.collect())
    }
}

fn as_bytes<T>(table: &'static [T]) -> &'static [u8] {
    // SAFETY: only called on the tables above, whose rows are integers or
    // byte arrays with no padding.
    unsafe { std::slice::from_raw_parts(table.as_ptr().cast::<u8>(), std::mem::size_of_val(table)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_lanes_follow_set_bits() {
        assert_eq!(source_lanes::<4>(0b1010), [1, 3, 0, 0]);
        assert_eq!(source_lanes::<4>(0), [0, 0, 0, 0]);
        assert_eq!(source_lanes::<8>(0xff), [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn every_table_decodes_to_source_lanes() {
        for (width, lanes) in [(16, 8), (32, 4), (32, 8), (64, 2), (64, 4)] {
            let table = PermutationTable::lookup(width, lanes).unwrap();
            assert_eq!(table.codes(), 1 << lanes);
            for code in 0..table.codes() as u64 {
                let expected: Vec<usize> = source_lanes::<8>(code)[..lanes]
                    .iter()
                    .map(|&l| l as usize)
                    .collect();
                assert_eq!(
                    table.decode(code).unwrap(),
                    expected,
                    "{}x{} code {:#b}",
                    width,
                    lanes,
                    code
                );
            }
            assert!(table.row(table.codes() as u64).is_none());
        }
    }

    #[test]
    fn byte_rows_cover_whole_lanes() {
        assert_eq!(
            BYTES_32X4[0b1010].0,
            [4, 5, 6, 7, 12, 13, 14, 15, 0, 1, 2, 3, 0, 1, 2, 3]
        );
        assert_eq!(
            BYTES_64X2[0b10].0,
            [8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3, 4, 5, 6, 7]
        );
        assert_eq!(DOUBLED_16X8[0b1000_0001], [0, 14, 0, 0, 0, 0, 0, 0]);
        assert_eq!(NIBBLES_32X8[0b1100_0000], 0x76);
        assert_eq!(PAIRS_64X4[0b0100].0, [4, 5, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn unsupported_shapes() {
        for (width, lanes) in [(8, 16), (16, 16), (32, 16), (64, 8), (24, 4)] {
            assert_eq!(
                PermutationTable::lookup(width, lanes).unwrap_err(),
                Error::UnsupportedShape {
                    width_bits: width,
                    lanes
                }
            );
        }
    }

    #[test]
    fn tables_are_aligned() {
        assert_eq!(BYTES_32X4.as_ptr() as usize % 16, 0);
        assert_eq!(PAIRS_64X4.as_ptr() as usize % 32, 0);
    }
}
