//! Verifying a compaction result against the scalar definition.

use std::fmt::Write;

use crate::lane::Lane;
use crate::vector::{Mask, Vector};

/// The kept lanes of `input`, in order.
pub fn expected_lanes<T: Lane, const N: usize>(input: &Vector<T, N>, mask: Mask<N>) -> Vec<T> {
    mask.iter_set().map(|i| input.lane(i)).collect()
}

/// Aborts unless `actual_count` equals the mask's count and the first
/// `actual_count` lanes of `actual` are the kept lanes of `input`, compared
/// bit for bit.
///
/// Lanes of `actual` past the count are not inspected.
#[track_caller]
pub fn assert_compressed<T: Lane, const N: usize>(
    input: &Vector<T, N>,
    mask: Mask<N>,
    actual: &[T],
    actual_count: usize,
) {
    let location = std::panic::Location::caller();
    let expected = expected_lanes(input, mask);
    if actual_count != expected.len() {
        crate::abort::abort(
            location.file(),
            location.line(),
            format_args!(
                "Size mismatch for {}x{}: expected {}, actual {}",
                T::NAME,
                N,
                expected.len(),
                actual_count
            ),
        );
    }

    let got = actual.get(..actual_count).unwrap_or(actual);
    let equal = got.len() == expected.len()
        && got.iter().zip(&expected).all(|(a, e)| a.bits_eq(*e));
    if !equal {
        crate::abort::abort(
            location.file(),
            location.line(),
            format_args!("{}", mismatch_report(input, mask, &expected, got)),
        );
    }
}

fn mismatch_report<T: Lane, const N: usize>(
    input: &Vector<T, N>,
    mask: Mask<N>,
    expected: &[T],
    actual: &[T],
) -> String {
    let mut report = format!("Mismatch for {}x{}:\n", T::NAME, N);
    let bools: String = mask.to_bools().iter().map(|&b| if b { '1' } else { '0' }).collect();
    // Writing to a String cannot fail.
    let _ = writeln!(report, "  mask:   {}", bools);
    let _ = writeln!(report, "  in:     {:?}", input.as_array());
    let _ = writeln!(report, "  expect: {:?}", expected);
    let _ = write!(report, "  actual: {:?}", actual);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_follows_mask_order() {
        let v = Vector::from_array([1.5f32, -0.0, f32::NAN, 4.0]);
        let got = expected_lanes(&v, Mask::from_code(0b1110));
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].to_bits(), (-0.0f32).to_bits());
        assert!(got[1].is_nan());
        assert_eq!(got[2], 4.0);
    }

    #[test]
    fn matching_result_passes() {
        let v = Vector::from_array([10u32, 20, 30, 40]);
        assert_compressed(&v, Mask::from_code(0b1010), &[20, 40, 0xdead, 0xbeef], 2);
        assert_compressed(&v, Mask::none(), &[], 0);
    }

    #[test]
    fn nan_lanes_compare_by_bits() {
        let v = Vector::from_array([f64::NAN, 1.0]);
        assert_compressed(&v, Mask::all(), &[f64::NAN, 1.0], 2);
    }

    #[test]
    fn report_lists_every_field() {
        let v = Vector::from_array([1u16, 2, 3, 4, 5, 6, 7, 8]);
        let report = mismatch_report(&v, Mask::from_code(0b11), &[1, 2], &[2, 1]);
        assert!(report.starts_with("Mismatch for u16x8:"));
        assert!(report.contains("mask:   11000000"));
        assert!(report.contains("expect: [1, 2]"));
        assert!(report.contains("actual: [2, 1]"));
    }
}
