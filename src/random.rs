//! Random vectors and masks for tests and benchmarks.

use rand::Rng;

use crate::lane::{Lane, LaneBits};
use crate::vector::{Mask, Vector};

/// A vector of lanes built from raw random bits, so every pattern (NaN,
/// signed zero, subnormal) can show up for float lanes.
pub fn random_lanes<T: Lane, const N: usize>(rng: &mut impl Rng) -> Vector<T, N> {
    Vector::from_fn(|_| T::from_bits(T::Bits::from_u64(rng.gen())))
}

/// A mask where each lane is set with probability `density`.
///
/// # Panics
///
/// If `density` is not in `[0, 1]`, including NaN.
pub fn random_mask<const N: usize>(rng: &mut impl Rng, density: f64) -> Mask<N> {
    assert!((0.0..=1.0).contains(&density), "density {} outside [0, 1]", density);
    Mask::from_fn(|_| rng.gen_bool(density))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn density_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_mask::<16>(&mut rng, 0.0), Mask::none());
        assert_eq!(random_mask::<16>(&mut rng, 1.0), Mask::all());
    }

    #[test]
    #[should_panic(expected = "outside [0, 1]")]
    fn density_above_one_panics() {
        random_mask::<8>(&mut StdRng::seed_from_u64(0), 1.5);
    }

    #[test]
    #[should_panic(expected = "outside [0, 1]")]
    fn nan_density_panics() {
        random_mask::<8>(&mut StdRng::seed_from_u64(0), f64::NAN);
    }

    #[test]
    fn seeded_is_reproducible() {
        let a: Vector<u32, 8> = random_lanes(&mut StdRng::seed_from_u64(1));
        let b: Vector<u32, 8> = random_lanes(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn fills_high_bits() {
        let mut rng = StdRng::seed_from_u64(3);
        let v: Vector<u64, 8> = random_lanes(&mut rng);
        assert!(v.as_array().iter().any(|&x| x > u64::from(u32::MAX)));
    }
}
