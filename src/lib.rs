//! Masked stream compaction ("compress") on fixed-width vectors.
//!
//! Given a [`Vector`] and a [`Mask`], the kept lanes are moved to the front in
//! their original order. Three store policies write the result to memory, and
//! every entry point also accepts the mask as packed bits:
//!
//! ```
//! use simd_compress::{compress_blended_store, Mask, Vector};
//!
//! let v = Vector::from_array([10u32, 20, 30, 40]);
//! let mut out = [9u32; 4];
//! let n = compress_blended_store(v, Mask::from_bools([false, true, false, true]), &mut out)?;
//! assert_eq!((n, out), (2, [20, 40, 9, 9]));
//! # Ok::<(), simd_compress::Error>(())
//! ```
//!
//! The best backend for the running CPU is picked once per process; see
//! [`Dispatcher`].

#[macro_use]
pub mod abort;

pub mod aligned;
mod backend;
mod bits;
pub mod check;
mod dispatch;
mod error;
mod lane;
pub mod network;
pub mod random;
mod tables;
pub mod unpack_bitmap;
mod vector;

pub use abort::{abort_fn, set_abort_fn, AbortFn};
pub use backend::Target;
pub use bits::mask_bytes;
pub use dispatch::{
    compress, compress_bits, compress_bits_blended_store, compress_bits_store,
    compress_blended_store, compress_store, supported_targets, Dispatcher, NativeShape,
};
pub use error::{Error, Result};
pub use lane::{Lane, LaneBits, F16};
pub use tables::{source_lanes, Encoding, PermutationTable};
pub use vector::{Mask, SetLanes, Vector};
