/// Errors for caller-supplied buffers and unsupported table shapes.
///
/// Contract violations inside the library do not show up here; they go
/// through [`crate::abort`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("mask bit buffer for {lanes} lanes needs {needed} bytes, got {actual}")]
    BitsTooShort {
        lanes: usize,
        needed: usize,
        actual: usize,
    },

    #[error("destination holds {actual} lanes, {needed} required")]
    DestinationTooShort { needed: usize, actual: usize },

    #[error("no permutation table for {lanes} lanes of {width_bits} bits")]
    UnsupportedShape { width_bits: usize, lanes: usize },

    #[error("expected {expected} lanes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
