//! Page-aligned lane buffers.
//!
//! Backed by an anonymous memory map, so the start is page aligned and
//! offsets into the buffer give destinations with a known misalignment.

use std::io;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use memmap2::MmapMut;

use crate::lane::Lane;

pub struct AlignedBuf<T: Lane> {
    map: MmapMut,
    len: usize,
    _lanes: PhantomData<T>,
}

impl<T: Lane> AlignedBuf<T> {
    /// A buffer of `len` lanes with all bits zero.
    ///
    /// Fails with `InvalidInput` when `len` lanes do not fit in `isize::MAX`
    /// bytes.
    pub fn zeroed(len: usize) -> io::Result<Self> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} lanes of {} overflow the address space", len, T::NAME),
                )
            })?;
        // Zero-length maps are rejected by the OS.
        let map = MmapMut::map_anon(bytes.max(1))?;
        log::trace!("mapped {} bytes for {} x {}", map.len(), len, T::NAME);
        Ok(Self {
            map,
            len,
            _lanes: PhantomData,
        })
    }

    /// A buffer of `len` copies of `value`.
    pub fn filled(len: usize, value: T) -> io::Result<Self> {
        let mut buf = Self::zeroed(len)?;
        buf.fill(value);
        Ok(buf)
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the map is page aligned, at least `len` lanes long, and
        // every bit pattern is a valid lane.
        unsafe { std::slice::from_raw_parts(self.map.as_ptr().cast::<T>(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`; `&mut self` makes the borrow unique.
        unsafe { std::slice::from_raw_parts_mut(self.map.as_mut_ptr().cast::<T>(), self.len) }
    }
}

impl<T: Lane> Deref for AlignedBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Lane> DerefMut for AlignedBuf<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Lane> std::fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
