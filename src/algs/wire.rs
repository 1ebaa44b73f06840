//! Fixed, little-endian wire helpers for message payloads.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Copy bytes into a freshly allocated, correctly aligned `Vec<T>`.
///
/// Received byte buffers carry no alignment guarantee, so they are decoded
/// through this instead of a borrowed cast.
pub fn pod_vec_from_bytes<T: Pod>(bytes: &[u8]) -> Result<Vec<T>, String> {
    let n = size_of::<T>();
    if n == 0 || bytes.len() % n != 0 {
        return Err(format!(
            "{} bytes is not a whole number of {n}-byte elements",
            bytes.len()
        ));
    }
    let mut out = vec![T::zeroed(); bytes.len() / n];
    cast_slice_mut(&mut out).copy_from_slice(bytes);
    Ok(out)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Size prefix carried ahead of variable-length payloads.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireLen {
    pub n_le: u64,
}

const_assert_eq!(size_of::<WireLen>(), 8);

impl WireLen {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u64).to_le(),
        }
    }

    pub fn get(&self) -> usize {
        u64::from_le(self.n_le) as usize
    }
}
