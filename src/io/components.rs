//! Moving single components between planar bricks and interleaved arrays.
//!
//! Component `q` of tuple `i` sits at `values[n_comps * i + q]`.

use crate::bov_error::BovError;
use crate::io::metadata::ArrayKind;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Memory slots of the six stored symmetric-tensor components
/// (`xx, xy, xz, yy, yz, zz`) inside the full 3x3 tuple.
pub const SYMMETRIC_TENSOR_SLOTS: [usize; 6] = [0, 1, 2, 4, 5, 8];

/// Memory component that file component `q` of an array of `kind` fills.
pub fn mem_component(kind: ArrayKind, q: usize) -> usize {
    match kind {
        ArrayKind::SymmetricTensor => SYMMETRIC_TENSOR_SLOTS[q],
        _ => q,
    }
}

fn check(n_planar: usize, q: usize, n_comps: usize, n_values: usize) -> Result<(), BovError> {
    if q >= n_comps {
        return Err(BovError::Config(format!(
            "component {q} out of range for {n_comps} components"
        )));
    }
    if n_planar * n_comps != n_values {
        return Err(BovError::ViewSizeMismatch {
            expected: n_planar * n_comps,
            actual: n_values,
        });
    }
    Ok(())
}

/// Scatter `planar` into component `q` of `values`.
pub fn interleave(
    planar: &[f32],
    q: usize,
    n_comps: usize,
    values: &mut [f32],
) -> Result<(), BovError> {
    check(planar.len(), q, n_comps, values.len())?;
    #[cfg(feature = "rayon")]
    values
        .par_chunks_exact_mut(n_comps)
        .zip(planar.par_iter())
        .for_each(|(t, &v)| t[q] = v);
    #[cfg(not(feature = "rayon"))]
    for (t, &v) in values.chunks_exact_mut(n_comps).zip(planar) {
        t[q] = v;
    }
    Ok(())
}

/// Gather component `q` of `values` into `planar`.
pub fn deinterleave(
    values: &[f32],
    q: usize,
    n_comps: usize,
    planar: &mut [f32],
) -> Result<(), BovError> {
    check(planar.len(), q, n_comps, values.len())?;
    #[cfg(feature = "rayon")]
    planar
        .par_iter_mut()
        .zip(values.par_chunks_exact(n_comps))
        .for_each(|(p, t)| *p = t[q]);
    #[cfg(not(feature = "rayon"))]
    for (p, t) in planar.iter_mut().zip(values.chunks_exact(n_comps)) {
        *p = t[q];
    }
    Ok(())
}

/// Complete 3x3 tuples whose upper triangle was filled: `3<-1`, `6<-2`, `7<-5`.
pub fn mirror_symmetric(values: &mut [f32]) {
    let mirror = |t: &mut [f32]| {
        t[3] = t[1];
        t[6] = t[2];
        t[7] = t[5];
    };
    #[cfg(feature = "rayon")]
    values.par_chunks_exact_mut(9).for_each(mirror);
    #[cfg(not(feature = "rayon"))]
    values.chunks_exact_mut(9).for_each(mirror);
}
