//! Inclusive index ranges over a 3-D integer lattice.
//!
//! A [`CartesianExtent`] is `[ilo, ihi, jlo, jhi, klo, khi]`. It performs no
//! validation against any outer domain; clamping to a domain is the job of the
//! decomposition and the I/O descriptors.

use super::DimensionMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Rectangular sub-region of an integer lattice, inclusive on both ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartesianExtent {
    ext: [i32; 6],
}

impl CartesianExtent {
    /// The empty sentinel; [`CartesianExtent::is_empty`] is true for it.
    pub const EMPTY: CartesianExtent = CartesianExtent {
        ext: [0, -1, 0, -1, 0, -1],
    };

    pub const fn new(ext: [i32; 6]) -> Self {
        Self { ext }
    }

    /// Zero-based extent covering `nx * ny * nz` indices.
    pub fn from_dims(nx: usize, ny: usize, nz: usize) -> Self {
        Self::new([0, nx as i32 - 1, 0, ny as i32 - 1, 0, nz as i32 - 1])
    }

    pub fn as_array(&self) -> [i32; 6] {
        self.ext
    }

    #[inline]
    pub fn lo(&self, q: usize) -> i32 {
        self.ext[2 * q]
    }

    #[inline]
    pub fn hi(&self, q: usize) -> i32 {
        self.ext[2 * q + 1]
    }

    /// Lower corner `[ilo, jlo, klo]`.
    pub fn origin(&self) -> [i32; 3] {
        [self.ext[0], self.ext[2], self.ext[4]]
    }

    /// Number of indices along axis `q` (0 when inverted).
    #[inline]
    pub fn width(&self, q: usize) -> usize {
        let w = self.hi(q) as i64 - self.lo(q) as i64 + 1;
        w.max(0) as usize
    }

    /// Per-axis index counts.
    pub fn dims(&self) -> [usize; 3] {
        [self.width(0), self.width(1), self.width(2)]
    }

    /// True when any axis is inverted.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|q| self.lo(q) > self.hi(q))
    }

    /// Total number of indices.
    pub fn size(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.dims().iter().product()
        }
    }

    /// Clip `self` to `other` in place.
    pub fn intersect(&mut self, other: &CartesianExtent) {
        for q in 0..3 {
            self.ext[2 * q] = self.lo(q).max(other.lo(q));
            self.ext[2 * q + 1] = self.hi(q).min(other.hi(q));
        }
        if self.is_empty() {
            *self = Self::EMPTY;
        }
    }

    pub fn intersection(a: &CartesianExtent, b: &CartesianExtent) -> CartesianExtent {
        let mut out = *a;
        out.intersect(b);
        out
    }

    /// Grow every non-degenerate axis by `n` on both sides.
    pub fn grow(&mut self, n: i32, mode: DimensionMode) {
        for q in 0..3 {
            if !mode.is_degenerate(q) {
                self.grow_axis(q, n);
            }
        }
    }

    /// Shrink every non-degenerate axis by `n` on both sides.
    pub fn shrink(&mut self, n: i32, mode: DimensionMode) {
        self.grow(-n, mode);
    }

    pub fn grow_axis(&mut self, q: usize, n: i32) {
        self.grow_low(q, n);
        self.grow_high(q, n);
    }

    pub fn grow_low(&mut self, q: usize, n: i32) {
        self.ext[2 * q] -= n;
    }

    pub fn grow_high(&mut self, q: usize, n: i32) {
        self.ext[2 * q + 1] += n;
    }

    /// Translate axis `q` by `n`.
    pub fn shift(&mut self, q: usize, n: i32) {
        self.ext[2 * q] += n;
        self.ext[2 * q + 1] += n;
    }

    pub fn shift_by(&mut self, n: [i32; 3]) {
        for (q, nq) in n.into_iter().enumerate() {
            self.shift(q, nq);
        }
    }

    /// Dual-grid conversion: cell indices to node indices.
    pub fn cell_to_node(&mut self, mode: DimensionMode) {
        for q in 0..3 {
            if !mode.is_degenerate(q) {
                self.ext[2 * q + 1] += 1;
            }
        }
    }

    /// Inverse of [`CartesianExtent::cell_to_node`].
    pub fn node_to_cell(&mut self, mode: DimensionMode) {
        for q in 0..3 {
            if !mode.is_degenerate(q) {
                self.ext[2 * q + 1] -= 1;
            }
        }
    }

    pub fn contains(&self, other: &CartesianExtent) -> bool {
        !other.is_empty()
            && (0..3).all(|q| self.lo(q) <= other.lo(q) && other.hi(q) <= self.hi(q))
    }

    pub fn contains_index(&self, idx: [i32; 3]) -> bool {
        (0..3).all(|q| self.lo(q) <= idx[q] && idx[q] <= self.hi(q))
    }

    /// Piece `piece` of `n_pieces` balanced pieces along axis `q`.
    ///
    /// The first `width % n_pieces` pieces carry one extra index. Returns
    /// `None` for a piece out of range or when there are fewer indices than
    /// pieces.
    pub fn split(&self, q: usize, n_pieces: usize, piece: usize) -> Option<CartesianExtent> {
        let n = self.width(q);
        if n_pieces == 0 || piece >= n_pieces || n < n_pieces {
            return None;
        }
        let base = n / n_pieces;
        let extra = n % n_pieces;
        let start = piece * base + piece.min(extra);
        let len = base + usize::from(piece < extra);
        let mut out = *self;
        out.ext[2 * q] = self.lo(q) + start as i32;
        out.ext[2 * q + 1] = out.ext[2 * q] + len as i32 - 1;
        Some(out)
    }

    /// Physical bounds `[xlo, xhi, ylo, yhi, zlo, zhi]`.
    ///
    /// Index `i` spans `[x0 + i*dx, x0 + (i+1)*dx]` on a non-degenerate axis, so
    /// adjacent extents share a face coordinate. Degenerate axes collapse to
    /// a single coordinate.
    pub fn bounds(&self, origin: [f64; 3], spacing: [f64; 3], mode: DimensionMode) -> [f64; 6] {
        let mut b = [0.0; 6];
        for q in 0..3 {
            b[2 * q] = origin[q] + spacing[q] * self.lo(q) as f64;
            b[2 * q + 1] = if mode.is_degenerate(q) {
                origin[q] + spacing[q] * self.hi(q) as f64
            } else {
                origin[q] + spacing[q] * (self.hi(q) + 1) as f64
            };
        }
        b
    }

    /// Flat offset of `idx` inside this extent, x fastest.
    pub fn flat_index(&self, idx: [i32; 3]) -> Option<usize> {
        if !self.contains_index(idx) {
            return None;
        }
        let [nx, ny, _] = self.dims();
        let i = (idx[0] - self.lo(0)) as usize;
        let j = (idx[1] - self.lo(1)) as usize;
        let k = (idx[2] - self.lo(2)) as usize;
        Some(i + nx * (j + ny * k))
    }
}

impl Default for CartesianExtent {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<[i32; 6]> for CartesianExtent {
    fn from(ext: [i32; 6]) -> Self {
        Self::new(ext)
    }
}

impl Index<usize> for CartesianExtent {
    type Output = i32;
    fn index(&self, i: usize) -> &i32 {
        &self.ext[i]
    }
}

impl IndexMut<usize> for CartesianExtent {
    fn index_mut(&mut self, i: usize) -> &mut i32 {
        &mut self.ext[i]
    }
}

impl fmt::Display for CartesianExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.ext;
        write!(f, "[{}, {}, {}, {}, {}, {}]", e[0], e[1], e[2], e[3], e[4], e[5])
    }
}
