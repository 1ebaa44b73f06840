//! Dimension mode of an extent: which axes are too thin for a ghost layer.
//!
//! The mode gates every ghost growth and every cell-to-node conversion: a
//! degenerate axis is never grown and never receives the `+1` of the dual
//! grid.

use super::CartesianExtent;
use serde::{Deserialize, Serialize};

/// Classification of an extent by its non-degenerate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionMode {
    /// Every axis degenerate.
    Dim0,
    /// 1-D along X.
    XOnly,
    /// 1-D along Y.
    YOnly,
    /// 1-D along Z.
    ZOnly,
    /// 2-D in the XY plane.
    Xy,
    /// 2-D in the XZ plane.
    Xz,
    /// 2-D in the YZ plane.
    Yz,
    /// Full 3-D.
    Dim3,
}

impl DimensionMode {
    /// Classify `ext` for a ghost width of `n_ghost`.
    ///
    /// An axis is degenerate when `hi - lo + 1 <= max(2 * n_ghost, 1)`.
    /// The floor of one layer means that with `n_ghost == 0` a single-layer
    /// axis still counts as degenerate, so a plane stays a plane and never
    /// gets the `+1` of the dual grid. Negative widths act as zero.
    pub fn of(ext: &CartesianExtent, n_ghost: i32) -> Self {
        let limit = (n_ghost.max(0) as i64).saturating_mul(2).max(1);
        let thin = |q: usize| (ext.hi(q) as i64 - ext.lo(q) as i64 + 1) <= limit;
        Self::from_flags([!thin(0), !thin(1), !thin(2)])
    }

    /// Build a mode from per-axis "carries data" flags.
    pub fn from_flags(active: [bool; 3]) -> Self {
        match active {
            [false, false, false] => DimensionMode::Dim0,
            [true, false, false] => DimensionMode::XOnly,
            [false, true, false] => DimensionMode::YOnly,
            [false, false, true] => DimensionMode::ZOnly,
            [true, true, false] => DimensionMode::Xy,
            [true, false, true] => DimensionMode::Xz,
            [false, true, true] => DimensionMode::Yz,
            [true, true, true] => DimensionMode::Dim3,
        }
    }

    /// Per-axis flags, `true` where the axis carries data.
    pub fn active_axes(self) -> [bool; 3] {
        match self {
            DimensionMode::Dim0 => [false, false, false],
            DimensionMode::XOnly => [true, false, false],
            DimensionMode::YOnly => [false, true, false],
            DimensionMode::ZOnly => [false, false, true],
            DimensionMode::Xy => [true, true, false],
            DimensionMode::Xz => [true, false, true],
            DimensionMode::Yz => [false, true, true],
            DimensionMode::Dim3 => [true, true, true],
        }
    }

    /// True when axis `q` is too thin to grow.
    pub fn is_degenerate(self, q: usize) -> bool {
        !self.active_axes()[q]
    }

    /// Number of non-degenerate axes.
    pub fn dimension(self) -> usize {
        self.active_axes().iter().filter(|a| **a).count()
    }
}

impl Default for DimensionMode {
    fn default() -> Self {
        DimensionMode::Dim3
    }
}
