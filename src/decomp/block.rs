//! One block of a Cartesian decomposition.

use crate::extent::CartesianExtent;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartesianDataBlock {
    index: [usize; 3],
    id: usize,
    extent: CartesianExtent,
    bounds: [f64; 6],
    owner: usize,
}

impl CartesianDataBlock {
    pub fn new(
        index: [usize; 3],
        id: usize,
        extent: CartesianExtent,
        bounds: [f64; 6],
        owner: usize,
    ) -> Self {
        Self {
            index,
            id,
            extent,
            bounds,
            owner,
        }
    }

    /// Decomposition index `[i, j, k]`.
    pub fn index(&self) -> [usize; 3] {
        self.index
    }

    /// Flat, row-major decomposition id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Un-ghosted index extent.
    pub fn extent(&self) -> &CartesianExtent {
        &self.extent
    }

    /// Physical bounds `[xlo, xhi, ylo, yhi, zlo, zhi]`.
    pub fn bounds(&self) -> &[f64; 6] {
        &self.bounds
    }

    /// Rank responsible for reading/writing this block.
    pub fn owner(&self) -> usize {
        self.owner
    }

    /// Closed-closed containment on every axis.
    pub fn contains_point(&self, x: [f64; 3]) -> bool {
        (0..3).all(|q| self.bounds[2 * q] <= x[q] && x[q] <= self.bounds[2 * q + 1])
    }

    pub fn centroid(&self) -> [f64; 3] {
        let b = &self.bounds;
        [
            0.5 * (b[0] + b[1]),
            0.5 * (b[2] + b[3]),
            0.5 * (b[4] + b[5]),
        ]
    }
}
