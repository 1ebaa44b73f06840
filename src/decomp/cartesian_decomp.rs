//! Global-to-local partitioning of a structured domain into blocks.
//!
//! A [`CartesianDecomp`] owns the decomposition parameters and an immutable
//! arena ([`BlockLattice`]) with one [`CartesianDataBlock`] and one
//! [`CartesianDataBlockIoDescriptor`] per decomposition index, stored flat in
//! row-major order (`i + ni * (j + nj * k)`).
//!
//! Every setter builds a complete replacement arena from a copy of the
//! parameters and only commits it on success, so a rejected reconfiguration
//! leaves the decomposition exactly as it was. The arena sits behind an
//! `Arc`; clones of the decomposition share it read-only.

use super::block::CartesianDataBlock;
use super::factor::balanced_dims;
use super::io_descriptor::CartesianDataBlockIoDescriptor;
use crate::bov_error::BovError;
use crate::debug_invariants::DebugInvariants;
use crate::extent::{CartesianExtent, DimensionMode};
use crate::io::config::BovIoConfig;
use std::sync::Arc;

/// Where block bounds come from.
#[derive(Clone, Debug, PartialEq)]
pub enum DecompGeometry {
    /// Bounds of the decomposition extent, split evenly per index.
    Uniform { bounds: [f64; 6] },
    /// Node coordinates along each axis of the file extent.
    Rectilinear { coords: Arc<[Vec<f64>; 3]> },
}

#[derive(Clone, Debug, PartialEq)]
struct DecompParams {
    file_ext: CartesianExtent,
    decomp_ext: CartesianExtent,
    geometry: DecompGeometry,
    dims: [usize; 3],
    periodic: [bool; 3],
    n_ghost: i32,
    n_ranks: usize,
}

/// Immutable block/descriptor arena of one decomposition.
#[derive(Debug)]
pub struct BlockLattice {
    dims: [usize; 3],
    blocks: Vec<CartesianDataBlock>,
    descriptors: Vec<CartesianDataBlockIoDescriptor>,
}

impl BlockLattice {
    fn build(p: &DecompParams) -> Result<Self, BovError> {
        let mode = DimensionMode::of(&p.decomp_ext, 0);
        let [ni, nj, nk] = p.dims;
        let n_blocks = ni * nj * nk;
        let mut blocks = Vec::with_capacity(n_blocks);
        let mut descriptors = Vec::with_capacity(n_blocks);
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let id = i + ni * (j + nj * k);
                    let ext = p
                        .decomp_ext
                        .split(0, ni, i)
                        .and_then(|e| e.split(1, nj, j))
                        .and_then(|e| e.split(2, nk, k))
                        .ok_or_else(|| {
                            BovError::InvalidDecomposition(format!(
                                "cannot split {} into {:?} blocks",
                                p.decomp_ext, p.dims
                            ))
                        })?;
                    let bounds = block_bounds(p, &ext, mode)?;
                    let owner = id * p.n_ranks / n_blocks;
                    descriptors.push(CartesianDataBlockIoDescriptor::new(
                        &ext,
                        &p.file_ext,
                        p.periodic,
                        p.n_ghost,
                    )?);
                    blocks.push(CartesianDataBlock::new([i, j, k], id, ext, bounds, owner));
                }
            }
        }
        Ok(Self {
            dims: p.dims,
            blocks,
            descriptors,
        })
    }

    pub fn blocks(&self) -> &[CartesianDataBlock] {
        &self.blocks
    }

    pub fn descriptors(&self) -> &[CartesianDataBlockIoDescriptor] {
        &self.descriptors
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }
}

fn block_bounds(
    p: &DecompParams,
    ext: &CartesianExtent,
    mode: DimensionMode,
) -> Result<[f64; 6], BovError> {
    let mut b = [0.0; 6];
    match &p.geometry {
        DecompGeometry::Uniform { bounds } => {
            for q in 0..3 {
                let (blo, bhi) = (bounds[2 * q], bounds[2 * q + 1]);
                if mode.is_degenerate(q) {
                    b[2 * q] = blo;
                    b[2 * q + 1] = bhi;
                    continue;
                }
                let n = p.decomp_ext.width(q) as f64;
                let d = (bhi - blo) / n;
                let i0 = (ext.lo(q) - p.decomp_ext.lo(q)) as f64;
                let i1 = (ext.hi(q) + 1 - p.decomp_ext.lo(q)) as f64;
                b[2 * q] = blo + d * i0;
                b[2 * q + 1] = if ext.hi(q) == p.decomp_ext.hi(q) {
                    bhi
                } else {
                    blo + d * i1
                };
            }
        }
        DecompGeometry::Rectilinear { coords } => {
            for q in 0..3 {
                let x = &coords[q];
                let at = |idx: i32| -> Result<f64, BovError> {
                    let off = (idx - p.file_ext.lo(q)) as usize;
                    x.get(off).copied().ok_or_else(|| {
                        BovError::Config(format!(
                            "axis {q} has {} coordinates, index {idx} requested",
                            x.len()
                        ))
                    })
                };
                b[2 * q] = at(ext.lo(q))?;
                let top = (ext.hi(q) + 1).min(p.file_ext.hi(q));
                b[2 * q + 1] = if mode.is_degenerate(q) {
                    at(ext.hi(q))?
                } else {
                    at(top)?
                };
            }
        }
    }
    Ok(b)
}

#[derive(Clone, Debug)]
pub struct CartesianDecomp {
    params: DecompParams,
    ni_nj: usize,
    lattice: Arc<BlockLattice>,
}

impl CartesianDecomp {
    /// Single-block decomposition of `file_ext` with the given physical bounds.
    pub fn new(file_ext: CartesianExtent, bounds: [f64; 6]) -> Result<Self, BovError> {
        let params = DecompParams {
            file_ext,
            decomp_ext: file_ext,
            geometry: DecompGeometry::Uniform { bounds },
            dims: [1, 1, 1],
            periodic: [false; 3],
            n_ghost: 0,
            n_ranks: 1,
        };
        Self::from_params(params)
    }

    /// Single-block decomposition of a uniform grid described by origin and spacing.
    pub fn uniform(
        file_ext: CartesianExtent,
        origin: [f64; 3],
        spacing: [f64; 3],
    ) -> Result<Self, BovError> {
        let mode = DimensionMode::of(&file_ext, 0);
        Self::new(file_ext, file_ext.bounds(origin, spacing, mode))
    }

    /// Decomposition of a uniform grid configured from `config` for `n_ranks`.
    ///
    /// `config.decomp_dims` with every entry `< 1` means "one block per rank,
    /// auto-factored".
    pub fn from_config(
        file_ext: CartesianExtent,
        origin: [f64; 3],
        spacing: [f64; 3],
        n_ranks: usize,
        config: &BovIoConfig,
    ) -> Result<Self, BovError> {
        let mut decomp = Self::uniform(file_ext, origin, spacing)?;
        let mut params = decomp.params.clone();
        params.n_ranks = n_ranks.max(1);
        params.periodic = config.periodic;
        params.n_ghost = config.n_ghost;
        if let Some(sub) = config.decomp_extent {
            params.decomp_ext = sub;
            let mode = DimensionMode::of(&sub, 0);
            params.geometry = DecompGeometry::Uniform {
                bounds: sub.bounds(origin, spacing, mode),
            };
        }
        let [ni, nj, nk] = config.decomp_dims;
        params.dims = if ni < 1 && nj < 1 && nk < 1 {
            auto_dims(&params.decomp_ext, params.n_ranks)?
        } else {
            explicit_dims(&params.decomp_ext, ni, nj, nk)?
        };
        decomp.commit(params)?;
        Ok(decomp)
    }

    fn from_params(params: DecompParams) -> Result<Self, BovError> {
        validate(&params)?;
        let lattice = Arc::new(BlockLattice::build(&params)?);
        let ni_nj = params.dims[0] * params.dims[1];
        let decomp = Self {
            params,
            ni_nj,
            lattice,
        };
        crate::debug_invariants!(decomp.validate_invariants(), "CartesianDecomp");
        Ok(decomp)
    }

    /// Replace parameters and arena together, or neither.
    fn commit(&mut self, params: DecompParams) -> Result<(), BovError> {
        let next = Self::from_params(params)?;
        log::debug!(
            "decomposition rebuilt: dims={:?} ghosts={} periodic={:?}",
            next.params.dims,
            next.params.n_ghost,
            next.params.periodic
        );
        *self = next;
        Ok(())
    }

    /// Auto-factor `n` blocks into a balanced 3-D tiling.
    pub fn set_decomp_dims(&mut self, n: usize) -> Result<(), BovError> {
        let dims = auto_dims(&self.params.decomp_ext, n)?;
        let mut params = self.params.clone();
        params.dims = dims;
        self.commit(params)
    }

    /// Explicit per-axis block counts.
    ///
    /// `nj < 1 && nk < 1` is read as "only `ni` is meaningful" and forwards to
    /// [`CartesianDecomp::set_decomp_dims`].
    pub fn set_decomp_dims_3(&mut self, ni: i32, nj: i32, nk: i32) -> Result<(), BovError> {
        let dims = explicit_dims(&self.params.decomp_ext, ni, nj, nk)?;
        let mut params = self.params.clone();
        params.dims = dims;
        self.commit(params)
    }

    pub fn set_periodic(&mut self, periodic: [bool; 3]) -> Result<(), BovError> {
        let mut params = self.params.clone();
        params.periodic = periodic;
        self.commit(params)
    }

    pub fn set_n_ghost(&mut self, n_ghost: i32) -> Result<(), BovError> {
        if n_ghost < 0 {
            return Err(BovError::InvalidGhostWidth(n_ghost));
        }
        let mut params = self.params.clone();
        params.n_ghost = n_ghost;
        self.commit(params)
    }

    /// Number of ranks blocks are assigned to.
    pub fn set_n_ranks(&mut self, n_ranks: usize) -> Result<(), BovError> {
        let mut params = self.params.clone();
        params.n_ranks = n_ranks;
        self.commit(params)
    }

    /// Restrict the partitioned region to a subset of the file extent; `bounds`
    /// are the physical bounds of that subset.
    pub fn set_decomp_extent(
        &mut self,
        decomp_ext: CartesianExtent,
        bounds: [f64; 6],
    ) -> Result<(), BovError> {
        let mut params = self.params.clone();
        params.decomp_ext = decomp_ext;
        if let DecompGeometry::Uniform { .. } = params.geometry {
            params.geometry = DecompGeometry::Uniform { bounds };
        }
        self.commit(params)
    }

    pub fn set_bounds(&mut self, bounds: [f64; 6]) -> Result<(), BovError> {
        let mut params = self.params.clone();
        params.geometry = DecompGeometry::Uniform { bounds };
        self.commit(params)
    }

    /// Use node coordinates (one vector per axis over the file extent).
    pub fn set_coordinates(&mut self, coords: [Vec<f64>; 3]) -> Result<(), BovError> {
        let mut params = self.params.clone();
        params.geometry = DecompGeometry::Rectilinear {
            coords: Arc::new(coords),
        };
        self.commit(params)
    }

    pub fn dims(&self) -> [usize; 3] {
        self.params.dims
    }

    /// Memoized `ni * nj`.
    pub fn ni_nj(&self) -> usize {
        self.ni_nj
    }

    pub fn len(&self) -> usize {
        self.lattice.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lattice.blocks.is_empty()
    }

    pub fn file_extent(&self) -> &CartesianExtent {
        &self.params.file_ext
    }

    pub fn decomp_extent(&self) -> &CartesianExtent {
        &self.params.decomp_ext
    }

    pub fn geometry(&self) -> &DecompGeometry {
        &self.params.geometry
    }

    /// Physical bounds of the decomposition extent.
    pub fn bounds(&self) -> [f64; 6] {
        let blocks = &self.lattice.blocks;
        let first = blocks[0].bounds();
        let last = blocks[blocks.len() - 1].bounds();
        [first[0], last[1], first[2], last[3], first[4], last[5]]
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.params.periodic
    }

    pub fn n_ghost(&self) -> i32 {
        self.params.n_ghost
    }

    pub fn n_ranks(&self) -> usize {
        self.params.n_ranks
    }

    pub fn lattice(&self) -> &Arc<BlockLattice> {
        &self.lattice
    }

    pub fn blocks(&self) -> &[CartesianDataBlock] {
        &self.lattice.blocks
    }

    /// Flat id of a decomposition index, `None` outside `[0, dims)`.
    pub fn flat_index(&self, index: [usize; 3]) -> Option<usize> {
        let d = self.params.dims;
        if (0..3).any(|q| index[q] >= d[q]) {
            return None;
        }
        Some(index[0] + d[0] * index[1] + self.ni_nj * index[2])
    }

    /// Block at an exact decomposition index.
    pub fn block(&self, index: [usize; 3]) -> Option<&CartesianDataBlock> {
        self.flat_index(index).map(|id| &self.lattice.blocks[id])
    }

    /// Like [`CartesianDecomp::block`] but with a descriptive error.
    pub fn block_checked(&self, index: [usize; 3]) -> Result<&CartesianDataBlock, BovError> {
        self.block(index).ok_or(BovError::BlockIndexOutOfRange {
            index,
            dims: self.params.dims,
        })
    }

    pub fn block_by_id(&self, id: usize) -> Option<&CartesianDataBlock> {
        self.lattice.blocks.get(id)
    }

    /// Cached I/O descriptor of the block at `index`.
    pub fn io_descriptor(&self, index: [usize; 3]) -> Option<&CartesianDataBlockIoDescriptor> {
        self.flat_index(index).map(|id| &self.lattice.descriptors[id])
    }

    pub fn io_descriptor_by_id(&self, id: usize) -> Option<&CartesianDataBlockIoDescriptor> {
        self.lattice.descriptors.get(id)
    }

    /// Blocks owned by `rank`.
    pub fn local_blocks(&self, rank: usize) -> impl Iterator<Item = &CartesianDataBlock> + '_ {
        self.lattice.blocks.iter().filter(move |b| b.owner() == rank)
    }

    /// Block containing the physical point `x`.
    ///
    /// Bisects each axis independently (X, then Y, then Z) over the block
    /// bounds lattice. Bounds are closed on both ends, so a point on a shared
    /// face resolves to the lower-index block.
    pub fn find_block(&self, x: [f64; 3]) -> Option<&CartesianDataBlock> {
        let i = self.search_axis(0, x[0])?;
        let j = self.search_axis(1, x[1])?;
        let k = self.search_axis(2, x[2])?;
        self.block([i, j, k])
    }

    /// Index along axis `q` of the block slab containing coordinate `x`.
    pub fn search_axis(&self, q: usize, x: f64) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        let (mut lo, mut hi) = (0usize, self.params.dims[q] - 1);
        loop {
            let (next_lo, next_hi) = match self.bisect(q, x, lo, hi) {
                Probe::Found(i) => return Some(i),
                Probe::Exhausted => return None,
                Probe::Narrow(l, h) => (l, h),
            };
            lo = next_lo;
            hi = next_hi;
        }
    }

    fn axis_bounds(&self, q: usize, i: usize) -> (f64, f64) {
        let mut index = [0usize; 3];
        index[q] = i;
        let id = index[0] + self.params.dims[0] * index[1] + self.ni_nj * index[2];
        let b = self.lattice.blocks[id].bounds();
        (b[2 * q], b[2 * q + 1])
    }

    /// One bisection step over the index range `[lo, hi]`.
    fn bisect(&self, q: usize, x: f64, lo: usize, hi: usize) -> Probe {
        let mid = lo + (hi - lo) / 2;
        let (blo, bhi) = self.axis_bounds(q, mid);
        if blo <= x && x <= bhi {
            if mid > 0 && x == blo && self.axis_bounds(q, mid - 1).1 == x {
                return Probe::Found(mid - 1);
            }
            Probe::Found(mid)
        } else if x < blo {
            if mid == lo {
                Probe::Exhausted
            } else {
                Probe::Narrow(lo, mid - 1)
            }
        } else if mid == hi {
            Probe::Exhausted
        } else {
            Probe::Narrow(mid + 1, hi)
        }
    }
}

enum Probe {
    Found(usize),
    Exhausted,
    Narrow(usize, usize),
}

fn validate(p: &DecompParams) -> Result<(), BovError> {
    if p.file_ext.is_empty() {
        return Err(BovError::InvalidExtent(p.file_ext));
    }
    if !p.file_ext.contains(&p.decomp_ext) {
        return Err(BovError::InvalidExtent(p.decomp_ext));
    }
    if p.n_ghost < 0 {
        return Err(BovError::InvalidGhostWidth(p.n_ghost));
    }
    if p.n_ranks == 0 {
        return Err(BovError::Config("decomposition needs at least one rank".into()));
    }
    for q in 0..3 {
        if p.dims[q] == 0 || p.dims[q] > p.decomp_ext.width(q) {
            return Err(BovError::InvalidDecomposition(format!(
                "{} blocks along axis {q} of {}",
                p.dims[q], p.decomp_ext
            )));
        }
    }
    if let DecompGeometry::Rectilinear { coords } = &p.geometry {
        for q in 0..3 {
            if coords[q].len() != p.file_ext.width(q) {
                return Err(BovError::Config(format!(
                    "axis {q}: {} coordinates for {} nodes",
                    coords[q].len(),
                    p.file_ext.width(q)
                )));
            }
        }
    }
    Ok(())
}

fn auto_dims(decomp_ext: &CartesianExtent, n: usize) -> Result<[usize; 3], BovError> {
    let mode = DimensionMode::of(decomp_ext, 0);
    balanced_dims(n, mode.active_axes()).ok_or_else(|| {
        BovError::InvalidDecomposition(format!("cannot factor {n} blocks over {decomp_ext}"))
    })
}

fn explicit_dims(
    decomp_ext: &CartesianExtent,
    ni: i32,
    nj: i32,
    nk: i32,
) -> Result<[usize; 3], BovError> {
    if nj < 1 && nk < 1 {
        if ni < 1 {
            return Err(BovError::InvalidDecomposition(format!(
                "block count {ni} must be >= 1"
            )));
        }
        return auto_dims(decomp_ext, ni as usize);
    }
    if ni < 1 || nj < 1 || nk < 1 {
        return Err(BovError::InvalidDecomposition(format!(
            "dims [{ni}, {nj}, {nk}] must all be >= 1"
        )));
    }
    Ok([ni as usize, nj as usize, nk as usize])
}

impl DebugInvariants for CartesianDecomp {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CartesianDecomp");
    }

    /// Blocks tile the decomposition extent and bounds increase along each axis.
    fn validate_invariants(&self) -> Result<(), BovError> {
        let blocks = &self.lattice.blocks;
        let total: usize = blocks.iter().map(|b| b.extent().size()).sum();
        if total != self.params.decomp_ext.size() {
            return Err(BovError::InvalidDecomposition(format!(
                "blocks cover {total} of {} indices",
                self.params.decomp_ext.size()
            )));
        }
        for q in 0..3 {
            for i in 1..self.params.dims[q] {
                let (_, prev_hi) = self.axis_bounds(q, i - 1);
                let (lo, _) = self.axis_bounds(q, i);
                if lo < prev_hi {
                    return Err(BovError::InvalidDecomposition(format!(
                        "bounds along axis {q} decrease at block {i}"
                    )));
                }
            }
        }
        Ok(())
    }
}
