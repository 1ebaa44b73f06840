//! Per-block file/memory view pairs for ghost-aware reads and writes.
//!
//! A [`CartesianDataBlockIoDescriptor`] lets a block fill its whole
//! node-local array, ghost layers included, straight from the brick file.
//! Blocks never exchange data at read/write time; all of the coordination
//! happens here, when the views are computed.
//!
//! Construction:
//! 1. grow the block by `n_ghost` on every axis the file's dimension mode
//!    allows;
//! 2. clamp non-periodic axes back inside the file extent, so no ghost is
//!    invented past a physical boundary;
//! 3. for each of the 27 shifts in `{-1, 0, 1}^3`, shift the memory extent by
//!    that multiple of the file size, intersect with the file, and record the
//!    surviving region as a (file view, memory view) pair.
//!
//! Shift `(0, 0, 0)` yields the primary region; the others only survive where
//! a periodic axis wraps.

use crate::bov_error::BovError;
use crate::debug_invariants::DebugInvariants;
use crate::extent::{CartesianExtent, DimensionMode};
use crate::ghost::subarray::SubarrayView;
use itertools::iproduct;

/// One (file view, memory view) pair with equal element counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewPair {
    pub file: SubarrayView,
    pub mem: SubarrayView,
    /// Region in file index space.
    pub file_region: CartesianExtent,
    /// Same region in (un-shifted) memory index space.
    pub mem_region: CartesianExtent,
}

#[derive(Clone, Debug)]
pub struct CartesianDataBlockIoDescriptor {
    block_ext: CartesianExtent,
    file_ext: CartesianExtent,
    mem_ext: CartesianExtent,
    periodic: [bool; 3],
    n_ghost: i32,
    views: Vec<ViewPair>,
}

impl CartesianDataBlockIoDescriptor {
    pub fn new(
        block_ext: &CartesianExtent,
        file_ext: &CartesianExtent,
        periodic: [bool; 3],
        n_ghost: i32,
    ) -> Result<Self, BovError> {
        if file_ext.is_empty() {
            return Err(BovError::InvalidExtent(*file_ext));
        }
        if block_ext.is_empty() || !file_ext.contains(block_ext) {
            return Err(BovError::InvalidExtent(*block_ext));
        }
        let mut desc = Self {
            block_ext: *block_ext,
            file_ext: *file_ext,
            mem_ext: *block_ext,
            periodic,
            n_ghost,
            views: Vec::new(),
        };

        if n_ghost <= 0 {
            desc.n_ghost = 0;
            desc.push_pair(*block_ext, *block_ext)?;
            return Ok(desc);
        }

        let mode = DimensionMode::of(file_ext, n_ghost);
        let mut mem_ext = *block_ext;
        mem_ext.grow(n_ghost, mode);
        for q in 0..3 {
            if !periodic[q] {
                mem_ext[2 * q] = mem_ext.lo(q).max(file_ext.lo(q));
                mem_ext[2 * q + 1] = mem_ext.hi(q).min(file_ext.hi(q));
            }
        }
        desc.mem_ext = mem_ext;

        let period = file_ext.dims().map(|n| n as i32);
        for (sk, sj, si) in iproduct!(-1..=1i32, -1..=1i32, -1..=1i32) {
            let shift = [si * period[0], sj * period[1], sk * period[2]];
            let mut shifted = mem_ext;
            shifted.shift_by(shift);
            shifted.intersect(file_ext);
            if shifted.is_empty() {
                continue;
            }
            let mut local = shifted;
            local.shift_by([-shift[0], -shift[1], -shift[2]]);
            desc.push_pair(shifted, local)?;
        }

        crate::debug_invariants!(desc.validate_invariants(), "CartesianDataBlockIoDescriptor::new");
        log::debug!(
            "io descriptor block={} mem={} views={}",
            desc.block_ext,
            desc.mem_ext,
            desc.views.len()
        );
        Ok(desc)
    }

    fn push_pair(
        &mut self,
        file_region: CartesianExtent,
        mem_region: CartesianExtent,
    ) -> Result<(), BovError> {
        let file = SubarrayView::of_extent(&self.file_ext, &file_region)?;
        let mem = SubarrayView::of_extent(&self.mem_ext, &mem_region)?;
        if file.len() != mem.len() {
            return Err(BovError::ViewSizeMismatch {
                expected: file.len(),
                actual: mem.len(),
            });
        }
        self.views.push(ViewPair {
            file,
            mem,
            file_region,
            mem_region,
        });
        Ok(())
    }

    /// Block extent grown by ghosts, minus ghosts past non-periodic boundaries.
    pub fn mem_extent(&self) -> &CartesianExtent {
        &self.mem_ext
    }

    pub fn block_extent(&self) -> &CartesianExtent {
        &self.block_ext
    }

    pub fn file_extent(&self) -> &CartesianExtent {
        &self.file_ext
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn n_ghost(&self) -> i32 {
        self.n_ghost
    }

    /// Number of view pairs.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn pair(&self, i: usize) -> Option<&ViewPair> {
        self.views.get(i)
    }

    pub fn pairs(&self) -> &[ViewPair] {
        &self.views
    }

    pub fn iter(&self) -> CartesianDataBlockIoDescriptorIter<'_> {
        CartesianDataBlockIoDescriptorIter {
            inner: self.views.iter(),
        }
    }
}

/// Sequential accessor over `(file view, memory view)` pairs.
pub struct CartesianDataBlockIoDescriptorIter<'a> {
    inner: std::slice::Iter<'a, ViewPair>,
}

impl<'a> Iterator for CartesianDataBlockIoDescriptorIter<'a> {
    type Item = (&'a SubarrayView, &'a SubarrayView);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|p| (&p.file, &p.mem))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for CartesianDataBlockIoDescriptorIter<'_> {}

impl<'a> IntoIterator for &'a CartesianDataBlockIoDescriptor {
    type Item = (&'a SubarrayView, &'a SubarrayView);
    type IntoIter = CartesianDataBlockIoDescriptorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl DebugInvariants for CartesianDataBlockIoDescriptor {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CartesianDataBlockIoDescriptor");
    }

    /// Memory regions tile the memory extent exactly once and every pair is
    /// size-matched.
    fn validate_invariants(&self) -> Result<(), BovError> {
        let mut covered = vec![0u8; self.mem_ext.size()];
        for pair in &self.views {
            if pair.file.len() != pair.mem.len() {
                return Err(BovError::ViewSizeMismatch {
                    expected: pair.file.len(),
                    actual: pair.mem.len(),
                });
            }
            let n = pair.mem.run_len();
            for off in pair.mem.runs() {
                for c in &mut covered[off..off + n] {
                    *c += 1;
                }
            }
        }
        match covered.iter().position(|&c| c != 1) {
            None => Ok(()),
            Some(i) => Err(BovError::Config(format!(
                "memory index {i} of {} covered {} times",
                self.mem_ext, covered[i]
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> CartesianExtent {
        CartesianExtent::new([0, 9, 0, 9, 0, 9])
    }

    #[test]
    fn overlapping_views_fail_validation() {
        let block = CartesianExtent::new([0, 4, 0, 9, 0, 9]);
        let mut d = CartesianDataBlockIoDescriptor::new(&block, &file(), [false; 3], 1).unwrap();
        assert!(d.validate_invariants().is_ok());
        let dup = d.views[0].clone();
        d.views.push(dup);
        assert!(matches!(d.validate_invariants(), Err(BovError::Config(_))));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "[invariants] CartesianDataBlockIoDescriptor")]
    fn overlapping_views_panic_in_debug_builds() {
        let block = CartesianExtent::new([0, 4, 0, 9, 0, 9]);
        let mut d = CartesianDataBlockIoDescriptor::new(&block, &file(), [false; 3], 1).unwrap();
        d.views.truncate(0);
        d.debug_assert_invariants();
    }

    #[test]
    fn zero_ghosts_is_one_pair() {
        let block = CartesianExtent::new([0, 4, 5, 9, 0, 9]);
        let d = CartesianDataBlockIoDescriptor::new(&block, &file(), [true; 3], 0).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.mem_extent(), &block);
        assert_eq!(d.pair(0).unwrap().file_region, block);
    }

    #[test]
    fn interior_block_reads_one_grown_region() {
        let block = CartesianExtent::new([3, 6, 3, 6, 3, 6]);
        let d = CartesianDataBlockIoDescriptor::new(&block, &file(), [false; 3], 2).unwrap();
        assert_eq!(d.mem_extent(), &CartesianExtent::new([1, 8, 1, 8, 1, 8]));
        assert_eq!(d.len(), 1);
        d.validate_invariants().unwrap();
    }

    #[test]
    fn non_periodic_boundary_strips_ghosts() {
        let block = CartesianExtent::new([0, 4, 0, 9, 0, 9]);
        let d = CartesianDataBlockIoDescriptor::new(&block, &file(), [false; 3], 1).unwrap();
        assert_eq!(d.mem_extent(), &CartesianExtent::new([0, 5, 0, 9, 0, 9]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn periodic_x_wraps_low_face() {
        let block = CartesianExtent::new([0, 4, 0, 9, 0, 9]);
        let d =
            CartesianDataBlockIoDescriptor::new(&block, &file(), [true, false, false], 1).unwrap();
        assert_eq!(d.mem_extent(), &CartesianExtent::new([-1, 5, 0, 9, 0, 9]));
        assert_eq!(d.len(), 2);
        let wrapped = d
            .pairs()
            .iter()
            .find(|p| p.mem_region.lo(0) == -1)
            .expect("wrapped region");
        assert_eq!(wrapped.file_region, CartesianExtent::new([9, 9, 0, 9, 0, 9]));
        assert_eq!(wrapped.mem.starts(), [0, 0, 0]);
        d.validate_invariants().unwrap();
    }

    #[test]
    fn fully_periodic_corner_block_has_eight_regions() {
        let block = CartesianExtent::new([0, 4, 0, 4, 0, 4]);
        let d = CartesianDataBlockIoDescriptor::new(&block, &file(), [true; 3], 1).unwrap();
        assert_eq!(d.len(), 8);
        assert_eq!(d.iter().len(), 8);
        let total: usize = d.iter().map(|(f, _)| f.len()).sum();
        assert_eq!(total, d.mem_extent().size());
        d.validate_invariants().unwrap();
    }

    #[test]
    fn planar_file_never_grows_the_flat_axis() {
        let file = CartesianExtent::new([0, 9, 0, 9, 0, 0]);
        let block = CartesianExtent::new([0, 4, 0, 4, 0, 0]);
        let d = CartesianDataBlockIoDescriptor::new(&block, &file, [true; 3], 1).unwrap();
        assert_eq!(d.mem_extent(), &CartesianExtent::new([-1, 5, -1, 5, 0, 0]));
        d.validate_invariants().unwrap();
    }

    #[test]
    fn negative_ghosts_degenerate_to_block() {
        let block = CartesianExtent::new([0, 4, 0, 4, 0, 4]);
        let d = CartesianDataBlockIoDescriptor::new(&block, &file(), [true; 3], -2).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.n_ghost(), 0);
        assert_eq!(d.mem_extent(), &block);
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let block = CartesianExtent::new([0, 4, 0, 4, 0, 4]);
        let outside = CartesianExtent::new([8, 12, 0, 4, 0, 4]);
        assert!(CartesianDataBlockIoDescriptor::new(&outside, &file(), [false; 3], 1).is_err());
    }
}
