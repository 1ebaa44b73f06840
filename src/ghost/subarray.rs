//! Strided sub-array views over flat, x-fastest buffers.
//!
//! A [`SubarrayView`] describes a box of `subsizes` elements starting at
//! `starts` inside a buffer laid out as `sizes` (x fastest). The same view
//! type describes a region of a brick file and a region of a memory
//! buffer; a file/memory pair moves data run by run, one contiguous x-run at
//! a time.
//!
//! Views are plain owned values, so they are released on every exit path.

use crate::bov_error::BovError;
use crate::extent::CartesianExtent;
use itertools::iproduct;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubarrayView {
    sizes: [usize; 3],
    subsizes: [usize; 3],
    starts: [usize; 3],
}

impl SubarrayView {
    /// Build a view, checking that the box fits inside the buffer shape.
    pub fn new(
        sizes: [usize; 3],
        subsizes: [usize; 3],
        starts: [usize; 3],
    ) -> Result<Self, BovError> {
        for q in 0..3 {
            if starts[q] + subsizes[q] > sizes[q] {
                return Err(BovError::Config(format!(
                    "subarray {subsizes:?} at {starts:?} does not fit in {sizes:?}"
                )));
            }
        }
        Ok(Self {
            sizes,
            subsizes,
            starts,
        })
    }

    /// View of `region` inside a buffer laid out over `outer`.
    pub fn of_extent(outer: &CartesianExtent, region: &CartesianExtent) -> Result<Self, BovError> {
        if outer.is_empty() {
            return Err(BovError::InvalidExtent(*outer));
        }
        if region.is_empty() {
            return Self::new(outer.dims(), [0; 3], [0; 3]);
        }
        if !outer.contains(region) {
            return Err(BovError::Config(format!(
                "region {region} is not inside {outer}"
            )));
        }
        let starts = [
            (region.lo(0) - outer.lo(0)) as usize,
            (region.lo(1) - outer.lo(1)) as usize,
            (region.lo(2) - outer.lo(2)) as usize,
        ];
        Self::new(outer.dims(), region.dims(), starts)
    }

    /// View covering the whole buffer.
    pub fn whole(sizes: [usize; 3]) -> Self {
        Self {
            sizes,
            subsizes: sizes,
            starts: [0; 3],
        }
    }

    pub fn sizes(&self) -> [usize; 3] {
        self.sizes
    }

    pub fn subsizes(&self) -> [usize; 3] {
        self.subsizes
    }

    pub fn starts(&self) -> [usize; 3] {
        self.starts
    }

    /// Number of elements selected by the view.
    pub fn len(&self) -> usize {
        self.subsizes.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements in the underlying buffer.
    pub fn buffer_len(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Length of each contiguous run.
    pub fn run_len(&self) -> usize {
        self.subsizes[0]
    }

    /// Buffer offset of every contiguous x-run, in storage order.
    pub fn runs(&self) -> impl Iterator<Item = usize> + '_ {
        let [sx, sy, _] = self.sizes;
        let [x0, y0, z0] = self.starts;
        let (ny, nz) = if self.is_empty() {
            (0, 0)
        } else {
            (self.subsizes[1], self.subsizes[2])
        };
        iproduct!(0..nz, 0..ny).map(move |(k, j)| x0 + sx * ((y0 + j) + sy * (z0 + k)))
    }

    fn check_buffer(&self, len: usize) -> Result<(), BovError> {
        if len != self.buffer_len() {
            return Err(BovError::ViewSizeMismatch {
                expected: self.buffer_len(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Append the selected elements of `src` to `out` in storage order.
    pub fn pack<T: Copy>(&self, src: &[T], out: &mut Vec<T>) -> Result<(), BovError> {
        self.check_buffer(src.len())?;
        out.reserve(self.len());
        let n = self.run_len();
        for off in self.runs() {
            out.extend_from_slice(&src[off..off + n]);
        }
        Ok(())
    }

    pub fn gather<T: Copy>(&self, src: &[T]) -> Result<Vec<T>, BovError> {
        let mut out = Vec::with_capacity(self.len());
        self.pack(src, &mut out)?;
        Ok(out)
    }

    /// Write packed `data` into the selected elements of `dst`.
    pub fn scatter<T: Copy>(&self, data: &[T], dst: &mut [T]) -> Result<(), BovError> {
        self.check_buffer(dst.len())?;
        if data.len() != self.len() {
            return Err(BovError::ViewSizeMismatch {
                expected: self.len(),
                actual: data.len(),
            });
        }
        let n = self.run_len();
        for (chunk, off) in data.chunks_exact(n.max(1)).zip(self.runs()) {
            dst[off..off + n].copy_from_slice(chunk);
        }
        Ok(())
    }

    /// Fill the selected elements of `dst` with `value`.
    pub fn fill<T: Copy>(&self, value: T, dst: &mut [T]) -> Result<(), BovError> {
        self.check_buffer(dst.len())?;
        let n = self.run_len();
        for off in self.runs() {
            dst[off..off + n].fill(value);
        }
        Ok(())
    }

    /// True when the two views select the same number of elements in the
    /// same run structure, so they can be copied run for run.
    pub fn is_congruent(&self, other: &SubarrayView) -> bool {
        self.subsizes == other.subsizes
    }
}
