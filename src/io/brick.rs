//! Raw brick files: one component of one array at one time step.
//!
//! A brick is `nx * ny * nz` native-endian `f32` values, x fastest. Regions
//! move between a brick and a memory buffer as pairs of [`SubarrayView`]s,
//! one contiguous x-run per positioned read or write.

use crate::bov_error::BovError;
use crate::ghost::subarray::SubarrayView;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::mem::size_of;
use std::path::{Path, PathBuf};

/// Region-wise access to one component brick.
pub trait BrickIo {
    /// Copy `file_view` of the brick into `mem_view` of `dst`.
    fn read_region(
        &self,
        file_view: &SubarrayView,
        mem_view: &SubarrayView,
        dst: &mut [f32],
    ) -> Result<(), BovError>;

    /// Copy `mem_view` of `src` into `file_view` of the brick.
    fn write_region(
        &self,
        file_view: &SubarrayView,
        mem_view: &SubarrayView,
        src: &[f32],
    ) -> Result<(), BovError>;

    fn path(&self) -> &Path;
}

/// Check that a file/memory view pair can be copied run for run.
pub fn check_view_pair(
    dims: [usize; 3],
    file_view: &SubarrayView,
    mem_view: &SubarrayView,
    mem_len: usize,
) -> Result<(), BovError> {
    if file_view.sizes() != dims {
        return Err(BovError::Config(format!(
            "file view over {:?} used on a brick of {dims:?}",
            file_view.sizes()
        )));
    }
    if !file_view.is_congruent(mem_view) {
        return Err(BovError::ViewSizeMismatch {
            expected: file_view.len(),
            actual: mem_view.len(),
        });
    }
    if mem_view.buffer_len() != mem_len {
        return Err(BovError::ViewSizeMismatch {
            expected: mem_view.buffer_len(),
            actual: mem_len,
        });
    }
    Ok(())
}

#[derive(Debug)]
pub struct BrickFile {
    path: PathBuf,
    file: File,
    dims: [usize; 3],
}

impl BrickFile {
    fn byte_len(dims: [usize; 3]) -> u64 {
        (dims.iter().product::<usize>() * size_of::<f32>()) as u64
    }

    /// Open an existing brick for reading; its size must match `dims`.
    pub fn open(path: impl Into<PathBuf>, dims: [usize; 3]) -> Result<Self, BovError> {
        let path = path.into();
        let file = File::open(&path).map_err(|e| BovError::io(&path, e))?;
        let len = file.metadata().map_err(|e| BovError::io(&path, e))?.len();
        if len != Self::byte_len(dims) {
            return Err(BovError::Io {
                path,
                message: format!("{len} bytes, expected {} for {dims:?}", Self::byte_len(dims)),
            });
        }
        Ok(Self { path, file, dims })
    }

    /// Create (or truncate) a brick and size it for `dims`.
    pub fn create(path: impl Into<PathBuf>, dims: [usize; 3]) -> Result<Self, BovError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| BovError::io(&path, e))?;
        file.set_len(Self::byte_len(dims))
            .map_err(|e| BovError::io(&path, e))?;
        Ok(Self { path, file, dims })
    }

    /// Open a brick another rank created, without truncating it.
    pub fn open_for_write(path: impl Into<PathBuf>, dims: [usize; 3]) -> Result<Self, BovError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| BovError::io(&path, e))?;
        Ok(Self { path, file, dims })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    fn seek_to(&self, element: usize) -> Result<(), BovError> {
        (&self.file)
            .seek(SeekFrom::Start((element * size_of::<f32>()) as u64))
            .map_err(|e| BovError::io(&self.path, e))?;
        Ok(())
    }
}

impl BrickIo for BrickFile {
    fn read_region(
        &self,
        file_view: &SubarrayView,
        mem_view: &SubarrayView,
        dst: &mut [f32],
    ) -> Result<(), BovError> {
        check_view_pair(self.dims, file_view, mem_view, dst.len())?;
        let n = file_view.run_len();
        for (f, m) in file_view.runs().zip(mem_view.runs()) {
            self.seek_to(f)?;
            (&self.file)
                .read_exact(bytemuck::cast_slice_mut(&mut dst[m..m + n]))
                .map_err(|e| BovError::io(&self.path, e))?;
        }
        Ok(())
    }

    fn write_region(
        &self,
        file_view: &SubarrayView,
        mem_view: &SubarrayView,
        src: &[f32],
    ) -> Result<(), BovError> {
        check_view_pair(self.dims, file_view, mem_view, src.len())?;
        let n = file_view.run_len();
        for (f, m) in file_view.runs().zip(mem_view.runs()) {
            self.seek_to(f)?;
            (&self.file)
                .write_all(bytemuck::cast_slice(&src[m..m + n]))
                .map_err(|e| BovError::io(&self.path, e))?;
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
