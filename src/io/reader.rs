//! Parallel BOV reader.
//!
//! Rank 0 parses the metadata file and broadcasts a packed copy; every rank
//! then opens the bricks of a time step and reads its own region, either a
//! flat extent of the file or the ghosted view pairs of a block descriptor.

use crate::algs::communicator::{Communicator, broadcast_bytes};
use crate::bov_error::BovError;
use crate::decomp::{CartesianDataBlockIoDescriptor, CartesianDecomp};
use crate::extent::CartesianExtent;
use crate::ghost::subarray::SubarrayView;
use crate::io::brick::BrickIo;
use crate::io::components::{interleave, mem_component, mirror_symmetric};
use crate::io::config::{BovIoConfig, VectorProjection};
use crate::io::data_set::{DataArray, DataSet, ProgressSink};
use crate::io::metadata::{ArrayKind, BovMetaData, OpenMode};
use crate::io::time_step_image::{BovArrayImage, BovTimeStepImage};
use std::path::Path;

/// Value written into every array by [`BovReader::read_meta_time_step`].
pub const META_READ_FILL: f32 = -1.0;

/// Region of the dataset one rank reads or writes.
#[derive(Copy, Clone, Debug)]
pub enum IoRegion<'a> {
    /// A plain extent inside the file; memory holds exactly that extent.
    Flat(CartesianExtent),
    /// A block with ghost layers, possibly wrapping periodically.
    Ghosted(&'a CartesianDataBlockIoDescriptor),
}

impl IoRegion<'_> {
    /// Extent of the memory buffer the region fills.
    pub fn mem_extent(&self) -> CartesianExtent {
        match self {
            IoRegion::Flat(ext) => *ext,
            IoRegion::Ghosted(d) => *d.mem_extent(),
        }
    }

    /// `(file view, memory view)` pairs against a file of `file_ext`.
    pub fn view_pairs(
        &self,
        file_ext: &CartesianExtent,
    ) -> Result<Vec<(SubarrayView, SubarrayView)>, BovError> {
        match self {
            IoRegion::Flat(ext) => {
                if ext.is_empty() || !file_ext.contains(ext) {
                    return Err(BovError::InvalidExtent(*ext));
                }
                Ok(vec![(
                    SubarrayView::of_extent(file_ext, ext)?,
                    SubarrayView::whole(ext.dims()),
                )])
            }
            IoRegion::Ghosted(d) => {
                if d.file_extent() != file_ext {
                    return Err(BovError::Config(format!(
                        "descriptor built for file {} used on file {file_ext}",
                        d.file_extent()
                    )));
                }
                Ok(d.iter().map(|(f, m)| (*f, *m)).collect())
            }
        }
    }

    fn is_flat(&self) -> bool {
        matches!(self, IoRegion::Flat(_))
    }
}

pub struct BovReader<C: Communicator> {
    comm: C,
    config: BovIoConfig,
    metadata: Option<BovMetaData>,
}

impl<C: Communicator> BovReader<C> {
    pub fn new(comm: C) -> Self {
        Self::with_config(comm, BovIoConfig::default())
    }

    pub fn with_config(comm: C, config: BovIoConfig) -> Self {
        Self {
            comm,
            config,
            metadata: None,
        }
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn config(&self) -> &BovIoConfig {
        &self.config
    }

    pub fn set_vector_projection(&mut self, projection: VectorProjection) {
        self.config.vector_projection = projection;
    }

    pub fn vector_projection(&self) -> VectorProjection {
        self.config.vector_projection
    }

    /// Collective: open the dataset described by the metadata file at `path`.
    ///
    /// Only rank 0 touches the file system here. A failure on rank 0 is
    /// reported on every rank.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), BovError> {
        self.metadata = None;
        let root = self.comm.rank() == 0;
        let md = if root {
            match BovMetaData::open(path.as_ref()) {
                Ok(md) => {
                    broadcast_bytes(&self.comm, 0, &md.pack())?;
                    md
                }
                Err(e) => {
                    broadcast_bytes(&self.comm, 0, &[])?;
                    return Err(e);
                }
            }
        } else {
            let bytes = broadcast_bytes(&self.comm, 0, &[])?;
            if bytes.is_empty() {
                return Err(BovError::Communication(format!(
                    "rank 0 failed to open {}",
                    path.as_ref().display()
                )));
            }
            BovMetaData::unpack(&bytes)?
        };
        log::debug!(
            "rank {} opened {} ({} arrays)",
            self.comm.rank(),
            path.as_ref().display(),
            md.arrays().len()
        );
        self.metadata = Some(md);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.metadata.take().is_some() {
            log::debug!("rank {} closed dataset", self.comm.rank());
        }
    }

    pub fn is_open(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn metadata(&self) -> Result<&BovMetaData, BovError> {
        self.metadata.as_ref().ok_or(BovError::NotOpen)
    }

    /// Catalog access, e.g. to activate or deactivate arrays.
    pub fn metadata_mut(&mut self) -> Result<&mut BovMetaData, BovError> {
        self.metadata.as_mut().ok_or(BovError::NotOpen)
    }

    /// Decomposition of the open dataset over this communicator.
    pub fn decomposition(&self) -> Result<CartesianDecomp, BovError> {
        let md = self.metadata()?;
        let mut config = self.config.clone();
        if config.decomp_extent.is_none() && md.decomp_extent() != md.file_extent() {
            config.decomp_extent = Some(*md.decomp_extent());
        }
        let mut decomp = CartesianDecomp::from_config(
            *md.file_extent(),
            md.origin(),
            md.spacing(),
            self.comm.size(),
            &config,
        )?;
        if let Some(coords) = md.coordinates() {
            decomp.set_coordinates(coords.clone())?;
        }
        Ok(decomp)
    }

    /// Open the bricks of every active array for `step`.
    pub fn open_time_step(&self, step: i64) -> Result<BovTimeStepImage, BovError> {
        BovTimeStepImage::open(self.metadata()?, step, OpenMode::Read, false)
    }

    pub fn close_time_step<F: BrickIo>(&self, image: BovTimeStepImage<F>) {
        log::debug!("closed time step {}", image.step());
    }

    /// Read every array of `image` for `region` into `data`.
    ///
    /// Arrays are added to the data set's point data with one tuple per
    /// memory-extent index. The first failing array aborts the step.
    pub fn read_time_step<F, D, P>(
        &self,
        image: &BovTimeStepImage<F>,
        region: IoRegion<'_>,
        data: &mut D,
        progress: &mut P,
    ) -> Result<(), BovError>
    where
        F: BrickIo,
        D: DataSet + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let md = self.metadata()?;
        let pairs = region.view_pairs(md.file_extent())?;
        let n_tuples = region.mem_extent().size();
        let total = image.n_arrays().max(1) as f64;
        let mut done = 0.25;
        progress.report(done);

        for array in image.arrays() {
            self.read_array(array, &pairs, n_tuples, data)?;
            if region.is_flat() && self.config.collective_io {
                self.comm.barrier();
            }
            done += 0.70 / total;
            progress.report(done);
        }
        Ok(())
    }

    fn read_array<F: BrickIo, D: DataSet + ?Sized>(
        &self,
        array: &BovArrayImage<F>,
        pairs: &[(SubarrayView, SubarrayView)],
        n_tuples: usize,
        data: &mut D,
    ) -> Result<(), BovError> {
        let kind = array.kind();
        let n_comps = kind.n_mem_components();
        let skip = match kind {
            ArrayKind::Vector => self.config.vector_projection.excluded_component(),
            _ => None,
        };
        let mut out = DataArray::new(array.name(), n_comps, n_tuples);
        let mut planar = vec![0.0f32; n_tuples];

        for (q, brick) in array.components().iter().enumerate() {
            if skip == Some(q) {
                log::debug!("{}: component {q} projected out", array.name());
                continue;
            }
            for (file_view, mem_view) in pairs {
                brick
                    .read_region(file_view, mem_view, &mut planar)
                    .map_err(|e| e.in_array(array.name(), q))?;
            }
            interleave(&planar, mem_component(kind, q), n_comps, out.values_mut())
                .map_err(|e| e.in_array(array.name(), q))?;
        }
        if kind == ArrayKind::SymmetricTensor {
            mirror_symmetric(out.values_mut());
        }
        data.point_data_mut().insert(out);
        log::debug!("read {} ({} tuples)", array.name(), n_tuples);
        Ok(())
    }

    /// Add every active array filled with [`META_READ_FILL`], without I/O.
    pub fn read_meta_time_step<D: DataSet + ?Sized>(
        &self,
        region: IoRegion<'_>,
        data: &mut D,
    ) -> Result<(), BovError> {
        let md = self.metadata()?;
        let n_tuples = region.mem_extent().size();
        for info in md.active_arrays() {
            data.point_data_mut()
                .add_array(&info.name, info.kind.n_mem_components(), n_tuples)
                .values_mut()
                .fill(META_READ_FILL);
        }
        Ok(())
    }

    /// Set extent and geometry of `data` to match `region`.
    pub fn fill_data_set_geometry<D: DataSet + ?Sized>(
        &self,
        region: IoRegion<'_>,
        data: &mut D,
    ) -> Result<(), BovError> {
        let md = self.metadata()?;
        let ext = region.mem_extent();
        data.set_extent(ext);
        match md.coordinates() {
            Some(coords) => {
                let file_ext = md.file_extent();
                let mut slices: [Vec<f64>; 3] = Default::default();
                for q in 0..3 {
                    slices[q] = (ext.lo(q)..=ext.hi(q))
                        .map(|i| wrapped_coordinate(&coords[q], i - file_ext.lo(q)))
                        .collect::<Result<_, _>>()?;
                }
                data.set_coordinates(slices);
            }
            None => {
                data.set_origin(md.origin());
                data.set_spacing(md.spacing());
            }
        }
        Ok(())
    }
}

/// Coordinate of file index `i` along an axis with coordinates `c`.
///
/// Indices outside `0..c.len()` are periodic images: they wrap onto the file
/// and are shifted by whole periods. The period is the coordinate range scaled
/// by `n / (n - 1)`, so a uniform axis continues with its own spacing.
fn wrapped_coordinate(c: &[f64], i: i32) -> Result<f64, BovError> {
    let n = c.len() as i64;
    let (first, last) = match (c.first(), c.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Err(BovError::Config("empty coordinate axis".into())),
    };
    let i = i as i64;
    if (0..n).contains(&i) {
        return Ok(c[i as usize]);
    }
    if n < 2 {
        return Err(BovError::Config(format!(
            "index {i} lies outside a single-point coordinate axis"
        )));
    }
    let period = (last - first) * n as f64 / (n - 1) as f64;
    Ok(c[i.rem_euclid(n) as usize] + i.div_euclid(n) as f64 * period)
}
