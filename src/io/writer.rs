//! Parallel BOV writer.

use crate::algs::communicator::{Communicator, broadcast_bytes};
use crate::bov_error::BovError;
use crate::io::brick::BrickIo;
use crate::io::components::{deinterleave, mem_component};
use crate::io::config::BovIoConfig;
use crate::io::data_set::{DataSet, ProgressSink};
use crate::io::metadata::{BovMetaData, OpenMode};
use crate::io::reader::IoRegion;
use crate::io::time_step_image::{BovArrayImage, BovTimeStepImage};
use crate::ghost::subarray::SubarrayView;
use std::path::Path;

const STATUS_OK: &[u8] = &[1];

pub struct BovWriter<C: Communicator> {
    comm: C,
    config: BovIoConfig,
    metadata: Option<BovMetaData>,
}

impl<C: Communicator> BovWriter<C> {
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

    /// Rank 0's outcome of `f`, shared with every rank.
    fn root_status(
        &self,
        f: impl FnOnce() -> Result<(), BovError>,
        what: &str,
    ) -> Result<(), BovError> {
        if self.comm.rank() == 0 {
            let res = f();
            let status: &[u8] = if res.is_ok() { STATUS_OK } else { &[] };
            broadcast_bytes(&self.comm, 0, status)?;
            res
        } else if broadcast_bytes(&self.comm, 0, &[])?.is_empty() {
            Err(BovError::Communication(format!("rank 0 failed to {what}")))
        } else {
            Ok(())
        }
    }

    /// Collective: write the metadata file at `path` on rank 0 and adopt
    /// `metadata` on every rank.
    pub fn open(&mut self, path: impl AsRef<Path>, mut metadata: BovMetaData) -> Result<(), BovError> {
        let path = path.as_ref();
        self.metadata = None;
        metadata.set_mode(OpenMode::Write);
        self.root_status(
            || metadata.clone().write_metadata(path),
            &format!("write {}", path.display()),
        )?;
        metadata.set_location(path);
        log::debug!("rank {} opened {} for writing", self.comm.rank(), path.display());
        self.metadata = Some(metadata);
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

    pub fn metadata_mut(&mut self) -> Result<&mut BovMetaData, BovError> {
        self.metadata.as_mut().ok_or(BovError::NotOpen)
    }

    /// Collective: rank 0 creates and sizes the bricks of `step`, then every
    /// rank opens them for writing.
    pub fn open_time_step(&mut self, step: i64) -> Result<BovTimeStepImage, BovError> {
        let md = self.metadata.as_ref().ok_or(BovError::NotOpen)?;
        let mut created = None;
        self.root_status(
            || {
                created = Some(BovTimeStepImage::open(md, step, OpenMode::Write, true)?);
                Ok(())
            },
            &format!("create time step {step}"),
        )?;
        let image = match created {
            Some(image) => image,
            None => BovTimeStepImage::open(md, step, OpenMode::Write, false)?,
        };
        if let Some(md) = self.metadata.as_mut() {
            md.add_time_step(step);
        }
        Ok(image)
    }

    pub fn close_time_step<F: BrickIo>(&self, image: BovTimeStepImage<F>) {
        log::debug!("closed time step {}", image.step());
    }

    /// Write every array of `image` from `data` over `region`.
    pub fn write_time_step<F, D, P>(
        &self,
        image: &BovTimeStepImage<F>,
        region: IoRegion<'_>,
        data: &D,
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
            write_array(array, &pairs, n_tuples, data)?;
            if matches!(region, IoRegion::Flat(_)) && self.config.collective_io {
                self.comm.barrier();
            }
            done += 0.70 / total;
            progress.report(done);
        }
        Ok(())
    }
}

fn write_array<F: BrickIo, D: DataSet + ?Sized>(
    array: &BovArrayImage<F>,
    pairs: &[(SubarrayView, SubarrayView)],
    n_tuples: usize,
    data: &D,
) -> Result<(), BovError> {
    let kind = array.kind();
    let src = data
        .point_data()
        .array(array.name())
        .ok_or_else(|| BovError::MissingArray(array.name().to_string()))?;
    if src.n_components() != kind.n_mem_components() || src.n_tuples() != n_tuples {
        return Err(BovError::ViewSizeMismatch {
            expected: n_tuples * kind.n_mem_components(),
            actual: src.values().len(),
        }
        .in_array(array.name(), 0));
    }
    let n_comps = src.n_components();
    let mut planar = vec![0.0f32; n_tuples];
    for (q, brick) in array.components().iter().enumerate() {
        deinterleave(src.values(), mem_component(kind, q), n_comps, &mut planar)
            .map_err(|e| e.in_array(array.name(), q))?;
        for (file_view, mem_view) in pairs {
            brick
                .write_region(file_view, mem_view, &planar)
                .map_err(|e| e.in_array(array.name(), q))?;
        }
    }
    log::debug!("wrote {} ({} tuples)", array.name(), n_tuples);
    Ok(())
}
