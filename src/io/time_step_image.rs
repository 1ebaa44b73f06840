//! Open brick handles for one time step.

use crate::bov_error::BovError;
use crate::io::brick::{BrickFile, BrickIo};
use crate::io::metadata::{ArrayKind, BovMetaData, OpenMode};

/// Component bricks of one array, in file-component order.
#[derive(Debug)]
pub struct BovArrayImage<F: BrickIo = BrickFile> {
    name: String,
    kind: ArrayKind,
    components: Vec<F>,
}

impl<F: BrickIo> BovArrayImage<F> {
    pub fn new(name: impl Into<String>, kind: ArrayKind, components: Vec<F>) -> Result<Self, BovError> {
        let name = name.into();
        if components.len() != kind.n_file_components() {
            return Err(BovError::Config(format!(
                "array `{name}` of kind {kind:?} needs {} component bricks, got {}",
                kind.n_file_components(),
                components.len()
            )));
        }
        Ok(Self {
            name,
            kind,
            components,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ArrayKind {
        self.kind
    }

    pub fn components(&self) -> &[F] {
        &self.components
    }
}

/// Per-array brick handles of one step, grouped by kind.
///
/// Dropping the image closes every brick.
#[derive(Debug)]
pub struct BovTimeStepImage<F: BrickIo = BrickFile> {
    step: i64,
    scalars: Vec<BovArrayImage<F>>,
    vectors: Vec<BovArrayImage<F>>,
    tensors: Vec<BovArrayImage<F>>,
    symmetric_tensors: Vec<BovArrayImage<F>>,
}

impl BovTimeStepImage<BrickFile> {
    /// Open the bricks of every active array of `step`.
    ///
    /// In [`OpenMode::Write`] `create` decides whether bricks are created
    /// (truncated and sized) or opened as they are.
    pub fn open(
        metadata: &BovMetaData,
        step: i64,
        mode: OpenMode,
        create: bool,
    ) -> Result<Self, BovError> {
        if mode == OpenMode::Read && !metadata.has_time_step(step) {
            return Err(BovError::UnknownTimeStep(step));
        }
        let dims = metadata.file_extent().dims();
        let mut arrays = Vec::new();
        for info in metadata.arrays().iter().filter(|a| !a.active) {
            log::debug!("time step {step}: skipping inactive array `{}`", info.name);
        }
        for info in metadata.active_arrays() {
            let mut bricks = Vec::with_capacity(info.kind.n_file_components());
            for component in info.component_names() {
                let path = metadata.brick_path(&component, step);
                let brick = match (mode, create) {
                    (OpenMode::Read, _) => BrickFile::open(path, dims),
                    (OpenMode::Write, true) => BrickFile::create(path, dims),
                    (OpenMode::Write, false) => BrickFile::open_for_write(path, dims),
                }?;
                bricks.push(brick);
            }
            arrays.push(BovArrayImage::new(info.name.clone(), info.kind, bricks)?);
        }
        log::debug!("opened time step {step} with {} arrays", arrays.len());
        Ok(Self::from_parts(step, arrays))
    }
}

impl<F: BrickIo> BovTimeStepImage<F> {
    /// Group `arrays` by kind, keeping their relative order.
    pub fn from_parts(step: i64, arrays: Vec<BovArrayImage<F>>) -> Self {
        let mut image = Self {
            step,
            scalars: Vec::new(),
            vectors: Vec::new(),
            tensors: Vec::new(),
            symmetric_tensors: Vec::new(),
        };
        for a in arrays {
            match a.kind {
                ArrayKind::Scalar => image.scalars.push(a),
                ArrayKind::Vector => image.vectors.push(a),
                ArrayKind::Tensor => image.tensors.push(a),
                ArrayKind::SymmetricTensor => image.symmetric_tensors.push(a),
            }
        }
        image
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn scalars(&self) -> &[BovArrayImage<F>] {
        &self.scalars
    }

    pub fn vectors(&self) -> &[BovArrayImage<F>] {
        &self.vectors
    }

    pub fn tensors(&self) -> &[BovArrayImage<F>] {
        &self.tensors
    }

    pub fn symmetric_tensors(&self) -> &[BovArrayImage<F>] {
        &self.symmetric_tensors
    }

    /// Every array, scalars first, then vectors, tensors and symmetric tensors.
    pub fn arrays(&self) -> impl Iterator<Item = &BovArrayImage<F>> + '_ {
        self.scalars
            .iter()
            .chain(&self.vectors)
            .chain(&self.tensors)
            .chain(&self.symmetric_tensors)
    }

    pub fn n_arrays(&self) -> usize {
        self.scalars.len() + self.vectors.len() + self.tensors.len() + self.symmetric_tensors.len()
    }
}
