//! Brick-of-Values dataset I/O.
//!
//! A BOV dataset is a small text metadata file plus one raw brick per array
//! component per time step. [`BovReader`] and [`BovWriter`] move bricks
//! between disk and a [`DataSet`], either for a flat extent or for a ghosted
//! block described by a
//! [`CartesianDataBlockIoDescriptor`](crate::decomp::CartesianDataBlockIoDescriptor).

pub mod brick;
pub mod components;
pub mod config;
pub mod data_set;
pub mod metadata;
pub mod pack;
pub mod reader;
pub mod time_step_image;
pub mod writer;

pub use brick::{BrickFile, BrickIo};
pub use config::{BovIoConfig, VectorProjection};
pub use data_set::{DataArray, DataSet, ImageData, NoProgress, PointData, ProgressSink};
pub use metadata::{ArrayInfo, ArrayKind, BovMetaData, OpenMode};
pub use reader::{BovReader, IoRegion, META_READ_FILL};
pub use time_step_image::{BovArrayImage, BovTimeStepImage};
pub use writer::BovWriter;
