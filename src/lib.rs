#![cfg_attr(docsrs, feature(doc_cfg))]
//! # bov-io
//!
//! Parallel reader and writer for Brick-of-Values (BOV) datasets together with
//! the Cartesian domain-decomposition layer that drives them: extent
//! arithmetic, per-block ghosted I/O views, block lookup by index or by
//! physical point, and point-to-point ghost exchange.
//!
//! ## Features
//! - Inclusive integer extents with dimension-aware grow/shrink and
//!   cell/node conversion
//! - Block decompositions with balanced auto-factoring, ownership and
//!   bisection search over block bounds
//! - Ghosted, periodic-aware file/memory view pairs per block
//! - Non-blocking ghost transactions whose buffers stay borrowed until
//!   completion
//! - Pluggable communication backends (serial, in-process threads, MPI)
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! bov-io = "0.3"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```
//!
//! A reader opens the metadata collectively, then each rank reads its own
//! block:
//!
//! ```no_run
//! use bov_io::prelude::*;
//!
//! # fn main() -> Result<(), BovError> {
//! let mut reader = BovReader::new(NoComm);
//! reader.open("run/data.bov")?;
//! let decomp = reader.decomposition()?;
//! let desc = decomp.io_descriptor_by_id(0).expect("one block");
//! let image = reader.open_time_step(0)?;
//! let mut data = ImageData::default();
//! reader.fill_data_set_geometry(IoRegion::Ghosted(desc), &mut data)?;
//! reader.read_time_step(&image, IoRegion::Ghosted(desc), &mut data, &mut NoProgress)?;
//! reader.close_time_step(image);
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod bov_error;
pub mod debug_invariants;
pub mod decomp;
pub mod extent;
pub mod ghost;
pub mod io;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, NoComm, RayonComm, Wait};
    pub use crate::bov_error::BovError;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::decomp::{CartesianDataBlock, CartesianDataBlockIoDescriptor, CartesianDecomp};
    pub use crate::extent::{CartesianExtent, DimensionMode};
    pub use crate::ghost::{
        GhostRequests, GhostTransaction, SubarrayView, exchange_ghosts, plan_ghost_exchange,
    };
    pub use crate::io::{
        ArrayKind, BovIoConfig, BovMetaData, BovReader, BovWriter, DataSet, ImageData, IoRegion,
        NoProgress, ProgressSink, VectorProjection,
    };
}
