//! Cartesian domain decomposition and per-block I/O views.

pub mod block;
pub mod cartesian_decomp;
pub mod factor;
pub mod io_descriptor;

pub use block::CartesianDataBlock;
pub use cartesian_decomp::{BlockLattice, CartesianDecomp, DecompGeometry};
pub use factor::balanced_dims;
pub use io_descriptor::{
    CartesianDataBlockIoDescriptor, CartesianDataBlockIoDescriptorIter, ViewPair,
};
