//! Index-space value types: extents and their dimension mode.

pub mod cartesian_extent;
pub mod dimension_mode;

pub use cartesian_extent::CartesianExtent;
pub use dimension_mode::DimensionMode;
