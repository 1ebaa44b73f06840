//! Reader/writer configuration.

use crate::extent::CartesianExtent;
use serde::{Deserialize, Serialize};

/// Vector component that is skipped on read and zero-filled in memory.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorProjection {
    #[default]
    None,
    ExcludeX,
    ExcludeY,
    ExcludeZ,
}

impl VectorProjection {
    /// Index of the excluded vector component, if any.
    pub fn excluded_component(self) -> Option<usize> {
        match self {
            VectorProjection::None => None,
            VectorProjection::ExcludeX => Some(0),
            VectorProjection::ExcludeY => Some(1),
            VectorProjection::ExcludeZ => Some(2),
        }
    }
}

/// Options shared by [`BovReader`](crate::io::reader::BovReader),
/// [`BovWriter`](crate::io::writer::BovWriter) and
/// [`CartesianDecomp::from_config`](crate::decomp::CartesianDecomp::from_config).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BovIoConfig {
    /// Ghost layers added around every block.
    pub n_ghost: i32,
    /// Per-axis periodic boundary flags.
    pub periodic: [bool; 3],
    /// Synchronize ranks after each flat-region array.
    pub collective_io: bool,
    /// Vector component left out of reads.
    pub vector_projection: VectorProjection,
    /// Explicit block counts; all entries `< 1` auto-factors over the ranks.
    pub decomp_dims: [i32; 3],
    /// Sub-extent of the file to partition, `None` for the whole file.
    pub decomp_extent: Option<CartesianExtent>,
}

impl Default for BovIoConfig {
    fn default() -> Self {
        Self {
            n_ghost: 0,
            periodic: [false; 3],
            collective_io: true,
            vector_projection: VectorProjection::None,
            decomp_dims: [0; 3],
            decomp_extent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: BovIoConfig =
            serde_json::from_str(r#"{ "n_ghost": 2, "periodic": [true, false, false] }"#).unwrap();
        assert_eq!(cfg.n_ghost, 2);
        assert_eq!(cfg.periodic, [true, false, false]);
        assert!(cfg.collective_io);
        assert_eq!(cfg.vector_projection, VectorProjection::None);
        assert_eq!(cfg.decomp_extent, None);
    }

    #[test]
    fn projection_component() {
        assert_eq!(VectorProjection::ExcludeY.excluded_component(), Some(1));
        assert_eq!(VectorProjection::None.excluded_component(), None);
    }
}
