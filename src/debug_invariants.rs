//! Structural self-checks for the decomposition types.
//!
//! Two types carry invariants worth re-checking after construction:
//!
//! * [`CartesianDecomp`](crate::decomp::CartesianDecomp): its blocks tile the
//!   decomposition extent and per-axis bounds never decrease.
//! * [`CartesianDataBlockIoDescriptor`](crate::decomp::CartesianDataBlockIoDescriptor):
//!   its memory regions cover the ghosted memory extent exactly once and every
//!   file/memory view pair selects the same number of elements.
//!
//! Constructors run the check through [`debug_invariants!`](macro@crate::debug_invariants)
//! in debug builds, or in release builds with the `check-invariants` or
//! `strict-invariants` feature.

use crate::bov_error::BovError;

/// A type that can re-verify its own construction invariants.
pub trait DebugInvariants {
    /// Panic on a violated invariant when checking is compiled in.
    fn debug_assert_invariants(&self);
    /// Report the first violated invariant as a [`BovError`].
    fn validate_invariants(&self) -> Result<(), BovError>;
}

/// Panic with `[invariants] <context>: <error>` when `$expr` is an `Err` and
/// invariant checking is compiled in; otherwise expands to nothing.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
