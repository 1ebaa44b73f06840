//! Ghost-zone exchange between ranks: strided views, transactions and the
//! planner that derives them from a decomposition.

pub mod plan;
pub mod subarray;
pub mod transaction;

pub use plan::{exchange_ghosts, plan_ghost_exchange};
pub use subarray::SubarrayView;
pub use transaction::{GhostRequests, GhostTransaction};
