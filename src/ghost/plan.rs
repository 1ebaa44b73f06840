//! Ghost-exchange planning for one-block-per-rank decompositions.

use crate::algs::communicator::Communicator;
use crate::bov_error::BovError;
use crate::decomp::CartesianDecomp;
use crate::extent::{CartesianExtent, DimensionMode};
use crate::ghost::transaction::{GhostRequests, GhostTransaction};
use bytemuck::Pod;
use std::collections::HashSet;

/// Global transaction list filling every block's ghost layer from its
/// neighbours' owned indices.
///
/// The list is identical on every rank. Only overlaps inside the file extent
/// are planned; periodic images are left to the descriptor read path.
pub fn plan_ghost_exchange(decomp: &CartesianDecomp) -> Result<Vec<GhostTransaction>, BovError> {
    let blocks = decomp.blocks();
    let mut owners = HashSet::with_capacity(blocks.len());
    for b in blocks {
        if !owners.insert(b.owner()) {
            return Err(BovError::InvalidDecomposition(format!(
                "rank {} owns more than one block",
                b.owner()
            )));
        }
    }

    let mem_extent = |id: usize| -> Result<CartesianExtent, BovError> {
        decomp
            .io_descriptor_by_id(id)
            .map(|d| *d.mem_extent())
            .ok_or_else(|| BovError::InvalidDecomposition(format!("no descriptor for block {id}")))
    };

    let mut plan = Vec::new();
    for dst in blocks {
        let dst_mem = mem_extent(dst.id())?;
        for src in blocks.iter().filter(|s| s.id() != dst.id()) {
            let int = CartesianExtent::intersection(src.extent(), &dst_mem);
            if int.is_empty() {
                continue;
            }
            plan.push(GhostTransaction::new(
                plan.len(),
                src.owner(),
                mem_extent(src.id())?,
                dst.owner(),
                dst_mem,
                int,
            ));
        }
    }
    log::debug!(
        "planned {} ghost transactions over {} blocks",
        plan.len(),
        blocks.len()
    );
    Ok(plan)
}

/// Run every transaction of `plan` against `buffer` and wait for completion.
///
/// Returns the number of requests this rank completed.
pub fn exchange_ghosts<C, T>(
    comm: &C,
    plan: &[GhostTransaction],
    buffer: &mut [T],
    point_data: bool,
    mode: DimensionMode,
    tag: u16,
) -> Result<usize, BovError>
where
    C: Communicator,
    T: Pod,
{
    let mut requests = GhostRequests::new(comm, buffer);
    for t in plan {
        t.execute(&mut requests, point_data, mode, tag)?;
    }
    requests.wait_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decomp(n: usize, n_ghost: i32) -> CartesianDecomp {
        let mut d =
            CartesianDecomp::uniform(CartesianExtent::from_dims(10, 10, 10), [0.0; 3], [1.0; 3])
                .unwrap();
        d.set_decomp_dims_3(n as i32, 1, 1).unwrap();
        d.set_n_ranks(n).unwrap();
        d.set_n_ghost(n_ghost).unwrap();
        d
    }

    #[test]
    fn slabs_exchange_with_neighbours_only() {
        let plan = plan_ghost_exchange(&decomp(3, 1)).unwrap();
        let pairs: Vec<_> = plan.iter().map(|t| (t.dst_rank(), t.src_rank())).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 0), (1, 2), (2, 1)]);
        for (i, t) in plan.iter().enumerate() {
            assert_eq!(t.id(), i);
            assert_eq!(t.int_extent().width(0), 1);
            assert_eq!(t.int_extent().width(1), 10);
        }
        // block 0 spans x 0..=3, so its right ghost column is x = 4
        assert_eq!(plan[0].int_extent().lo(0), 4);
    }

    #[test]
    fn no_ghosts_means_no_traffic() {
        assert!(plan_ghost_exchange(&decomp(3, 0)).unwrap().is_empty());
    }

    #[test]
    fn shared_owner_is_rejected() {
        let mut d = decomp(4, 1);
        d.set_n_ranks(2).unwrap();
        assert!(matches!(
            plan_ghost_exchange(&d),
            Err(BovError::InvalidDecomposition(_))
        ));
    }
}
