//! Point-to-point ghost-fill obligations between two ranks.
//!
//! A [`GhostTransaction`] only names *which* index range moves from which
//! rank to which rank. Buffers are supplied at execution time through a
//! [`GhostRequests`] batch, which mutably borrows the rank-local array until
//! [`GhostRequests::wait_all`] consumes it, so the array cannot be touched
//! while requests on it are outstanding.
//!
//! Every rank walks the same global transaction list; a transaction only
//! produces traffic on its two endpoints.

use crate::algs::communicator::{Communicator, Wait};
use crate::algs::wire::{cast_slice, expect_exact_len, pod_vec_from_bytes};
use crate::bov_error::BovError;
use crate::extent::{CartesianExtent, DimensionMode};
use crate::ghost::subarray::SubarrayView;
use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::mem::size_of;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostTransaction {
    id: usize,
    src_rank: usize,
    src_ext: CartesianExtent,
    dst_rank: usize,
    dst_ext: CartesianExtent,
    int_ext: CartesianExtent,
}

impl GhostTransaction {
    /// `src_ext`/`dst_ext` are the extents of the full local buffers on each
    /// side; `int_ext` is the region that moves.
    pub fn new(
        id: usize,
        src_rank: usize,
        src_ext: CartesianExtent,
        dst_rank: usize,
        dst_ext: CartesianExtent,
        int_ext: CartesianExtent,
    ) -> Self {
        Self {
            id,
            src_rank,
            src_ext,
            dst_rank,
            dst_ext,
            int_ext,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn src_rank(&self) -> usize {
        self.src_rank
    }

    pub fn src_extent(&self) -> &CartesianExtent {
        &self.src_ext
    }

    pub fn dst_rank(&self) -> usize {
        self.dst_rank
    }

    pub fn dst_extent(&self) -> &CartesianExtent {
        &self.dst_ext
    }

    pub fn int_extent(&self) -> &CartesianExtent {
        &self.int_ext
    }

    /// View of the intersection inside a buffer laid out over `buffer_ext`,
    /// both moved to zero-based coordinates first.
    fn local_view(
        &self,
        buffer_ext: &CartesianExtent,
        point_data: bool,
        mode: DimensionMode,
    ) -> Result<SubarrayView, BovError> {
        let [x0, y0, z0] = buffer_ext.origin();
        let mut buf = *buffer_ext;
        buf.shift_by([-x0, -y0, -z0]);
        let mut int = self.int_ext;
        int.shift_by([-x0, -y0, -z0]);
        if point_data {
            buf.cell_to_node(mode);
            int.cell_to_node(mode);
        }
        SubarrayView::of_extent(&buf, &int)
    }

    /// Issue this rank's half of the transaction into `requests`.
    ///
    /// Sends are packed immediately; receives land in the batch's buffer when
    /// the batch is waited. Ranks that are neither endpoint do nothing.
    pub fn execute<C, T>(
        &self,
        requests: &mut GhostRequests<'_, C, T>,
        point_data: bool,
        mode: DimensionMode,
        tag: u16,
    ) -> Result<(), BovError>
    where
        C: Communicator,
        T: Pod,
    {
        let comm = requests.comm;
        if comm.is_no_comm() {
            return Err(BovError::SerialCommunicator);
        }
        let rank = comm.rank();

        // validate both halves before anything is posted
        let packed = if rank == self.src_rank {
            let view = self.local_view(&self.src_ext, point_data, mode)?;
            Some(view.gather(&*requests.buffer)?)
        } else {
            None
        };
        let recv_view = if rank == self.dst_rank {
            let view = self.local_view(&self.dst_ext, point_data, mode)?;
            if view.buffer_len() != requests.buffer.len() {
                return Err(BovError::ViewSizeMismatch {
                    expected: view.buffer_len(),
                    actual: requests.buffer.len(),
                });
            }
            Some(view)
        } else {
            None
        };

        if let Some(packed) = packed {
            requests
                .sends
                .push(comm.isend(self.dst_rank, tag, cast_slice(&packed)));
        }
        if let Some(view) = recv_view {
            let mut scratch = vec![0u8; view.len() * size_of::<T>()];
            let handle = comm.irecv(self.src_rank, tag, &mut scratch);
            requests.recvs.push(PendingRecv {
                handle,
                view,
                transaction: self.id,
            });
        }
        Ok(())
    }
}

struct PendingRecv<H> {
    handle: H,
    view: SubarrayView,
    transaction: usize,
}

/// Outstanding requests of one ghost fill, bound to the rank-local buffer.
///
/// Dropping a batch without [`GhostRequests::wait_all`] still completes its
/// requests, discarding received data, so no message is left for a later
/// exchange on the same tag.
pub struct GhostRequests<'a, C: Communicator, T: Pod> {
    comm: &'a C,
    buffer: &'a mut [T],
    sends: Vec<C::SendHandle>,
    recvs: Vec<PendingRecv<C::RecvHandle>>,
}

impl<'a, C: Communicator, T: Pod> GhostRequests<'a, C, T> {
    pub fn new(comm: &'a C, buffer: &'a mut [T]) -> Self {
        Self {
            comm,
            buffer,
            sends: Vec::new(),
            recvs: Vec::new(),
        }
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.sends.len() + self.recvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Complete every request, unpack received regions into the buffer and
    /// release it. Returns the number of completed requests.
    ///
    /// Every request is completed even after a failure; the first failure is
    /// returned once all of them are done.
    pub fn wait_all(mut self) -> Result<usize, BovError> {
        let n = self.len();
        for s in std::mem::take(&mut self.sends) {
            let _ = s.wait();
        }
        let mut first_err = None;
        for pending in std::mem::take(&mut self.recvs) {
            let transaction = pending.transaction;
            let bytes = pending.handle.wait();
            if let Err(e) = unpack(bytes, &pending.view, &mut *self.buffer) {
                log::warn!("ghost transaction {transaction} failed: {e}");
                if first_err.is_none() {
                    first_err = Some(match e {
                        BovError::Communication(msg) => BovError::Communication(format!(
                            "ghost transaction {transaction}: {msg}"
                        )),
                        other => other,
                    });
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(n),
        }
    }
}

impl<C: Communicator, T: Pod> Drop for GhostRequests<'_, C, T> {
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }
        log::debug!("draining {} unwaited ghost requests", self.len());
        for s in self.sends.drain(..) {
            let _ = s.wait();
        }
        for pending in self.recvs.drain(..) {
            let _ = pending.handle.wait();
        }
    }
}

/// Check one received payload and scatter it into `buffer`.
fn unpack<T: Pod>(
    bytes: Option<Vec<u8>>,
    view: &SubarrayView,
    buffer: &mut [T],
) -> Result<(), BovError> {
    let bytes = bytes.ok_or_else(|| BovError::Communication("no data delivered".into()))?;
    expect_exact_len(bytes.len(), view.len() * size_of::<T>()).map_err(BovError::Communication)?;
    let data: Vec<T> = pod_vec_from_bytes(&bytes).map_err(BovError::Communication)?;
    view.scatter(&data, buffer)
}
