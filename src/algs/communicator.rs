//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking: ghost exchange calls
//! `.wait()` before it trusts that a buffer is ready.
//!
//! Messages between the same `(source, destination, tag)` triple are
//! delivered in the order they were sent, and receives must be waited in the
//! order they were posted.

use crate::algs::wire::{WireLen, cast_slice, expect_exact_len, pod_vec_from_bytes};
use crate::bov_error::BovError;
use bytes::Bytes;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Message tag namespace; `base()` is the first tag, `offset(n)` the n-th.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    /// Tags at and above this value are reserved for internal collectives.
    pub const RESERVED: CommTag = CommTag(0xFF00);
    pub const BARRIER: CommTag = CommTag(0xFF00);
    pub const BROADCAST: CommTag = CommTag(0xFF10);

    pub fn base(self) -> u16 {
        self.0
    }

    pub fn offset(self, n: u16) -> u16 {
        self.0.wrapping_add(n)
    }
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator: 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of at most `buf.len()` bytes; the data is returned by
    /// `wait()` on the handle.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// True for the serial stand-in, which moves no data.
    fn is_no_comm(&self) -> bool {
        false
    }

    /// Block until every rank has entered the barrier.
    ///
    /// The default gathers an empty message on rank 0 and releases everyone.
    fn barrier(&self) {
        let size = self.size();
        if size <= 1 {
            return;
        }
        let tag = CommTag::BARRIER.base();
        if self.rank() == 0 {
            for peer in 1..size {
                let _ = self.irecv(peer, tag, &mut []).wait();
            }
            let sends: Vec<_> = (1..size).map(|peer| self.isend(peer, tag, &[])).collect();
            for s in sends {
                let _ = s.wait();
            }
        } else {
            let s = self.isend(0, tag, &[]);
            let _ = self.irecv(0, tag, &mut []).wait();
            let _ = s.wait();
        }
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Send `payload` from `root` to every rank, size-prefixed.
///
/// Only `root`'s `payload` is read; every rank returns the root's bytes. An
/// empty payload is delivered as an empty vector, which callers use to
/// signal a failure on the root.
pub fn broadcast_bytes<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    payload: &[u8],
) -> Result<Vec<u8>, BovError> {
    let size = comm.size();
    if root >= size {
        return Err(BovError::Communication(format!(
            "broadcast root {root} outside communicator of size {size}"
        )));
    }
    if size == 1 {
        return Ok(payload.to_vec());
    }
    let tag = CommTag::BROADCAST;
    if comm.rank() == root {
        let len = [WireLen::new(payload.len())];
        let mut sends = Vec::with_capacity(2 * (size - 1));
        for peer in (0..size).filter(|&p| p != root) {
            sends.push(comm.isend(peer, tag.base(), cast_slice(&len)));
            if !payload.is_empty() {
                sends.push(comm.isend(peer, tag.offset(1), payload));
            }
        }
        for s in sends {
            let _ = s.wait();
        }
        log::debug!("broadcast {} bytes from rank {root}", payload.len());
        return Ok(payload.to_vec());
    }

    let mut len_buf = [0u8; std::mem::size_of::<WireLen>()];
    let raw = comm
        .irecv(root, tag.base(), &mut len_buf)
        .wait()
        .ok_or_else(|| BovError::Communication("broadcast size never arrived".into()))?;
    expect_exact_len(raw.len(), len_buf.len()).map_err(BovError::Communication)?;
    let n = pod_vec_from_bytes::<WireLen>(&raw)
        .map_err(BovError::Communication)?[0]
        .get();
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut body = vec![0u8; n];
    let data = comm
        .irecv(root, tag.offset(1), &mut body)
        .wait()
        .ok_or_else(|| BovError::Communication("broadcast payload never arrived".into()))?;
    expect_exact_len(data.len(), n).map_err(BovError::Communication)?;
    Ok(data)
}

/// Compile-time no-op comm for pure serial unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn is_no_comm(&self) -> bool {
        true
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Debug, Default)]
struct Mailbox {
    slots: DashMap<Key, VecDeque<Bytes>>,
}

impl Mailbox {
    fn post(&self, key: Key, data: Bytes) {
        self.slots.entry(key).or_default().push_back(data);
    }

    fn take(&self, key: &Key) -> Option<Bytes> {
        self.slots.get_mut(key).and_then(|mut q| q.pop_front())
    }
}

pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            if let Some(bytes) = self.mailbox.take(&self.key) {
                let n = bytes.len().min(self.len);
                return Some(bytes[..n].to_vec());
            }
            std::thread::yield_now();
        }
    }
}

/// In-process ranks, one per thread, sharing a private mailbox.
#[derive(Clone, Debug)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl RayonComm {
    /// One communicator per rank of a fresh `size`-rank world.
    pub fn world(size: usize) -> Vec<RayonComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| RayonComm {
                rank,
                size,
                mailbox: mailbox.clone(),
            })
            .collect()
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        self.mailbox
            .post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            mailbox: self.mailbox.clone(),
            key: (peer, self.rank, tag),
            len: buf.len(),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{
        Communicator as _, CommunicatorCollectives as _, Destination as _, Source as _,
    };

    pub struct MpiComm {
        _universe: Universe,
        pub world: SimpleCommunicator,
        pub rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, BovError> {
            let universe = mpi::initialize().ok_or_else(|| {
                BovError::Communication("MPI is unavailable or already initialized".into())
            })?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                _universe: universe,
                world,
                rank,
                size,
            })
        }
    }

    /// Request over a heap buffer owned by the handle until completion.
    ///
    /// Dropping an unwaited handle completes the request before the buffer is
    /// freed, so an early error return never leaves MPI holding freed memory.
    pub struct MpiHandle {
        req: Option<Request<'static, [u8], StaticScope>>,
        buf: Option<*mut [u8]>,
        returns_data: bool,
    }

    impl MpiHandle {
        fn complete(&mut self) -> Option<Box<[u8]>> {
            if let Some(req) = self.req.take() {
                req.wait();
            }
            // SAFETY: `buf` came from `Box::into_raw` in `isend`/`irecv`, it is
            // taken at most once, and the only request borrowing it has
            // completed above.
            self.buf.take().map(|raw| unsafe { Box::from_raw(raw) })
        }
    }

    impl Wait for MpiHandle {
        fn wait(mut self) -> Option<Vec<u8>> {
            let owned = self.complete()?;
            self.returns_data.then(|| owned.into_vec())
        }
    }

    impl Drop for MpiHandle {
        fn drop(&mut self) {
            if self.req.is_some() {
                log::warn!("completing an MPI request dropped before wait");
            }
            drop(self.complete());
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let raw = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: the allocation stays alive until `MpiHandle::wait` frees it.
            let data: &'static [u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, data, tag as i32);
            MpiHandle {
                req: Some(req),
                buf: Some(raw),
                returns_data: false,
            }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let raw = Box::into_raw(vec![0u8; buf.len()].into_boxed_slice());
            // SAFETY: as in `isend`; no other reference to the allocation exists.
            let data: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, data, tag as i32);
            MpiHandle {
                req: Some(req),
                buf: Some(raw),
                returns_data: true,
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rayon_roundtrip_two_ranks() {
        let world = RayonComm::world(2);
        let (c0, c1) = (&world[0], &world[1]);

        let mut recv_buf = [0u8; 4];
        let recv_handle = c1.irecv(0, 7, &mut recv_buf);
        let send_handle = c0.isend(1, 7, &[1, 2, 3, 4]);
        send_handle.wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn worlds_are_isolated() {
        let a = RayonComm::world(2);
        let b = RayonComm::world(2);
        a[0].isend(1, 3, &[1]);
        b[0].isend(1, 3, &[2]);
        assert_eq!(b[1].irecv(0, 3, &mut [0u8; 1]).wait(), Some(vec![2]));
        assert_eq!(a[1].irecv(0, 3, &mut [0u8; 1]).wait(), Some(vec![1]));
    }

    #[test]
    fn no_comm_broadcast_is_identity() {
        let got = broadcast_bytes(&NoComm, 0, b"abc").unwrap();
        assert_eq!(got, b"abc");
        assert!(broadcast_bytes(&NoComm, 1, b"abc").is_err());
    }

    #[test]
    fn threaded_broadcast_and_barrier() {
        let world = RayonComm::world(4);
        let payload = b"metadata".to_vec();
        let results: Vec<Vec<u8>> = std::thread::scope(|s| {
            let handles: Vec<_> = world
                .iter()
                .map(|comm| {
                    let payload = &payload;
                    s.spawn(move || {
                        let mine: &[u8] = if comm.rank() == 2 { payload.as_slice() } else { &[] };
                        let got = broadcast_bytes(comm, 2, mine).unwrap();
                        comm.barrier();
                        got
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for r in results {
            assert_eq!(r, payload);
        }
    }

    #[cfg(feature = "mpi-support")]
    #[test]
    fn mpi_roundtrip() {
        let comm = MpiComm::new().expect("MPI initialization failed");
        let size = comm.size();
        let nbr = (comm.rank + 1) % size;
        let mut recv = [0u8; 1];
        let r = comm.irecv(nbr, 9, &mut recv);
        let s = comm.isend(nbr, 9, &[42]);
        s.wait();
        assert_eq!(r.wait(), Some(vec![42]));
    }
}
