use bov_io::algs::communicator::{
    CommTag, Communicator, NoComm, RayonComm, Wait, broadcast_bytes,
};
use bov_io::bov_error::BovError;

mod util;

#[test]
fn rayon_round_trip() {
    let tag = CommTag(0x1000);
    let world = RayonComm::world(2);
    let (c0, c1) = (&world[0], &world[1]);

    let msg = b"hello";
    let _s = c0.isend(1, tag.base(), msg);

    let mut buf = [0u8; 5];
    let h = c1.irecv(0, tag.base(), &mut buf);
    let got = h.wait().unwrap();
    assert_eq!(&got, msg);
}

#[test]
fn rayon_fifo_order() {
    let tag = CommTag(0x1001);
    let world = RayonComm::world(2);

    for i in 0..10u8 {
        let _ = world[0].isend(1, tag.base(), &[i]);
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let mut b = [0u8; 1];
        let h = world[1].irecv(0, tag.base(), &mut b);
        out.push(h.wait().unwrap()[0]);
    }
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
fn truncation_is_ok() {
    let tag = CommTag(0x1002);
    let world = RayonComm::world(2);

    let _ = world[0].isend(1, tag.base(), &[1, 2, 3, 4, 5, 6]);
    let mut b = [0u8; 4];
    let h = world[1].irecv(0, tag.base(), &mut b);
    let got = h.wait().unwrap();
    assert_eq!(got, vec![1, 2, 3, 4]);
}

#[test]
fn tags_do_not_mix() {
    let world = RayonComm::world(2);
    let a = CommTag(0x2000);
    let _ = world[0].isend(1, a.offset(1), &[9]);
    let _ = world[0].isend(1, a.base(), &[7]);
    assert_eq!(world[1].irecv(0, a.base(), &mut [0u8; 1]).wait(), Some(vec![7]));
    assert_eq!(world[1].irecv(0, a.offset(1), &mut [0u8; 1]).wait(), Some(vec![9]));
}

#[test]
fn no_comm_moves_nothing() {
    let c = NoComm;
    assert!(c.is_no_comm());
    assert_eq!((c.rank(), c.size()), (0, 1));
    assert_eq!(c.irecv(0, 1, &mut [0u8; 4]).wait(), None);
    c.barrier();
}

#[test]
fn empty_broadcast_reaches_every_rank() {
    let got = util::run_ranks(3, |comm| {
        let mine: &[u8] = if comm.rank() == 0 { b"" } else { b"ignored" };
        let out = broadcast_bytes(&comm, 0, mine).unwrap();
        comm.barrier();
        out
    });
    assert!(got.iter().all(Vec::is_empty));
}

#[test]
fn broadcast_root_out_of_range() {
    let world = RayonComm::world(2);
    assert!(matches!(
        broadcast_bytes(&world[0], 2, b"x"),
        Err(BovError::Communication(_))
    ));
}

#[test]
fn repeated_barriers_keep_ranks_in_step() {
    let rounds = util::run_ranks(4, |comm| {
        let mut seen = 0;
        for round in 0..5u8 {
            comm.barrier();
            let peer = (comm.rank() + 1) % comm.size();
            let from = (comm.rank() + comm.size() - 1) % comm.size();
            let _ = comm.isend(peer, 0x3000, &[round]);
            let got = comm.irecv(from, 0x3000, &mut [0u8; 1]).wait().unwrap();
            assert_eq!(got, vec![round]);
            seen += 1;
        }
        seen
    });
    assert_eq!(rounds, vec![5; 4]);
}
