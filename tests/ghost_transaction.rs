use bov_io::algs::communicator::Communicator;
use bov_io::bov_error::BovError;
use bov_io::decomp::CartesianDecomp;
use bov_io::extent::{CartesianExtent, DimensionMode};
use bov_io::ghost::{GhostRequests, GhostTransaction, exchange_ghosts, plan_ghost_exchange};
use serial_test::serial;

mod util;

fn slab_decomp(n_ranks: usize, n_ghost: i32) -> CartesianDecomp {
    let mut d =
        CartesianDecomp::uniform(CartesianExtent::from_dims(10, 10, 10), [0.0; 3], [1.0; 3])
            .unwrap();
    d.set_n_ranks(n_ranks).unwrap();
    d.set_decomp_dims(n_ranks).unwrap();
    d.set_n_ghost(n_ghost).unwrap();
    d
}

#[test]
#[serial]
fn planned_exchange_fills_every_ghost() {
    let decomp = slab_decomp(3, 1);
    let plan = plan_ghost_exchange(&decomp).unwrap();
    let mode = DimensionMode::of(decomp.file_extent(), 1);

    let results = util::run_ranks(3, |comm| {
        let block = decomp.local_blocks(comm.rank()).next().unwrap();
        let desc = decomp.io_descriptor(block.index()).unwrap();
        let mem = *desc.mem_extent();
        let owned = block.extent();

        let mut buf = vec![-1.0f32; mem.size()];
        for k in owned.lo(2)..=owned.hi(2) {
            for j in owned.lo(1)..=owned.hi(1) {
                for i in owned.lo(0)..=owned.hi(0) {
                    buf[util::index_in(&mem, i, j, k)] = util::point_value(i, j, k, 0);
                }
            }
        }
        let n = exchange_ghosts(&comm, &plan, &mut buf, false, mode, 40).unwrap();
        (mem, buf, n)
    });

    for (mem, buf, n) in results {
        assert!(n > 0);
        assert_eq!(buf, util::ramp(&mem, 0), "rank with memory {mem}");
    }
}

#[test]
#[serial]
fn point_data_moves_node_columns() {
    // cell extents; node buffers carry one more index on each active axis
    let src_ext = CartesianExtent::new([0, 3, 0, 3, 0, 0]);
    let dst_ext = CartesianExtent::new([3, 6, 0, 3, 0, 0]);
    let int_ext = CartesianExtent::new([3, 3, 0, 3, 0, 0]);
    let mode = DimensionMode::Xy;
    let t = GhostTransaction::new(0, 0, src_ext, 1, dst_ext, int_ext);

    let results = util::run_ranks(2, |comm| {
        let mut buf: Vec<f32> = if comm.rank() == 0 {
            (0..25).map(|v| v as f32).collect()
        } else {
            vec![-1.0; 25]
        };
        let mut req = GhostRequests::new(&comm, &mut buf);
        t.execute(&mut req, true, mode, 3).unwrap();
        assert_eq!(req.len(), 1);
        req.wait_all().unwrap();
        buf
    });

    let dst = &results[1];
    for j in 0..5 {
        for i in 0..5 {
            let got = dst[i + 5 * j];
            if i < 2 {
                // node x = 3 + i on the source is local column 3 + i
                assert_eq!(got, (3 + i + 5 * j) as f32);
            } else {
                assert_eq!(got, -1.0);
            }
        }
    }
    assert_eq!(results[0], (0..25).map(|v| v as f32).collect::<Vec<_>>());
}

#[test]
#[serial]
fn both_endpoints_agree_on_message_size() {
    let decomp = slab_decomp(4, 2);
    let plan = plan_ghost_exchange(&decomp).unwrap();
    let mode = DimensionMode::of(decomp.file_extent(), 2);
    for t in &plan {
        assert_eq!(
            CartesianExtent::intersection(t.int_extent(), t.src_extent()),
            *t.int_extent()
        );
        assert_eq!(
            CartesianExtent::intersection(t.int_extent(), t.dst_extent()),
            *t.int_extent()
        );
    }
    let counts = util::run_ranks(4, |comm| {
        let block = decomp.local_blocks(comm.rank()).next().unwrap();
        let mem = decomp.io_descriptor(block.index()).unwrap().mem_extent().size();
        let mut buf = vec![0.0f64; mem];
        exchange_ghosts(&comm, &plan, &mut buf, false, mode, 9).unwrap()
    });
    let sends_and_recvs: usize = counts.iter().sum();
    assert_eq!(sends_and_recvs, 2 * plan.len());
}

#[test]
fn serial_build_rejects_exchange() {
    let decomp = slab_decomp(1, 1);
    let t = GhostTransaction::new(
        0,
        0,
        *decomp.file_extent(),
        0,
        *decomp.file_extent(),
        *decomp.file_extent(),
    );
    let mut buf = vec![0.0f32; 1000];
    assert_eq!(
        exchange_ghosts(
            &bov_io::algs::communicator::NoComm,
            &[t],
            &mut buf,
            false,
            DimensionMode::Dim3,
            0
        ),
        Err(BovError::SerialCommunicator)
    );
}
