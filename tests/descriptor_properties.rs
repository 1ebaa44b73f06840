use bov_io::decomp::{CartesianDataBlockIoDescriptor, CartesianDecomp};
use bov_io::extent::{CartesianExtent, DimensionMode};
use bov_io::DebugInvariants;
use proptest::prelude::*;

mod util;

/// Wrap `p` into `[lo, lo + n)`.
fn wrap(p: i32, lo: i32, n: i32) -> i32 {
    (p - lo).rem_euclid(n) + lo
}

/// Fill the memory extent of `d` through its view pairs from a file whose
/// value at every index is that index's flat offset.
fn gather_file_offsets(d: &CartesianDataBlockIoDescriptor) -> Vec<usize> {
    let file_ext = d.file_extent();
    let file: Vec<usize> = (0..file_ext.size()).collect();
    let mut mem = vec![usize::MAX; d.mem_extent().size()];
    for (fv, mv) in d {
        let packed = fv.gather(&file).unwrap();
        mv.scatter(&packed, &mut mem).unwrap();
    }
    mem
}

fn case() -> impl Strategy<Value = (CartesianExtent, CartesianExtent, [bool; 3], i32)> {
    (
        [1i32..9, 1i32..9, 1i32..9],
        any::<[bool; 3]>(),
        0i32..3,
        [0u32..100, 0u32..100, 0u32..100],
        [0u32..100, 0u32..100, 0u32..100],
    )
        .prop_map(|(n, periodic, n_ghost, a, b)| {
            let file = CartesianExtent::new([0, n[0] - 1, 0, n[1] - 1, 0, n[2] - 1]);
            let mut block = [0i32; 6];
            for q in 0..3 {
                let x = (a[q] as i32) % n[q];
                let y = (b[q] as i32) % n[q];
                block[2 * q] = x.min(y);
                block[2 * q + 1] = x.max(y);
            }
            (file, CartesianExtent::new(block), periodic, n_ghost)
        })
}

proptest! {
    #[test]
    fn views_cover_memory_once((file, block, periodic, n_ghost) in case()) {
        let d = CartesianDataBlockIoDescriptor::new(&block, &file, periodic, n_ghost).unwrap();
        prop_assert!(d.validate_invariants().is_ok());
        let total: usize = d.iter().map(|(f, m)| {
            assert_eq!(f.len(), m.len());
            m.len()
        }).sum();
        prop_assert_eq!(total, d.mem_extent().size());
        prop_assert!(d.mem_extent().contains(&block));
    }

    #[test]
    fn every_memory_index_reads_its_wrapped_file_index((file, block, periodic, n_ghost) in case()) {
        let d = CartesianDataBlockIoDescriptor::new(&block, &file, periodic, n_ghost).unwrap();
        let mem = gather_file_offsets(&d);
        let m = *d.mem_extent();
        let n = file.dims().map(|v| v as i32);
        for k in m.lo(2)..=m.hi(2) {
            for j in m.lo(1)..=m.hi(1) {
                for i in m.lo(0)..=m.hi(0) {
                    let w = [wrap(i, 0, n[0]), wrap(j, 0, n[1]), wrap(k, 0, n[2])];
                    let want = file.flat_index(w).unwrap();
                    prop_assert_eq!(mem[util::index_in(&m, i, j, k)], want);
                }
            }
        }
    }
}

#[test]
fn zero_ghosts_always_single_pair() {
    let file = CartesianExtent::from_dims(6, 5, 4);
    let block = CartesianExtent::new([1, 3, 0, 4, 2, 3]);
    for periodic in [[false; 3], [true; 3], [true, false, true]] {
        let d = CartesianDataBlockIoDescriptor::new(&block, &file, periodic, 0).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.mem_extent(), &block);
    }
}

#[test]
fn decomposition_descriptors_match_blocks() {
    let mut decomp =
        CartesianDecomp::uniform(CartesianExtent::from_dims(12, 9, 1), [0.0; 3], [1.0; 3]).unwrap();
    decomp.set_n_ghost(2).unwrap();
    decomp.set_periodic([true, false, false]).unwrap();
    decomp.set_decomp_dims(6).unwrap();
    assert_eq!(decomp.dims(), [3, 2, 1]);
    let mode = DimensionMode::of(decomp.file_extent(), 2);
    assert_eq!(mode, DimensionMode::Xy);
    for b in decomp.blocks() {
        let d = decomp.io_descriptor(b.index()).unwrap();
        assert_eq!(d.block_extent(), b.extent());
        // x always gets both ghost columns, y only away from the boundary
        assert_eq!(d.mem_extent().width(0), b.extent().width(0) + 4);
        assert_eq!(d.mem_extent().width(1), b.extent().width(1) + 2);
        assert_eq!(d.mem_extent().width(2), 1);
    }
}
