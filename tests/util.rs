#![allow(dead_code)]
use bov_io::algs::communicator::RayonComm;
use bov_io::algs::wire::cast_slice;
use bov_io::extent::CartesianExtent;
use bov_io::io::{ArrayKind, BovMetaData};
use std::path::{Path, PathBuf};

/// Fresh, empty directory private to this test process.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("bov-io-tests")
        .join(format!("{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Run `f` once per rank of an `n`-rank in-process world, one thread each.
pub fn run_ranks<R, F>(n: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(RayonComm) -> R + Sync,
{
    let world = RayonComm::world(n);
    std::thread::scope(|s| {
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Distinct, exactly representable value for component `c` at `(i, j, k)`.
pub fn point_value(i: i32, j: i32, k: i32, c: usize) -> f32 {
    (c as i32 * 1_000_000 + i + 100 * j + 10_000 * k) as f32
}

/// Values of component `c` over `ext`, x fastest.
pub fn ramp(ext: &CartesianExtent, c: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(ext.size());
    for k in ext.lo(2)..=ext.hi(2) {
        for j in ext.lo(1)..=ext.hi(1) {
            for i in ext.lo(0)..=ext.hi(0) {
                out.push(point_value(i, j, k, c));
            }
        }
    }
    out
}

/// Write metadata plus `point_value` bricks for every component of every
/// array and step. Returns the metadata path.
pub fn write_dataset(
    dir: &Path,
    dims: [usize; 3],
    arrays: &[(&str, ArrayKind)],
    steps: &[i64],
) -> PathBuf {
    let mut md = BovMetaData::new(dims).unwrap();
    md.set_spacing([0.5, 0.5, 0.5]);
    for &(name, kind) in arrays {
        md.add_array(name, kind).unwrap();
    }
    let path = dir.join("data.bov");
    md.write_metadata(&path).unwrap();
    let ext = CartesianExtent::from_dims(dims[0], dims[1], dims[2]);
    for &step in steps {
        for info in md.arrays() {
            for (c, comp) in info.component_names().iter().enumerate() {
                let values = ramp(&ext, c);
                std::fs::write(md.brick_path(comp, step), cast_slice(&values)).unwrap();
            }
        }
    }
    path
}

/// Flat index of `(i, j, k)` inside `ext`.
pub fn index_in(ext: &CartesianExtent, i: i32, j: i32, k: i32) -> usize {
    ext.flat_index([i, j, k]).unwrap()
}
