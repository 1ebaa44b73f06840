use bov_io::algs::communicator::Communicator;
use bov_io::extent::CartesianExtent;
use bov_io::io::{
    ArrayKind, BovIoConfig, BovMetaData, BovReader, BovWriter, DataSet, ImageData, IoRegion,
    NoProgress,
};
use serial_test::serial;

mod util;

fn ghosted_read(name: &str, periodic: [bool; 3]) -> Vec<(CartesianExtent, Vec<f32>)> {
    let dir = util::scratch_dir(name);
    let path = util::write_dataset(&dir, [10, 10, 10], &[("rho", ArrayKind::Scalar)], &[0, 1]);
    let config = BovIoConfig {
        n_ghost: 1,
        periodic,
        ..BovIoConfig::default()
    };

    util::run_ranks(3, |comm| {
        let rank = comm.rank();
        let mut reader = BovReader::with_config(comm, config.clone());
        reader.open(&path).unwrap();
        assert_eq!(reader.metadata().unwrap().time_steps(), &[0, 1]);

        let decomp = reader.decomposition().unwrap();
        assert_eq!(decomp.len(), 3);
        let block = decomp.local_blocks(rank).next().unwrap();
        let desc = decomp.io_descriptor(block.index()).unwrap();

        let image = reader.open_time_step(1).unwrap();
        let mut data = ImageData::default();
        reader
            .fill_data_set_geometry(IoRegion::Ghosted(desc), &mut data)
            .unwrap();
        reader
            .read_time_step(&image, IoRegion::Ghosted(desc), &mut data, &mut NoProgress)
            .unwrap();
        reader.close_time_step(image);
        reader.close();

        let rho = data.point_data().array("rho").unwrap();
        (data.extent, rho.values().to_vec())
    })
}

#[test]
#[serial]
fn ghosted_blocks_read_their_neighbours() {
    for (mem, values) in ghosted_read("e2e-ghosted", [false; 3]) {
        let file = CartesianExtent::from_dims(10, 10, 10);
        assert!(file.contains(&mem));
        assert_eq!(values, util::ramp(&mem, 0), "memory extent {mem}");
    }
}

#[test]
#[serial]
fn periodic_ghosts_wrap_around() {
    let results = ghosted_read("e2e-periodic", [true, false, false]);
    let (mut saw_low_ghost, mut saw_high_ghost) = (false, false);
    for (mem, values) in results {
        // the low ghost layer holds x = 9, the high one x = 0
        for (ghost, source) in [(-1, 9), (10, 0)] {
            if ghost < mem.lo(0) || ghost > mem.hi(0) {
                continue;
            }
            saw_low_ghost |= ghost == -1;
            saw_high_ghost |= ghost == 10;
            for k in mem.lo(2)..=mem.hi(2) {
                for j in mem.lo(1)..=mem.hi(1) {
                    let got = values[util::index_in(&mem, ghost, j, k)];
                    assert_eq!(got, util::point_value(source, j, k, 0), "ghost x = {ghost}");
                }
            }
        }
    }
    assert!(saw_low_ghost);
    assert!(saw_high_ghost);
}

/// Symmetric tensor tuples built from six independent ramps.
fn stensor_tuples(ext: &CartesianExtent) -> Vec<f32> {
    let c: Vec<Vec<f32>> = (0..6).map(|q| util::ramp(ext, q)).collect();
    (0..ext.size())
        .flat_map(|i| {
            [
                c[0][i], c[1][i], c[2][i], //
                c[1][i], c[3][i], c[4][i], //
                c[2][i], c[4][i], c[5][i],
            ]
        })
        .collect()
}

#[test]
#[serial]
fn symmetric_tensor_write_then_read_is_exact() {
    let dir = util::scratch_dir("e2e-stensor");
    let path = dir.join("out.bov");
    let file = CartesianExtent::from_dims(6, 4, 3);
    let mut md = BovMetaData::new([6, 4, 3]).unwrap();
    md.add_array("s", ArrayKind::SymmetricTensor).unwrap();

    let results = util::run_ranks(2, |comm| {
        let rank = comm.rank();
        let mut writer = BovWriter::new(comm.clone());
        writer.open(&path, md.clone()).unwrap();
        let image = writer.open_time_step(3).unwrap();

        let region = file.split(0, 2, rank).unwrap();
        let mut data = ImageData::default();
        data.set_extent(region);
        data.point_data_mut()
            .add_array("s", 9, region.size())
            .values_mut()
            .copy_from_slice(&stensor_tuples(&region));
        let mut seen = Vec::new();
        let mut progress = |f: f64| seen.push(f);
        writer
            .write_time_step(&image, IoRegion::Flat(region), &data, &mut progress)
            .unwrap();
        assert_eq!(seen.len(), 2);
        writer.close_time_step(image);
        writer.close();
        comm.barrier();

        let mut reader = BovReader::new(comm);
        reader.open(&path).unwrap();
        let image = reader.open_time_step(3).unwrap();
        let mut back = ImageData::default();
        reader
            .read_time_step(&image, IoRegion::Flat(file), &mut back, &mut NoProgress)
            .unwrap();
        let s = back.point_data().array("s").unwrap();
        s.values().iter().map(|v| v.to_bits()).collect::<Vec<u32>>()
    });

    let want: Vec<u32> = stensor_tuples(&file).iter().map(|v| v.to_bits()).collect();
    for bits in results {
        assert_eq!(bits, want);
    }
}
