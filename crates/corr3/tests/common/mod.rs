// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

#![allow(dead_code)] // not every test file uses every helper

use std::path::Path;

use corr3::{Catalog, Lattice, Offset, StatTuple, TriangleSet, bin_from_sets};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

pub fn assert_stats_close(actual: &StatTuple, expected: &StatTuple, rtol: f64) {
    let pairs = [
        ("ddd", actual.ddd, expected.ddd),
        ("ddr", actual.ddr, expected.ddr),
        ("drr", actual.drr, expected.drr),
        ("rrr", actual.rrr, expected.rrr),
    ];
    for (name, a, e) in pairs {
        assert!(
            isclose(a, e, rtol, 0.0),
            "{name} mismatch: actual = {a}, expected = {e}"
        );
    }
}

/// a field with random integer values in `[lo, hi)`. Integer values keep
/// every partial sum exact, which makes the results independent of the
/// summation order
pub fn random_int_field(lattice: &Lattice, seed: u64, lo: i32, hi: i32) -> Vec<f32> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let dist = Uniform::try_from(lo..hi).unwrap();
    (0..lattice.n_points())
        .map(|_| dist.sample(&mut rng) as f32)
        .collect()
}

/// a catalog with 2 bins, including offsets that are negative and that
/// exceed the lattice resolution
pub fn small_catalog(cell_size: f64) -> Catalog {
    let bin0 = bin_from_sets(
        0.5,
        1.5,
        vec![
            TriangleSet::new(
                Offset::new(1, 0, 0),
                vec![Offset::new(0, 1, 0), Offset::new(0, 0, -1)],
            ),
            TriangleSet::new(Offset::new(0, -1, 0), vec![Offset::new(0, 0, 1)]),
        ],
        cell_size,
    );
    let bin1 = bin_from_sets(
        1.5,
        2.5,
        vec![
            TriangleSet::new(
                Offset::new(2, 0, 0),
                vec![Offset::new(0, 2, 0), Offset::new(1, 1, -5)],
            ),
            TriangleSet::new(Offset::new(-2, 1, 0), vec![]),
        ],
        cell_size,
    );
    Catalog::new(vec![bin0, bin1])
}

/// the statistics of every bin, computed by directly enumerating every
/// triangle anchored at every lattice site
pub fn brute_force_totals(
    first: &[f32],
    second: &[f32],
    third: &[f32],
    lattice: &Lattice,
    catalog: &Catalog,
) -> Vec<StatTuple> {
    let n = lattice.resolution() as i64;
    let site_of = |x: i64, y: i64, z: i64| {
        let wrap = |c: i64| c.rem_euclid(n) as usize;
        lattice.map_idx(wrap(x), wrap(y), wrap(z))
    };

    let mut totals = vec![StatTuple::ZERO; catalog.n_bins()];
    for (total, bin) in totals.iter_mut().zip(catalog.bins()) {
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let d1 = first[site_of(x, y, z)] as f64;
                    for set in bin.sets() {
                        let [px, py, pz] = set.primary().value().map(|c| c as i64);
                        let d2 = second[site_of(x + px, y + py, z + pz)] as f64;
                        for secondary in set.secondaries() {
                            let [sx, sy, sz] = secondary.value().map(|c| c as i64);
                            let d3 = third[site_of(x + sx, y + sy, z + sz)] as f64;
                            *total += StatTuple::new(d1 * d2 * d3, d1 * d2, d1, 1.0);
                        }
                    }
                }
            }
        }
    }
    totals
}

pub fn write_f32_field(path: &Path, field: &[f32]) {
    let bytes: Vec<u8> = field.iter().flat_map(|v| v.to_ne_bytes()).collect();
    std::fs::write(path, bytes).unwrap();
}

pub fn write_f64_field(path: &Path, field: &[f64]) {
    let bytes: Vec<u8> = field.iter().flat_map(|v| v.to_ne_bytes()).collect();
    std::fs::write(path, bytes).unwrap();
}
