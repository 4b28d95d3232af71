mod common;

use std::num::NonZeroUsize;

use common::{assert_stats_close, brute_force_totals, random_int_field, small_catalog};
use corr3::{
    Catalog, EngineParams, Estimator, FieldTriple, JackknifeResult, Lattice, MeanRadii, Offset,
    RadiusBin, SerialExecutor, StatTuple, ThreadPoolExecutor, TriangleSet, correlate,
    correlate_auto,
};

fn params(nres: usize, sample_fraction: f64, jackknife_groups: usize, seed: u64) -> EngineParams {
    EngineParams {
        lattice: Lattice::new(nres).unwrap(),
        sample_fraction,
        jackknife_groups,
        seed,
    }
}

fn threaded(n_threads: usize) -> ThreadPoolExecutor {
    ThreadPoolExecutor::new(NonZeroUsize::new(n_threads).unwrap()).unwrap()
}

#[test]
fn unit_cube_scenario() {
    let radii = MeanRadii {
        r1: 1.0,
        r2: 1.0,
        r3: std::f64::consts::SQRT_2,
    };
    let set = TriangleSet::new(Offset::new(1, 0, 0), vec![Offset::new(0, 1, 0)]);
    let catalog = Catalog::new(vec![RadiusBin::new(0.5, 1.5, radii, vec![set])]);
    let field = vec![1.0_f32; 8];

    let result =
        correlate_auto(&mut SerialExecutor, &field, &catalog, &params(2, 1.0, 1, 0)).unwrap();
    let total = result.total(0);
    assert_eq!(total.ddd, 8.0);
    assert_eq!(total.rrr, 8.0);
    assert_eq!(Estimator::Plain.evaluate(total), 0.0);
    // the only group holds everything, so leaving it out leaves nothing
    assert_eq!(*result.leave_one_out(0, 0), StatTuple::ZERO);
}

#[test]
fn matches_brute_force() {
    let lattice = Lattice::new(5).unwrap();
    let catalog = small_catalog(1.0);
    let field = random_int_field(&lattice, 12, -3, 6);

    let expected = brute_force_totals(&field, &field, &field, &lattice, &catalog);
    let result =
        correlate_auto(&mut SerialExecutor, &field, &catalog, &params(5, 1.0, 4, 0)).unwrap();
    assert_eq!(result.totals(), expected.as_slice());
}

#[test]
fn cross_correlation_matches_brute_force() {
    let lattice = Lattice::new(4).unwrap();
    let catalog = small_catalog(1.0);
    let first = random_int_field(&lattice, 1, 0, 5);
    let second = random_int_field(&lattice, 2, -4, 4);
    let third = random_int_field(&lattice, 3, 1, 3);

    let expected = brute_force_totals(&first, &second, &third, &lattice, &catalog);
    let fields = FieldTriple::new(&first, &second, &third, lattice).unwrap();
    let result = correlate(&mut threaded(3), fields, &catalog, &params(4, 1.0, 2, 0)).unwrap();
    assert_eq!(result.totals(), expected.as_slice());
}

#[test]
fn serial_and_threaded_agree() {
    let lattice = Lattice::new(6).unwrap();
    let catalog = small_catalog(1.0);
    let field = random_int_field(&lattice, 7, -5, 10);

    for sample_fraction in [1.0, 0.3] {
        let p = params(6, sample_fraction, 5, 2024);
        let reference = correlate_auto(&mut SerialExecutor, &field, &catalog, &p).unwrap();
        for n_threads in [1, 2, 3, 8] {
            let result = correlate_auto(&mut threaded(n_threads), &field, &catalog, &p).unwrap();
            assert_eq!(
                result, reference,
                "mismatch for {n_threads} threads with sample_fraction = {sample_fraction}"
            );
        }
    }
}

#[test]
fn sampled_runs_depend_on_seed() {
    let lattice = Lattice::new(6).unwrap();
    let catalog = small_catalog(1.0);
    let field = random_int_field(&lattice, 7, 1, 10);
    let full = correlate_auto(&mut SerialExecutor, &field, &catalog, &params(6, 1.0, 1, 0))
        .unwrap();

    let a = correlate_auto(&mut SerialExecutor, &field, &catalog, &params(6, 0.5, 1, 1)).unwrap();
    let b = correlate_auto(&mut SerialExecutor, &field, &catalog, &params(6, 0.5, 1, 1)).unwrap();
    let c = correlate_auto(&mut SerialExecutor, &field, &catalog, &params(6, 0.5, 1, 2)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    // each anchor contributes a fixed number of triangles per bin, so RRR is
    // proportional to the number of sampled anchors
    let triangles_per_anchor = [3.0, 2.0];
    for bin in 0..2 {
        let rrr = a.total(bin).rrr;
        let anchors = rrr / triangles_per_anchor[bin];
        assert_eq!(anchors.fract(), 0.0);
        assert!(anchors > 0.0 && anchors < 216.0);
        assert!(rrr < full.total(bin).rrr);
    }
}

/// sum the pre-transform group contributions back up (undoing the
/// leave-one-out transform): contrib_j = total - leave_one_out_j
fn summed_group_contribs(result: &JackknifeResult, bin: usize) -> StatTuple {
    let total = *result.total(bin);
    result
        .leave_one_out_for_bin(bin)
        .fold(StatTuple::ZERO, |acc, loo| acc + (total - *loo))
}

#[test]
fn jackknife_multiplicity() {
    // every triangle is attributed once to each distinct group among its
    // vertices
    let lattice = Lattice::new(4).unwrap();
    let catalog = small_catalog(1.0);
    let field = random_int_field(&lattice, 5, -2, 4);
    let n_groups = 4;
    let group_len = lattice.n_points() / n_groups;
    let n = lattice.resolution() as i64;

    let mut expected = vec![StatTuple::ZERO; catalog.n_bins()];
    for (bin_index, bin) in catalog.bins().iter().enumerate() {
        for idx in 0..lattice.n_points() {
            let [x, y, z] = lattice.reverse_map_idx(idx).map(|c| c as i64);
            let shifted = |offset: &Offset| {
                let [dx, dy, dz] = offset.value().map(|c| c as i64);
                lattice.map_idx(
                    (x + dx).rem_euclid(n) as usize,
                    (y + dy).rem_euclid(n) as usize,
                    (z + dz).rem_euclid(n) as usize,
                )
            };
            let d1 = field[idx] as f64;
            for set in bin.sets() {
                let idx2 = shifted(set.primary());
                let d2 = field[idx2] as f64;
                for secondary in set.secondaries() {
                    let idx3 = shifted(secondary);
                    let d3 = field[idx3] as f64;
                    let mut groups = vec![idx / group_len, idx2 / group_len, idx3 / group_len];
                    groups.sort();
                    groups.dedup();
                    let multiplicity = groups.len() as f64;
                    expected[bin_index] += StatTuple::new(
                        multiplicity * d1 * d2 * d3,
                        multiplicity * d1 * d2,
                        multiplicity * d1,
                        multiplicity,
                    );
                }
            }
        }
    }

    let result = correlate_auto(
        &mut SerialExecutor,
        &field,
        &catalog,
        &params(4, 1.0, n_groups, 0),
    )
    .unwrap();
    for (bin_index, expected_sum) in expected.iter().enumerate() {
        assert_stats_close(
            &summed_group_contribs(&result, bin_index),
            expected_sum,
            1e-12,
        );
    }
}

#[test]
fn single_group_reconstructs_total() {
    let lattice = Lattice::new(4).unwrap();
    let catalog = small_catalog(1.0);
    let field = random_int_field(&lattice, 9, 0, 7);
    let result =
        correlate_auto(&mut threaded(2), &field, &catalog, &params(4, 1.0, 1, 0)).unwrap();
    for bin in 0..catalog.n_bins() {
        assert_eq!(*result.leave_one_out(bin, 0), StatTuple::ZERO);
        assert_eq!(summed_group_contribs(&result, bin), *result.total(bin));
    }
}

#[test]
fn uneven_jackknife_groups() {
    // 27 sites in 4 groups: the trailing sites fold into the last group
    let lattice = Lattice::new(3).unwrap();
    let catalog = small_catalog(1.0);
    let field = random_int_field(&lattice, 3, 1, 5);
    let result =
        correlate_auto(&mut SerialExecutor, &field, &catalog, &params(3, 1.0, 4, 0)).unwrap();
    assert_eq!(result.n_groups(), 4);
    for bin in 0..catalog.n_bins() {
        let total = result.total(bin);
        for loo in result.leave_one_out_for_bin(bin) {
            assert!(loo.rrr < total.rrr);
            assert!(loo.rrr >= 0.0);
        }
    }
}

#[test]
fn constant_field() {
    let catalog = small_catalog(1.0);
    let field = vec![2.5_f32; 64];
    let result = correlate_auto(&mut threaded(4), &field, &catalog, &params(4, 1.0, 8, 0)).unwrap();
    assert!(result.is_zero());
    assert_eq!(result.n_bins(), 2);
    assert_eq!(result.n_groups(), 8);
}

#[test]
fn empty_catalog() {
    let lattice = Lattice::new(3).unwrap();
    let field = random_int_field(&lattice, 3, 1, 5);
    let result = correlate_auto(
        &mut SerialExecutor,
        &field,
        &Catalog::default(),
        &params(3, 1.0, 2, 0),
    )
    .unwrap();
    assert_eq!(result.n_bins(), 0);
}
