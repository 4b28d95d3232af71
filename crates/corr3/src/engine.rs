//! Drives the correlation calculation over the full lattice.
//!
//! The lattice is decomposed into its `nres` x-planes, which are the units of
//! work handed to an [`Executor`]. When only a fraction of the lattice sites
//! are sampled, each plane draws from its own generator (seeded from the run
//! seed and the plane index). Consequently, the set of sampled sites only
//! depends on the seed, and never on the executor or the number of threads.
//!
//! # Reproducibility
//! Partial sums from different workers are combined in whatever order the
//! workers finish. Since floating-point addition isn't associative, results
//! from the multi-threaded executor may differ (in the last few bits) between
//! runs and from the serial executor. Integer-valued fields (where every
//! partial sum is exact) are the exception.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use corr3_nostd_internal::{
    Catalog, Executor, FieldTriple, JackknifePartition, JackknifeResult, Lattice, ReductionSpec,
    StatePack, TriangleWalk,
};
use rand::distr::{Bernoulli, Distribution};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;
use tracing::{debug, info, warn};

use crate::error::Error;

/// The parameters that determine the outcome of a correlation run.
///
/// These don't include the number of threads, which only affects how the
/// work is carried out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineParams {
    pub lattice: Lattice,
    /// the probability that a lattice site is used as an anchor. Must lie in
    /// `(0, 1]`
    pub sample_fraction: f64,
    pub jackknife_groups: usize,
    pub seed: u64,
}

/// the generator used for sampling the sites of a single x-plane
fn plane_rng(seed: u64, plane: usize) -> Xoshiro256PlusPlus {
    // seed_from_u64 scrambles its argument with SplitMix64
    Xoshiro256PlusPlus::seed_from_u64(seed ^ (plane as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// The reduction over every (sampled) site of the lattice, one x-plane per
/// unit of work
struct LatticeReduction<'a> {
    walk: TriangleWalk<'a>,
    // None when every site is used
    sampler: Option<Bernoulli>,
    seed: u64,
}

impl<'a> ReductionSpec for LatticeReduction<'a> {
    fn n_work_units(&self) -> usize {
        self.walk.lattice().resolution()
    }

    fn new_statepack(&self) -> StatePack {
        self.walk.new_statepack()
    }

    fn process_unit(&self, statepack: &mut StatePack, unit: usize) {
        let plane_len = self.walk.lattice().plane_len();
        let start = unit * plane_len;
        let stop = start + plane_len;
        match self.sampler {
            None => {
                for idx in start..stop {
                    self.walk.accumulate_point(statepack, idx);
                }
            }
            Some(ref sampler) => {
                let mut rng = plane_rng(self.seed, unit);
                for idx in start..stop {
                    if sampler.sample(&mut rng) {
                        self.walk.accumulate_point(statepack, idx);
                    }
                }
            }
        }
    }
}

fn check_statepack_shape(
    out: &StatePack,
    reduction_spec: &impl ReductionSpec,
) -> Result<(), &'static str> {
    if out.shape() != reduction_spec.new_statepack().shape() {
        Err("the out argument doesn't have the correct shape!")
    } else {
        Ok(())
    }
}

/// Processes every unit of work on the calling thread, in order.
///
/// This is primarily useful for producing reference results.
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn drive_reduce(
        &mut self,
        out: &mut StatePack,
        reduction_spec: &impl ReductionSpec,
    ) -> Result<(), &'static str> {
        check_statepack_shape(out, reduction_spec)?;
        let mut statepack = reduction_spec.new_statepack();
        for unit in 0..reduction_spec.n_work_units() {
            reduction_spec.process_unit(&mut statepack, unit);
        }
        out.merge(&statepack);
        Ok(())
    }
}

/// Processes the units of work with a fixed-size pool of worker threads.
///
/// Each worker repeatedly claims the next unprocessed unit, accumulating into
/// a private statepack. Once the units are exhausted, each worker merges its
/// statepack into the output (a single lock acquisition per worker).
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
    n_threads: NonZeroUsize,
}

impl ThreadPoolExecutor {
    pub fn new(n_threads: NonZeroUsize) -> Result<Self, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads.get())
            .thread_name(|i| format!("corr3-worker-{i}"))
            .build()
            .map_err(Error::thread_pool)?;
        Ok(ThreadPoolExecutor { pool, n_threads })
    }

    pub fn n_threads(&self) -> NonZeroUsize {
        self.n_threads
    }
}

impl Executor for ThreadPoolExecutor {
    fn drive_reduce(
        &mut self,
        out: &mut StatePack,
        reduction_spec: &impl ReductionSpec,
    ) -> Result<(), &'static str> {
        check_statepack_shape(out, reduction_spec)?;
        let n_units = reduction_spec.n_work_units();
        let next_unit = AtomicUsize::new(0);
        let shared = Mutex::new(out);

        self.pool.scope(|scope| {
            for _ in 0..self.n_threads.get() {
                scope.spawn(|_| {
                    let mut statepack = reduction_spec.new_statepack();
                    loop {
                        let unit = next_unit.fetch_add(1, Ordering::Relaxed);
                        if unit >= n_units {
                            break;
                        }
                        reduction_spec.process_unit(&mut statepack, unit);
                    }
                    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.merge(&statepack);
                });
            }
        });
        Ok(())
    }
}

fn is_flat(field: &[f32]) -> bool {
    let mut values = field.iter().copied();
    match values.next() {
        None => true,
        Some(first) => {
            let (min, max) = values.fold((first, first), |(min, max), v| (min.min(v), max.max(v)));
            max == min
        }
    }
}

/// Compute the 3-point correlation statistics of `fields` for every bin of
/// `catalog`.
///
/// When the anchor field is constant (zero spread), a warning is logged and
/// an all-zero result is returned without walking any triangles.
pub fn correlate(
    executor: &mut impl Executor,
    fields: FieldTriple,
    catalog: &Catalog,
    params: &EngineParams,
) -> Result<JackknifeResult, Error> {
    let lattice = params.lattice;
    if *fields.lattice() != lattice {
        return Err(Error::internal(
            "the fields are defined on a different lattice than the one in the parameters",
        ));
    }
    let n_points = lattice.n_points();
    let partition = JackknifePartition::new(n_points, params.jackknife_groups).map_err(|_| {
        Error::integer_range(
            "the number of jackknife groups",
            params.jackknife_groups as i64,
            1,
            n_points as i64,
        )
    })?;

    let fraction = params.sample_fraction;
    let sampler = if fraction == 1.0 {
        None
    } else if fraction > 0.0 && fraction < 1.0 {
        Some(Bernoulli::new(fraction).map_err(|_| Error::sample_fraction(fraction))?)
    } else {
        return Err(Error::sample_fraction(fraction));
    };

    if is_flat(fields.first()) {
        warn!("the field has zero spread, returning an all-zero result");
        return Ok(JackknifeResult::zeroed(
            catalog.n_bins(),
            params.jackknife_groups,
        ));
    }

    debug!(
        "correlating {} bins on a {}^3 lattice with {} jackknife groups",
        catalog.n_bins(),
        lattice.resolution(),
        partition.n_groups()
    );
    let reduction = LatticeReduction {
        walk: TriangleWalk::new(fields, catalog, partition),
        sampler,
        seed: params.seed,
    };
    let mut statepack = reduction.new_statepack();
    executor
        .drive_reduce(&mut statepack, &reduction)
        .map_err(Error::internal)?;
    info!("finished correlating");
    Ok(statepack.into_jackknife_result())
}

/// Compute the 3-point auto-correlation statistics of `field`
pub fn correlate_auto(
    executor: &mut impl Executor,
    field: &[f32],
    catalog: &Catalog,
    params: &EngineParams,
) -> Result<JackknifeResult, Error> {
    let fields = FieldTriple::auto(field, params.lattice).map_err(Error::internal)?;
    correlate(executor, fields, catalog, params)
}
