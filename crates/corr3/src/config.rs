//! Run configuration
//!
//! A [`RunConfig`] is always constructed through a [`RunConfigBuilder`],
//! which validates every parameter (and fills in defaults) in
//! [`RunConfigBuilder::build`].

use std::num::NonZeroUsize;

use corr3_nostd_internal::{Estimator, Lattice};
use tracing::warn;

use crate::engine::{EngineParams, ThreadPoolExecutor};
use crate::error::Error;
use crate::field::Normalization;

pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.01;
pub const DEFAULT_SEED: u64 = 0x5EED_C022_3000_0001;

/// The validated parameters of a run
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    lattice: Lattice,
    box_length: f64,
    sample_fraction: f64,
    jackknife_groups: usize,
    n_threads: NonZeroUsize,
    estimator: Estimator,
    normalization: Normalization,
    seed: u64,
}

impl RunConfig {
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn resolution(&self) -> usize {
        self.lattice.resolution()
    }

    /// the physical side length of the periodic box
    pub fn box_length(&self) -> f64 {
        self.box_length
    }

    /// the physical side length of a single lattice cell
    pub fn cell_size(&self) -> f64 {
        self.box_length / (self.lattice.resolution() as f64)
    }

    pub fn sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    pub fn jackknife_groups(&self) -> usize {
        self.jackknife_groups
    }

    pub fn n_threads(&self) -> NonZeroUsize {
        self.n_threads
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            lattice: self.lattice,
            sample_fraction: self.sample_fraction,
            jackknife_groups: self.jackknife_groups,
            seed: self.seed,
        }
    }

    /// construct an executor with the configured number of threads
    pub fn build_executor(&self) -> Result<ThreadPoolExecutor, Error> {
        ThreadPoolExecutor::new(self.n_threads)
    }

    /// the prefix for the names of report files (e.g.
    /// `corr3_estimatorPlain_bins_sample0.010_normOne_`)
    pub fn output_prefix(&self, catalog_name: &str) -> String {
        format!(
            "corr3_{}_{}_sample{:.3}_{}_",
            self.estimator.label(),
            catalog_name,
            self.sample_fraction,
            self.normalization.label()
        )
    }
}

/// Builds a [`RunConfig`].
///
/// The resolution and the box length must always be specified. Everything
/// else has a default.
#[derive(Clone, Debug, Default)]
pub struct RunConfigBuilder {
    resolution: Option<usize>,
    box_length: Option<f64>,
    sample_fraction: Option<f64>,
    jackknife_groups: Option<usize>,
    n_threads: Option<usize>,
    estimator: Option<String>,
    normalization: Option<String>,
    seed: Option<u64>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// the number of lattice sites along each axis
    pub fn resolution(mut self, resolution: usize) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn box_length(mut self, box_length: f64) -> Self {
        self.box_length = Some(box_length);
        self
    }

    /// values above 1 are reduced to 1. Defaults to
    /// [`DEFAULT_SAMPLE_FRACTION`]
    pub fn sample_fraction(mut self, sample_fraction: f64) -> Self {
        self.sample_fraction = Some(sample_fraction);
        self
    }

    /// defaults to 1
    pub fn jackknife_groups(mut self, jackknife_groups: usize) -> Self {
        self.jackknife_groups = Some(jackknife_groups);
        self
    }

    /// defaults to the available parallelism of the machine
    pub fn n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = Some(n_threads);
        self
    }

    /// any name accepted by [`Estimator::from_name`]
    pub fn estimator(mut self, name: &str) -> Self {
        self.estimator = Some(name.to_owned());
        self
    }

    /// any name accepted by [`Normalization::from_name`]
    pub fn normalization(mut self, name: &str) -> Self {
        self.normalization = Some(name.to_owned());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<RunConfig, Error> {
        let resolution = self
            .resolution
            .ok_or_else(|| Error::missing_parameter("resolution"))?;
        if resolution == 0 || resolution > (i32::MAX as usize) {
            return Err(Error::integer_range(
                "the resolution",
                i64::try_from(resolution).unwrap_or(i64::MAX),
                1,
                i32::MAX as i64,
            ));
        }
        let lattice = Lattice::new(resolution).map_err(Error::internal)?;

        let box_length = self
            .box_length
            .ok_or_else(|| Error::missing_parameter("box_length"))?;
        if !(box_length.is_finite() && box_length > 0.0) {
            return Err(Error::positive_float("the box length", box_length));
        }

        let mut sample_fraction = self.sample_fraction.unwrap_or(DEFAULT_SAMPLE_FRACTION);
        if sample_fraction.is_nan() || sample_fraction <= 0.0 {
            return Err(Error::sample_fraction(sample_fraction));
        } else if sample_fraction > 1.0 {
            warn!("reducing the sampling fraction from {sample_fraction} to 1");
            sample_fraction = 1.0;
        }

        let n_points = lattice.n_points();
        let jackknife_groups = self.jackknife_groups.unwrap_or(1);
        if jackknife_groups == 0 || jackknife_groups > n_points {
            return Err(Error::integer_range(
                "the number of jackknife groups",
                i64::try_from(jackknife_groups).unwrap_or(i64::MAX),
                1,
                i64::try_from(n_points).unwrap_or(i64::MAX),
            ));
        }

        let n_threads = match self.n_threads {
            Some(n) => NonZeroUsize::new(n).ok_or_else(|| {
                Error::integer_range("the number of threads", 0, 1, i64::MAX)
            })?,
            None => std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        };

        let estimator_name = self.estimator.as_deref().unwrap_or("");
        let estimator = Estimator::from_name(estimator_name).ok_or_else(|| {
            Error::unknown_name(
                "estimator",
                estimator_name.to_owned(),
                Estimator::NAMES.iter().map(|s| s.to_string()).collect(),
            )
        })?;
        if is_legacy_plain_alias(estimator_name) {
            warn!(
                "the estimator name \"{estimator_name}\" selects the Landy-Szalay estimator; \
                 older versions of this tool used the plain estimator for this name"
            );
        }

        let normalization_name = self.normalization.as_deref().unwrap_or("");
        let normalization = Normalization::from_name(normalization_name).ok_or_else(|| {
            Error::unknown_name(
                "normalization",
                normalization_name.to_owned(),
                Normalization::NAMES.iter().map(|s| s.to_string()).collect(),
            )
        })?;

        Ok(RunConfig {
            lattice,
            box_length,
            sample_fraction,
            jackknife_groups,
            n_threads,
            estimator,
            normalization,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
        })
    }
}

/// names that older versions of this tool resolved to the plain estimator
fn is_legacy_plain_alias(name: &str) -> bool {
    name == "LS"
}
