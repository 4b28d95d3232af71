//! Define the per-bin accumulator state and the estimators that consume it
//!
//! # Accumulation Machinery
//!
//! Each radius bin tracks 4 running sums over the triangles `(P1, P2, P3)`
//! whose vertices carry the field samples `d1`, `d2` and `d3`:
//!
//! | component | contribution per triangle |
//! |-----------|---------------------------|
//! | `DDD`     | `d1 * d2 * d3`            |
//! | `DDR`     | `d1 * d2`                 |
//! | `DRR`     | `d1`                      |
//! | `RRR`     | `1`                       |
//!
//! The sums are stored as `f64` even though the samples are `f32`, since a
//! single bin can receive billions of contributions.
//!
//! The state is a plain value: combining partial results is addition, and
//! removing the contribution of one jackknife group is subtraction.

use core::ops::{Add, AddAssign, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatTuple {
    pub ddd: f64,
    pub ddr: f64,
    pub drr: f64,
    pub rrr: f64,
}

impl StatTuple {
    pub const ZERO: StatTuple = StatTuple::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(ddd: f64, ddr: f64, drr: f64, rrr: f64) -> Self {
        StatTuple { ddd, ddr, drr, rrr }
    }
}

impl Add for StatTuple {
    type Output = StatTuple;

    fn add(self, other: StatTuple) -> StatTuple {
        StatTuple {
            ddd: self.ddd + other.ddd,
            ddr: self.ddr + other.ddr,
            drr: self.drr + other.drr,
            rrr: self.rrr + other.rrr,
        }
    }
}

impl Sub for StatTuple {
    type Output = StatTuple;

    fn sub(self, other: StatTuple) -> StatTuple {
        StatTuple {
            ddd: self.ddd - other.ddd,
            ddr: self.ddr - other.ddr,
            drr: self.drr - other.drr,
            rrr: self.rrr - other.rrr,
        }
    }
}

impl AddAssign for StatTuple {
    fn add_assign(&mut self, other: StatTuple) {
        *self = *self + other;
    }
}

impl SubAssign for StatTuple {
    fn sub_assign(&mut self, other: StatTuple) {
        *self = *self - other;
    }
}

/// the simple estimator: `DDD/RRR - 1`
///
/// When `RRR` is 0, the result is NaN or infinite.
pub fn plain(stats: &StatTuple) -> f64 {
    (stats.ddd / stats.rrr) - 1.0
}

/// the Landy-Szalay estimator: `(DDD - 3 DDR + 3 DRR)/RRR - 1`
///
/// When `RRR` is 0, the result is NaN or infinite.
pub fn landy_szalay(stats: &StatTuple) -> f64 {
    ((stats.ddd - 3.0 * stats.ddr + 3.0 * stats.drr) / stats.rrr) - 1.0
}

/// Maps a [`StatTuple`] to a correlation value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Estimator {
    Plain,
    LandySzalay,
}

impl Estimator {
    /// the names accepted by [`Estimator::from_name`]
    pub const NAMES: &'static [&'static str] = &["plain", "Plain", "LS"];

    /// An empty name selects the default ([`Estimator::Plain`])
    pub fn from_name(name: &str) -> Option<Estimator> {
        match name {
            "" | "plain" | "Plain" => Some(Estimator::Plain),
            "LS" => Some(Estimator::LandySzalay),
            _ => None,
        }
    }

    /// descriptive label (used when logging and naming outputs)
    pub fn label(&self) -> &'static str {
        match self {
            Estimator::Plain => "estimatorPlain",
            Estimator::LandySzalay => "estimatorLandaySzalay",
        }
    }

    #[inline]
    pub fn evaluate(&self, stats: &StatTuple) -> f64 {
        match self {
            Estimator::Plain => plain(stats),
            Estimator::LandySzalay => landy_szalay(stats),
        }
    }
}
