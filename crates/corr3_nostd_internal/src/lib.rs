#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod catalog;
mod jackknife;
mod lattice;
mod offset;
mod parallel;
mod state;
mod stats;
mod walk;

pub use catalog::{Catalog, MeanRadii, RadiusBin, TriangleSet};
pub use jackknife::JackknifePartition;
pub use lattice::Lattice;
pub use offset::Offset;
pub use parallel::{Executor, ReductionSpec};
pub use state::{JackknifeResult, StatePack};
pub use stats::{Estimator, StatTuple, landy_szalay, plain};
pub use walk::{FieldTriple, TriangleWalk};
