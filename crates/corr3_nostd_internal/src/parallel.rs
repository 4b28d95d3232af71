//! Our parallelism abstractions describe a reduction as a set of
//! independent units of work.
//!
//! A reduction (a type implementing [`ReductionSpec`]) knows how to
//! decompose the calculation into units of work and how to fold the
//! contributions of a single unit into a [`StatePack`]. An [`Executor`]
//! decides who processes each unit and how the resulting statepacks are
//! combined.
//!
//! The contract that every executor must honor:
//! - each unit of work is processed exactly once
//! - each unit's contributions land in a statepack private to the worker
//!   processing it (units never share mutable state)
//! - every private statepack is merged into the output exactly once
//!
//! Since floating-point addition isn't associative, different executors (or
//! different runs of a multi-threaded executor) may produce results that
//! differ in the last few bits. Bitwise reproducibility is only guaranteed
//! when every partial sum is exactly representable (e.g. integer-valued
//! fields).

use crate::state::StatePack;

/// Used for specifying the details of a binned reduction, providing an
/// interface for an [`Executor`] to carry it out.
///
/// An important premise is that you do error-checking while constructing
/// the type, and design the logic such that you don't have to do **any**
/// error-handling in these methods.
pub trait ReductionSpec: Sync {
    /// the number of independent units of work
    fn n_work_units(&self) -> usize;

    /// a zero-initialized statepack with the shape expected by the reduction
    fn new_statepack(&self) -> StatePack;

    /// add every contribution from the unit of work `unit` to `statepack`
    fn process_unit(&self, statepack: &mut StatePack, unit: usize);
}

/// a trait for expressing how to launch a reduction
///
/// We implement this for each parallelism "backend," so we have a uniform
/// interface for easily switching between backends.
pub trait Executor {
    /// add the contributions of every unit of work in `reduction_spec` to
    /// `out`
    fn drive_reduce(
        &mut self,
        out: &mut StatePack,
        reduction_spec: &impl ReductionSpec,
    ) -> Result<(), &'static str>;
}
