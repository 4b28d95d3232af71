/*!
Estimates the isotropic 3-point correlation function of a scalar field
sampled on a periodic 3D lattice.

# High-Level: 3-Point Statistics

Rather than enumerating every triple of lattice sites, the calculation is
driven by a precomputed catalog of triangle shapes. The catalog is organized
into radius bins. Each bin lists the lattice offsets (relative to an anchor
site) that form valid triangles for that bin. For every sampled anchor site,
we walk each bin's triangles (with periodic wrap-around) and accumulate 4
sums (`DDD`, `DDR`, `DRR`, `RRR`) that an [`Estimator`] turns into a
correlation value.

Errors are estimated with jackknife resampling: the lattice is partitioned
into groups and the statistics are recomputed with each group left out.

# User Guide

```no_run
use corr3::{RunConfigBuilder, prepare_catalog, process_field_file};

let config = RunConfigBuilder::new()
    .resolution(128)
    .box_length(256.0)
    .sample_fraction(0.05)
    .jackknife_groups(8)
    .estimator("LS")
    .build()?;
let catalog = prepare_catalog("triangles.bin", &config)?;
let mut executor = config.build_executor()?;
process_field_file("field.dat", "corr3.txt", &catalog, &config, &mut executor)?;
# Ok::<(), corr3::Error>(())
```

# Developer Guide

The innermost machinery (with no dependence on the standard library) lives
in [`corr3_nostd_internal`]. This crate adds file I/O, configuration, the
executors, and reporting.
*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the modules in this package
mod catalog_io;
mod config;
mod driver;
mod engine;
mod error;
mod field;
mod geometry;
mod report;

// pull in symbols that visible outside of the package
pub use catalog_io::{CatalogSummary, load_catalog, read_catalog, save_catalog, write_catalog};
pub use config::{DEFAULT_SAMPLE_FRACTION, DEFAULT_SEED, RunConfig, RunConfigBuilder};
pub use corr3_nostd_internal::{
    Catalog, Estimator, Executor, FieldTriple, JackknifeResult, Lattice, MeanRadii, Offset,
    RadiusBin, ReductionSpec, StatTuple, StatePack, TriangleSet, landy_szalay, plain,
};
pub use driver::{prepare_catalog, process_field_file};
pub use engine::{EngineParams, SerialExecutor, ThreadPoolExecutor, correlate, correlate_auto};
pub use error::Error;
pub use field::{FieldDtype, Normalization, NormalizeOutcome, load_field, normalize, read_field};
pub use geometry::{EuclideanMagnitude, bin_from_sets};
pub use report::{
    ReportRow, build_report, format_scientific, jackknife_error, load_report, parse_report,
    save_report, write_report,
};
