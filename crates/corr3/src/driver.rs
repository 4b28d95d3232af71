//! Glue that strings the individual stages together for a single field file

use std::path::Path;

use corr3_nostd_internal::{Catalog, Executor};
use tracing::info;

use crate::catalog_io::{CatalogSummary, load_catalog};
use crate::config::RunConfig;
use crate::engine::correlate_auto;
use crate::error::Error;
use crate::field::{load_field, normalize};
use crate::report::{ReportRow, build_report, save_report};

/// Load the catalog at `path` (using the cell size implied by `config`) and
/// log a summary of the work it implies
pub fn prepare_catalog(path: impl AsRef<Path>, config: &RunConfig) -> Result<Catalog, Error> {
    let catalog = load_catalog(path, config.cell_size())?;
    CatalogSummary::new(&catalog).log(&catalog, config.sample_fraction(), config.lattice());
    Ok(catalog)
}

/// Compute the auto-correlation of the field stored at `input` and write the
/// report to `output`.
///
/// Errors for which [`Error::is_per_file`] holds only concern this file, so
/// a caller processing many files can skip to the next one.
pub fn process_field_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    catalog: &Catalog,
    config: &RunConfig,
    executor: &mut impl Executor,
) -> Result<Vec<ReportRow>, Error> {
    let input = input.as_ref();
    let output = output.as_ref();
    info!("processing {}", input.display());

    let mut field = load_field(input, config.lattice())?;
    normalize(&mut field, config.normalization())?;

    let result = correlate_auto(executor, &field, catalog, &config.engine_params())?;
    let rows = build_report(&result, catalog, config.estimator())?;
    save_report(output, &rows)?;
    info!("saved the report to {}", output.display());
    Ok(rows)
}
