//! Writing (and reading back) the per-bin report of a correlation run.
//!
//! The report is a tab-separated table with a single header line (prefixed
//! with `#`) and one row per bin:
//!
//! ```text
//! # R1_avg   R2_avg   R3_avg   corr3   Error   DDD   DDR   DRR   RRR
//! ```
//!
//! Every value is written in C-style scientific notation with 16 fractional
//! digits (e.g. `1.0000000000000000e+00`), padded on the right to a width of
//! 23 characters. Non-finite values are written as `nan`, `inf` or `-inf`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use corr3_nostd_internal::{Catalog, Estimator, JackknifeResult, StatTuple};

use crate::error::Error;

const COLUMN_NAMES: [&str; 9] = [
    "R1_avg", "R2_avg", "R3_avg", "corr3", "Error", "DDD", "DDR", "DRR", "RRR",
];
const COLUMN_WIDTH: usize = 23;

/// A single row of the report
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportRow {
    pub r1_avg: f64,
    pub r2_avg: f64,
    pub r3_avg: f64,
    pub corr3: f64,
    pub error: f64,
    pub stats: StatTuple,
}

impl ReportRow {
    fn values(&self) -> [f64; 9] {
        [
            self.r1_avg,
            self.r2_avg,
            self.r3_avg,
            self.corr3,
            self.error,
            self.stats.ddd,
            self.stats.ddr,
            self.stats.drr,
            self.stats.rrr,
        ]
    }

    fn from_values(values: [f64; 9]) -> Self {
        let [r1_avg, r2_avg, r3_avg, corr3, error, ddd, ddr, drr, rrr] = values;
        ReportRow {
            r1_avg,
            r2_avg,
            r3_avg,
            corr3,
            error,
            stats: StatTuple::new(ddd, ddr, drr, rrr),
        }
    }
}

/// The jackknife error of `bin`:
/// `sqrt(((J - 1) / J) * sum_j (est(leave_one_out_j) - est(total))^2)`.
///
/// When the bin holds no triangles (`RRR == 0`), no group contributes and the
/// error is NaN.
pub fn jackknife_error(result: &JackknifeResult, bin: usize, estimator: Estimator) -> f64 {
    let total = result.total(bin);
    if total.rrr == 0.0 {
        return f64::NAN;
    }
    let full = estimator.evaluate(total);
    let mut diff_sq_sum = 0.0;
    let mut count = 0_usize;
    for leave_one_out in result.leave_one_out_for_bin(bin) {
        diff_sq_sum += (estimator.evaluate(leave_one_out) - full).powi(2);
        count += 1;
    }
    let count = count as f64;
    (((count - 1.0) / count) * diff_sq_sum).sqrt()
}

/// Assemble the report rows for every bin of `catalog`
pub fn build_report(
    result: &JackknifeResult,
    catalog: &Catalog,
    estimator: Estimator,
) -> Result<Vec<ReportRow>, Error> {
    if result.n_bins() != catalog.n_bins() {
        return Err(Error::internal(
            "the result and the catalog have different numbers of bins",
        ));
    }
    let rows = catalog
        .bins()
        .iter()
        .enumerate()
        .map(|(bin_index, bin)| {
            let stats = *result.total(bin_index);
            let radii = bin.mean_radii();
            ReportRow {
                r1_avg: radii.r1,
                r2_avg: radii.r2,
                r3_avg: radii.r3,
                corr3: estimator.evaluate(&stats),
                error: jackknife_error(result, bin_index, estimator),
                stats,
            }
        })
        .collect();
    Ok(rows)
}

/// Format `value` like C's `%.16e`
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    } else if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let formatted = format!("{value:.16e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Write the report to `writer`
pub fn write_report<W: Write>(mut writer: W, rows: &[ReportRow]) -> std::io::Result<()> {
    write!(writer, "{:<22}", format!("# {}", COLUMN_NAMES[0]))?;
    for name in &COLUMN_NAMES[1..] {
        write!(writer, "\t{name:<width$}", width = COLUMN_WIDTH)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (i, value) in row.values().into_iter().enumerate() {
            if i > 0 {
                write!(writer, "\t")?;
            }
            write!(
                writer,
                "{:<width$}",
                format_scientific(value),
                width = COLUMN_WIDTH
            )?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// Write the report to a file at `path`
pub fn save_report(path: impl AsRef<Path>, rows: &[ReportRow]) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path.to_path_buf(), "create", e))?;
    write_report(BufWriter::new(file), rows).map_err(|e| Error::io(path.to_path_buf(), "write", e))
}

/// Parse a report produced by [`write_report`]
pub fn parse_report<R: BufRead>(reader: R) -> Result<Vec<ReportRow>, Error> {
    let mut rows = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line.map_err(|e| Error::report_parse(line_number, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut values = [0.0; 9];
        let mut n_values = 0;
        for token in trimmed.split_whitespace() {
            if n_values == values.len() {
                return Err(Error::report_parse(
                    line_number,
                    format!("expected {} columns, found more", values.len()),
                ));
            }
            values[n_values] = token.parse::<f64>().map_err(|_| {
                Error::report_parse(line_number, format!("{token:?} isn't a number"))
            })?;
            n_values += 1;
        }
        if n_values != values.len() {
            return Err(Error::report_parse(
                line_number,
                format!("expected {} columns, found {n_values}", values.len()),
            ));
        }
        rows.push(ReportRow::from_values(values));
    }
    Ok(rows)
}

/// Parse the report stored at `path`
pub fn load_report(path: impl AsRef<Path>) -> Result<Vec<ReportRow>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path.to_path_buf(), "open", e))?;
    parse_report(BufReader::new(file))
}
