//! Reading and writing the binary triangle catalog.
//!
//! Every value is 4 bytes wide and stored with native endianness:
//!
//! ```text
//! nbins: i32
//! repeated nbins times:
//!     rmin: f32, rmax: f32, n_primary: i32
//!     repeated n_primary times:
//!         primary: [i32; 3]
//!         n_secondary_raw: i32        (3 * the number of secondaries)
//!         repeated n_secondary_raw/3 times:
//!             secondary: [i32; 3]
//! ```
//!
//! A catalog generator may still be appending bins while we read the file.
//! For that reason, reaching the end of the file where a bin's `rmin` is
//! expected isn't an error: we return the bins read up to that point.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Write};
use std::path::Path;

use corr3_nostd_internal::{Catalog, Lattice, Offset, RadiusBin, TriangleSet};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::geometry::MeanRadiiSums;

struct CatalogReader<R> {
    inner: R,
}

impl<R: Read> CatalogReader<R> {
    fn read_bytes<const N: usize>(&mut self) -> std::io::Result<[u8; N]> {
        let mut buf = [0_u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_i32(&mut self) -> std::io::Result<i32> {
        Ok(i32::from_ne_bytes(self.read_bytes()?))
    }

    fn read_f32(&mut self) -> std::io::Result<f32> {
        Ok(f32::from_ne_bytes(self.read_bytes()?))
    }

    fn read_offset(&mut self) -> std::io::Result<Offset> {
        let dx = self.read_i32()?;
        let dy = self.read_i32()?;
        let dz = self.read_i32()?;
        Ok(Offset::new(dx, dy, dz))
    }
}

fn truncated(location: String, err: std::io::Error) -> Error {
    if err.kind() == IoErrorKind::UnexpectedEof {
        Error::catalog_truncated(location, None)
    } else {
        Error::catalog_truncated(location, Some(err))
    }
}

/// Counts read from a header only reserve up to this many elements ahead of
/// time. A corrupt or partially written header can't trigger a huge
/// allocation; the short read that follows reports the problem instead.
const MAX_PREALLOC: usize = 1024;

fn checked_count(value: i32, location: impl FnOnce() -> String) -> Result<usize, Error> {
    usize::try_from(value)
        .map_err(|_| Error::catalog_format(location(), "the count must not be negative"))
}

/// Read a catalog from `reader`.
///
/// `cell_size` is the physical length of a lattice cell. It is only used to
/// convert the mean edge lengths of each bin into physical units.
pub fn read_catalog<R: Read>(reader: R, cell_size: f64) -> Result<Catalog, Error> {
    let mut reader = CatalogReader { inner: reader };

    let raw_nbins = reader
        .read_i32()
        .map_err(|e| truncated("the number of bins".to_owned(), e))?;
    let nbins = checked_count(raw_nbins, || "the number of bins".to_owned())?;

    let mut bins = Vec::with_capacity(nbins.min(MAX_PREALLOC));
    for bin_index in 0..nbins {
        let bin_loc = format!("bin {} of {}", bin_index + 1, nbins);

        let rmin = match reader.read_f32() {
            Ok(rmin) => rmin,
            Err(e) if e.kind() == IoErrorKind::UnexpectedEof => {
                warn!(
                    "the catalog ends before {bin_loc}, only {bin_index} bins will be used \
                     (the catalog may still be being written)"
                );
                break;
            }
            Err(e) => return Err(truncated(format!("rmin of {bin_loc}"), e)),
        };
        let rmax = reader
            .read_f32()
            .map_err(|e| truncated(format!("rmax of {bin_loc}"), e))?;
        let raw_n_primary = reader
            .read_i32()
            .map_err(|e| truncated(format!("the number of primary points of {bin_loc}"), e))?;
        let n_primary = checked_count(raw_n_primary, || {
            format!("the number of primary points of {bin_loc}")
        })?;

        let mut sums = MeanRadiiSums::default();
        let mut sets = Vec::with_capacity(n_primary.min(MAX_PREALLOC));
        for primary_index in 0..n_primary {
            let primary_loc = format!(
                "primary point {} of {} in {bin_loc}",
                primary_index + 1,
                n_primary
            );
            let primary = reader
                .read_offset()
                .map_err(|e| truncated(primary_loc.clone(), e))?;

            let raw_n_secondary = reader.read_i32().map_err(|e| {
                truncated(format!("the number of secondaries of {primary_loc}"), e)
            })?;
            let n_secondary_raw = checked_count(raw_n_secondary, || {
                format!("the number of secondaries of {primary_loc}")
            })?;
            if n_secondary_raw % 3 != 0 {
                return Err(Error::catalog_format(
                    format!("the number of secondaries of {primary_loc}"),
                    "the number of secondary components must be a multiple of 3",
                ));
            }
            let n_secondary = n_secondary_raw / 3;

            let mut secondaries = Vec::with_capacity(n_secondary.min(MAX_PREALLOC));
            for secondary_index in 0..n_secondary {
                let secondary = reader.read_offset().map_err(|e| {
                    truncated(
                        format!(
                            "secondary point {} of {} for {primary_loc}",
                            secondary_index + 1,
                            n_secondary
                        ),
                        e,
                    )
                })?;
                sums.add_triangle(&primary, &secondary);
                secondaries.push(secondary);
            }
            sets.push(TriangleSet::new(primary, secondaries));
        }

        bins.push(RadiusBin::new(rmin, rmax, sums.finalize(cell_size), sets));
    }
    Ok(Catalog::new(bins))
}

/// Load the catalog stored at `path`
pub fn load_catalog(path: impl AsRef<Path>, cell_size: f64) -> Result<Catalog, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path.to_path_buf(), "open", e))?;
    let catalog = read_catalog(BufReader::new(file), cell_size)?;
    info!(
        "loaded {} bins from the catalog at {}",
        catalog.n_bins(),
        path.display()
    );
    Ok(catalog)
}

fn count_to_i32(count: usize, what: &str) -> std::io::Result<i32> {
    i32::try_from(count).map_err(|_| {
        std::io::Error::new(
            IoErrorKind::InvalidInput,
            format!("{what} ({count}) can't be represented as an i32"),
        )
    })
}

fn write_offset<W: Write>(writer: &mut W, offset: &Offset) -> std::io::Result<()> {
    for component in offset.value() {
        writer.write_all(&component.to_ne_bytes())?;
    }
    Ok(())
}

/// Write `catalog` to `writer` in the layout understood by [`read_catalog`].
///
/// The mean edge lengths aren't stored; they are recomputed on load.
pub fn write_catalog<W: Write>(mut writer: W, catalog: &Catalog) -> std::io::Result<()> {
    writer.write_all(&count_to_i32(catalog.n_bins(), "the number of bins")?.to_ne_bytes())?;
    for bin in catalog.bins() {
        writer.write_all(&bin.rmin().to_ne_bytes())?;
        writer.write_all(&bin.rmax().to_ne_bytes())?;
        let n_primary = count_to_i32(bin.sets().len(), "the number of primary points")?;
        writer.write_all(&n_primary.to_ne_bytes())?;
        for set in bin.sets() {
            write_offset(&mut writer, set.primary())?;
            let n_secondary_raw = set
                .len()
                .checked_mul(3)
                .ok_or_else(|| {
                    std::io::Error::new(IoErrorKind::InvalidInput, "too many secondaries")
                })
                .and_then(|n| count_to_i32(n, "the number of secondary components"))?;
            writer.write_all(&n_secondary_raw.to_ne_bytes())?;
            for secondary in set.secondaries() {
                write_offset(&mut writer, secondary)?;
            }
        }
    }
    writer.flush()
}

/// Write `catalog` to a file at `path`
pub fn save_catalog(path: impl AsRef<Path>, catalog: &Catalog) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path.to_path_buf(), "create", e))?;
    write_catalog(BufWriter::new(file), catalog)
        .map_err(|e| Error::io(path.to_path_buf(), "write", e))
}

/// Summarizes the amount of work implied by a catalog
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogSummary {
    triangles_per_bin: Vec<usize>,
    total_triangles: usize,
}

impl CatalogSummary {
    pub fn new(catalog: &Catalog) -> Self {
        let triangles_per_bin: Vec<usize> =
            catalog.bins().iter().map(RadiusBin::n_triangles).collect();
        let total_triangles = triangles_per_bin.iter().sum();
        CatalogSummary {
            triangles_per_bin,
            total_triangles,
        }
    }

    pub fn triangles_per_bin(&self) -> &[usize] {
        &self.triangles_per_bin
    }

    /// the number of triangles walked for each sampled lattice site
    pub fn total_triangles(&self) -> usize {
        self.total_triangles
    }

    /// the expected number of triangle evaluations for a single field
    pub fn expected_evaluations(&self, sample_fraction: f64, lattice: &Lattice) -> f64 {
        sample_fraction * (self.total_triangles as f64) * (lattice.n_points() as f64)
    }

    /// log a description of every bin (at the debug level) and the overall
    /// workload (at the info level)
    pub fn log(&self, catalog: &Catalog, sample_fraction: f64, lattice: &Lattice) {
        for (bin_index, (bin, n_triangles)) in catalog
            .bins()
            .iter()
            .zip(self.triangles_per_bin.iter())
            .enumerate()
        {
            let radii = bin.mean_radii();
            debug!(
                "bin {bin_index}: r_mean = {{{:.2}, {:.2}, {:.2}}} ({:.1} < r < {:.1}), \
                 {n_triangles} triangles",
                radii.r1,
                radii.r2,
                radii.r3,
                bin.rmin(),
                bin.rmax()
            );
        }
        info!(
            "{} triangles per sampled lattice point",
            self.total_triangles
        );
        info!(
            "expecting {:.3e} triangle evaluations per field",
            self.expected_evaluations(sample_fraction, lattice)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_i32(buf: &mut Vec<u8>, vals: &[i32]) {
        for val in vals {
            buf.extend_from_slice(&val.to_ne_bytes());
        }
    }

    fn push_f32(buf: &mut Vec<u8>, vals: &[f32]) {
        for val in vals {
            buf.extend_from_slice(&val.to_ne_bytes());
        }
    }

    #[test]
    fn read_handwritten_catalog() {
        let mut buf = Vec::new();
        push_i32(&mut buf, &[1]);
        push_f32(&mut buf, &[0.5, 1.5]);
        push_i32(&mut buf, &[1, 1, 0, 0, 6, 0, 1, 0, 0, 0, 1]);

        let catalog = read_catalog(buf.as_slice(), 2.0).unwrap();
        assert_eq!(catalog.n_bins(), 1);
        let bin = &catalog.bins()[0];
        assert_eq!(bin.rmin(), 0.5);
        assert_eq!(bin.rmax(), 1.5);
        assert_eq!(bin.n_triangles(), 2);
        assert_eq!(*bin.sets()[0].primary(), Offset::new(1, 0, 0));
        assert_eq!(
            bin.sets()[0].secondaries(),
            &[Offset::new(0, 1, 0), Offset::new(0, 0, 1)]
        );
        assert_eq!(bin.mean_radii().r1, 2.0);
        assert_eq!(bin.mean_radii().r2, 2.0);
    }

    #[test]
    fn read_negative_count() {
        let mut buf = Vec::new();
        push_i32(&mut buf, &[1]);
        push_f32(&mut buf, &[0.5, 1.5]);
        push_i32(&mut buf, &[-2]);
        assert!(read_catalog(buf.as_slice(), 1.0).is_err());
    }

    #[test]
    fn read_indivisible_secondary_count() {
        let mut buf = Vec::new();
        push_i32(&mut buf, &[1]);
        push_f32(&mut buf, &[0.5, 1.5]);
        push_i32(&mut buf, &[1, 1, 0, 0, 4, 0, 1, 0, 0]);
        assert!(read_catalog(buf.as_slice(), 1.0).is_err());
    }

    #[test]
    fn read_empty_stream() {
        let empty: &[u8] = &[];
        assert!(read_catalog(empty, 1.0).is_err());
    }

    #[test]
    fn summary_counts() {
        let mut buf = Vec::new();
        push_i32(&mut buf, &[2]);
        push_f32(&mut buf, &[0.5, 1.5]);
        push_i32(&mut buf, &[1, 1, 0, 0, 6, 0, 1, 0, 0, 0, 1]);
        push_f32(&mut buf, &[1.5, 2.5]);
        push_i32(&mut buf, &[1, 2, 0, 0, 3, 0, 2, 0]);
        let catalog = read_catalog(buf.as_slice(), 1.0).unwrap();

        let summary = CatalogSummary::new(&catalog);
        assert_eq!(summary.triangles_per_bin(), &[2, 1]);
        assert_eq!(summary.total_triangles(), 3);
        let lattice = Lattice::new(4).unwrap();
        assert_eq!(summary.expected_evaluations(0.5, &lattice), 96.0);
    }
}
