//! Loading and normalizing scalar fields sampled on the lattice.
//!
//! A field file is a flat array of `nres^3` samples in the lattice's
//! flattened order, stored with native endianness and no header. The sample
//! type (`f32` or `f64`) is inferred from the file size. Samples are always
//! held in memory as `f32`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use corr3_nostd_internal::Lattice;
use tracing::{debug, warn};

use crate::error::Error;

/// The floating-point type of the samples stored in a field file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldDtype {
    F32,
    F64,
}

impl FieldDtype {
    /// infer the dtype of a file holding `n_points` samples in `n_bytes`
    pub fn from_file_size(n_bytes: u64, n_points: usize) -> Option<FieldDtype> {
        let n_points = u64::try_from(n_points).ok().filter(|n| *n > 0)?;
        if Some(n_bytes) == n_points.checked_mul(4) {
            Some(FieldDtype::F32)
        } else if Some(n_bytes) == n_points.checked_mul(8) {
            Some(FieldDtype::F64)
        } else {
            None
        }
    }

    /// the number of bytes per sample
    pub fn size_of(&self) -> usize {
        match self {
            FieldDtype::F32 => 4,
            FieldDtype::F64 => 8,
        }
    }
}

/// read `n_points` samples of type `dtype` from `reader`. `f64` samples are
/// narrowed to `f32`.
pub fn read_field<R: Read>(
    mut reader: R,
    dtype: FieldDtype,
    n_points: usize,
) -> std::io::Result<Vec<f32>> {
    let mut field = Vec::with_capacity(n_points);
    match dtype {
        FieldDtype::F32 => {
            let mut buf = [0_u8; 4];
            for _ in 0..n_points {
                reader.read_exact(&mut buf)?;
                field.push(f32::from_ne_bytes(buf));
            }
        }
        FieldDtype::F64 => {
            let mut buf = [0_u8; 8];
            for _ in 0..n_points {
                reader.read_exact(&mut buf)?;
                field.push(f64::from_ne_bytes(buf) as f32);
            }
        }
    }
    Ok(field)
}

/// Load the field stored at `path`, which must hold one sample per site of
/// `lattice`
pub fn load_field(path: impl AsRef<Path>, lattice: &Lattice) -> Result<Vec<f32>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::field_io(path.to_path_buf(), "open", e))?;
    let n_bytes = file
        .metadata()
        .map_err(|e| Error::field_io(path.to_path_buf(), "query the size of", e))?
        .len();
    let n_points = lattice.n_points();
    let dtype = FieldDtype::from_file_size(n_bytes, n_points)
        .ok_or_else(|| Error::field_dtype(path.to_path_buf(), n_bytes, n_points))?;
    debug!("reading {} as {:?} samples", path.display(), dtype);

    read_field(BufReader::new(file), dtype, n_points)
        .map_err(|e| Error::field_io(path.to_path_buf(), "read", e))
}

/// How a field is rescaled by its mean `<T>` before correlating it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalization {
    /// `T / <T>` (a uniform field becomes 1 everywhere)
    #[default]
    NormOne,
    /// `(T - <T>) / <T>`
    NormOverdensity,
}

impl Normalization {
    /// the names accepted by [`Normalization::from_name`]
    pub const NAMES: &'static [&'static str] = &["normOne", "normOverdensity"];

    /// An empty name selects the default ([`Normalization::NormOne`])
    pub fn from_name(name: &str) -> Option<Normalization> {
        match name {
            "" | "normOne" => Some(Normalization::NormOne),
            "normOverdensity" => Some(Normalization::NormOverdensity),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Normalization::NormOne => "normOne",
            Normalization::NormOverdensity => "normOverdensity",
        }
    }
}

/// What [`normalize`] did to a field
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NormalizeOutcome {
    /// the field was rescaled by its mean
    Normalized { mean: f64 },
    /// every sample is zero. The field is left untouched and the
    /// correlation will be degenerate.
    AllZero,
}

/// normalize `field` in place.
///
/// The mean is accumulated in `f64`. A field whose mean is zero can't be
/// normalized: when every sample is zero we leave the field alone (and warn),
/// otherwise we report an error.
pub fn normalize(field: &mut [f32], normalization: Normalization) -> Result<NormalizeOutcome, Error> {
    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;
    for value in field.iter() {
        let value = *value as f64;
        sum += value;
        sum_sq += value * value;
    }
    let mean = sum / (field.len() as f64);
    debug!("the field's mean is {mean}");

    if mean == 0.0 {
        if sum_sq == 0.0 {
            warn!("the field is all zeros, the output will be degenerate");
            return Ok(NormalizeOutcome::AllZero);
        } else {
            return Err(Error::zero_mean_field());
        }
    }

    match normalization {
        Normalization::NormOne => {
            for value in field.iter_mut() {
                *value = ((*value as f64) / mean) as f32;
            }
        }
        Normalization::NormOverdensity => {
            for value in field.iter_mut() {
                *value = (((*value as f64) - mean) / mean) as f32;
            }
        }
    }
    Ok(NormalizeOutcome::Normalized { mean })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_from_size() {
        assert_eq!(FieldDtype::from_file_size(32, 8), Some(FieldDtype::F32));
        assert_eq!(FieldDtype::from_file_size(64, 8), Some(FieldDtype::F64));
        assert_eq!(FieldDtype::from_file_size(48, 8), None);
        assert_eq!(FieldDtype::from_file_size(0, 8), None);
        assert_eq!(FieldDtype::from_file_size(0, 0), None);
    }

    #[test]
    fn dtype_from_size_huge_lattice() {
        // 4 * n_points and 8 * n_points don't fit in a u64
        let n_points = 1_usize << 62;
        assert_eq!(FieldDtype::from_file_size(0, n_points), None);
        assert_eq!(FieldDtype::from_file_size(u64::MAX, n_points), None);
        assert_eq!(
            FieldDtype::from_file_size(1 << 62, 1 << 60),
            Some(FieldDtype::F32)
        );
        assert_eq!(
            FieldDtype::from_file_size(1 << 63, 1 << 60),
            Some(FieldDtype::F64)
        );
    }

    #[test]
    fn read_f64_narrows() {
        let mut buf = Vec::new();
        for val in [0.5_f64, -2.0, 1.0e-3] {
            buf.extend_from_slice(&val.to_ne_bytes());
        }
        let field = read_field(buf.as_slice(), FieldDtype::F64, 3).unwrap();
        assert_eq!(field, vec![0.5_f32, -2.0, 1.0e-3_f64 as f32]);
    }

    #[test]
    fn read_short_stream() {
        let buf = [0_u8; 7];
        assert!(read_field(&buf[..], FieldDtype::F32, 2).is_err());
    }

    #[test]
    fn normalize_one() {
        let mut field = vec![1.0_f32, 3.0, 2.0, 2.0];
        let outcome = normalize(&mut field, Normalization::NormOne).unwrap();
        assert_eq!(outcome, NormalizeOutcome::Normalized { mean: 2.0 });
        assert_eq!(field, vec![0.5, 1.5, 1.0, 1.0]);
    }

    #[test]
    fn normalize_overdensity() {
        let mut field = vec![1.0_f32, 3.0, 2.0, 2.0];
        normalize(&mut field, Normalization::NormOverdensity).unwrap();
        assert_eq!(field, vec![-0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn normalize_zero_mean() {
        let mut zeros = vec![0.0_f32; 8];
        for normalization in [Normalization::NormOne, Normalization::NormOverdensity] {
            let outcome = normalize(&mut zeros, normalization).unwrap();
            assert_eq!(outcome, NormalizeOutcome::AllZero);
            assert!(zeros.iter().all(|v| *v == 0.0));

            let mut balanced = vec![1.0_f32, -1.0, 2.0, -2.0];
            let err = normalize(&mut balanced, normalization).unwrap_err();
            assert!(err.is_per_file());
            assert_eq!(balanced, vec![1.0, -1.0, 2.0, -2.0]);
        }
    }

    #[test]
    fn normalization_names() {
        assert_eq!(Normalization::from_name(""), Some(Normalization::NormOne));
        assert_eq!(
            Normalization::from_name("normOne"),
            Some(Normalization::NormOne)
        );
        assert_eq!(
            Normalization::from_name("normOverdensity"),
            Some(Normalization::NormOverdensity)
        );
        assert_eq!(Normalization::from_name("overdensity"), None);
        assert_eq!(Normalization::NormOverdensity.label(), "normOverdensity");
    }
}
