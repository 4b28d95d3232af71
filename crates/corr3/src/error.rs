// The public crate wraps the `&'static str` errors reported by
// `corr3_nostd_internal`. Errors that only arise in the public crate (I/O,
// file formats, configuration) are defined here with a payload struct per
// variant.
//
// We keep `ErrorKind` private so that variants can be reorganized without
// breaking callers.

use std::path::PathBuf;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Debug)]
enum ErrorKind {
    /// A catalog that is structurally invalid (e.g. a negative count)
    CatalogFormat(CatalogFormatError),
    /// A catalog that ends in the middle of a bin
    CatalogTruncated(CatalogTruncatedError),
    /// A field file whose size isn't consistent with f32 or f64 samples
    FieldDtype(FieldDtypeError),
    /// An error that occurs when an integer lies outside of the acceptable
    /// range of values
    IntegerRange(IntegerRangeError),
    /// An error that occurs within `corr3_nostd_internal`
    Internal(InternalError),
    /// Failure to open, read or write a file
    Io(IoError),
    /// A required configuration parameter was never specified
    MissingParameter(MissingParameterError),
    /// A floating-point parameter that must be positive and finite
    PositiveFloat(PositiveFloatError),
    /// A malformed line within a report file
    ReportParse(ReportParseError),
    /// An invalid sampling fraction
    SampleFraction(SampleFractionError),
    /// Failure to construct the worker pool
    ThreadPool(rayon::ThreadPoolBuildError),
    /// An unrecognized name for an estimator or normalization
    UnknownName(UnknownNameError),
    /// A field with a zero mean that can't be normalized
    ZeroMeanField(ZeroMeanFieldError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that the catalog is structurally invalid
    pub(crate) fn catalog_format(location: String, what: &'static str) -> Self {
        Error {
            kind: ErrorKind::CatalogFormat(CatalogFormatError { location, what }),
        }
    }

    /// produce an error indicating that the catalog ended prematurely
    ///
    /// `source` is `None` when the reader reported a clean end-of-file
    pub(crate) fn catalog_truncated(location: String, source: Option<std::io::Error>) -> Self {
        Error {
            kind: ErrorKind::CatalogTruncated(CatalogTruncatedError { location, source }),
        }
    }

    /// produce an error indicating that the dtype of a field file can't be
    /// inferred from its size
    pub(crate) fn field_dtype(path: PathBuf, n_bytes: u64, n_points: usize) -> Self {
        Error {
            kind: ErrorKind::FieldDtype(FieldDtypeError {
                path,
                n_bytes,
                n_points,
            }),
        }
    }

    /// produce an error indicating that an integer lies outside the acceptable
    /// range of values
    pub(crate) fn integer_range(
        description: &'static str,
        actual: i64,
        min_val: i64,
        max_val: i64,
    ) -> Self {
        Error {
            kind: ErrorKind::IntegerRange(IntegerRangeError {
                description,
                actual,
                min_val,
                max_val,
            }),
        }
    }

    /// wraps an internal error string
    pub(crate) fn internal(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::Internal(InternalError(message)),
        }
    }

    /// produce an error describing a failed file operation
    pub(crate) fn io(path: PathBuf, action: &'static str, source: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(IoError {
                path,
                action,
                source,
                field_file: false,
            }),
        }
    }

    /// produce an error describing a failed operation on a field file
    pub(crate) fn field_io(path: PathBuf, action: &'static str, source: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(IoError {
                path,
                action,
                source,
                field_file: true,
            }),
        }
    }

    /// produce an error indicating that a required parameter wasn't specified
    pub(crate) fn missing_parameter(name: &'static str) -> Self {
        Error {
            kind: ErrorKind::MissingParameter(MissingParameterError { name }),
        }
    }

    /// produce an error indicating that a parameter isn't a positive, finite
    /// number
    pub(crate) fn positive_float(description: &'static str, actual: f64) -> Self {
        Error {
            kind: ErrorKind::PositiveFloat(PositiveFloatError {
                description,
                actual,
            }),
        }
    }

    /// produce an error indicating that a line of a report couldn't be parsed
    pub(crate) fn report_parse(line: usize, what: String) -> Self {
        Error {
            kind: ErrorKind::ReportParse(ReportParseError { line, what }),
        }
    }

    /// produce an error indicating an invalid sampling fraction
    pub(crate) fn sample_fraction(actual: f64) -> Self {
        Error {
            kind: ErrorKind::SampleFraction(SampleFractionError { actual }),
        }
    }

    pub(crate) fn thread_pool(err: rayon::ThreadPoolBuildError) -> Self {
        Error {
            kind: ErrorKind::ThreadPool(err),
        }
    }

    /// produce an error indicating that an unknown name was specified
    pub(crate) fn unknown_name(what: &'static str, actual: String, choices: Vec<String>) -> Self {
        Error {
            kind: ErrorKind::UnknownName(UnknownNameError {
                what,
                actual,
                choices,
            }),
        }
    }

    /// produce an error indicating that a field with a zero mean (but
    /// non-zero samples) can't be normalized
    pub(crate) fn zero_mean_field() -> Self {
        Error {
            kind: ErrorKind::ZeroMeanField(ZeroMeanFieldError),
        }
    }

    /// Returns whether the error only affects the current field file.
    ///
    /// A driver that processes several files can log these errors and move
    /// on to the next file. Failures involving the catalog, the configuration
    /// or an output report are never per-file.
    pub fn is_per_file(&self) -> bool {
        match self.kind {
            ErrorKind::ZeroMeanField(_) | ErrorKind::FieldDtype(_) => true,
            ErrorKind::Io(ref err) => err.field_file,
            _ => false,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            ErrorKind::CatalogTruncated(ref err) => err
                .source
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            ErrorKind::Io(ref err) => Some(&err.source),
            ErrorKind::ThreadPool(ref err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::CatalogFormat(ref err) => err.fmt(f),
            ErrorKind::CatalogTruncated(ref err) => err.fmt(f),
            ErrorKind::FieldDtype(ref err) => err.fmt(f),
            ErrorKind::IntegerRange(ref err) => err.fmt(f),
            ErrorKind::Internal(ref err) => err.fmt(f),
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::MissingParameter(ref err) => err.fmt(f),
            ErrorKind::PositiveFloat(ref err) => err.fmt(f),
            ErrorKind::ReportParse(ref err) => err.fmt(f),
            ErrorKind::SampleFraction(ref err) => err.fmt(f),
            ErrorKind::ThreadPool(ref err) => write!(f, "failed to build the thread pool: {err}"),
            ErrorKind::UnknownName(ref err) => err.fmt(f),
            ErrorKind::ZeroMeanField(ref err) => err.fmt(f),
        }
    }
}

#[derive(Debug)]
struct CatalogFormatError {
    location: String,
    what: &'static str,
}

impl core::fmt::Display for CatalogFormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "malformed catalog ({}): {}", self.location, self.what)
    }
}

#[derive(Debug)]
struct CatalogTruncatedError {
    // e.g. "n_primary of bin 2 of 5"
    location: String,
    source: Option<std::io::Error>,
}

impl core::fmt::Display for CatalogTruncatedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.source {
            Some(ref err) => write!(f, "failed to read {} from the catalog: {err}", self.location),
            None => write!(
                f,
                "the catalog ended while reading {}. It may still be being written",
                self.location
            ),
        }
    }
}

#[derive(Debug)]
struct FieldDtypeError {
    path: PathBuf,
    n_bytes: u64,
    n_points: usize,
}

impl core::fmt::Display for FieldDtypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} holds {} bytes, which is inconsistent with {} samples of either \
             4 or 8 bytes",
            self.path.display(),
            self.n_bytes,
            self.n_points
        )
    }
}

/// An error that occurs when an integer lies outside of the acceptable
/// range of values
#[derive(Debug)]
struct IntegerRangeError {
    description: &'static str,
    actual: i64,
    min_val: i64,
    max_val: i64,
}

impl core::fmt::Display for IntegerRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has a value of {}. The value should be no less than {} and \
             not exceed {}",
            self.description, self.actual, self.min_val, self.max_val
        )
    }
}

/// wraps the string errors from `corr3_nostd_internal`
struct InternalError(&'static str);

impl core::fmt::Display for InternalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::fmt::Debug for InternalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.0, f)
    }
}

#[derive(Debug)]
struct IoError {
    path: PathBuf,
    // e.g. "open", "read"
    action: &'static str,
    source: std::io::Error,
    field_file: bool,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "failed to {} {}: {}",
            self.action,
            self.path.display(),
            self.source
        )
    }
}

#[derive(Debug)]
struct MissingParameterError {
    name: &'static str,
}

impl core::fmt::Display for MissingParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "the {} parameter was never specified", self.name)
    }
}

#[derive(Debug)]
struct PositiveFloatError {
    description: &'static str,
    actual: f64,
}

impl core::fmt::Display for PositiveFloatError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has a value of {}. It must be positive and finite",
            self.description, self.actual
        )
    }
}

#[derive(Debug)]
struct ReportParseError {
    // 1-based
    line: usize,
    what: String,
}

impl core::fmt::Display for ReportParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "line {} of the report: {}", self.line, self.what)
    }
}

#[derive(Debug)]
struct SampleFractionError {
    actual: f64,
}

impl core::fmt::Display for SampleFractionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "the sampling fraction is {}. It must be positive",
            self.actual
        )
    }
}

/// An error occurs when an unknown estimator or normalization name is
/// specified
#[derive(Debug)]
struct UnknownNameError {
    // e.g. "estimator"
    what: &'static str,
    actual: String,
    choices: Vec<String>,
}

impl core::fmt::Display for UnknownNameError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{:?} is not a known {} name. Choices include: {:?}",
            self.actual, self.what, self.choices
        )
    }
}

#[derive(Debug)]
struct ZeroMeanFieldError;

impl core::fmt::Display for ZeroMeanFieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "the field has a mean of zero but holds non-zero samples, so it \
             can't be normalized"
        )
    }
}
