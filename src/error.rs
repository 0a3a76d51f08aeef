//! Error type of the `vareon` library.
//!
//! The CLI and server entry points wrap these into `anyhow::Error`; the library
//! functions return them directly so callers can tell client errors (bad input)
//! from upstream failures.

use thiserror::Error;

/// Errors raised by sequence retrieval, scoring, classification and calibration.
#[derive(Debug, Error)]
pub enum Error {
    /// The sequence service answered with a non-success status code.
    #[error("Failed to fetch genome sequence from UCSC API: {status}")]
    Service {
        /// HTTP status code returned by the service.
        status: u16,
    },
    /// The sequence service answered without sequence data.
    #[error("UCSC API Error: {0}")]
    Api(String),
    /// The local reference does not hold the requested chromosome.
    #[error("chromosome {requested} not available, reference holds {available}")]
    ChromosomeNotAvailable {
        /// Chromosome name from the request.
        requested: String,
        /// Name of the loaded record.
        available: String,
    },
    /// The requested position does not fall into the fetched window.
    #[error("Variant position {position} is outside the fetched window (start = {start}, end = {end})")]
    PositionOutOfWindow {
        /// 1-based position of the variant.
        position: u64,
        /// 1-based first position of the window.
        start: u64,
        /// 1-based last position of the window.
        end: u64,
    },
    /// The window base at the variant position differs from the declared reference.
    #[error("reference mismatch at position {position}: expected {expected}, found {found}")]
    ReferenceMismatch {
        /// Position of the mismatch (1-based genomic, or 0-based window offset in batch mode).
        position: u64,
        /// The declared reference base.
        expected: char,
        /// The base found in the sequence window.
        found: char,
    },
    /// An allele that is not a single nucleotide.
    #[error("invalid base {0:?}, expected a single nucleotide of A, C, G, T")]
    InvalidBase(String),
    /// Offset into a sequence window out of range.
    #[error("offset {offset} out of range for window of length {len}")]
    OffsetOutOfRange {
        /// Requested 0-based offset.
        offset: usize,
        /// Length of the window.
        len: usize,
    },
    /// The external likelihood scorer failed or returned malformed data.
    #[error("scorer error: {0}")]
    Scorer(String),
    /// The calibration could not be fit from the given data.
    #[error("calibration error: {0}")]
    Calibration(String),
    /// A labeled variant table could not be read.
    #[error("invalid labeled variant table: {0}")]
    LabelTable(String),
    /// Transport-level HTTP failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON (de-)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than an upstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::PositionOutOfWindow { .. }
                | Error::ChromosomeNotAvailable { .. }
                | Error::ReferenceMismatch { .. }
                | Error::InvalidBase(_)
                | Error::OffsetOutOfRange { .. }
        )
    }
}

/// Result type alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
