use std::path::PathBuf;

/// Custom Result type for matefilter operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status when no mates were found in the two inputs
pub const EXIT_FORMAT_ERROR: i32 = 1;
/// Exit status for invalid invocations (bad arguments, unopenable files)
pub const EXIT_PARAMS_ERROR: i32 = 2;
/// Exit status for I/O or parse failures after processing started
pub const EXIT_IO_ERROR: i32 = 3;

/// The main error type for the matefilter library, encompassing all possible error cases
/// that can occur while indexing and reconciling paired record files.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors raised while reading or writing record streams
    StreamError(#[from] StreamError),
    /// Errors raised by the read-name index
    IndexError(#[from] IndexError),
    /// Errors raised by the pair reconciliation controller
    PairError(#[from] PairError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
}
impl Error {
    /// Process exit status for this error
    ///
    /// Open/create failures and a bad index size are invocation errors. A run without any
    /// pairs is a format-assumption failure; everything else is a mid-run I/O failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StreamError(StreamError::Open { .. } | StreamError::Create { .. })
            | Self::IndexError(IndexError::InvalidBucketCount(_)) => EXIT_PARAMS_ERROR,
            Self::PairError(PairError::NoPairs { .. }) => EXIT_FORMAT_ERROR,
            _ => EXIT_IO_ERROR,
        }
    }
}

/// Errors that can occur while reading or writing FASTQ record streams
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// An input file could not be opened for reading
    #[error("Unable to open {} for reading: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An output file could not be created
    #[error("Unable to create output file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record header line did not begin with `@`
    ///
    /// # Fields
    /// * `stream` - Label of the offending stream
    /// * `line` - 1-based line number of the header line
    #[error("{stream}: expected '@' at the start of line {line}")]
    MissingHeaderMarker { stream: String, line: u64 },

    /// The third line of a record did not begin with `+`
    #[error("{stream}: expected '+' at the start of line {line}")]
    MissingSeparator { stream: String, line: u64 },

    /// The stream ended in the middle of a record
    #[error("{stream}: truncated record starting at line {line}")]
    Truncated { stream: String, line: u64 },

    /// Sequence and quality lines have different lengths
    #[error("{stream}: sequence length ({seq}) does not match quality length ({qual}) for record at line {line}")]
    LengthMismatch {
        stream: String,
        line: u64,
        seq: usize,
        qual: usize,
    },

    /// No record starts at the requested byte offset
    ///
    /// # Arguments
    /// * `u64` - The decompressed byte offset that was requested
    #[error("No record starts at byte offset {0}")]
    NotARecordStart(u64),
}

/// Errors specific to the read-name index
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The bucket table must hold at least one bucket
    #[error("Invalid bucket count: {0}")]
    InvalidBucketCount(usize),

    /// The slot arena cannot address any more entries
    ///
    /// # Arguments
    /// * `usize` - The number of slots in use when the limit was hit
    #[error("Read-name index is full ({0} slots in use)")]
    CapacityExhausted(usize),
}

/// Errors raised while reconciling two record files
#[derive(thiserror::Error, Debug)]
pub enum PairError {
    /// Not a single mate was found; the two inputs almost certainly use
    /// different read-name conventions
    #[error("0 paired reads between {first} and {second} records - are the headers ok?")]
    NoPairs { first: u64, second: u64 },

    /// The re-scan of the indexed file ended before every residual entry was seen
    #[error("Indexed file ended with {0} unpaired records still pending")]
    DrainIncomplete(usize),

    /// The output record counts do not account for every input record
    #[error(
        "Record accounting failed: paired1={paired1} paired2={paired2} unpaired={unpaired}, expected {expected_paired} pairs and {expected_unpaired} unpaired"
    )]
    Unbalanced {
        paired1: u64,
        paired2: u64,
        unpaired: u64,
        expected_paired: u64,
        expected_unpaired: u64,
    },
}
