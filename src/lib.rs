mod error;
mod index;
mod name;
mod pairing;
mod progress;
pub mod stream;

pub use error::{
    Error, IndexError, PairError, Result, StreamError, EXIT_FORMAT_ERROR, EXIT_IO_ERROR,
    EXIT_PARAMS_ERROR,
};
pub use index::{
    IndexConfig, IndexConfigBuilder, IndexEntry, ReadNameIndex, Traverse, DEFAULT_BUCKETS,
};
pub use name::{read_name, strip_mate_suffix};
pub use pairing::{
    reconcile_paths, DrainTactic, PairPaths, PairedOutputs, PairingConfig, PairingConfigBuilder,
    PairingSummary, Reconciler, Strategy,
};
pub use progress::{ProgressLogger, DEFAULT_PROGRESS_INTERVAL};
pub use stream::{FastqReader, FastqRecord, FastqWriter};
