//! Record streams over FASTQ files
//!
//! This module provides the reader and writer the reconciliation works against:
//! forward scanning with byte-offset recall, rewinding, quick copies of a record
//! at a known offset, and counted, optionally compressed, outputs.

mod reader;
mod source;
mod writer;

pub use reader::{FastqReader, FastqRecord};
pub use source::{ReplayDecoder, Source};
pub use writer::{compression_level, format_for_path, FastqWriter, DEFAULT_COMPRESSION_LEVEL};
