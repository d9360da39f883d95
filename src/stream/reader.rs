//! FASTQ reader with byte-offset recall
//!
//! Records are parsed by `seq_io` over a seekable [`Source`]. Every record is reported
//! together with the decompressed byte offset of its header line. That offset can later
//! be handed back to [`FastqReader::copy_record_at`] to transfer the record's raw bytes
//! into an output without going through the sequential scan.

use std::{io::Write, path::Path};

use seq_io::fastq::{self, Position, Record};

use super::{source::Source, FastqWriter};
use crate::{
    error::{Error, Result, StreamError},
    name::read_name,
};

/// Capacity of the parser buffer in front of the byte source
const BUFFER_CAPACITY: usize = 1 << 16;

/// A borrowed view of one FASTQ record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastqRecord<'a> {
    head: &'a [u8],
    seq: &'a [u8],
    qual: &'a [u8],
    offset: u64,
}
impl<'a> FastqRecord<'a> {
    /// Header line without the `@` marker and line terminator
    #[must_use]
    pub fn head(&self) -> &'a [u8] {
        self.head
    }

    #[must_use]
    pub fn seq(&self) -> &'a [u8] {
        self.seq
    }

    #[must_use]
    pub fn qual(&self) -> &'a [u8] {
        self.qual
    }

    /// Decompressed byte offset of the header line within the source
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Normalized read name used to match mates across files
    #[must_use]
    pub fn name(&self, strip_mate_suffix: bool) -> &'a [u8] {
        read_name(self.head, strip_mate_suffix)
    }
}

/// Field buffers of the record currently held by the reader
#[derive(Debug, Default)]
struct RecordBuf {
    head: Vec<u8>,
    seq: Vec<u8>,
    qual: Vec<u8>,
}
impl RecordBuf {
    fn fill(&mut self, record: &fastq::RefRecord<'_>) {
        for (buf, field) in [
            (&mut self.head, record.head()),
            (&mut self.seq, record.seq()),
            (&mut self.qual, record.qual()),
        ] {
            buf.clear();
            buf.extend_from_slice(field);
        }
    }
}

/// Converts a `seq_io` failure into a stream error naming `stream`
fn parse_error(stream: &str, err: fastq::Error) -> Error {
    let stream = stream.to_string();
    match err {
        fastq::Error::Io(e) => e.into(),
        fastq::Error::InvalidStart { pos, .. } => StreamError::MissingHeaderMarker {
            stream,
            line: pos.line,
        }
        .into(),
        fastq::Error::InvalidSep { pos, .. } => StreamError::MissingSeparator {
            stream,
            line: pos.line,
        }
        .into(),
        fastq::Error::UnexpectedEnd { pos } => StreamError::Truncated {
            stream,
            line: pos.line,
        }
        .into(),
        fastq::Error::UnequalLengths { seq, qual, pos } => StreamError::LengthMismatch {
            stream,
            line: pos.line,
            seq,
            qual,
        }
        .into(),
        fastq::Error::BufferLimit => std::io::Error::other(fastq::Error::BufferLimit).into(),
    }
}

/// A forward FASTQ reader that can rewind and recall records by offset
pub struct FastqReader {
    /// Label used in log and error messages (usually the file path)
    label: String,
    inner: fastq::Reader<Source>,
    compressed: bool,
    buf: RecordBuf,
    /// Raw bytes of the last quick-copied record
    raw: Vec<u8>,
}
impl FastqReader {
    /// Opens a plain or compressed FASTQ file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (source, _format) = Source::open(path).map_err(|source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), source))
    }

    /// Reads FASTQ records from an uncompressed in-memory buffer
    #[must_use]
    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(label.into(), Source::from_bytes(bytes))
    }

    fn new(label: String, source: Source) -> Self {
        Self {
            label,
            compressed: source.is_compressed(),
            inner: fastq::Reader::with_capacity(source, BUFFER_CAPACITY),
            buf: RecordBuf::default(),
            raw: Vec::new(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether random access requires replaying decompression
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Repositions the reader to the start of the stream
    pub fn rewind(&mut self) -> Result<()> {
        self.inner
            .seek(&Position::new(1, 0))
            .map_err(|e| parse_error(&self.label, e))
    }

    /// Reads the next record, returning `None` at the end of the stream
    ///
    /// Line terminators may be `\n` or `\r\n`; up to three trailing blank lines are
    /// tolerated at the end of the input.
    pub fn next_record(&mut self) -> Result<Option<FastqRecord<'_>>> {
        match self.inner.next() {
            None => return Ok(None),
            Some(Ok(record)) => self.buf.fill(&record),
            Some(Err(e)) => return Err(parse_error(&self.label, e)),
        }
        Ok(Some(FastqRecord {
            head: &self.buf.head,
            seq: &self.buf.seq,
            qual: &self.buf.qual,
            offset: self.inner.position().byte(),
        }))
    }

    /// Copies the record starting at `offset` into `dest`
    ///
    /// The header, sequence, separator and quality lines are transferred as stored,
    /// with line terminators normalized to `\n`. The offset must come from this same,
    /// unmodified stream. The reader is left positioned after the copied record, so
    /// sequential reading must [`rewind`](Self::rewind) first.
    pub fn copy_record_at<W: Write>(
        &mut self,
        offset: u64,
        dest: &mut FastqWriter<W>,
    ) -> Result<()> {
        self.inner
            .seek(&Position::new(0, offset))
            .map_err(|e| parse_error(&self.label, e))?;
        let record = match self.inner.next() {
            Some(Ok(record)) => record,
            Some(Err(fastq::Error::Io(e))) => return Err(e.into()),
            Some(Err(_)) | None => return Err(StreamError::NotARecordStart(offset).into()),
        };
        self.raw.clear();
        record.write_unchanged(&mut self.raw)?;
        dest.write_raw(&self.raw)
    }
}
