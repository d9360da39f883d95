//! FASTQ record writer
//!
//! Output compression is chosen from the file extension; everything else is written as
//! plain text. Writers count the records they emit so that the reconciliation can check
//! its accounting against what actually reached each output.

use std::{
    cell::RefCell,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    rc::Rc,
};

use niffler::{Format, Level};

use super::FastqRecord;
use crate::error::{Result, StreamError};

/// Compression level used when none is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 3;

/// Picks an output compression format from the extension of `path`
#[must_use]
pub fn format_for_path(path: &Path) -> Format {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz" | "bgz") => Format::Gzip,
        Some("bz2") => Format::Bzip,
        Some("xz" | "lzma") => Format::Lzma,
        Some("zst") => Format::Zstd,
        _ => Format::No,
    }
}

/// Maps a numeric level onto niffler's levels, clamped to `1..=9`
#[must_use]
pub fn compression_level(level: u32) -> Level {
    match level {
        0 | 1 => Level::One,
        2 => Level::Two,
        3 => Level::Three,
        4 => Level::Four,
        5 => Level::Five,
        6 => Level::Six,
        7 => Level::Seven,
        8 => Level::Eight,
        _ => Level::Nine,
    }
}

/// First write failure seen below a compression encoder
type Failure = Rc<RefCell<Option<io::Error>>>;

/// Remembers the first error of the wrapped writer
///
/// Encoders write their trailer when dropped and discard any error doing so. Sitting
/// underneath them, this wrapper keeps that error for [`FastqWriter::finish`].
struct TrackedWrite<T> {
    inner: T,
    failure: Failure,
}
impl<T: Write> TrackedWrite<T> {
    fn record<R>(&self, result: io::Result<R>) -> io::Result<R> {
        if let Err(e) = &result {
            let mut failure = self.failure.borrow_mut();
            if failure.is_none() {
                *failure = Some(io::Error::new(e.kind(), e.to_string()));
            }
        }
        result
    }
}
impl<T: Write> Write for TrackedWrite<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        self.record(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.inner.flush();
        self.record(result)
    }
}

/// Append-only FASTQ output that counts emitted records
pub struct FastqWriter<W: Write> {
    inner: W,
    records: u64,
    failure: Option<Failure>,
}
impl FastqWriter<Box<dyn Write>> {
    /// Creates (or truncates) an output file, compressing according to its extension
    pub fn to_path<P: AsRef<Path>>(path: P, level: u32) -> Result<Self> {
        let path = path.as_ref();
        let create_error = |source| StreamError::Create {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(create_error)?;
        Self::encoded(file, format_for_path(path), level)
            .map_err(|e| create_error(io::Error::other(e)).into())
    }

    /// Buffers and encodes `out` in `format`, tracking failures of `out` itself
    fn encoded<T: Write + 'static>(
        out: T,
        format: Format,
        level: u32,
    ) -> std::result::Result<Self, niffler::Error> {
        let failure = Failure::default();
        let tracked = TrackedWrite {
            inner: out,
            failure: Rc::clone(&failure),
        };
        let inner = niffler::get_writer(
            Box::new(BufWriter::new(tracked)),
            format,
            compression_level(level),
        )?;
        Ok(Self {
            inner,
            records: 0,
            failure: Some(failure),
        })
    }
}
impl<W: Write> FastqWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records: 0,
            failure: None,
        }
    }

    /// Writes a parsed record in canonical four-line form
    pub fn write_record(&mut self, record: &FastqRecord<'_>) -> Result<()> {
        seq_io::fastq::write_to(&mut self.inner, record.head(), record.seq(), record.qual())?;
        self.records += 1;
        Ok(())
    }

    /// Writes one record as stored, normalizing line terminators to `\n`
    pub(crate) fn write_raw(&mut self, raw: &[u8]) -> Result<()> {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        for line in raw.split(|&b| b == b'\n') {
            self.inner.write_all(line.strip_suffix(b"\r").unwrap_or(line))?;
            self.inner.write_all(b"\n")?;
        }
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Flushes and closes the output
    ///
    /// Errors raised while an encoder writes its trailer on close are reported here.
    pub fn finish(mut self) -> Result<()> {
        self.flush()?;
        drop(self.inner);
        match self.failure.and_then(|failure| failure.take()) {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
