//! Seekable byte sources over plain or compressed files
//!
//! Plain files seek natively. Compressed files are decoded through `niffler` and seek by
//! decompressing forward, reopening the file first when the target lies behind the
//! current position. All offsets refer to the decompressed byte stream.

use std::{
    fs::File,
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use niffler::Format;

/// Shortest file niffler can sniff a compression format from
const MIN_SNIFF_BYTES: u64 = 5;

/// Converts a niffler failure into an I/O error
fn niffler_to_io(err: niffler::Error) -> io::Error {
    match err {
        niffler::Error::IOError(e) => e,
        other => io::Error::other(other),
    }
}

/// A byte source that supports absolute seeks in decompressed coordinates
pub enum Source {
    /// Uncompressed file on disk
    Plain(File),
    /// Compressed file decoded on the fly
    Compressed(ReplayDecoder),
    /// In-memory uncompressed data
    Memory(Cursor<Vec<u8>>),
}
impl Source {
    /// Opens a file, detecting its compression format from the magic bytes
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<(Self, Format)> {
        let path = path.as_ref();
        if std::fs::metadata(path)?.len() < MIN_SNIFF_BYTES {
            return Ok((Self::Plain(File::open(path)?), Format::No));
        }
        let (decoder, format) = niffler::from_path(path).map_err(niffler_to_io)?;
        if matches!(format, Format::No) {
            // Reopen without the sniffing wrapper so that seeks go straight to the file
            drop(decoder);
            return Ok((Self::Plain(File::open(path)?), format));
        }
        let source = Self::Compressed(ReplayDecoder {
            path: path.to_path_buf(),
            inner: decoder,
            pos: 0,
        });
        Ok((source, format))
    }

    /// Wraps an in-memory buffer
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Memory(Cursor::new(bytes))
    }

    /// Whether seeking backwards requires decompressing from the start of the file
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}
impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(file) => file.read(buf),
            Self::Compressed(decoder) => decoder.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}
impl Seek for Source {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Plain(file) => file.seek(pos),
            Self::Compressed(decoder) => decoder.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

/// A decompressing reader that emulates random access by replaying the stream
pub struct ReplayDecoder {
    /// Path of the compressed file, needed to restart decompression
    path: PathBuf,
    /// Active decoder
    inner: Box<dyn Read>,
    /// Number of decompressed bytes consumed from `inner`
    pos: u64,
}
impl ReplayDecoder {
    fn reopen(&mut self) -> io::Result<()> {
        let (decoder, _format) = niffler::from_path(&self.path).map_err(niffler_to_io)?;
        self.inner = decoder;
        self.pos = 0;
        Ok(())
    }
}
impl Read for ReplayDecoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}
impl Seek for ReplayDecoder {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(target) => target,
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
            })?,
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "cannot seek relative to the end of a compressed stream",
                ))
            }
        };
        if target < self.pos {
            self.reopen()?;
        }
        let gap = target - self.pos;
        let skipped = io::copy(&mut (&mut self.inner).take(gap), &mut io::sink())?;
        self.pos += skipped;
        if skipped < gap {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek to byte {target} past end of decompressed stream"),
            ));
        }
        Ok(self.pos)
    }
}
