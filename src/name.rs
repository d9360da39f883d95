//! Read-name normalization
//!
//! Mates are matched across files by their *normalized* name: the record header up to
//! the first whitespace character, optionally with any trailing mate suffix (`/1`, `/2`)
//! removed. The same normalization must be applied to both inputs.

/// Returns the normalized read name for a FASTQ header (without the leading `@`)
///
/// # Arguments
///
/// * `head` - The full header line, excluding the `@` marker and the line terminator
/// * `strip` - Whether trailing mate suffixes should be removed
///
/// # Examples
///
/// ```
/// use matefilter::read_name;
///
/// assert_eq!(read_name(b"frag7/1 length=100", true), b"frag7");
/// assert_eq!(read_name(b"frag7/1 length=100", false), b"frag7/1");
/// assert_eq!(read_name(b"frag7 1:N:0:ATCACG", true), b"frag7");
/// ```
#[must_use]
pub fn read_name(head: &[u8], strip: bool) -> &[u8] {
    let end = memchr::memchr2(b' ', b'\t', head).unwrap_or(head.len());
    let name = &head[..end];
    if strip {
        strip_mate_suffix(name)
    } else {
        name
    }
}

/// Removes every trailing `/1` or `/2` from a read name
///
/// Suffixes are removed repeatedly, so applying this function to its own output is a no-op.
#[must_use]
pub fn strip_mate_suffix(mut name: &[u8]) -> &[u8] {
    while let [rest @ .., b'/', b'1' | b'2'] = name {
        name = rest;
    }
    name
}
