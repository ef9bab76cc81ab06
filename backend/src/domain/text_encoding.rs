//! Character encoding detection for CSV entries.
//!
//! Archives bundle files from different producers, so every entry is sniffed
//! on its own. Detection priority:
//! 1. BOM (byte order mark).
//! 2. Empty or pure-ASCII samples are treated as UTF-8.
//! 3. `chardetng` statistical guess, UTF-8 allowed.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Upper bound on the bytes inspected by [`detect_encoding`].
pub const ENCODING_SAMPLE_BYTES: usize = 10_000;

/// Raised when the content is malformed for the chosen encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content is not valid {encoding}")]
pub struct DecodeError {
    /// Name of the encoding that failed.
    pub encoding: &'static str,
}

/// Guess the encoding of `content` from at most [`ENCODING_SAMPLE_BYTES`].
///
/// # Examples
/// ```
/// use csvmerge::domain::detect_encoding;
///
/// assert_eq!(detect_encoding(b"id,val\n1,10\n").name(), "UTF-8");
/// assert_eq!(detect_encoding("名称,数量\n".as_bytes()).name(), "UTF-8");
/// ```
#[must_use]
pub fn detect_encoding(content: &[u8]) -> &'static Encoding {
    let sample = content.get(..ENCODING_SAMPLE_BYTES).unwrap_or(content);
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }
    if sample.is_ascii() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    // A truncated sample may end inside a multi-byte sequence.
    detector.feed(sample, sample.len() == content.len());
    detector.guess(None, true)
}

/// Decode `content` strictly, honouring and stripping any BOM.
///
/// Malformed sequences are an error rather than replacement characters so a
/// bad guess leads to the file being skipped, not to silently corrupted cells.
pub fn decode_strict<'a>(
    content: &'a [u8],
    encoding: &'static Encoding,
) -> Result<Cow<'a, str>, DecodeError> {
    let (encoding, body) = match Encoding::for_bom(content) {
        Some((bom_encoding, bom_len)) => (bom_encoding, content.get(bom_len..).unwrap_or_default()),
        None => (encoding, content),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(DecodeError {
            encoding: encoding.name(),
        })
}
