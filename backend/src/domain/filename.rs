//! Archive entry name repair.
//!
//! ZIP entries without the UTF-8 flag carry names in whatever code page the
//! producing tool used. Readers conventionally decode those bytes as CP437,
//! which garbles names written by tools on, for example, Chinese Windows
//! systems. Repair decodes the raw bytes with a configurable legacy encoding
//! instead and never fails: undecodable names fall back to UTF-8 with the
//! invalid sequences dropped.

use encoding_rs::Encoding;

/// Default legacy encoding applied to names without the UTF-8 flag.
pub const DEFAULT_LEGACY_FILENAME_ENCODING: &str = "GBK";

/// Raised when a configured encoding label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filename encoding label {label:?}")]
pub struct UnknownEncodingError {
    /// Label as configured.
    pub label: String,
}

/// Decodes stored entry names into readable logical paths.
///
/// # Examples
/// ```
/// use csvmerge::domain::FilenameDecoder;
///
/// let decoder = FilenameDecoder::new("GBK").expect("GBK is a known label");
/// // "一月.csv" as stored by a GBK system.
/// let raw = [0xD2, 0xBB, 0xD4, 0xC2, b'.', b'c', b's', b'v'];
/// assert_eq!(decoder.repair(&raw, false), "一月.csv");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FilenameDecoder {
    legacy: &'static Encoding,
}

impl Default for FilenameDecoder {
    fn default() -> Self {
        Self {
            legacy: encoding_rs::GBK,
        }
    }
}

impl FilenameDecoder {
    /// Build a decoder for a WHATWG encoding label such as `GBK` or `Shift_JIS`.
    pub fn new(label: &str) -> Result<Self, UnknownEncodingError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(|legacy| Self { legacy })
            .ok_or_else(|| UnknownEncodingError {
                label: label.to_owned(),
            })
    }

    /// Name of the legacy encoding in use.
    #[must_use]
    pub fn legacy_encoding(&self) -> &'static str {
        self.legacy.name()
    }

    /// Decode a stored name.
    #[must_use]
    pub fn repair(&self, raw: &[u8], declared_utf8: bool) -> String {
        if raw.is_ascii() {
            return raw.iter().map(|&byte| char::from(byte)).collect();
        }
        if declared_utf8 {
            return utf8_dropping_invalid(raw);
        }
        self.legacy
            .decode_without_bom_handling_and_without_replacement(raw)
            .map_or_else(|| utf8_dropping_invalid(raw), |decoded| decoded.into_owned())
    }
}

fn utf8_dropping_invalid(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Normalise a repaired name into a relative `/`-separated path.
///
/// Backslashes become separators; empty, `.` and `..` segments are dropped,
/// which also strips leading roots. Returns `None` when nothing remains.
///
/// # Examples
/// ```
/// use csvmerge::domain::sanitize_entry_path;
///
/// assert_eq!(sanitize_entry_path("../../q1\\jan.csv").as_deref(), Some("q1/jan.csv"));
/// assert_eq!(sanitize_entry_path("/./"), None);
/// ```
#[must_use]
pub fn sanitize_entry_path(name: &str) -> Option<String> {
    let normalised = name.replace('\\', "/");
    let segments: Vec<&str> = normalised
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// File stem used as the provenance label: base name minus its last extension.
///
/// # Examples
/// ```
/// use csvmerge::domain::label_for_path;
///
/// assert_eq!(label_for_path("2024/jan.csv"), "jan");
/// assert_eq!(label_for_path("report.v2.csv"), "report.v2");
/// ```
#[must_use]
pub fn label_for_path(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    // Leading dots belong to the name, not the extension.
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    match base.rfind('.') {
        Some(dot) if dot >= leading_dots => base.get(..dot).unwrap_or(base).to_owned(),
        _ => base.to_owned(),
    }
}
