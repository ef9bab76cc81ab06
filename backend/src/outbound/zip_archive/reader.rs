//! `zip`-backed archive reader.

use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::domain::ports::{ArchiveEntry, ArchiveReader, ArchiveReaderError};

const PREALLOCATE_LIMIT: usize = 1 << 20;

/// Default cap on the decompressed size of one archive's entries.
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 1 << 30;

/// Reads ZIP archives held in memory.
///
/// Decompressed output is bounded by `max_extracted_bytes` across all entries
/// of one archive, whatever sizes the headers declare.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiveReader {
    max_extracted_bytes: u64,
}

impl Default for ZipArchiveReader {
    fn default() -> Self {
        Self {
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }
}

impl ZipArchiveReader {
    /// Create a reader with the default decompression cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the decompression cap.
    #[must_use]
    pub fn with_max_extracted_bytes(mut self, max_extracted_bytes: u64) -> Self {
        self.max_extracted_bytes = max_extracted_bytes;
        self
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn read_entries(&self, archive: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveReaderError> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(map_open_error)?;

        let mut entries = Vec::with_capacity(zip.len());
        let mut remaining = self.max_extracted_bytes;
        for index in 0..zip.len() {
            let (raw_name, name_is_utf8, is_dir) = {
                let file = zip.by_index_raw(index).map_err(|err| {
                    ArchiveReaderError::read(format!("#{index}"), err.to_string())
                })?;
                let raw_name = file.name_raw().to_vec();
                if file.encrypted() {
                    return Err(ArchiveReaderError::encrypted(
                        String::from_utf8_lossy(&raw_name).into_owned(),
                    ));
                }
                // The reader decodes names without the UTF-8 flag as CP437, so
                // a name declared as UTF-8 is exactly its raw bytes.
                let name_is_utf8 =
                    std::str::from_utf8(&raw_name).is_ok_and(|raw| raw == file.name());
                (raw_name, name_is_utf8, file.is_dir())
            };

            let contents = if is_dir {
                Vec::new()
            } else {
                let display = String::from_utf8_lossy(&raw_name).into_owned();
                let mut file = zip
                    .by_index(index)
                    .map_err(|err| ArchiveReaderError::read(display.clone(), err.to_string()))?;
                // Declared sizes are untrusted; cap the up-front allocation.
                let declared = usize::try_from(file.size()).unwrap_or(0);
                let mut contents = Vec::with_capacity(declared.min(PREALLOCATE_LIMIT));
                let read = (&mut file)
                    .take(remaining.saturating_add(1))
                    .read_to_end(&mut contents)
                    .map_err(|err| ArchiveReaderError::read(display.clone(), err.to_string()))?;
                let read = u64::try_from(read).unwrap_or(u64::MAX);
                if read > remaining {
                    return Err(ArchiveReaderError::read(
                        display,
                        format!(
                            "decompressed size exceeds {} bytes",
                            self.max_extracted_bytes
                        ),
                    ));
                }
                remaining -= read;
                contents
            };

            entries.push(ArchiveEntry {
                raw_name,
                name_is_utf8,
                is_dir,
                contents,
            });
        }
        Ok(entries)
    }
}

fn map_open_error(error: ZipError) -> ArchiveReaderError {
    ArchiveReaderError::malformed(error.to_string())
}
