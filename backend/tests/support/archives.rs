//! Archive builders shared by the HTTP integration suites.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build a deflated archive; names ending in `/` become directories.
pub(crate) fn zip_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .expect("add directory");
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(contents).expect("write contents");
        }
    }
    writer.finish().expect("finish archive").into_inner()
}

/// Build a single-entry stored archive whose name bytes are written as-is,
/// without the UTF-8 flag.
///
/// Mirrors `stored_zip` in `src/outbound/zip_archive/reader.rs` with
/// `flags = 0`. Integration tests cannot reach that `#[cfg(test)]` helper, so
/// keep the two layouts in step.
pub(crate) fn legacy_named_zip(raw_name: &[u8], contents: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(contents);
    let size = u32::try_from(contents.len()).expect("small fixture");
    let name_len = u16::try_from(raw_name.len()).expect("short name");
    let dos_date: u16 = 0x0021;

    let mut local = Vec::new();
    local.extend_from_slice(&0x0403_4b50_u32.to_le_bytes());
    for field in [20_u16, 0, 0, 0, dos_date] {
        local.extend_from_slice(&field.to_le_bytes());
    }
    for field in [crc, size, size] {
        local.extend_from_slice(&field.to_le_bytes());
    }
    local.extend_from_slice(&name_len.to_le_bytes());
    local.extend_from_slice(&0_u16.to_le_bytes());
    local.extend_from_slice(raw_name);
    local.extend_from_slice(contents);

    let mut central = Vec::new();
    central.extend_from_slice(&0x0201_4b50_u32.to_le_bytes());
    for field in [20_u16, 20, 0, 0, 0, dos_date] {
        central.extend_from_slice(&field.to_le_bytes());
    }
    for field in [crc, size, size] {
        central.extend_from_slice(&field.to_le_bytes());
    }
    for field in [name_len, 0, 0, 0, 0] {
        central.extend_from_slice(&field.to_le_bytes());
    }
    central.extend_from_slice(&0_u32.to_le_bytes());
    central.extend_from_slice(&0_u32.to_le_bytes());
    central.extend_from_slice(raw_name);

    let central_offset = u32::try_from(local.len()).expect("small fixture");
    let central_size = u32::try_from(central.len()).expect("small fixture");
    let mut archive = local;
    archive.extend_from_slice(&central);
    archive.extend_from_slice(&0x0605_4b50_u32.to_le_bytes());
    for field in [0_u16, 0, 1, 1] {
        archive.extend_from_slice(&field.to_le_bytes());
    }
    archive.extend_from_slice(&central_size.to_le_bytes());
    archive.extend_from_slice(&central_offset.to_le_bytes());
    archive.extend_from_slice(&0_u16.to_le_bytes());
    archive
}
