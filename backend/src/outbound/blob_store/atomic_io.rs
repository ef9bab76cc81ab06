//! Atomic file replacement inside a capability directory.
//!
//! Contents are written to a hidden temporary sibling, synced, then renamed
//! over the target so readers never observe a partial file.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` in `dir` with `contents`.
///
/// `file_name` must be a single path component.
pub(super) fn write_atomic(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    if file_name.is_empty() || file_name.contains('/') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{file_name:?} is not a single file name"),
        ));
    }
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(
        ".{file_name}.tmp.{}.{suffix}.{counter}",
        std::process::id()
    );

    write_to_temp_file(dir, &tmp_name, contents)?;
    if let Err(err) = rename_temp_to_target(dir, &tmp_name, file_name) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    sync_directory(dir);
    Ok(())
}

fn write_to_temp_file(dir: &Dir, tmp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;

    if let Err(err) = file.write_all(contents).and_then(|()| file.sync_all()) {
        drop(file);
        drop(dir.remove_file(tmp_name));
        return Err(err);
    }
    Ok(())
}

#[cfg(windows)]
fn rename_temp_to_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists, so remove it first.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn rename_temp_to_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Best effort; the rename itself already succeeded.
    }
}
