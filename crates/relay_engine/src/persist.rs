use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("parent directory missing or not writable: {0}")]
    Dir(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Directory that will hold `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Replace `path` with `content` by writing a sibling temp file, syncing it, then renaming.
///
/// Readers observe either the old or the new content, never a partial write.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), PersistError> {
    let dir = parent_dir(path);
    let meta = fs::metadata(&dir).map_err(|e| PersistError::Dir(e.to_string()))?;
    if !meta.is_dir() {
        return Err(PersistError::Dir(format!("{} is not a directory", dir.display())));
    }

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

/// Serialize as JSON indented with four spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Serialize `value` as four-space JSON and write it atomically to `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), PersistError> {
    let content = to_pretty_json(value)?;
    write_atomic(path, &content)
}
