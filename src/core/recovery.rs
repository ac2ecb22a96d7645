//! Recovery snapshot files kept in a flat directory

use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use walkdir::WalkDir;

use super::error::{StoreError, StoreResult};

/// Suffix appended to the sanitized document path
pub const RECOVERY_SUFFIX: &str = ".recovery";

/// Flatten a document path into a file name: separators and drive colons become `_`
pub fn sanitize(document_path: &Path) -> String {
    document_path
        .to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

/// Best-effort inverse of [`sanitize`].
///
/// An underscore becomes a separator only when the path built so far names
/// an existing directory, so underscores inside real file names survive as
/// long as the directories on the way still exist.
pub fn unsanitize(name: &str) -> PathBuf {
    let mut pieces = name.split('_');
    let mut rebuilt = pieces.next().unwrap_or_default().to_string();

    for piece in pieces {
        if rebuilt.is_empty() {
            rebuilt.push(MAIN_SEPARATOR);
        } else if Path::new(&rebuilt).is_dir() {
            if !rebuilt.ends_with(MAIN_SEPARATOR) {
                rebuilt.push(MAIN_SEPARATOR);
            }
        } else {
            rebuilt.push('_');
        }
        rebuilt.push_str(piece);
    }

    PathBuf::from(rebuilt)
}

/// `<recovery_dir>/<sanitized>.recovery`
pub fn snapshot_path(recovery_dir: &Path, document_path: &Path) -> PathBuf {
    recovery_dir.join(format!("{}{}", sanitize(document_path), RECOVERY_SUFFIX))
}

/// Write `content` as the snapshot, creating the directory if needed
pub fn write_snapshot(recovery_dir: &Path, document_path: &Path, content: &str) -> StoreResult<PathBuf> {
    fs::create_dir_all(recovery_dir).map_err(|e| StoreError::io(recovery_dir, e))?;

    let path = snapshot_path(recovery_dir, document_path);
    fs::write(&path, content).map_err(|e| StoreError::io(&path, e))?;
    Ok(path)
}

pub fn read_snapshot(recovery_dir: &Path, document_path: &Path) -> StoreResult<String> {
    let path = snapshot_path(recovery_dir, document_path);
    fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))
}

/// Delete the snapshot; a missing file is not an error
pub fn remove_snapshot(recovery_dir: &Path, document_path: &Path) -> StoreResult<()> {
    let path = snapshot_path(recovery_dir, document_path);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(&path, e)),
    }
}

/// Document paths of every snapshot in the directory, sorted
pub fn list_snapshots(recovery_dir: &Path) -> Vec<PathBuf> {
    if !recovery_dir.is_dir() {
        return Vec::new();
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(recovery_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.strip_suffix(RECOVERY_SUFFIX)
                .filter(|stem| !stem.is_empty())
                .map(unsanitize)
        })
        .collect();
    paths.sort();
    paths
}
