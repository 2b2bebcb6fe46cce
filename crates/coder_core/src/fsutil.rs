//! Small filesystem helpers shared by the config and job snapshot writers.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling path used while a file is being replaced (`<name>.tmp`).
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents` so readers see either the old or the new
/// file, never a partial one.
///
/// Creates the parent folder if needed. The temp file lives next to the
/// target so the final rename stays on one filesystem.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path_for(path);
    let result = write_synced(&temp, contents).and_then(|()| fs::rename(&temp, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_path_keeps_full_name() {
        assert_eq!(
            temp_path_for(Path::new("/data/jobs.json")),
            PathBuf::from("/data/jobs.json.tmp")
        );
    }

    #[test]
    fn write_atomic_replaces_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        // A directory in the way makes the rename fail after the temp file is written
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("child"), b"x").unwrap();

        assert!(write_atomic(&path, b"data").is_err());
        assert!(!temp_path_for(&path).exists());
        assert!(path.is_dir());
    }
}
