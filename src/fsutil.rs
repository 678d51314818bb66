//! Small filesystem helpers shared by the state-directory writers.

use std::io::Write;
use std::path::Path;

use crate::error::{Result, SboToolkitError};

/// What: Write a file atomically via write-temp-then-rename.
///
/// Inputs:
/// - `path`: Final destination; its parent directory must exist.
/// - `contents`: Full file contents.
///
/// Details:
/// - The temp file is created in the destination directory so the rename
///   stays on one filesystem; a failed rename removes the temp file.
///
/// # Errors
///
/// Returns `Io` when the temp file cannot be created, written, or renamed
/// into place.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SboToolkitError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| SboToolkitError::io(tmp.path().to_path_buf(), e))?;
    tmp.persist(path)
        .map_err(|e| SboToolkitError::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PKGDB");

        write_atomic(&path, "first\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\n");

        write_atomic(&path, "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");

        // No stray temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
