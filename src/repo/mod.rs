//! Repository scanner and `.info` metadata readers.
//!
//! The on-disk repository is laid out two levels deep as
//! `<root>/<category>/<package>`, each package directory carrying a
//! `<package>.info` descriptor with shell-style `VERSION="…"` and
//! `REQUIRES="…"` fields plus a `README`. The scanner turns that layout into
//! catalog [`Package`] records; the field readers are also used on their own
//! by the review display and `check-updates`.

use std::fs;
use std::path::Path;

use crate::error::{Result, SboToolkitError};
use crate::types::Package;

/// What: Extract a shell-quoted field value from `.info` file contents.
///
/// Inputs:
/// - `contents`: Full text of the `.info` file.
/// - `field`: Field name without decoration (e.g. `REQUIRES`).
///
/// Output:
/// - Returns `Some(value)` with continuations collapsed, `None` when the
///   field is absent or unterminated.
///
/// Details:
/// - The value is everything between the double quotes after `FIELD=`.
/// - Backslashes, newlines, and tabs inside the value become spaces, then
///   the result is trimmed, so multi-line values collapse to one line.
fn read_info_field(contents: &str, field: &str) -> Option<String> {
    let marker = format!("{field}=");
    let start = contents.find(&marker)? + marker.len();
    let rest = &contents[start..];

    let open = rest.find('"')? + 1;
    let close = rest[open..].find('"')? + open;

    let value: String = rest[open..close]
        .chars()
        .map(|c| match c {
            '\\' | '\n' | '\t' => ' ',
            other => other,
        })
        .collect();

    Some(value.trim().to_string())
}

/// Read the full `.info` file for a package directory.
fn read_info(sbo_dir: &Path, pkg_name: &str) -> Result<String> {
    let info_path = sbo_dir.join(format!("{pkg_name}.info"));
    fs::read_to_string(&info_path).map_err(|e| SboToolkitError::io(info_path, e))
}

/// What: Read the `REQUIRES` field of a package's `.info` file.
///
/// Inputs:
/// - `sbo_dir`: Package build-script directory.
/// - `pkg_name`: Package name (the `.info` file is `<name>.info`).
///
/// Output:
/// - Returns the whitespace-normalized `REQUIRES` value; empty when the
///   field is missing.
///
/// # Errors
///
/// Returns `Io` when the `.info` file cannot be read.
pub fn read_requires(sbo_dir: &Path, pkg_name: &str) -> Result<String> {
    let contents = read_info(sbo_dir, pkg_name)?;
    Ok(read_info_field(&contents, "REQUIRES").unwrap_or_default())
}

/// What: Read the `VERSION` field of a package's `.info` file.
///
/// Inputs:
/// - `sbo_dir`: Package build-script directory.
/// - `pkg_name`: Package name.
///
/// Output:
/// - Returns the `VERSION` value; empty when the field is missing.
///
/// # Errors
///
/// Returns `Io` when the `.info` file cannot be read.
pub fn read_version(sbo_dir: &Path, pkg_name: &str) -> Result<String> {
    let contents = read_info(sbo_dir, pkg_name)?;
    Ok(read_info_field(&contents, "VERSION").unwrap_or_default())
}

/// What: Load a package's `README` contents.
///
/// Inputs:
/// - `sbo_dir`: Package build-script directory.
///
/// Output:
/// - Returns the file contents, or an empty string when no `README` exists.
pub fn load_readme(sbo_dir: &Path) -> String {
    let readme_path = sbo_dir.join("README");
    fs::read_to_string(&readme_path).unwrap_or_else(|e| {
        tracing::warn!("unable to read {}: {e}", readme_path.display());
        String::new()
    })
}

/// What: Compute the info CRC fingerprint for a package directory.
///
/// Inputs:
/// - `sbo_dir`: Package build-script directory.
/// - `pkg_name`: Package name.
///
/// Output:
/// - Returns the CRC32 over the `README` contents followed by the
///   `REQUIRES` value.
///
/// Details:
/// - The fingerprint depends only on repository inputs, never on the
///   user-editable dep file, so it changes exactly when the upstream
///   definition changes.
///
/// # Errors
///
/// Returns `Io` when the `.info` file cannot be read.
pub fn info_crc(sbo_dir: &Path, pkg_name: &str) -> Result<u32> {
    let readme = load_readme(sbo_dir);
    let requires = read_requires(sbo_dir, pkg_name)?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(readme.as_bytes());
    hasher.update(requires.as_bytes());
    Ok(hasher.finalize())
}

/// What: Scan the repository for package build directories.
///
/// Inputs:
/// - `root`: Repository root, laid out as `<root>/<category>/<package>`.
///
/// Output:
/// - Returns one [`Package`] per build directory, sorted by name.
///
/// Details:
/// - The walk goes exactly two levels deep; dot entries are skipped.
/// - A second-level directory is a package only if it contains a regular
///   `<package>/<package>.info` file; anything else is skipped silently.
/// - Each record carries the directory path, the `VERSION` field, and the
///   info CRC.
///
/// # Errors
///
/// Returns `Io` when the root or a category directory cannot be read.
pub fn scan_repo(root: &Path) -> Result<Vec<Package>> {
    let mut pkgs = Vec::new();

    let categories = fs::read_dir(root).map_err(|e| SboToolkitError::io(root, e))?;
    for category in categories {
        let category = category.map_err(|e| SboToolkitError::io(root, e))?;
        if category.file_name().to_string_lossy().starts_with('.')
            || !category.path().is_dir()
        {
            continue;
        }

        let category_path = category.path();
        let entries =
            fs::read_dir(&category_path).map_err(|e| SboToolkitError::io(&category_path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SboToolkitError::io(&category_path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }

            let sbo_dir = entry.path();
            let info_path = sbo_dir.join(format!("{name}.info"));
            if !info_path.is_file() {
                continue;
            }

            let mut pkg = Package::new(name.as_str());
            pkg.version = read_version(&sbo_dir, &name)?;
            pkg.info_crc = info_crc(&sbo_dir, &name)?;
            pkg.sbo_dir = Some(sbo_dir);
            pkgs.push(pkg);
        }
    }

    pkgs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pkgs)
}
