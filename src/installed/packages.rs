//! Installed-package oracle backed by the local package database directory.

use std::fs;
use std::path::Path;

use crate::error::{Result, SboToolkitError};
use crate::installed::{InstalledSet, PackageDatabase};
use crate::types::InstalledPackage;

/// Conventional location of the installed-package database.
pub const DEFAULT_PACKAGES_DIR: &str = "/var/log/packages";

/// Oracle over the package database directory, one file per installed
/// package named `name-version-arch-build{tag}`.
#[derive(Debug)]
pub struct PackagesBackend {
    set: InstalledSet,
}

impl PackagesBackend {
    /// What: Build the oracle from a package database directory.
    ///
    /// Inputs:
    /// - `dir`: Directory whose regular files name installed packages.
    ///
    /// Output:
    /// - Returns the oracle with its name-sorted cache built.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the directory cannot be read and `Parse` when an
    /// entry filename is not of the canonical form.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();

        let dir_entries = fs::read_dir(dir).map_err(|e| SboToolkitError::io(dir, e))?;
        for entry in dir_entries {
            let entry = entry.map_err(|e| SboToolkitError::io(dir, e))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(InstalledPackage::parse(&name)?);
        }

        Ok(Self {
            set: InstalledSet::new(entries),
        })
    }

    /// Open the oracle at the conventional system location.
    ///
    /// # Errors
    ///
    /// See [`PackagesBackend::open`].
    pub fn open_default() -> Result<Self> {
        Self::open(Path::new(DEFAULT_PACKAGES_DIR))
    }
}

impl PackageDatabase for PackagesBackend {
    fn search(&self, name: &str, tag: Option<&str>) -> Option<&InstalledPackage> {
        self.set.search(name, tag)
    }

    fn get(&self, index: usize, tag: Option<&str>) -> Option<&InstalledPackage> {
        self.set.get(index, tag)
    }

    fn len(&self) -> usize {
        self.set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_scans_regular_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("htop-3.2.2-x86_64-1_SBo"), "").unwrap();
        fs::write(dir.path().join("bash-5.2.021-x86_64-1"), "").unwrap();
        fs::create_dir(dir.path().join("subdir-1.0-x86_64-1")).unwrap();

        let db = PackagesBackend::open(dir.path()).unwrap();
        assert_eq!(db.len(), 2);
        assert!(db.is_installed("htop", Some("_SBo")));
        assert!(db.is_installed("bash", None));
        assert!(!db.is_installed("bash", Some("_SBo")));
        assert_eq!(db.search("htop", None).unwrap().version, "3.2.2");
    }

    #[test]
    fn test_open_rejects_malformed_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("not-a-package"), "").unwrap();
        assert!(PackagesBackend::open(dir.path()).is_err());
    }
}
