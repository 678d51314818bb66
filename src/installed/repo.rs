//! Installed-package oracle backed by a slackpkg repository pkglist.

use std::fs;
use std::path::Path;

use crate::error::{Result, SboToolkitError};
use crate::installed::{InstalledSet, PackageDatabase};
use crate::types::InstalledPackage;

/// Conventional location of the slackpkg package list.
pub const DEFAULT_PKGLIST: &str = "/var/lib/slackpkg/pkglist";

/// Column carrying the repository name.
const REPO_COLUMN: usize = 0;
/// Column carrying the package filename.
const PKG_COLUMN: usize = 5;

/// Oracle over a whitespace-columnar slackpkg `pkglist` file, restricted to
/// one repository.
#[derive(Debug)]
pub struct SlackpkgRepoBackend {
    set: InstalledSet,
}

impl SlackpkgRepoBackend {
    /// What: Build the oracle from a pkglist file.
    ///
    /// Inputs:
    /// - `path`: The pkglist file.
    /// - `repo_name`: Repository to select; lines whose first column names a
    ///   different repository are ignored.
    ///
    /// Output:
    /// - Returns the oracle with its name-sorted cache built.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read and `Parse` when a
    /// selected line is too short or its package column is malformed.
    pub fn open(path: &Path, repo_name: &str) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| SboToolkitError::io(path, e))?;

        let mut entries = Vec::new();
        for line in contents.lines() {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.is_empty() || cols[REPO_COLUMN] != repo_name {
                continue;
            }
            let Some(pkg_col) = cols.get(PKG_COLUMN) else {
                return Err(SboToolkitError::Parse(format!(
                    "malformed pkglist line in {}: {line}",
                    path.display()
                )));
            };
            entries.push(InstalledPackage::parse(pkg_col)?);
        }

        Ok(Self {
            set: InstalledSet::new(entries),
        })
    }

    /// Open the oracle at the conventional system location.
    ///
    /// # Errors
    ///
    /// See [`SlackpkgRepoBackend::open`].
    pub fn open_default(repo_name: &str) -> Result<Self> {
        Self::open(Path::new(DEFAULT_PKGLIST), repo_name)
    }
}

impl PackageDatabase for SlackpkgRepoBackend {
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

    const PKGLIST: &str = "\
SLACKPKGPLUS_SBo ./pkgs htop 3.2.2 x86_64 htop-3.2.2-x86_64-1_SBo txz .\n\
SLACKPKGPLUS_SBo ./pkgs curlie 1.6.9 x86_64 curlie-1.6.9-x86_64-1_SBo txz .\n\
slackware64 ./patches bash 5.2.021 x86_64 bash-5.2.021-x86_64-1 txz .\n";

    #[test]
    fn test_open_filters_repository() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkglist");
        fs::write(&path, PKGLIST).unwrap();

        let db = SlackpkgRepoBackend::open(&path, "SLACKPKGPLUS_SBo").unwrap();
        assert_eq!(db.len(), 2);
        assert!(db.is_installed("htop", Some("_SBo")));
        // The slackware64 line belongs to another repository
        assert!(!db.is_installed("bash", None));
    }

    #[test]
    fn test_open_rejects_short_selected_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkglist");
        fs::write(&path, "SLACKPKGPLUS_SBo ./pkgs htop\n").unwrap();
        assert!(SlackpkgRepoBackend::open(&path, "SLACKPKGPLUS_SBo").is_err());
    }
}
