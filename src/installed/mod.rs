//! Installed-package oracle.
//!
//! Two interchangeable back-ends answer "is this package installed, and at
//! which version": the local package database directory and a slackpkg
//! repository pkglist. Both build a name-sorted in-memory cache when
//! constructed and expose the same four queries through the
//! [`PackageDatabase`] trait, so queue generators never care which one they
//! were handed.

mod packages;
mod repo;

pub use packages::PackagesBackend;
pub use repo::SlackpkgRepoBackend;

use crate::types::InstalledPackage;

/// Query interface over the installed-package set.
pub trait PackageDatabase {
    /// What: Look up an installed entry by name.
    ///
    /// Inputs:
    /// - `name`: Package name.
    /// - `tag`: `Some(tag)` restricts the match to entries with that exact
    ///   tag; `None` accepts any entry.
    ///
    /// Output:
    /// - Returns the entry when installed and accepted by the filter.
    fn search(&self, name: &str, tag: Option<&str>) -> Option<&InstalledPackage>;

    /// What: Access the cache by index, with the same tag filter as
    /// [`PackageDatabase::search`].
    fn get(&self, index: usize, tag: Option<&str>) -> Option<&InstalledPackage>;

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// True when the installed set is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `name` is installed (subject to the tag filter).
    fn is_installed(&self, name: &str, tag: Option<&str>) -> bool {
        self.search(name, tag).is_some()
    }
}

/// Shared name-sorted cache behind both back-ends.
#[derive(Debug, Default)]
pub(crate) struct InstalledSet {
    entries: Vec<InstalledPackage>,
}

impl InstalledSet {
    /// Build the cache, sorting entries by name.
    pub(crate) fn new(mut entries: Vec<InstalledPackage>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub(crate) fn search(&self, name: &str, tag: Option<&str>) -> Option<&InstalledPackage> {
        let pos = self
            .entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()?;
        let entry = &self.entries[pos];
        entry.matches_tag(tag).then_some(entry)
    }

    pub(crate) fn get(&self, index: usize, tag: Option<&str>) -> Option<&InstalledPackage> {
        let entry = self.entries.get(index)?;
        entry.matches_tag(tag).then_some(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
