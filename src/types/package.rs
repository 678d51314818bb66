//! Core catalog data types: packages, dependency blocks, and update tags.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stable handle to a package node inside a [`crate::graph::PackageGraph`].
///
/// Handles are indices into the graph's node arena and remain valid for the
/// lifetime of the graph; nodes are never removed, only added.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Dependency block of a package, populated lazily from its dep file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDep {
    /// Direct required dependencies, sorted by package name.
    pub required: Vec<NodeId>,
    /// Reverse edges, populated only when a traversal requested them.
    pub parents: Vec<NodeId>,
    /// Opaque build-option strings, preserved verbatim and in order.
    pub buildopts: Vec<String>,
    /// True for user-authored meta-packages (dep file only, no build dir).
    pub is_meta: bool,
}

/// Classification attached to a package by the update planner.
///
/// `parent` names the target whose dependency walk reached this package;
/// `child` names the updated dependency whose reverse walk reached it;
/// `installed` is the currently installed version being replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Update {
    /// Directly requested target with a newer repository version.
    Update {
        /// Installed version being replaced.
        installed: String,
    },
    /// Dependency that is not installed at all.
    DepAdded {
        /// Target whose walk discovered the missing dependency.
        parent: NodeId,
    },
    /// Dependency with a newer repository version.
    DepUpdate {
        /// Target whose walk discovered the update.
        parent: NodeId,
        /// Installed version being replaced.
        installed: String,
    },
    /// Dependency rebuilt at the same version (`rebuild_deps` only).
    DepRebuild {
        /// Target whose walk requested the rebuild.
        parent: NodeId,
    },
    /// Dependency whose installed version is newer than the repository's.
    DepDowngrade {
        /// Target whose walk discovered the downgrade.
        parent: NodeId,
        /// Installed version, newer than the repository version.
        installed: String,
    },
    /// Installed parent of an updated package, itself updated.
    RevdepUpdate {
        /// Updated dependency that triggered the walk.
        child: NodeId,
        /// Installed version being replaced.
        installed: String,
    },
    /// Installed parent of an updated package, rebuilt at the same version.
    RevdepRebuild {
        /// Updated dependency that triggered the rebuild.
        child: NodeId,
    },
    /// Installed parent whose installed version is newer than the repository's.
    RevdepDowngrade {
        /// Updated dependency that triggered the walk.
        child: NodeId,
        /// Installed version, newer than the repository version.
        installed: String,
    },
}

impl Update {
    /// What: Check whether this classification is a downgrade.
    ///
    /// Output:
    /// - Returns `true` for `DepDowngrade` and `RevdepDowngrade`.
    ///
    /// Details:
    /// - Downgrade entries are reported but stripped from the build list
    ///   before emission.
    #[must_use]
    pub const fn is_downgrade(&self) -> bool {
        matches!(
            self,
            Self::DepDowngrade { .. } | Self::RevdepDowngrade { .. }
        )
    }

    /// What: Check whether this package must re-enter the dependency walk.
    ///
    /// Output:
    /// - Returns `true` for `RevdepUpdate` and `RevdepRebuild`.
    ///
    /// Details:
    /// - Reverse-dependency hits become root-level build targets whose own
    ///   dependency closure is walked on the next planner iteration.
    #[must_use]
    pub const fn is_revdep_trigger(&self) -> bool {
        matches!(self, Self::RevdepUpdate { .. } | Self::RevdepRebuild { .. })
    }
}

/// One buildable unit of the repository, or a user-authored meta-package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Unique package name, case-sensitive.
    pub name: String,
    /// Repository version string (empty for meta-packages).
    pub version: String,
    /// Absolute path of the build-script directory; `None` for meta-packages.
    pub sbo_dir: Option<PathBuf>,
    /// CRC32 over the package's `README` and `REQUIRES` field.
    pub info_crc: u32,
    /// Dependency block, populated lazily by the graph loader.
    pub dep: PackageDep,
    /// Persisted flag: the user has reviewed this package's definition.
    pub is_reviewed: bool,
    /// Persisted flag, preserved verbatim; reserved for tracking tooling.
    pub is_tracked: bool,
    /// Transient flag used by the remove planner.
    pub for_removal: bool,
    /// Transient classification assigned by the update planner.
    pub update: Option<Update>,
}

impl Package {
    /// What: Create an empty package record with the given name.
    ///
    /// Inputs:
    /// - `name`: Unique package name.
    ///
    /// Output:
    /// - Returns a `Package` with no version, directory, or dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            sbo_dir: None,
            info_crc: 0,
            dep: PackageDep::default(),
            is_reviewed: false,
            is_tracked: false,
            for_removal: false,
            update: None,
        }
    }

    /// True when this node is a user-authored meta-package.
    #[must_use]
    pub const fn is_meta(&self) -> bool {
        self.dep.is_meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_package_is_empty() {
        let pkg = Package::new("htop");
        assert_eq!(pkg.name, "htop");
        assert!(pkg.version.is_empty());
        assert!(pkg.sbo_dir.is_none());
        assert!(pkg.dep.required.is_empty());
        assert!(!pkg.is_meta());
        assert!(pkg.update.is_none());
    }

    #[test]
    fn test_update_is_downgrade() {
        let parent = NodeId(0);
        assert!(
            Update::DepDowngrade {
                parent,
                installed: "2.0".into()
            }
            .is_downgrade()
        );
        assert!(
            Update::RevdepDowngrade {
                child: parent,
                installed: "2.0".into()
            }
            .is_downgrade()
        );
        assert!(
            !Update::Update {
                installed: "1.0".into()
            }
            .is_downgrade()
        );
    }

    #[test]
    fn test_update_is_revdep_trigger() {
        let child = NodeId(3);
        assert!(Update::RevdepRebuild { child }.is_revdep_trigger());
        assert!(
            Update::RevdepUpdate {
                child,
                installed: "1.0".into()
            }
            .is_revdep_trigger()
        );
        assert!(!Update::DepAdded { parent: child }.is_revdep_trigger());
    }
}
