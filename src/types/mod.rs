//! Shared data types for the package catalog, traversals, and queues.

pub mod installed;
pub mod options;
pub mod package;

pub use installed::InstalledPackage;
pub use options::{CheckInstalled, OutputMode, PkgOptions, ReviewType};
pub use package::{NodeId, Package, PackageDep, Update};
