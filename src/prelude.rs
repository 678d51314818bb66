//! Convenient re-exports of the types most callers need.

pub use crate::config::UserConfig;
pub use crate::error::{Result, SboToolkitError};
pub use crate::graph::{GraphIter, IterFlags, PackageGraph, TraversalState, Visit};
pub use crate::installed::{PackageDatabase, PackagesBackend, SlackpkgRepoBackend};
pub use crate::output::OutputSink;
pub use crate::review::ReviewStatus;
pub use crate::types::{
    CheckInstalled, InstalledPackage, NodeId, OutputMode, Package, PackageDep, PkgOptions,
    ReviewType, Update,
};
pub use crate::version::compare_versions;
