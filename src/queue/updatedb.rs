//! The `updatedb` command: synchronize PKGDB with the repository.

use crate::config::UserConfig;
use crate::error::Result;
use crate::graph::{self, PackageGraph};
use crate::types::Package;
use crate::{pkgdb, repo};

/// What: Synthesize default dep files for packages that lack one.
///
/// Details:
/// - Failures are reported per package and do not stop the sweep.
pub fn create_default_deps(graph: &PackageGraph, config: &UserConfig) {
    for &id in graph.sbo_ids() {
        let pkg = graph.node(id);
        if config.dep_file_path(&pkg.name).is_file() {
            continue;
        }
        // The verbose helper already reported the failure
        let _ = graph::create_default_dep_verbose(pkg, config);
    }
}

/// What: Run the `updatedb` command.
///
/// Inputs:
/// - `graph`: Current catalog; replaced by the fresh scan.
/// - `config`: Supplies repository root and state directory.
///
/// Details:
/// - Scans the repository, diffs against the loaded catalog (carrying
///   review/track flags across unchanged definitions), prints the
///   Added/Upgraded/Downgraded/Modified/Removed report, rewrites PKGDB,
///   and synthesizes dep files for any package still lacking one.
/// - Removed packages are reported but not retained.
///
/// # Errors
///
/// Propagates scan and persistence failures.
pub fn run_updatedb(graph: &mut PackageGraph, config: &UserConfig) -> Result<()> {
    let mut new_pkgs = repo::scan_repo(&config.sbopkg_repo)?;

    let old_pkgs: Vec<Package> = graph
        .sbo_ids()
        .iter()
        .map(|&id| graph.node(id).clone())
        .collect();

    let diff = pkgdb::diff_catalogs(&mut new_pkgs, &old_pkgs);
    diff.report();

    *graph = PackageGraph::from_packages(new_pkgs);
    pkgdb::write_pkgdb(graph, config)?;
    create_default_deps(graph, config);

    Ok(())
}
