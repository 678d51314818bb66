//! The `check-updates` report.
//!
//! Walks the installed set (tag-filtered) and classifies each entry against
//! the repository: a newer repository version is an update, an older one a
//! downgrade, and an entry with no repository counterpart has been removed
//! upstream. Versions are re-read from the `.info` files so the report
//! reflects the repository on disk, not a stale catalog.

use std::cmp::Ordering;

use crate::config::UserConfig;
use crate::error::Result;
use crate::graph::PackageGraph;
use crate::installed::PackageDatabase;
use crate::mesg;
use crate::repo;
use crate::version::compare_versions;

/// One classified row of the report.
enum UpdatedPkg {
    /// Repository version is newer: `(name, installed, repo_version)`.
    Updated(String, String, String),
    /// Repository version is older: `(name, installed, repo_version)`.
    Downgraded(String, String, String),
    /// Installed but gone from the repository: `(name, installed)`.
    Removed(String, String),
}

/// What: Classify the installed set against the repository.
///
/// Inputs:
/// - `db`: Installed-package oracle.
/// - `graph`: Catalog used to find repository counterparts.
/// - `pkg_name`: Restrict the report to one package when given.
/// - `config`: Supplies the tag filter.
///
/// Output:
/// - Returns the classified rows in installed-set order.
///
/// # Errors
///
/// Returns `Io` when a repository `.info` file cannot be re-read.
fn get_updated_pkgs(
    db: &dyn PackageDatabase,
    graph: &PackageGraph,
    pkg_name: Option<&str>,
    config: &UserConfig,
) -> Result<Vec<UpdatedPkg>> {
    let mut rows = Vec::new();
    let mut have_pkg = false;

    for i in 0..db.len() {
        let Some(entry) = db.get(i, Some(&config.sbo_tag)) else {
            continue;
        };

        if let Some(wanted) = pkg_name
            && entry.name != wanted
        {
            continue;
        }

        let node = graph.lookup(&entry.name).map(|id| graph.node(id));
        let sbo_dir = node.and_then(|pkg| pkg.sbo_dir.as_deref());

        let Some(sbo_dir) = sbo_dir else {
            if pkg_name.is_none() {
                rows.push(UpdatedPkg::Removed(
                    entry.name.clone(),
                    entry.version.clone(),
                ));
            }
            continue;
        };

        have_pkg = true;
        let sbo_version = repo::read_version(sbo_dir, &entry.name)?;

        match compare_versions(&entry.version, &sbo_version) {
            Ordering::Less => rows.push(UpdatedPkg::Updated(
                entry.name.clone(),
                entry.version.clone(),
                sbo_version,
            )),
            Ordering::Greater => rows.push(UpdatedPkg::Downgraded(
                entry.name.clone(),
                entry.version.clone(),
                sbo_version,
            )),
            Ordering::Equal => {}
        }
    }

    // A single requested package that never matched a repository entry is
    // itself a removal when it is installed at all.
    if let Some(wanted) = pkg_name
        && !have_pkg
        && let Some(entry) = db.search(wanted, Some(&config.sbo_tag))
    {
        rows.push(UpdatedPkg::Removed(
            entry.name.clone(),
            entry.version.clone(),
        ));
    }

    Ok(rows)
}

/// What: Run the `check-updates` command.
///
/// Details:
/// - Prints one labeled row per classified package: `[U]` update available,
///   `[D]` repository downgrade, `[R]` removed from the repository.
///
/// # Errors
///
/// Propagates classification failures.
pub fn run_check_updates(
    db: &dyn PackageDatabase,
    graph: &PackageGraph,
    pkg_name: Option<&str>,
    config: &UserConfig,
) -> Result<()> {
    for row in get_updated_pkgs(db, graph, pkg_name, config)? {
        match row {
            UpdatedPkg::Updated(name, installed, repo_version) => {
                mesg::ok_label(
                    &format!("{:>4}", "[U]"),
                    &format!(" {name:<24} {installed:<8} --> {repo_version}"),
                );
            }
            UpdatedPkg::Downgraded(name, installed, repo_version) => {
                mesg::info_label(
                    &format!("{:>4}", "[D]"),
                    &format!(" {name:<24} {installed:<8} --> {repo_version}"),
                );
            }
            UpdatedPkg::Removed(name, installed) => {
                mesg::error_label(
                    &format!("{:>4}", "[R]"),
                    &format!(" {name:<24} {installed:<8}"),
                );
            }
        }
    }
    Ok(())
}
