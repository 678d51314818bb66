//! The persistent package catalog (PKGDB).
//!
//! One record per line: `name:relative_dir:version:crc_hex:reviewed:tracked`.
//! The relative directory is the build-script path with the repository root
//! stripped, so the database survives a repository relocation. Writes go
//! through a temp file and rename so a crashed run never leaves a torn
//! catalog behind.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::UserConfig;
use crate::error::{Result, SboToolkitError};
use crate::fsutil::write_atomic;
use crate::graph::PackageGraph;
use crate::types::Package;
use crate::version::compare_versions;

/// What: Check whether a PKGDB exists in the state directory.
#[must_use]
pub fn pkgdb_exists(config: &UserConfig) -> bool {
    config.pkgdb_path().is_file()
}

/// What: Load the catalog from PKGDB.
///
/// Inputs:
/// - `config`: Supplies the state directory and the repository root used to
///   re-absolutize the stored relative directories.
///
/// Output:
/// - Returns the catalog records in file order (sorted by name on disk).
///
/// # Errors
///
/// Returns `Io` when the file cannot be read and `Parse` when a record does
/// not have exactly six `:`-separated fields or carries a malformed CRC.
pub fn load_pkgdb(config: &UserConfig) -> Result<Vec<Package>> {
    let path = config.pkgdb_path();
    let contents = fs::read_to_string(&path).map_err(|e| SboToolkitError::io(&path, e))?;

    let mut pkgs = Vec::new();
    for (lineno, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 6 {
            return Err(SboToolkitError::Parse(format!(
                "malformed record at line {} in {}",
                lineno + 1,
                path.display()
            )));
        }

        let mut pkg = Package::new(fields[0]);
        pkg.sbo_dir = Some(config.sbopkg_repo.join(fields[1]));
        pkg.version = fields[2].to_string();
        pkg.info_crc = u32::from_str_radix(fields[3], 16).map_err(|e| {
            SboToolkitError::Parse(format!(
                "bad CRC at line {} in {}: {e}",
                lineno + 1,
                path.display()
            ))
        })?;
        pkg.is_reviewed = fields[4] == "1";
        pkg.is_tracked = fields[5] == "1";
        pkgs.push(pkg);
    }

    Ok(pkgs)
}

/// Relative build directory of a package, for persistence.
fn relative_dir(pkg: &Package, root: &Path) -> PathBuf {
    pkg.sbo_dir
        .as_deref()
        .map(|dir| dir.strip_prefix(root).unwrap_or(dir).to_path_buf())
        .unwrap_or_default()
}

/// What: Persist the repository side of a graph as PKGDB.
///
/// Inputs:
/// - `graph`: Catalog whose repository nodes are written, in name order.
/// - `config`: Supplies the state directory and repository root.
///
/// Details:
/// - The write is atomic (temp file + rename).
///
/// # Errors
///
/// Returns `Io` when the file cannot be written into place.
pub fn write_pkgdb(graph: &PackageGraph, config: &UserConfig) -> Result<()> {
    let mut contents = String::new();
    for &id in graph.sbo_ids() {
        let pkg = graph.node(id);
        contents.push_str(&format!(
            "{}:{}:{}:{:x}:{}:{}\n",
            pkg.name,
            relative_dir(pkg, &config.sbopkg_repo).display(),
            pkg.version,
            pkg.info_crc,
            u8::from(pkg.is_reviewed),
            u8::from(pkg.is_tracked),
        ));
    }

    write_atomic(&config.pkgdb_path(), &contents)
}

/// Outcome of comparing a fresh repository scan against the catalog.
#[derive(Debug, Default)]
pub struct CatalogDiff {
    /// Packages new to the repository: `(name, version)`.
    pub added: Vec<(String, String)>,
    /// Version went up: `(name, old_version, new_version)`.
    pub upgraded: Vec<(String, String, String)>,
    /// Version went down: `(name, old_version, new_version)`.
    pub downgraded: Vec<(String, String, String)>,
    /// Definition changed at the same version: `(name, version)`.
    pub modified: Vec<(String, String)>,
    /// Packages gone from the repository: `(name, version)`.
    pub removed: Vec<(String, String)>,
}

impl CatalogDiff {
    /// True when the scan matched the catalog exactly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.upgraded.is_empty()
            && self.downgraded.is_empty()
            && self.modified.is_empty()
            && self.removed.is_empty()
    }

    /// What: Print the sectioned updatedb report.
    ///
    /// Details:
    /// - Sections appear only when non-empty, each row carrying its class
    ///   label: `[A]`, `[U]`, `[D]`, `[M]`, `[R]`.
    pub fn report(&self) {
        if !self.added.is_empty() {
            println!("Added:");
            for (name, version) in &self.added {
                println!("  [A] {name:<24} {version:<8}");
            }
        }
        if !self.upgraded.is_empty() {
            println!("Upgraded:");
            for (name, old, new) in &self.upgraded {
                println!("  [U] {name:<24} {old:<8} --> {new}");
            }
        }
        if !self.downgraded.is_empty() {
            println!("Downgraded:");
            for (name, old, new) in &self.downgraded {
                println!("  [D] {name:<24} {old:<8} --> {new}");
            }
        }
        if !self.modified.is_empty() {
            println!("Modified:");
            for (name, version) in &self.modified {
                println!("  [M] {name:<24} {version:<8}");
            }
        }
        if !self.removed.is_empty() {
            println!("Removed:");
            for (name, version) in &self.removed {
                println!("  [R] {name:<24} {version:<8}");
            }
        }
    }
}

/// What: Diff a fresh scan against the previous catalog, carrying flags.
///
/// Inputs:
/// - `new_pkgs`: Freshly scanned records, sorted by name; review/track
///   flags are rewritten in place.
/// - `old_pkgs`: Previously persisted catalog, sorted by name.
///
/// Output:
/// - Returns the classification of every name across both sets.
///
/// Details:
/// - `is_tracked` carries over whenever the name survives.
/// - `is_reviewed` carries over only while the info CRC is unchanged; any
///   definition change clears it.
/// - With matching CRCs a package contributes nothing to the report.
pub fn diff_catalogs(new_pkgs: &mut [Package], old_pkgs: &[Package]) -> CatalogDiff {
    let mut diff = CatalogDiff::default();

    for pkg in new_pkgs.iter_mut() {
        let old = old_pkgs
            .binary_search_by(|o| o.name.as_str().cmp(&pkg.name))
            .ok()
            .map(|pos| &old_pkgs[pos]);

        let Some(old) = old else {
            diff.added.push((pkg.name.clone(), pkg.version.clone()));
            continue;
        };

        pkg.is_tracked = old.is_tracked;
        if old.info_crc == pkg.info_crc {
            pkg.is_reviewed = old.is_reviewed;
            continue;
        }

        match compare_versions(&old.version, &pkg.version) {
            Ordering::Equal => diff
                .modified
                .push((pkg.name.clone(), pkg.version.clone())),
            Ordering::Less => diff.upgraded.push((
                pkg.name.clone(),
                old.version.clone(),
                pkg.version.clone(),
            )),
            Ordering::Greater => diff.downgraded.push((
                pkg.name.clone(),
                old.version.clone(),
                pkg.version.clone(),
            )),
        }
    }

    for old in old_pkgs {
        if new_pkgs
            .binary_search_by(|n| n.name.as_str().cmp(&old.name))
            .is_err()
        {
            diff.removed.push((old.name.clone(), old.version.clone()));
        }
    }

    diff
}
