//! The `search` and `make-meta` commands.

use crate::config::UserConfig;
use crate::error::{Result, SboToolkitError};
use crate::fsutil::write_atomic;
use crate::graph::{self, PackageGraph};
use crate::mesg;

/// What: Run the `search` command.
///
/// Inputs:
/// - `graph`: Catalog; meta-packages from the state directory are pulled in
///   before matching.
/// - `pattern`: Case-insensitive substring to match against package names.
///
/// Details:
/// - Matching repository packages print as `category/name`; meta-packages
///   print as `META/<name>`. Results are sorted.
///
/// # Errors
///
/// Returns `Io` when the state directory cannot be scanned.
pub fn run_search(graph: &mut PackageGraph, pattern: &str, config: &UserConfig) -> Result<()> {
    let needle = pattern.to_lowercase();
    let mut results: Vec<String> = Vec::new();

    for &id in graph.sbo_ids() {
        let pkg = graph.node(id);
        if !pkg.name.to_lowercase().contains(&needle) {
            continue;
        }
        let rel = pkg
            .sbo_dir
            .as_deref()
            .map(|dir| {
                dir.strip_prefix(&config.sbopkg_repo)
                    .unwrap_or(dir)
                    .display()
                    .to_string()
            })
            .unwrap_or_else(|| pkg.name.clone());
        results.push(rel);
    }

    graph::find_all_meta_pkgs(graph, config)?;
    for &id in graph.meta_ids() {
        let name = graph.name(id);
        if name.to_lowercase().contains(&needle) {
            results.push(format!("META/{name}"));
        }
    }

    results.sort();
    for result in results {
        println!("{result}");
    }
    Ok(())
}

/// What: Run the `make-meta` command.
///
/// Inputs:
/// - `graph`: Catalog, used to reject name collisions.
/// - `meta_name`: Name of the meta-package to create.
/// - `pkg_names`: Members, written as its required list.
///
/// Details:
/// - Writes `METAPKG` followed by a `REQUIRED:` block to the state
///   directory, atomically.
///
/// # Errors
///
/// Returns `Config` when no members were given or the name collides with a
/// repository package, and `Io` when the file cannot be written.
pub fn run_make_meta(
    graph: &PackageGraph,
    meta_name: &str,
    pkg_names: &[String],
    config: &UserConfig,
) -> Result<()> {
    if pkg_names.is_empty() {
        mesg::warn(&format!(
            "no packages provided for meta package {meta_name}"
        ));
        return Err(SboToolkitError::Config(format!(
            "meta package {meta_name} has no members"
        )));
    }

    if graph
        .sbo_ids()
        .iter()
        .any(|&id| graph.name(id) == meta_name)
    {
        return Err(SboToolkitError::Config(format!(
            "meta-package {meta_name} conflicts with an existing {meta_name} package"
        )));
    }

    let mut contents = String::from("METAPKG\nREQUIRED:\n");
    for name in pkg_names {
        contents.push_str(name);
        contents.push('\n');
    }

    write_atomic(&config.dep_file_path(meta_name), &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{is_meta_file, parse_dep_file};
    use crate::types::Package;
    use tempfile::TempDir;

    fn test_config(depdir: &std::path::Path) -> UserConfig {
        UserConfig {
            depdir: depdir.to_path_buf(),
            ..UserConfig::default()
        }
    }

    #[test]
    fn test_make_meta_writes_marker_and_members() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let graph = PackageGraph::from_packages(vec![Package::new("htop")]);

        let members = vec!["htop".to_string(), "curlie".to_string()];
        run_make_meta(&graph, "mytools", &members, &config).unwrap();

        let path = config.dep_file_path("mytools");
        assert!(is_meta_file(&path));
        let contents = std::fs::read_to_string(&path).unwrap();
        let dep = parse_dep_file(&contents, &path).unwrap();
        assert!(dep.is_meta);
        assert_eq!(dep.required, vec!["htop", "curlie"]);
    }

    #[test]
    fn test_make_meta_rejects_collision_and_empty() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let graph = PackageGraph::from_packages(vec![Package::new("htop")]);

        assert!(run_make_meta(&graph, "htop", &["curlie".to_string()], &config).is_err());
        assert!(run_make_meta(&graph, "empty", &[], &config).is_err());
    }
}
