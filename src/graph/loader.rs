//! Dependency-file parsing and lazy graph loading.
//!
//! Dep files live in the state directory, one per package, in a
//! line-oriented format: reserved marker lines (`METAPKG`, `REQUIRED:`,
//! `OPTIONAL:`, `BUILDOPTS:`) open blocks, `#` starts a comment, lines
//! beginning with `-` are ignored. [`load_dep`] parses files on demand and
//! links the subgraph below a package, detecting cycles along the visit
//! path; missing files for repository packages are synthesized from the
//! package's `REQUIRES` field.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::config::UserConfig;
use crate::error::{Result, SboToolkitError};
use crate::fsutil::write_atomic;
use crate::graph::PackageGraph;
use crate::installed::PackageDatabase;
use crate::types::{NodeId, Package, PkgOptions};
use crate::{mesg, repo};

/// Placeholder token in `REQUIRES` fields that never names a package.
const README_TOKEN: &str = "%README%";

/// Parsed contents of one dependency file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DepFile {
    /// True when a `METAPKG` marker was present.
    pub is_meta: bool,
    /// Names listed under `REQUIRED:`, in file order.
    pub required: Vec<String>,
    /// Names listed under `OPTIONAL:`, in file order.
    pub optional: Vec<String>,
    /// Verbatim lines under `BUILDOPTS:`, in file order.
    pub buildopts: Vec<String>,
}

/// Block being parsed while walking a dep file.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Block {
    None,
    Required,
    Optional,
    Buildopts,
}

/// What: Normalize one dep-file line, deciding whether it carries content.
///
/// Inputs:
/// - `raw`: The line as read, without its terminator.
///
/// Output:
/// - Returns `Some(content)` for a content or marker line, `None` for
///   blank, comment-only, and `-`-prefixed lines.
///
/// Details:
/// - Tabs and backslashes become spaces, `#` starts a comment, and the
///   result is trimmed.
fn normalize_dep_line(raw: &str) -> Option<String> {
    let mut line: String = raw
        .chars()
        .map(|c| match c {
            '\t' | '\\' => ' ',
            other => other,
        })
        .collect();

    if let Some(comment) = line.find('#') {
        line.truncate(comment);
    }

    let line = line.trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }

    Some(line.to_string())
}

/// What: Parse the contents of a dependency file.
///
/// Inputs:
/// - `contents`: Full file text.
/// - `path`: Origin of the contents, for diagnostics only.
///
/// Output:
/// - Returns the parsed [`DepFile`].
///
/// # Errors
///
/// Returns `Parse` when a content line appears before any block marker.
pub fn parse_dep_file(contents: &str, path: &Path) -> Result<DepFile> {
    let mut dep = DepFile::default();
    let mut block = Block::None;

    for raw in contents.lines() {
        let Some(line) = normalize_dep_line(raw) else {
            continue;
        };

        match line.as_str() {
            "METAPKG" => dep.is_meta = true,
            "REQUIRED:" => block = Block::Required,
            "OPTIONAL:" => block = Block::Optional,
            "BUILDOPTS:" => block = Block::Buildopts,
            _ => match block {
                Block::Required => dep.required.push(line),
                Block::Optional => dep.optional.push(line),
                Block::Buildopts => dep.buildopts.push(line),
                Block::None => {
                    return Err(SboToolkitError::Parse(format!(
                        "badly formatted dependency file {}",
                        path.display()
                    )));
                }
            },
        }
    }

    Ok(dep)
}

/// What: Check whether a dep file marks a meta-package.
///
/// Inputs:
/// - `path`: Dep-file path.
///
/// Output:
/// - Returns `true` when the file exists and contains a `METAPKG` marker
///   line; `false` otherwise (including unreadable files).
#[must_use]
pub fn is_meta_file(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };

    contents
        .lines()
        .filter_map(normalize_dep_line)
        .any(|line| line == "METAPKG")
}

/// What: Render the default dependency file for a `REQUIRES` value.
///
/// Inputs:
/// - `requires`: Whitespace-separated dependency names from the `.info`
///   file.
///
/// Output:
/// - Returns the file contents: a `REQUIRED:` block with one name per line
///   (the `%README%` placeholder dropped), then empty `OPTIONAL:` and
///   `BUILDOPTS:` blocks.
#[must_use]
pub fn default_dep_contents(requires: &str) -> String {
    let mut contents = String::from("REQUIRED:\n");
    for token in requires.split_whitespace() {
        if token == README_TOKEN {
            continue;
        }
        contents.push_str(token);
        contents.push('\n');
    }
    contents.push_str("\nOPTIONAL:\n\nBUILDOPTS:\n");
    contents
}

/// What: Write the default dep file for a repository package.
///
/// Inputs:
/// - `pkg`: Catalog record; must have a build directory.
/// - `config`: Supplies the state directory and repository layout.
///
/// Output:
/// - Returns the path of the created file.
///
/// Details:
/// - The file is derived from the package's `REQUIRES` field and replaces
///   any existing dep file atomically.
///
/// # Errors
///
/// Returns `MissingDepFile` for meta-packages (nothing to synthesize from)
/// and `Io` when the `.info` file cannot be read or the dep file cannot be
/// written.
pub fn create_default_dep(pkg: &Package, config: &UserConfig) -> Result<std::path::PathBuf> {
    let Some(sbo_dir) = &pkg.sbo_dir else {
        return Err(SboToolkitError::MissingDepFile(pkg.name.clone()));
    };

    let requires = repo::read_requires(sbo_dir, &pkg.name)?;
    let dep_path = config.dep_file_path(&pkg.name);
    write_atomic(&dep_path, &default_dep_contents(&requires))?;

    Ok(dep_path)
}

/// Like [`create_default_dep`], reporting the outcome to the user.
pub fn create_default_dep_verbose(pkg: &Package, config: &UserConfig) -> Result<std::path::PathBuf> {
    match create_default_dep(pkg, config) {
        Ok(path) => {
            mesg::info(&format!("created {}", path.display()));
            Ok(path)
        }
        Err(err) => {
            mesg::error(&format!(
                "unable to create {} dependency file",
                pkg.name
            ));
            Err(err)
        }
    }
}

/// What: Resolve a package name to a graph node, discovering meta-packages.
///
/// Inputs:
/// - `graph`: Catalog to search and extend.
/// - `name`: Package name.
/// - `config`: Supplies the state directory for meta detection.
///
/// Output:
/// - Returns the handle when the name is a repository package, an existing
///   meta node, or a dep file on disk carrying the `METAPKG` marker (which
///   creates the meta node); `None` otherwise.
pub fn resolve_node(graph: &mut PackageGraph, name: &str, config: &UserConfig) -> Option<NodeId> {
    if let Some(id) = graph.lookup(name) {
        return Some(id);
    }
    if is_meta_file(&config.dep_file_path(name)) {
        return Some(graph.insert_meta(name));
    }
    None
}

/// One in-progress dep file on the DFS visit path.
struct Frame {
    node: NodeId,
    entries: Vec<String>,
    next: usize,
}

/// What: Read and apply a node's dep file, returning the names to link.
///
/// Details:
/// - A missing file is synthesized for repository packages and is fatal for
///   meta-packages.
/// - Buildopts and the meta flag are (re)assigned from the file, so
///   reloading after an edit never duplicates state.
/// - For a non-meta node with `recursive` off, the file's entries are not
///   processed at all; meta-packages always expand (they act as includes).
fn read_entries(
    graph: &mut PackageGraph,
    node: NodeId,
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<Vec<String>> {
    let dep_path = config.dep_file_path(graph.name(node));

    let contents = match fs::read_to_string(&dep_path) {
        Ok(contents) => contents,
        Err(_) => {
            create_default_dep_verbose(graph.node(node), config)?;
            fs::read_to_string(&dep_path).map_err(|e| SboToolkitError::io(&dep_path, e))?
        }
    };

    let parsed = parse_dep_file(&contents, &dep_path)?;

    let pkg = graph.node_mut(node);
    if parsed.is_meta && pkg.sbo_dir.is_some() {
        tracing::warn!(
            "ignoring METAPKG marker in {}: {} is a repository package",
            dep_path.display(),
            pkg.name
        );
    }
    pkg.dep.buildopts = parsed.buildopts;

    if !graph.node(node).is_meta() && !options.recursive {
        return Ok(Vec::new());
    }

    let mut entries = parsed.required;
    if options.optional {
        entries.extend(parsed.optional);
    }
    Ok(entries)
}

/// What: Ensure the subgraph below a package is parsed and linked.
///
/// Inputs:
/// - `graph`: Catalog to link into.
/// - `pkg_name`: Root of the subgraph.
/// - `options`: Controls optional deps, recursion, and reverse edges.
/// - `config`: Supplies the state directory.
///
/// Output:
/// - Returns `Ok(())` with all edges below the root inserted.
///
/// Details:
/// - Depth-first with an explicit stack; each dep file is parsed at most
///   once per call, and re-loading an already linked subgraph is a no-op
///   thanks to sorted-unique edge insertion.
/// - A required name that resolves to nothing is reported and skipped
///   (the repository may have dropped it since the file was written).
///
/// # Errors
///
/// Returns `PackageNotFound` for an unknown root, `CyclicDependency` when a
/// dep file reaches back into the visit path, `Parse` for malformed files,
/// and `MissingDepFile`/`Io` when a file is absent and cannot be
/// synthesized.
pub fn load_dep(
    graph: &mut PackageGraph,
    pkg_name: &str,
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<()> {
    let root = resolve_node(graph, pkg_name, config)
        .ok_or_else(|| SboToolkitError::PackageNotFound(pkg_name.to_string()))?;

    let mut visited: BTreeSet<NodeId> = BTreeSet::new();
    let mut path: Vec<Frame> = Vec::new();

    visited.insert(root);
    path.push(Frame {
        node: root,
        entries: read_entries(graph, root, options, config)?,
        next: 0,
    });

    while let Some(frame) = path.last_mut() {
        if frame.next >= frame.entries.len() {
            path.pop();
            continue;
        }

        let parent = frame.node;
        let dep_name = frame.entries[frame.next].clone();
        frame.next += 1;

        let Some(child) = resolve_node(graph, &dep_name, config) else {
            mesg::warn(&format!(
                "{dep_name} no longer in repository but included by {}",
                graph.name(parent)
            ));
            continue;
        };

        if path.iter().any(|f| f.node == child) {
            return Err(SboToolkitError::CyclicDependency(
                graph.name(parent).to_string(),
                graph.name(child).to_string(),
            ));
        }

        if options.revdeps {
            graph.insert_parent(child, parent);
        }
        graph.insert_required(parent, child);

        if visited.insert(child) {
            path.push(Frame {
                node: child,
                entries: read_entries(graph, child, options, config)?,
                next: 0,
            });
        }
    }

    Ok(())
}

/// What: Load the dep files of every catalog entry.
///
/// Details:
/// - Covers repository packages and already-known meta-packages; used when
///   reverse-dependency chains must span the whole repository.
///
/// # Errors
///
/// Propagates the first [`load_dep`] failure.
pub fn load_all_deps(
    graph: &mut PackageGraph,
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<()> {
    let ids: Vec<NodeId> = graph
        .sbo_ids()
        .iter()
        .chain(graph.meta_ids().iter())
        .copied()
        .collect();

    for id in ids {
        let name = graph.name(id).to_string();
        load_dep(graph, &name, options, config)?;
    }
    Ok(())
}

/// What: Load the dep files of every installed catalog entry.
///
/// Inputs:
/// - `db`: Installed-package oracle; entries are matched by name with no
///   tag filter.
///
/// Details:
/// - Restricts the graph to chains that could reach installed packages;
///   used by `--installed-revdeps`.
///
/// # Errors
///
/// Propagates the first [`load_dep`] failure.
pub fn load_installed_deps(
    graph: &mut PackageGraph,
    db: &dyn PackageDatabase,
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<()> {
    let ids: Vec<NodeId> = graph
        .sbo_ids()
        .iter()
        .chain(graph.meta_ids().iter())
        .copied()
        .collect();

    for id in ids {
        let name = graph.name(id).to_string();
        if !db.is_installed(&name, None) {
            continue;
        }
        load_dep(graph, &name, options, config)?;
    }
    Ok(())
}

/// What: Register every meta-package found in the state directory.
///
/// Details:
/// - Scans the dep dir for regular files carrying the `METAPKG` marker
///   whose names are not already known to the graph; used by `search`.
///
/// # Errors
///
/// Returns `Io` when the state directory cannot be read.
pub fn find_all_meta_pkgs(graph: &mut PackageGraph, config: &UserConfig) -> Result<()> {
    let entries =
        fs::read_dir(&config.depdir).map_err(|e| SboToolkitError::io(&config.depdir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| SboToolkitError::io(&config.depdir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if graph.lookup(&name).is_none() && is_meta_file(&entry.path()) {
            graph.insert_meta(&name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_config(depdir: &Path) -> UserConfig {
        UserConfig {
            depdir: depdir.to_path_buf(),
            ..UserConfig::default()
        }
    }

    fn write_dep(depdir: &Path, name: &str, contents: &str) {
        fs::write(depdir.join(name), contents).unwrap();
    }

    fn graph_of(names: &[&str]) -> PackageGraph {
        PackageGraph::from_packages(
            names
                .iter()
                .map(|n| {
                    let mut pkg = Package::new(*n);
                    pkg.sbo_dir = Some(PathBuf::from(format!("/repo/system/{n}")));
                    pkg
                })
                .collect(),
        )
    }

    #[test]
    fn test_parse_dep_file_blocks() {
        let contents = "REQUIRED:\nfoo\nbar # trailing comment\n\nOPTIONAL:\nbaz\n\nBUILDOPTS:\nFEATURE=yes\n";
        let dep = parse_dep_file(contents, Path::new("test")).unwrap();
        assert!(!dep.is_meta);
        assert_eq!(dep.required, vec!["foo", "bar"]);
        assert_eq!(dep.optional, vec!["baz"]);
        assert_eq!(dep.buildopts, vec!["FEATURE=yes"]);
    }

    #[test]
    fn test_parse_dep_file_skip_lines() {
        let contents = "# header\nREQUIRED:\n- disabled\nfoo\n";
        let dep = parse_dep_file(contents, Path::new("test")).unwrap();
        assert_eq!(dep.required, vec!["foo"]);
    }

    #[test]
    fn test_parse_dep_file_metapkg_only() {
        let dep = parse_dep_file("METAPKG\n", Path::new("test")).unwrap();
        assert!(dep.is_meta);
        assert!(dep.required.is_empty());
    }

    #[test]
    fn test_parse_dep_file_rejects_content_before_marker() {
        assert!(parse_dep_file("foo\nREQUIRED:\n", Path::new("test")).is_err());
    }

    #[test]
    fn test_default_dep_contents_round_trip() {
        let contents = default_dep_contents("foo %README% bar");
        let dep = parse_dep_file(&contents, Path::new("test")).unwrap();
        assert_eq!(dep.required, vec!["foo", "bar"]);
        assert!(dep.optional.is_empty());
        assert!(dep.buildopts.is_empty());
    }

    #[test]
    fn test_load_dep_links_subgraph() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "a", "REQUIRED:\nb\nc\n");
        write_dep(dir.path(), "b", "REQUIRED:\nc\n");
        write_dep(dir.path(), "c", "REQUIRED:\n");

        let mut graph = graph_of(&["a", "b", "c"]);
        let options = PkgOptions {
            revdeps: true,
            ..PkgOptions::default()
        };
        load_dep(&mut graph, "a", &options, &config).unwrap();

        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("b").unwrap();
        let c = graph.lookup("c").unwrap();
        assert_eq!(graph.node(a).dep.required, vec![b, c]);
        assert_eq!(graph.node(b).dep.required, vec![c]);
        // Reverse edges mirror forward edges
        assert_eq!(graph.node(c).dep.parents, vec![a, b]);
    }

    #[test]
    fn test_load_dep_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "a", "REQUIRED:\nb\n\nBUILDOPTS:\nOPT=1\n");
        write_dep(dir.path(), "b", "REQUIRED:\n");

        let mut graph = graph_of(&["a", "b"]);
        let options = PkgOptions::default();
        load_dep(&mut graph, "a", &options, &config).unwrap();
        load_dep(&mut graph, "a", &options, &config).unwrap();

        let a = graph.lookup("a").unwrap();
        assert_eq!(graph.node(a).dep.required.len(), 1);
        assert_eq!(graph.node(a).dep.buildopts, vec!["OPT=1"]);
    }

    #[test]
    fn test_load_dep_detects_cycle() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "a", "REQUIRED:\nb\n");
        write_dep(dir.path(), "b", "REQUIRED:\na\n");

        let mut graph = graph_of(&["a", "b"]);
        let err = load_dep(&mut graph, "a", &PkgOptions::default(), &config).unwrap_err();
        assert!(matches!(err, SboToolkitError::CyclicDependency(_, _)));
    }

    #[test]
    fn test_load_dep_skips_dangling_reference() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "a", "REQUIRED:\ngone\n");

        let mut graph = graph_of(&["a"]);
        load_dep(&mut graph, "a", &PkgOptions::default(), &config).unwrap();
        let a = graph.lookup("a").unwrap();
        assert!(graph.node(a).dep.required.is_empty());
    }

    #[test]
    fn test_load_dep_non_recursive_links_nothing() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "a", "REQUIRED:\nb\n");
        write_dep(dir.path(), "b", "REQUIRED:\n");

        let mut graph = graph_of(&["a", "b"]);
        let options = PkgOptions {
            recursive: false,
            ..PkgOptions::default()
        };
        load_dep(&mut graph, "a", &options, &config).unwrap();
        let a = graph.lookup("a").unwrap();
        assert!(graph.node(a).dep.required.is_empty());
    }

    #[test]
    fn test_load_dep_meta_expands_when_non_recursive() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "group", "METAPKG\nREQUIRED:\na\nb\n");
        write_dep(dir.path(), "a", "REQUIRED:\nb\n");
        write_dep(dir.path(), "b", "REQUIRED:\n");

        let mut graph = graph_of(&["a", "b"]);
        let options = PkgOptions {
            recursive: false,
            ..PkgOptions::default()
        };
        load_dep(&mut graph, "group", &options, &config).unwrap();

        let group = graph.lookup("group").unwrap();
        assert!(graph.node(group).is_meta());
        // The meta expands its members, but the non-recursive members stop
        assert_eq!(graph.node(group).dep.required.len(), 2);
        let a = graph.lookup("a").unwrap();
        assert!(graph.node(a).dep.required.is_empty());
    }

    #[test]
    fn test_load_dep_optional_honored() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "a", "REQUIRED:\nb\n\nOPTIONAL:\nc\n");
        write_dep(dir.path(), "b", "REQUIRED:\n");
        write_dep(dir.path(), "c", "REQUIRED:\n");

        let mut graph = graph_of(&["a", "b", "c"]);
        let without = PkgOptions {
            optional: false,
            ..PkgOptions::default()
        };
        load_dep(&mut graph, "a", &without, &config).unwrap();
        let a = graph.lookup("a").unwrap();
        assert_eq!(graph.node(a).dep.required.len(), 1);

        let mut graph = graph_of(&["a", "b", "c"]);
        load_dep(&mut graph, "a", &PkgOptions::default(), &config).unwrap();
        let a = graph.lookup("a").unwrap();
        assert_eq!(graph.node(a).dep.required.len(), 2);
    }

    #[test]
    fn test_find_all_meta_pkgs() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        write_dep(dir.path(), "group", "METAPKG\nREQUIRED:\na\n");
        write_dep(dir.path(), "a", "REQUIRED:\n");

        let mut graph = graph_of(&["a"]);
        find_all_meta_pkgs(&mut graph, &config).unwrap();
        assert_eq!(graph.meta_ids().len(), 1);
        assert!(graph.lookup("group").is_some());
    }
}
