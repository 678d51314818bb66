//! Integration tests for catalog persistence and `updatedb`.

use std::fs;
use std::path::Path;

use sbo_toolkit::config::UserConfig;
use sbo_toolkit::graph::PackageGraph;
use sbo_toolkit::queue;
use sbo_toolkit::{pkgdb, repo};

struct Fixture {
    _repo: tempfile::TempDir,
    _state: tempfile::TempDir,
    config: UserConfig,
}

impl Fixture {
    fn new() -> Self {
        let repo_dir = tempfile::TempDir::new().unwrap();
        let state_dir = tempfile::TempDir::new().unwrap();
        let config = UserConfig {
            sbopkg_repo: repo_dir.path().to_path_buf(),
            depdir: state_dir.path().to_path_buf(),
            ..UserConfig::default()
        };
        Self {
            _repo: repo_dir,
            _state: state_dir,
            config,
        }
    }

    fn write_package(&self, category: &str, name: &str, version: &str, requires: &str) {
        let dir = self.config.sbopkg_repo.join(category).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{name}.info")),
            format!("PRGNAM=\"{name}\"\nVERSION=\"{version}\"\nREQUIRES=\"{requires}\"\n"),
        )
        .unwrap();
        fs::write(dir.join("README"), format!("{name} does things\n")).unwrap();
    }

    fn pkgdb_bytes(&self) -> Vec<u8> {
        fs::read(self.config.pkgdb_path()).unwrap()
    }
}

/// Scan the repository and persist the initial catalog.
fn bootstrap(fx: &Fixture) -> PackageGraph {
    let graph = PackageGraph::from_packages(repo::scan_repo(&fx.config.sbopkg_repo).unwrap());
    pkgdb::write_pkgdb(&graph, &fx.config).unwrap();
    graph
}

/// Running updatedb against an unchanged repository rewrites PKGDB
/// byte-for-byte identically.
#[test]
fn test_updatedb_unchanged_repo_is_stable() {
    let fx = Fixture::new();
    fx.write_package("system", "htop", "3.2.2", "ncurses");
    fx.write_package("libraries", "ncurses", "6.4", "");

    let mut graph = bootstrap(&fx);

    // Mark state that must survive an unchanged rescan
    let htop = graph.lookup("htop").unwrap();
    graph.node_mut(htop).is_reviewed = true;
    graph.node_mut(htop).is_tracked = true;
    pkgdb::write_pkgdb(&graph, &fx.config).unwrap();
    let before = fx.pkgdb_bytes();

    queue::run_updatedb(&mut graph, &fx.config).unwrap();

    assert_eq!(fx.pkgdb_bytes(), before);
}

/// A changed REQUIRES field clears the review flag but keeps tracking.
#[test]
fn test_updatedb_definition_change_clears_review() {
    let fx = Fixture::new();
    fx.write_package("system", "htop", "3.2.2", "ncurses");

    let mut graph = bootstrap(&fx);
    let htop = graph.lookup("htop").unwrap();
    graph.node_mut(htop).is_reviewed = true;
    graph.node_mut(htop).is_tracked = true;
    pkgdb::write_pkgdb(&graph, &fx.config).unwrap();

    fx.write_package("system", "htop", "3.2.2", "ncurses lm_sensors");
    queue::run_updatedb(&mut graph, &fx.config).unwrap();

    let saved = pkgdb::load_pkgdb(&fx.config).unwrap();
    assert_eq!(saved.len(), 1);
    assert!(!saved[0].is_reviewed);
    assert!(saved[0].is_tracked);
}

/// A removed package disappears from the catalog; a new one is added.
#[test]
fn test_updatedb_tracks_added_and_removed() {
    let fx = Fixture::new();
    fx.write_package("system", "htop", "3.2.2", "");

    let mut graph = bootstrap(&fx);

    fs::remove_dir_all(fx.config.sbopkg_repo.join("system/htop")).unwrap();
    fx.write_package("network", "curlie", "1.6.9", "curl");
    queue::run_updatedb(&mut graph, &fx.config).unwrap();

    let saved = pkgdb::load_pkgdb(&fx.config).unwrap();
    let names: Vec<&str> = saved.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["curlie"]);
}

/// updatedb synthesizes default dep files from REQUIRES for packages that
/// lack one, dropping the %README% placeholder.
#[test]
fn test_updatedb_synthesizes_default_dep_files() {
    let fx = Fixture::new();
    fx.write_package("system", "htop", "3.2.2", "ncurses %README%");
    fx.write_package("libraries", "ncurses", "6.4", "");

    let mut graph = bootstrap(&fx);
    queue::run_updatedb(&mut graph, &fx.config).unwrap();

    let dep_path = fx.config.dep_file_path("htop");
    assert!(dep_path.is_file());
    let dep = sbo_toolkit::graph::parse_dep_file(
        &fs::read_to_string(&dep_path).unwrap(),
        &dep_path,
    )
    .unwrap();
    assert_eq!(dep.required, vec!["ncurses"]);
    assert!(dep.optional.is_empty());

    // An existing dep file is left alone
    fs::write(&dep_path, "REQUIRED:\nncurses\n# customized\n").unwrap();
    queue::run_updatedb(&mut graph, &fx.config).unwrap();
    assert!(
        fs::read_to_string(&dep_path)
            .unwrap()
            .contains("# customized")
    );
}

/// PKGDB survives a load/store round trip unchanged.
#[test]
fn test_pkgdb_round_trip_preserves_catalog() {
    let fx = Fixture::new();
    fx.write_package("system", "htop", "3.2.2", "ncurses");
    fx.write_package("libraries", "ncurses", "6.4", "");

    let graph = bootstrap(&fx);
    let before = fx.pkgdb_bytes();

    let reloaded = PackageGraph::from_packages(pkgdb::load_pkgdb(&fx.config).unwrap());
    pkgdb::write_pkgdb(&reloaded, &fx.config).unwrap();

    assert_eq!(fx.pkgdb_bytes(), before);
    assert_eq!(reloaded.sbo_ids().len(), graph.sbo_ids().len());
    for (&a, &b) in graph.sbo_ids().iter().zip(reloaded.sbo_ids()) {
        assert_eq!(graph.name(a), reloaded.name(b));
        assert_eq!(graph.node(a).info_crc, reloaded.node(b).info_crc);
        assert_eq!(
            graph.node(a).sbo_dir.as_deref().map(Path::to_path_buf),
            reloaded.node(b).sbo_dir.as_deref().map(Path::to_path_buf)
        );
    }
}
