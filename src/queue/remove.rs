//! Remove-queue generation.
//!
//! A removal cascades through a target's dependency subtree, but a package
//! still required by an installed parent outside the cascade is vetoed and
//! reported. Reverse edges are always loaded so the veto check can see
//! every installed parent.

use std::collections::BTreeSet;
use std::io::Write;

use crate::config::UserConfig;
use crate::error::{Result, SboToolkitError};
use crate::graph::{self, GraphIter, IterFlags, PackageGraph, TraversalState};
use crate::installed::PackageDatabase;
use crate::mesg;
use crate::output;
use crate::types::{NodeId, OutputMode, PkgOptions};

/// What: Collect removal candidates below the targets.
///
/// Details:
/// - Forward traversal, depth −1 (`deep`) or 0; installed non-meta nodes
///   are marked `for_removal`.
/// - Candidates come back with targets before their dependencies so the
///   veto pass can cascade.
fn collect_candidates(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    pkg_names: &[String],
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<Vec<NodeId>> {
    let mut state = TraversalState::new();
    let mut candidates = Vec::new();
    let mut seen = BTreeSet::new();
    let max_dist = if options.deep { -1 } else { 0 };

    for pkg_name in pkg_names {
        let visits =
            GraphIter::begin(graph, &mut state, pkg_name, IterFlags::default(), max_dist)?
                .collect_visits()?;

        for visit in visits {
            let node = visit.id;
            if graph.node(node).is_meta() {
                continue;
            }
            if !db.is_installed(graph.name(node), Some(&config.sbo_tag)) {
                continue;
            }
            graph.node_mut(node).for_removal = true;
            if seen.insert(node) {
                candidates.push(node);
            }
        }
    }

    // Post-order collection lists dependencies first; removal wants the
    // targets first so dependents leave before what they require.
    candidates.reverse();
    Ok(candidates)
}

/// What: Veto candidates still required by an installed parent.
///
/// Details:
/// - One step through each candidate's parents: an installed parent not
///   itself marked for removal keeps the candidate installed, with a
///   `[required] child <-- parent` diagnostic.
/// - Runs in targets-first order so a vetoed package also vetoes the
///   dependencies only it was pulling out.
fn veto_required(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    candidates: &[NodeId],
    config: &UserConfig,
) -> Result<Vec<NodeId>> {
    let mut state = TraversalState::new();
    let mut removal = Vec::new();

    for &node in candidates {
        let node_name = graph.name(node).to_string();
        let flags = IterFlags {
            revdeps: true,
            ..IterFlags::default()
        };
        let visits =
            GraphIter::begin(graph, &mut state, &node_name, flags, 1)?.collect_visits()?;

        for visit in visits {
            let parent = visit.id;
            if parent == node || graph.node(parent).is_meta() {
                continue;
            }

            let parent_installed =
                db.is_installed(graph.name(parent), Some(&config.sbo_tag));
            if parent_installed && !graph.node(parent).for_removal {
                mesg::error_label(
                    &format!("{:>12}", "[required]"),
                    &format!(" {node_name:<24} <-- {}", graph.name(parent)),
                );
                graph.node_mut(node).for_removal = false;
                break;
            }
        }

        if graph.node(node).for_removal {
            removal.push(node);
        }
    }

    Ok(removal)
}

/// What: Run the `remove` command.
///
/// Details:
/// - Loads the whole catalog with reverse edges, collects and vetoes the
///   cascade, and emits survivors with each package before the
///   dependencies it was holding in place. An empty queue produces no
///   output file.
///
/// # Errors
///
/// Propagates load, traversal, and output failures.
pub fn run_remove(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    pkg_names: &[String],
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<()> {
    debug_assert!(options.revdeps, "removal requires reverse-dep processing");

    graph::load_all_deps(graph, options, config)?;
    for pkg_name in pkg_names {
        graph::load_dep(graph, pkg_name, options, config)?;
    }

    let candidates = collect_candidates(db, graph, pkg_names, options, config)?;
    let removal = veto_required(db, graph, &candidates, config)?;

    if removal.is_empty() {
        return Ok(());
    }

    let mut sink = output::open_sink(options, pkg_names, "-remove")?;
    let io_err = |e: std::io::Error| SboToolkitError::io("output", e);

    let mut wrote_any = false;
    for &node in &removal {
        let name = output::output_name(
            options.output_mode,
            graph.name(node),
            &config.slackpkg_repo_name,
        );
        if options.output_mode == OutputMode::File {
            writeln!(sink, "{name}").map_err(io_err)?;
        } else {
            write!(sink, "{name} ").map_err(io_err)?;
        }
        wrote_any = true;
    }
    if wrote_any && options.output_mode != OutputMode::File {
        writeln!(sink).map_err(io_err)?;
    }

    if let Some(path) = sink.path() {
        mesg::ok(&format!("created {}", path.display()));
    }
    sink.close()
}
