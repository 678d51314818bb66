//! Build-queue generation.
//!
//! A build queue lists the packages needed to build a set of targets, in
//! dependency order (or reverse-dependency order with `revdeps`). Every
//! node passes the review gate on its way into the queue; a review that
//! modifies a dep file aborts the affected target's traversal, reloads the
//! file, and retries with the new edges.

use std::collections::BTreeSet;

use crate::config::UserConfig;
use crate::error::Result;
use crate::graph::{self, GraphIter, IterFlags, PackageGraph, TraversalState};
use crate::installed::PackageDatabase;
use crate::output::{self, OutputSink};
use crate::review::{self, ReviewStatus};
use crate::types::{NodeId, PkgOptions};
use crate::pkgdb;

/// Effective traversal depth for queue generation.
fn queue_max_dist(options: &PkgOptions) -> i32 {
    if options.max_dist >= 0 {
        options.max_dist
    } else if options.deep {
        -1
    } else {
        1
    }
}

/// Outcome of one target's collection pass.
enum TargetPass {
    /// All nodes collected and reviewed.
    Done,
    /// A dep file changed during review; run the target again.
    Restart,
}

/// What: Collect one target's queue contribution, gating each node.
///
/// Details:
/// - Drives a full traversal first, then processes the visits: meta nodes
///   are dropped, installed non-target nodes are skipped per the
///   `check_installed` policy, and each remaining node passes the review
///   gate once (tracked in `review_skip`).
/// - A `Restart` from the gate clears the modified node's edges, reloads
///   its dep file, and discards this pass's remaining work.
fn collect_target(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    state: &mut TraversalState,
    pkg_name: &str,
    options: &PkgOptions,
    config: &UserConfig,
    db_dirty: &mut bool,
    review_skip: &mut BTreeSet<NodeId>,
    output: &mut Vec<NodeId>,
    output_seen: &mut BTreeSet<NodeId>,
) -> Result<TargetPass> {
    let flags = IterFlags {
        revdeps: options.revdeps,
        ..IterFlags::default()
    };
    let visits =
        GraphIter::begin(graph, state, pkg_name, flags, queue_max_dist(options))?.collect_visits()?;

    for visit in visits {
        let node = visit.id;
        if graph.node(node).is_meta() {
            continue;
        }

        if options.check_installed.is_enabled() && graph.name(node) != pkg_name {
            let tag = options.check_installed.tag_filter(&config.sbo_tag);
            if db.is_installed(graph.name(node), tag) {
                continue;
            }
        }

        if !review_skip.contains(&node) {
            let status = review::check_reviewed(
                graph.node_mut(node),
                options.review_type,
                config,
                db_dirty,
            )?;
            if status == ReviewStatus::Restart {
                let node_name = graph.name(node).to_string();
                graph.clear_required(node);
                graph::load_dep(graph, &node_name, options, config)?;
                return Ok(TargetPass::Restart);
            }
            review_skip.insert(node);
        }

        if output_seen.insert(node) {
            output.push(node);
        }
    }

    Ok(TargetPass::Done)
}

/// What: Generate and emit the build queue for a set of targets.
///
/// Inputs:
/// - `sink`: Queue destination.
/// - `db`: Installed-package oracle for the skip policy.
/// - `graph`: Catalog with the targets' subgraphs loaded.
/// - `pkg_names`: Targets, in command-line order.
/// - `options`: Traversal direction, depth, skip, review, and output mode.
/// - `config`: User configuration.
/// - `db_dirty`: Set when a review changed PKGDB state.
///
/// Output:
/// - Writes the queue through the sink: iteration order for dependency
///   traversals, reversed for reverse-dependency traversals.
///
/// # Errors
///
/// Propagates traversal (cycle), review, reload, and write failures.
#[allow(clippy::too_many_arguments)]
pub fn write_sqf(
    sink: &mut OutputSink,
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    pkg_names: &[String],
    options: &PkgOptions,
    config: &UserConfig,
    db_dirty: &mut bool,
) -> Result<()> {
    let mut state = TraversalState::new();
    let mut review_skip = BTreeSet::new();
    let mut output = Vec::new();
    let mut output_seen = BTreeSet::new();

    for pkg_name in pkg_names {
        loop {
            let pass = collect_target(
                db,
                graph,
                &mut state,
                pkg_name,
                options,
                config,
                db_dirty,
                &mut review_skip,
                &mut output,
                &mut output_seen,
            )?;
            match pass {
                TargetPass::Done => break,
                TargetPass::Restart => {}
            }
        }
    }

    output::write_queue(
        sink,
        graph,
        &output,
        options.revdeps,
        options.output_mode,
        &config.slackpkg_repo_name,
    )
}

/// What: Run the `build` command.
///
/// Details:
/// - Loads each target's subgraph, widens the graph for reverse-dependency
///   queues (all catalog entries, or only installed ones with
///   `installed_revdeps`), writes the queue, and persists PKGDB when a
///   review changed it.
///
/// # Errors
///
/// Propagates load, traversal, review, and output failures.
pub fn run_build(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    pkg_names: &[String],
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<()> {
    for pkg_name in pkg_names {
        graph::load_dep(graph, pkg_name, options, config)?;
    }

    if options.revdeps {
        if options.installed_revdeps {
            graph::load_installed_deps(graph, db, options, config)?;
        } else {
            graph::load_all_deps(graph, options, config)?;
        }
    }

    let mut sink = output::open_sink(options, pkg_names, "")?;
    let mut db_dirty = false;

    write_sqf(&mut sink, db, graph, pkg_names, options, config, &mut db_dirty)?;
    sink.close()?;

    if db_dirty {
        pkgdb::write_pkgdb(graph, config)?;
    }
    Ok(())
}
