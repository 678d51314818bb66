//! Update planning.
//!
//! Given a set of targets, the planner finds every package whose repository
//! version is newer than the installed one, then runs a fix-point over two
//! work lists: a dependency walk classifies each reachable package
//! (update, added, rebuild, downgrade), and a reverse-dependency walk pulls
//! in installed parents of anything that changed version. Downgrades are
//! reported but stripped before the final queue is emitted in dependency
//! order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::UserConfig;
use crate::error::Result;
use crate::graph::{self, GraphIter, IterFlags, PackageGraph, TraversalState};
use crate::installed::PackageDatabase;
use crate::output;
use crate::review::{self, ReviewStatus};
use crate::types::{CheckInstalled, NodeId, PkgOptions, ReviewType, Update};
use crate::version::compare_versions;
use crate::{mesg, pkgdb};

use super::build;

/// Append a handle to a work list unless it is already present.
fn push_unique(list: &mut Vec<NodeId>, id: NodeId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// What: Select targets whose repository version beats the installed one.
///
/// Details:
/// - Each target is walked at depth 0, so a meta-package target expands to
///   its members while a plain target contributes only itself.
fn select_updated_pkgs(
    db: &dyn PackageDatabase,
    graph: &PackageGraph,
    pkg_names: &[String],
    config: &UserConfig,
) -> Result<Vec<NodeId>> {
    let mut state = TraversalState::new();
    let mut selected = Vec::new();

    for pkg_name in pkg_names {
        let visits =
            GraphIter::begin(graph, &mut state, pkg_name, IterFlags::default(), 0)?
                .collect_visits()?;

        for visit in visits {
            let node = visit.id;
            if graph.node(node).is_meta() {
                continue;
            }
            if let Some(inst) = db.search(graph.name(node), Some(&config.sbo_tag))
                && compare_versions(&graph.node(node).version, &inst.version)
                    == Ordering::Greater
            {
                push_unique(&mut selected, node);
            }
        }
    }

    Ok(selected)
}

/// What: Dependency walk (B1): classify everything below the work list.
///
/// Details:
/// - Deep forward iteration with preserved coloring, so each pass only
///   covers territory earlier passes have not blackened.
/// - Classification per visited non-meta node: the walk root itself
///   becomes `Update`; an uninstalled node `DepAdded`; otherwise the
///   version comparison yields `DepUpdate`, `DepRebuild` (only with
///   `rebuild_deps`), or `DepDowngrade`.
#[allow(clippy::too_many_arguments)]
fn process_update_deps(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    state: &mut TraversalState,
    rebuild_deps: bool,
    pkg_list: &mut Vec<NodeId>,
    update_list: &mut Vec<NodeId>,
    build_list: &mut Vec<NodeId>,
    config: &UserConfig,
) -> Result<()> {
    while let Some(&cur) = pkg_list.first() {
        let cur_name = graph.name(cur).to_string();
        let flags = IterFlags {
            preserve_color: true,
            ..IterFlags::default()
        };
        let visits = GraphIter::begin(graph, state, &cur_name, flags, -1)?.collect_visits()?;

        for visit in visits {
            let node = visit.id;
            if graph.node(node).is_meta() {
                continue;
            }

            // A reverse-dep hit from an earlier pass is already a root-level
            // target; just make sure it reaches the build list.
            if graph
                .node(node)
                .update
                .as_ref()
                .is_some_and(Update::is_revdep_trigger)
            {
                push_unique(build_list, node);
                continue;
            }

            let inst = db
                .search(graph.name(node), Some(&config.sbo_tag))
                .map(|e| e.version.clone());

            if visit.dist == 0 {
                let Some(installed) = inst else {
                    tracing::warn!(
                        "update target {} disappeared from the installed set",
                        graph.name(node)
                    );
                    continue;
                };
                if graph.node(node).update.is_none() {
                    graph.node_mut(node).update = Some(Update::Update { installed });
                    push_unique(update_list, node);
                }
                push_unique(build_list, node);
                continue;
            }

            let Some(installed) = inst else {
                if graph.node(node).update.is_none() {
                    graph.node_mut(node).update = Some(Update::DepAdded { parent: cur });
                }
                push_unique(build_list, node);
                continue;
            };

            match compare_versions(&graph.node(node).version, &installed) {
                Ordering::Greater => {
                    if graph.node(node).update.is_none() {
                        graph.node_mut(node).update = Some(Update::DepUpdate {
                            parent: cur,
                            installed,
                        });
                        push_unique(update_list, node);
                    }
                    push_unique(build_list, node);
                }
                Ordering::Equal => {
                    if rebuild_deps {
                        if graph.node(node).update.is_none() {
                            graph.node_mut(node).update =
                                Some(Update::DepRebuild { parent: cur });
                        }
                        push_unique(build_list, node);
                    }
                }
                Ordering::Less => {
                    if graph.node(node).update.is_none() {
                        graph.node_mut(node).update = Some(Update::DepDowngrade {
                            parent: cur,
                            installed,
                        });
                    }
                    push_unique(build_list, node);
                }
            }
        }

        pkg_list.remove(0);
    }

    Ok(())
}

/// What: Reverse-dependency walk (B2): pull in installed parents.
///
/// Details:
/// - One step up from every version-changed package, with preserved
///   coloring. An installed parent is classified `RevdepUpdate`,
///   `RevdepRebuild`, or `RevdepDowngrade`; the first two re-enter the
///   dependency walk so their own closures get covered.
fn process_update_revdeps(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    state: &mut TraversalState,
    pkg_list: &mut Vec<NodeId>,
    update_list: &mut Vec<NodeId>,
    build_list: &mut Vec<NodeId>,
    config: &UserConfig,
) -> Result<()> {
    while let Some(&cur) = update_list.first() {
        let cur_name = graph.name(cur).to_string();
        let flags = IterFlags {
            revdeps: true,
            forward: true,
            preserve_color: true,
            ..IterFlags::default()
        };
        let visits = GraphIter::begin(graph, state, &cur_name, flags, 1)?.collect_visits()?;

        for visit in visits {
            let node = visit.id;
            if graph.node(node).is_meta() || visit.dist == 0 {
                continue;
            }

            let Some(installed) = db
                .search(graph.name(node), Some(&config.sbo_tag))
                .map(|e| e.version.clone())
            else {
                continue;
            };

            match compare_versions(&graph.node(node).version, &installed) {
                Ordering::Greater => {
                    if graph.node(node).update.is_none() {
                        graph.node_mut(node).update = Some(Update::RevdepUpdate {
                            child: cur,
                            installed,
                        });
                        push_unique(update_list, node);
                    }
                    push_unique(pkg_list, node);
                }
                Ordering::Equal => {
                    if graph.node(node).update.is_none() {
                        graph.node_mut(node).update = Some(Update::RevdepRebuild { child: cur });
                    }
                    push_unique(pkg_list, node);
                }
                Ordering::Less => {
                    if graph.node(node).update.is_none() {
                        graph.node_mut(node).update = Some(Update::RevdepDowngrade {
                            child: cur,
                            installed,
                        });
                        // Reported, then stripped before emission; recorded
                        // here so the downgrade is visible to the user.
                        push_unique(build_list, node);
                    }
                }
            }
        }

        update_list.remove(0);
    }

    Ok(())
}

/// What: Run the planner fix-point with review (phases B1–B3).
///
/// Details:
/// - Each outer pass clears the traversal coloring, resets classifications,
///   reseeds the work list from the originally selected targets, and
///   alternates the two walks until both lists drain.
/// - Then every build-list entry passes the review gate; a dep-file
///   modification reloads that file and restarts the outer pass. The skip
///   set persists across passes so nobody is prompted twice.
fn process_update(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    options: &PkgOptions,
    selected: &[NodeId],
    build_list: &mut Vec<NodeId>,
    config: &UserConfig,
) -> Result<()> {
    let mut state = TraversalState::new();
    let mut review_skip: BTreeSet<NodeId> = BTreeSet::new();
    let mut pkg_list: Vec<NodeId> = selected.to_vec();
    let mut update_list: Vec<NodeId> = Vec::new();

    loop {
        state.clear(graph.len());
        for &id in build_list.iter() {
            graph.node_mut(id).update = None;
        }
        build_list.clear();
        if pkg_list.is_empty() {
            pkg_list = selected.to_vec();
        }

        while !pkg_list.is_empty() || !update_list.is_empty() {
            process_update_deps(
                db,
                graph,
                &mut state,
                options.rebuild_deps,
                &mut pkg_list,
                &mut update_list,
                build_list,
                config,
            )?;
            process_update_revdeps(
                db,
                graph,
                &mut state,
                &mut pkg_list,
                &mut update_list,
                build_list,
                config,
            )?;
        }

        let mut restart = false;
        for i in 0..build_list.len() {
            let node = build_list[i];
            if review_skip.contains(&node) {
                continue;
            }

            let mut db_dirty = false;
            let status = review::check_reviewed(
                graph.node_mut(node),
                options.review_type,
                config,
                &mut db_dirty,
            )?;
            if db_dirty {
                pkgdb::write_pkgdb(graph, config)?;
            }
            review_skip.insert(node);

            if status == ReviewStatus::Restart {
                let node_name = graph.name(node).to_string();
                graph.clear_required(node);
                graph::load_dep(graph, &node_name, options, config)?;
                restart = true;
                break;
            }
        }

        if !restart {
            return Ok(());
        }
    }
}

/// What: Print the classification report and strip downgrade entries.
///
/// Details:
/// - One labeled line per entry: `[ U]`/`[DU]`/`[DR]`/`[DD]`/`[DA]` for the
///   dependency walk, `[PU]`/`[PR]`/`[PD]` for reverse dependencies, with
///   the related package and the version transition where applicable.
fn report_and_strip(graph: &PackageGraph, build_list: &mut Vec<NodeId>) {
    let mut kept = Vec::with_capacity(build_list.len());

    for &node in build_list.iter() {
        let pkg = graph.node(node);
        let Some(update) = &pkg.update else {
            continue;
        };
        let name = &pkg.name;
        let version = &pkg.version;

        match update {
            Update::Update { installed } => {
                mesg::ok_label(
                    "[ U]",
                    &format!(" {name:<24} {:<28} {installed:<8} --> {version}", ""),
                );
            }
            Update::DepUpdate { parent, installed } => {
                let rel = graph.name(*parent);
                mesg::ok_label(
                    "[DU]",
                    &format!(" {name:<24} (P:{rel:<24}) {installed:<8} --> {version}"),
                );
            }
            Update::DepRebuild { parent } => {
                let rel = graph.name(*parent);
                mesg::info_label("[DR]", &format!(" {name:<24} (P:{rel:<24}) {version:<8}"));
            }
            Update::DepDowngrade { parent, .. } => {
                let rel = graph.name(*parent);
                mesg::error_label("[DD]", &format!(" {name:<24} (P:{rel:<24}) {version:<8}"));
            }
            Update::DepAdded { parent } => {
                let rel = graph.name(*parent);
                mesg::warn_label("[DA]", &format!(" {name:<24} (P:{rel:<24}) {version:<8}"));
            }
            Update::RevdepUpdate { child, installed } => {
                let rel = graph.name(*child);
                mesg::ok_label(
                    "[PU]",
                    &format!(" {name:<24} (D:{rel:<24}) {installed:<8} --> {version}"),
                );
            }
            Update::RevdepRebuild { child } => {
                let rel = graph.name(*child);
                mesg::info_label("[PR]", &format!(" {name:<24} (D:{rel:<24}) {version:<8}"));
            }
            Update::RevdepDowngrade { child, .. } => {
                let rel = graph.name(*child);
                mesg::error_label("[PD]", &format!(" {name:<24} ({rel:<24}) {version:<8}"));
            }
        }

        if !update.is_downgrade() {
            kept.push(node);
        }
    }

    *build_list = kept;
}

/// What: Run the `update` command.
///
/// Details:
/// - Forces deep reverse-dependency loading, selects the updated targets,
///   runs the planner fix-point, reports and strips, then emits the final
///   queue with review, recursion, and install checks all disabled (the
///   planning pass already decided everything).
///
/// # Errors
///
/// Propagates load, traversal, review, and output failures.
pub fn run_update(
    db: &dyn PackageDatabase,
    graph: &mut PackageGraph,
    pkg_names: &[String],
    options: &PkgOptions,
    config: &UserConfig,
) -> Result<()> {
    let mut options = options.clone();
    options.revdeps = true;
    options.deep = true;
    options.max_dist = -1;

    if options.installed_revdeps {
        graph::load_installed_deps(graph, db, &options, config)?;
    } else {
        graph::load_all_deps(graph, &options, config)?;
    }

    // Meta-package targets exist only as dep files; pull them in explicitly.
    for pkg_name in pkg_names {
        if graph::is_meta_file(&config.dep_file_path(pkg_name)) {
            graph::load_dep(graph, pkg_name, &options, config)?;
        }
    }

    let selected = select_updated_pkgs(db, graph, pkg_names, config)?;

    let mut build_list = Vec::new();
    process_update(db, graph, &options, &selected, &mut build_list, config)?;

    report_and_strip(graph, &mut build_list);

    let emit_options = PkgOptions {
        review_type: ReviewType::Disabled,
        check_installed: CheckInstalled::None,
        revdeps: false,
        deep: false,
        max_dist: 0,
        recursive: false,
        ..options.clone()
    };

    let build_names: Vec<String> = build_list
        .iter()
        .map(|&id| graph.name(id).to_string())
        .collect();

    // The output file is named after the requested targets, not the
    // resulting queue.
    let mut sink = match output::resolve_output_name(&options, pkg_names, "")? {
        Some(name) => output::OutputSink::create(std::path::Path::new(&name))?,
        None => output::OutputSink::stdout(),
    };

    let mut db_dirty = false;
    build::write_sqf(
        &mut sink,
        db,
        graph,
        &build_names,
        &emit_options,
        config,
        &mut db_dirty,
    )?;
    sink.close()?;

    if db_dirty {
        pkgdb::write_pkgdb(graph, config)?;
    }
    Ok(())
}
