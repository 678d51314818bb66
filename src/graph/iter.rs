//! Depth-first traversal over the package graph.
//!
//! One iterator abstraction drives every queue generator. It walks either
//! required dependencies or reverse dependencies, visits each reachable node
//! at most once, tracks a minimum distance from the start node, and emits
//! nodes either post-order (dependencies before their dependents, the
//! default) or pre-order (`forward`). Traversal bookkeeping lives in a
//! caller-owned [`TraversalState`] so the catalog itself stays immutable and
//! multi-pass planners can carry coloring across traversals.

use crate::error::{Result, SboToolkitError};
use crate::graph::PackageGraph;
use crate::types::NodeId;

/// Traversal coloring of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    #[default]
    White,
    /// On the active visit path.
    Grey,
    /// Fully processed.
    Black,
}

/// Per-node traversal bookkeeping.
#[derive(Clone, Debug)]
struct Mark {
    color: Color,
    /// Minimum distance from the start node; −1 when unset.
    dist: i32,
    /// Progress through this node's adjacency list.
    edge_index: usize,
}

impl Default for Mark {
    fn default() -> Self {
        Self {
            color: Color::White,
            dist: -1,
            edge_index: 0,
        }
    }
}

/// Caller-owned traversal markers, keyed by node handle.
///
/// A fresh state (or [`TraversalState::clear`]) resets every node to
/// unvisited. Passing the same state to several traversals with
/// `preserve_color` continues from the existing coloring, which is how the
/// update planner walks only new territory on each pass.
#[derive(Debug, Default)]
pub struct TraversalState {
    marks: Vec<Mark>,
}

impl TraversalState {
    /// Create an empty state; it grows to the graph size on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Reset every marker to the unvisited state.
    ///
    /// Inputs:
    /// - `len`: Current node count of the graph.
    pub fn clear(&mut self, len: usize) {
        self.marks.clear();
        self.marks.resize_with(len, Mark::default);
    }

    /// Grow the marker table without touching existing entries.
    fn grow(&mut self, len: usize) {
        if self.marks.len() < len {
            self.marks.resize_with(len, Mark::default);
        }
    }

    /// Distance recorded for a node (−1 when the node was never reached).
    #[must_use]
    pub fn dist(&self, id: NodeId) -> i32 {
        self.marks.get(id.index()).map_or(-1, |m| m.dist)
    }

    fn mark(&self, id: NodeId) -> &Mark {
        &self.marks[id.index()]
    }

    fn mark_mut(&mut self, id: NodeId) -> &mut Mark {
        &mut self.marks[id.index()]
    }
}

/// Flags selecting edge direction, emission order, and marker handling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IterFlags {
    /// Traverse reverse edges (parents) instead of required dependencies.
    pub revdeps: bool,
    /// Emit each node when first visited instead of on pop.
    pub forward: bool,
    /// At the distance cut-off, also emit the neighbor one step beyond.
    pub req_nearest: bool,
    /// Count steps to and from meta-packages as distance 1 instead of 0.
    pub metapkg_dist: bool,
    /// Keep the existing coloring instead of clearing markers at begin.
    pub preserve_color: bool,
}

/// One emitted node together with its distance from the start.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Visit {
    /// Emitted node.
    pub id: NodeId,
    /// Minimum distance from the start node at emission time.
    pub dist: i32,
}

/// Cursor over one traversal of the graph.
pub struct GraphIter<'g, 's> {
    graph: &'g PackageGraph,
    state: &'s mut TraversalState,
    flags: IterFlags,
    /// Depth cut-off; −1 means unbounded.
    max_dist: i32,
    /// Node whose adjacency list is being consumed.
    cur: Option<NodeId>,
    /// Pre-order mode: node emitted by the previous step, entered next.
    pending: Option<NodeId>,
    /// Pre-order mode: the start node, emitted by the first `next` call.
    primed: Option<Visit>,
    /// Ancestors of `cur` on the visit path.
    stack: Vec<NodeId>,
}

impl<'g, 's> GraphIter<'g, 's> {
    /// What: Start a traversal at a named package.
    ///
    /// Inputs:
    /// - `graph`: The catalog to walk.
    /// - `state`: Marker storage; cleared here unless `preserve_color`.
    /// - `pkg_name`: Start node name.
    /// - `flags`: Direction, emission order, and marker handling.
    /// - `max_dist`: Depth cut-off; −1 for unbounded.
    ///
    /// Output:
    /// - Returns the cursor; drive it with [`GraphIter::next`].
    ///
    /// Details:
    /// - The start node's color and distance are always reset, even when
    ///   `preserve_color` keeps the rest of the coloring.
    ///
    /// # Errors
    ///
    /// Returns `PackageNotFound` when `pkg_name` is not in the graph.
    pub fn begin(
        graph: &'g PackageGraph,
        state: &'s mut TraversalState,
        pkg_name: &str,
        flags: IterFlags,
        max_dist: i32,
    ) -> Result<Self> {
        let start = graph
            .lookup(pkg_name)
            .ok_or_else(|| SboToolkitError::PackageNotFound(pkg_name.to_string()))?;

        if flags.preserve_color {
            state.grow(graph.len());
        } else {
            state.clear(graph.len());
        }

        let mut iter = Self {
            graph,
            state,
            flags,
            max_dist,
            cur: None,
            pending: None,
            primed: None,
            stack: Vec::new(),
        };

        if flags.forward {
            let mark = iter.state.mark_mut(start);
            mark.color = Color::White;
            mark.dist = 0;
            iter.pending = Some(start);
            iter.primed = Some(Visit { id: start, dist: 0 });
        } else {
            let mark = iter.state.mark_mut(start);
            mark.color = Color::Grey;
            mark.dist = 0;
            iter.cur = Some(start);
        }

        Ok(iter)
    }

    /// What: Produce the next node of the traversal.
    ///
    /// Output:
    /// - Returns `Ok(Some(visit))` for each emitted node, `Ok(None)` when
    ///   the traversal is complete.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` when an edge reaches a node on the active
    /// visit path.
    pub fn next(&mut self) -> Result<Option<Visit>> {
        if let Some(visit) = self.primed.take() {
            return Ok(Some(visit));
        }
        if self.flags.forward {
            self.next_preorder()
        } else {
            self.next_postorder()
        }
    }

    /// What: Drain the traversal into a list of visits.
    ///
    /// Output:
    /// - Returns every remaining emission in order.
    ///
    /// # Errors
    ///
    /// Propagates the first cycle error.
    pub fn collect_visits(mut self) -> Result<Vec<Visit>> {
        let mut visits = Vec::new();
        while let Some(visit) = self.next()? {
            visits.push(visit);
        }
        Ok(visits)
    }

    /// Adjacency list of a node for the configured direction.
    fn edges(&self, id: NodeId) -> &[NodeId] {
        let dep = &self.graph.node(id).dep;
        if self.flags.revdeps {
            &dep.parents
        } else {
            &dep.required
        }
    }

    /// What: Consume the current node's next edge.
    ///
    /// Details:
    /// - Advances the edge index, rejects GREY targets as cycles, and
    ///   applies the minimum-distance update with the meta-package rule: a
    ///   step from a meta-package (dependency direction) or to one (reverse
    ///   direction) contributes no distance unless `metapkg_dist`.
    fn take_edge(&mut self, cur: NodeId) -> Result<NodeId> {
        let idx = self.state.mark(cur).edge_index;
        let edge = self.edges(cur)[idx];
        self.state.mark_mut(cur).edge_index = idx + 1;

        if self.state.mark(edge).color == Color::Grey {
            return Err(SboToolkitError::CyclicDependency(
                self.graph.name(cur).to_string(),
                self.graph.name(edge).to_string(),
            ));
        }

        let mut incr = 1;
        if !self.flags.metapkg_dist {
            let meta_side = if self.flags.revdeps { edge } else { cur };
            if self.graph.node(meta_side).is_meta() {
                incr = 0;
            }
        }

        let dist = self.state.mark(cur).dist + incr;
        let edge_mark = self.state.mark_mut(edge);
        if edge_mark.dist < 0 || dist < edge_mark.dist {
            edge_mark.dist = dist;
        }

        Ok(edge)
    }

    /// Visit record for an emitted node.
    fn visit(&self, id: NodeId) -> Visit {
        Visit {
            id,
            dist: self.state.mark(id).dist,
        }
    }

    /// What: Check whether the distance cut-off stops traversal at a node.
    ///
    /// Details:
    /// - A meta-package in the dependency direction is transparent: every
    ///   step out of it costs nothing, so the cut-off never blocks it
    ///   (unless `metapkg_dist` restored the contribution of 1).
    fn at_max(&self, cur: NodeId) -> bool {
        if self.max_dist < 0 || self.state.mark(cur).dist != self.max_dist {
            return false;
        }
        let transparent = !self.flags.metapkg_dist
            && !self.flags.revdeps
            && self.graph.node(cur).is_meta();
        !transparent
    }

    /// Post-order step: emit nodes as they are popped off the visit path.
    fn next_postorder(&mut self) -> Result<Option<Visit>> {
        loop {
            let Some(cur) = self.cur else {
                return Ok(None);
            };

            let num_edges = self.edges(cur).len();
            let at_max = self.at_max(cur);
            let have_edges = self.state.mark(cur).edge_index < num_edges;

            if !have_edges || at_max {
                if at_max && self.flags.req_nearest && have_edges {
                    let edge = self.take_edge(cur)?;
                    self.state.mark_mut(edge).color = Color::Black;
                    return Ok(Some(self.visit(edge)));
                }

                self.state.mark_mut(cur).color = Color::Black;
                self.cur = self.stack.pop();
                return Ok(Some(self.visit(cur)));
            }

            while self.state.mark(cur).edge_index < num_edges {
                let edge = self.take_edge(cur)?;
                let color = self.state.mark(edge).color;

                if color == Color::Black && self.flags.req_nearest {
                    return Ok(Some(self.visit(edge)));
                }
                if color == Color::White {
                    self.state.mark_mut(edge).color = Color::Grey;
                    self.stack.push(cur);
                    self.cur = Some(edge);
                    break;
                }
            }
        }
    }

    /// Pre-order step: emit nodes when first reached, descend on re-entry.
    fn next_preorder(&mut self) -> Result<Option<Visit>> {
        loop {
            if let Some(pending) = self.pending.take()
                && self.state.mark(pending).color == Color::White
            {
                self.state.mark_mut(pending).color = Color::Grey;
                if let Some(cur) = self.cur {
                    self.stack.push(cur);
                }
                self.cur = Some(pending);
            }

            let Some(cur) = self.cur else {
                return Ok(None);
            };

            let num_edges = self.edges(cur).len();
            let at_max = self.at_max(cur);
            let have_edges = self.state.mark(cur).edge_index < num_edges;

            if !have_edges || at_max {
                if at_max && self.flags.req_nearest && have_edges {
                    let edge = self.take_edge(cur)?;
                    self.state.mark_mut(edge).color = Color::Black;
                    self.pending = Some(edge);
                    return Ok(Some(self.visit(edge)));
                }

                self.state.mark_mut(cur).color = Color::Black;
                self.cur = self.stack.pop();
                continue;
            }

            while self.state.mark(cur).edge_index < num_edges {
                let edge = self.take_edge(cur)?;
                let color = self.state.mark(edge).color;

                if color == Color::White || (color == Color::Black && self.flags.req_nearest) {
                    self.pending = Some(edge);
                    return Ok(Some(self.visit(edge)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Package;

    /// Build a graph from `(name, deps)` pairs with reverse edges populated.
    fn build_graph(edges: &[(&str, &[&str])]) -> PackageGraph {
        let mut graph =
            PackageGraph::from_packages(edges.iter().map(|(n, _)| Package::new(*n)).collect());
        for (name, deps) in edges {
            let parent = graph.lookup(name).unwrap();
            for dep in *deps {
                let child = graph.lookup(dep).unwrap();
                graph.insert_required(parent, child);
                graph.insert_parent(child, parent);
            }
        }
        graph
    }

    fn names(graph: &PackageGraph, visits: &[Visit]) -> Vec<String> {
        visits
            .iter()
            .map(|v| graph.name(v.id).to_string())
            .collect()
    }

    #[test]
    fn test_postorder_emits_dependencies_first() {
        let graph = build_graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        let mut state = TraversalState::new();
        let iter =
            GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), -1).unwrap();
        let visits = iter.collect_visits().unwrap();
        assert_eq!(names(&graph, &visits), vec!["c", "b", "a"]);
        assert_eq!(visits.last().unwrap().dist, 0);
    }

    #[test]
    fn test_preorder_emits_start_first() {
        let graph = build_graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        let mut state = TraversalState::new();
        let flags = IterFlags {
            forward: true,
            ..IterFlags::default()
        };
        let iter = GraphIter::begin(&graph, &mut state, "a", flags, -1).unwrap();
        let visits = iter.collect_visits().unwrap();
        assert_eq!(names(&graph, &visits), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_each_node_visited_once() {
        // Diamond: d is reachable through both b and c
        let graph = build_graph(&[
            ("a", &["b", "c"]),
            ("b", &["d"]),
            ("c", &["d"]),
            ("d", &[]),
        ]);
        let mut state = TraversalState::new();
        let iter =
            GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), -1).unwrap();
        let visits = iter.collect_visits().unwrap();
        assert_eq!(visits.len(), 4);
        let mut sorted = names(&graph, &visits);
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_max_dist_zero_returns_start_only() {
        let graph = build_graph(&[("a", &["b"]), ("b", &[])]);
        let mut state = TraversalState::new();
        let iter = GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), 0).unwrap();
        let visits = iter.collect_visits().unwrap();
        assert_eq!(names(&graph, &visits), vec!["a"]);
    }

    #[test]
    fn test_max_dist_limits_depth() {
        let graph = build_graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let mut state = TraversalState::new();
        let iter = GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), 1).unwrap();
        let visits = iter.collect_visits().unwrap();
        assert_eq!(names(&graph, &visits), vec!["b", "a"]);
    }

    #[test]
    fn test_reverse_traversal_walks_parents() {
        let graph = build_graph(&[("a", &["c"]), ("b", &["c"]), ("c", &[])]);
        let mut state = TraversalState::new();
        let flags = IterFlags {
            revdeps: true,
            ..IterFlags::default()
        };
        let iter = GraphIter::begin(&graph, &mut state, "c", flags, -1).unwrap();
        let visits = iter.collect_visits().unwrap();
        let mut parents = names(&graph, &visits);
        parents.sort();
        assert_eq!(parents, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_detected() {
        let graph = build_graph(&[("a", &["b"]), ("b", &["a"])]);
        let mut state = TraversalState::new();
        let mut iter =
            GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), -1).unwrap();
        let mut result = Ok(None);
        loop {
            match iter.next() {
                Ok(Some(_)) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }
        assert!(matches!(
            result,
            Err(SboToolkitError::CyclicDependency(_, _))
        ));
    }

    #[test]
    fn test_meta_package_step_costs_nothing() {
        let mut graph = build_graph(&[("a", &[]), ("b", &[])]);
        let meta = graph.insert_meta("group");
        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("b").unwrap();
        graph.insert_required(meta, a);
        graph.insert_required(meta, b);

        let mut state = TraversalState::new();
        let iter =
            GraphIter::begin(&graph, &mut state, "group", IterFlags::default(), 0).unwrap();
        let visits = iter.collect_visits().unwrap();
        // Members of the meta-package sit at distance 0 and are reached even
        // with a zero depth cut-off
        assert_eq!(visits.len(), 3);
        assert!(visits.iter().all(|v| v.dist == 0));

        // With metapkg_dist the same walk stops at the meta node itself
        let mut state = TraversalState::new();
        let flags = IterFlags {
            metapkg_dist: true,
            ..IterFlags::default()
        };
        let iter = GraphIter::begin(&graph, &mut state, "group", flags, 0).unwrap();
        let visits = iter.collect_visits().unwrap();
        assert_eq!(visits.len(), 1);
    }

    #[test]
    fn test_req_nearest_emits_boundary_neighbor() {
        let graph = build_graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let mut state = TraversalState::new();

        // First blacken c in a full traversal, then walk again from a with a
        // depth limit and ask for the nearest already-processed neighbor.
        let iter =
            GraphIter::begin(&graph, &mut state, "c", IterFlags::default(), -1).unwrap();
        iter.collect_visits().unwrap();

        let flags = IterFlags {
            req_nearest: true,
            preserve_color: true,
            ..IterFlags::default()
        };
        let iter = GraphIter::begin(&graph, &mut state, "a", flags, 1).unwrap();
        let visits = iter.collect_visits().unwrap();
        let visited = names(&graph, &visits);
        // b sits at the cut-off; c lies one step beyond and is emitted once
        assert!(visited.contains(&"b".to_string()));
        assert!(visited.contains(&"c".to_string()));
    }

    #[test]
    fn test_preserve_color_skips_processed_subtrees() {
        let graph = build_graph(&[("a", &["b"]), ("b", &[]), ("c", &["b"])]);
        let mut state = TraversalState::new();

        let iter =
            GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), -1).unwrap();
        assert_eq!(names(&graph, &iter.collect_visits().unwrap()), vec!["b", "a"]);

        let flags = IterFlags {
            preserve_color: true,
            ..IterFlags::default()
        };
        let iter = GraphIter::begin(&graph, &mut state, "c", flags, -1).unwrap();
        // b is already black, so only c itself is emitted
        assert_eq!(names(&graph, &iter.collect_visits().unwrap()), vec!["c"]);
    }

    #[test]
    fn test_min_distance_retained() {
        // c is at distance 1 via a and distance 2 via b; the direct path wins
        let graph = build_graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        let mut state = TraversalState::new();
        let iter =
            GraphIter::begin(&graph, &mut state, "a", IterFlags::default(), -1).unwrap();
        iter.collect_visits().unwrap();
        let c = graph.lookup("c").unwrap();
        assert_eq!(state.dist(c), 1);
    }
}
