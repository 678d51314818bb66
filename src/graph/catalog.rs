//! The package graph: an arena of catalog nodes with sorted name indices.
//!
//! The graph owns every [`Package`] and hands out [`NodeId`] handles; edges
//! are handles too, so nodes never point at each other. Two disjoint,
//! name-sorted index lists distinguish repository packages from user-authored
//! meta-packages, and lookups fall through the repository set first.

use crate::types::{NodeId, Package};

/// Catalog of repository packages and meta-packages plus their edges.
#[derive(Debug, Default)]
pub struct PackageGraph {
    /// Node arena; a `NodeId` is an index into this vector.
    nodes: Vec<Package>,
    /// Repository package handles, sorted by package name.
    sbo_index: Vec<NodeId>,
    /// Meta-package handles, sorted by package name.
    meta_index: Vec<NodeId>,
}

impl PackageGraph {
    /// What: Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Build a graph from scanned or loaded repository packages.
    ///
    /// Inputs:
    /// - `pkgs`: Catalog records; need not be sorted.
    ///
    /// Output:
    /// - Returns a graph whose repository set contains exactly `pkgs`.
    #[must_use]
    pub fn from_packages(pkgs: Vec<Package>) -> Self {
        let mut graph = Self::new();
        for pkg in pkgs {
            graph.insert_sbo(pkg);
        }
        graph
    }

    /// Number of nodes in the arena (repository plus meta).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph holds no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immutable access to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Package {
        &self.nodes[id.0]
    }

    /// Mutable access to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Package {
        &mut self.nodes[id.0]
    }

    /// Name of a node, for diagnostics.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Repository package handles, sorted by name.
    #[must_use]
    pub fn sbo_ids(&self) -> &[NodeId] {
        &self.sbo_index
    }

    /// Meta-package handles, sorted by name.
    #[must_use]
    pub fn meta_ids(&self) -> &[NodeId] {
        &self.meta_index
    }

    /// What: Look up a package by name.
    ///
    /// Inputs:
    /// - `name`: Case-sensitive package name.
    ///
    /// Output:
    /// - Returns the handle, searching the repository set first and the
    ///   meta set second.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.search_index(&self.sbo_index, name)
            .or_else(|| self.search_index(&self.meta_index, name))
    }

    /// What: Add a repository package to the catalog.
    ///
    /// Inputs:
    /// - `pkg`: The record to insert; its name must be unused.
    ///
    /// Output:
    /// - Returns the new node's handle.
    pub fn insert_sbo(&mut self, pkg: Package) -> NodeId {
        debug_assert!(self.lookup(&pkg.name).is_none());
        let id = NodeId(self.nodes.len());
        let pos = self.index_insert_pos(&self.sbo_index, &pkg.name);
        self.nodes.push(pkg);
        self.sbo_index.insert(pos, id);
        id
    }

    /// What: Add an empty meta-package node to the catalog.
    ///
    /// Inputs:
    /// - `name`: Meta-package name; must not collide with any existing node.
    ///
    /// Output:
    /// - Returns the new node's handle, with `is_meta` already set.
    pub fn insert_meta(&mut self, name: &str) -> NodeId {
        debug_assert!(self.lookup(name).is_none());
        let id = NodeId(self.nodes.len());
        let pos = self.index_insert_pos(&self.meta_index, name);
        let mut pkg = Package::new(name);
        pkg.dep.is_meta = true;
        self.nodes.push(pkg);
        self.meta_index.insert(pos, id);
        id
    }

    /// What: Record the edge `parent → child` in the parent's required list.
    ///
    /// Details:
    /// - The list stays sorted by child name; duplicates are ignored.
    pub fn insert_required(&mut self, parent: NodeId, child: NodeId) {
        let child_name = self.nodes[child.0].name.clone();
        let list = &self.nodes[parent.0].dep.required;
        if let Err(pos) = self.edge_search(list, &child_name) {
            self.nodes[parent.0].dep.required.insert(pos, child);
        }
    }

    /// What: Record the reverse edge `child ← parent` in the child's parents.
    ///
    /// Details:
    /// - The list stays sorted by parent name; duplicates are ignored.
    pub fn insert_parent(&mut self, child: NodeId, parent: NodeId) {
        let parent_name = self.nodes[parent.0].name.clone();
        let list = &self.nodes[child.0].dep.parents;
        if let Err(pos) = self.edge_search(list, &parent_name) {
            self.nodes[child.0].dep.parents.insert(pos, parent);
        }
    }

    /// What: Drop all outbound edges of a node.
    ///
    /// Details:
    /// - Each former dependency also loses its reverse edge back to `id`.
    /// - Used before re-parsing an edited dependency file.
    pub fn clear_required(&mut self, id: NodeId) {
        let required = std::mem::take(&mut self.nodes[id.0].dep.required);
        for child in required {
            self.nodes[child.0].dep.parents.retain(|&p| p != id);
        }
    }

    /// Binary search of an index list, returning the handle on a hit.
    fn search_index(&self, index: &[NodeId], name: &str) -> Option<NodeId> {
        index
            .binary_search_by(|&id| self.nodes[id.0].name.as_str().cmp(name))
            .ok()
            .map(|pos| index[pos])
    }

    /// Insertion position that keeps an index list sorted by name.
    fn index_insert_pos(&self, index: &[NodeId], name: &str) -> usize {
        match index.binary_search_by(|&id| self.nodes[id.0].name.as_str().cmp(name)) {
            Ok(pos) | Err(pos) => pos,
        }
    }

    /// Binary search of an edge list sorted by node name.
    fn edge_search(&self, list: &[NodeId], name: &str) -> Result<usize, usize> {
        list.binary_search_by(|&id| self.nodes[id.0].name.as_str().cmp(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(names: &[&str]) -> PackageGraph {
        PackageGraph::from_packages(names.iter().map(|n| Package::new(*n)).collect())
    }

    #[test]
    fn test_lookup_falls_through_to_meta() {
        let mut graph = graph_with(&["bar", "foo"]);
        assert!(graph.lookup("group").is_none());

        let meta = graph.insert_meta("group");
        assert_eq!(graph.lookup("group"), Some(meta));
        assert!(graph.node(meta).is_meta());
        // Repository entries still resolve
        assert!(graph.lookup("foo").is_some());
    }

    #[test]
    fn test_indices_stay_sorted() {
        let graph = graph_with(&["zsh", "bash", "mksh"]);
        let names: Vec<&str> = graph.sbo_ids().iter().map(|&id| graph.name(id)).collect();
        assert_eq!(names, vec!["bash", "mksh", "zsh"]);
    }

    #[test]
    fn test_insert_required_sorted_and_unique() {
        let mut graph = graph_with(&["a", "b", "c"]);
        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("b").unwrap();
        let c = graph.lookup("c").unwrap();

        graph.insert_required(a, c);
        graph.insert_required(a, b);
        graph.insert_required(a, c);

        let names: Vec<&str> = graph
            .node(a)
            .dep
            .required
            .iter()
            .map(|&id| graph.name(id))
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_clear_required_unlinks_parents() {
        let mut graph = graph_with(&["a", "b"]);
        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("b").unwrap();

        graph.insert_required(a, b);
        graph.insert_parent(b, a);
        assert_eq!(graph.node(b).dep.parents, vec![a]);

        graph.clear_required(a);
        assert!(graph.node(a).dep.required.is_empty());
        assert!(graph.node(b).dep.parents.is_empty());
    }
}
