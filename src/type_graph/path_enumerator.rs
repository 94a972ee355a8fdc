//! Enumeration of root-to-ancestor join paths through a [`TypeGraph`].
//!
//! Each path is a chain of tables linked by the shared id column. Paths are
//! produced by a depth-first walk that follows the first parent of a node on
//! the current path and starts a cloned path for every additional parent.
//! A node is handed to the first path that reaches it and never to another,
//! so an interface reachable through several routes is joined once.

use super::{NodeIdx, TypeGraph};

pub type Path = Vec<NodeIdx>;

pub struct PathEnumerator<'g> {
    graph: &'g TypeGraph,
    saved: Vec<bool>,
    paths: Vec<Path>,
}

impl<'g> PathEnumerator<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            saved: vec![false; graph.len()],
            paths: Vec::new(),
        }
    }

    /// All join paths from the root, unpruned
    pub fn generate_lists(mut self) -> Vec<Path> {
        if self.graph.is_empty() {
            return Vec::new();
        }
        self.walk(self.graph.root_idx(), Vec::new(), 0);
        self.paths
    }

    /// `fresh` counts nodes this branch appended itself; a branch that only
    /// carries its cloned prefix adds nothing and is not emitted.
    fn walk(&mut self, node: NodeIdx, mut current: Path, fresh: usize) {
        if self.saved[node] {
            if fresh > 0 {
                self.paths.push(current);
            }
            return;
        }
        current.push(node);
        self.saved[node] = true;

        let graph = self.graph;
        let parents = graph.supers(node);
        let Some((&first, rest)) = parents.split_first() else {
            self.paths.push(current);
            return;
        };
        let branches: Vec<(NodeIdx, Path)> =
            rest.iter().map(|&p| (p, current.clone())).collect();
        self.walk(first, current, fresh + 1);
        for (parent, prefix) in branches {
            self.walk(parent, prefix, 0);
        }
    }

    /// Enumerate and prune in one step
    pub fn pruned(graph: &'g TypeGraph) -> Vec<Path> {
        let paths = Self::new(graph).generate_lists();
        prune_paths(graph, paths)
    }
}

/// Drop uninformative branches.
///
/// Trailing nodes without set properties are trimmed unless they are the
/// universal root or force-included. A path with no set property that does
/// not reach the universal root is dropped, and single-node paths go away
/// when a longer path survives. When nothing is left the bare root remains.
pub fn prune_paths(graph: &TypeGraph, paths: Vec<Path>) -> Vec<Path> {
    let mut kept: Vec<Path> = Vec::with_capacity(paths.len());
    for mut path in paths {
        while let Some(&last) = path.last() {
            let node = graph.node(last);
            if path.len() > 1 && !node.has_values() && !node.is_universal_root && !node.force_include
            {
                path.pop();
            } else {
                break;
            }
        }
        let informative = path.iter().any(|&idx| {
            let node = graph.node(idx);
            node.has_values() || node.is_universal_root
        });
        if informative && !kept.contains(&path) {
            kept.push(path);
        }
    }

    if kept.iter().any(|p| p.len() > 1) {
        kept.retain(|p| p.len() > 1);
    }
    if kept.is_empty() && !graph.is_empty() {
        kept.push(vec![graph.root_idx()]);
    }
    log::debug!(
        "pruned paths for `{}`: {:?}",
        graph.root().class_name,
        kept
    );
    kept
}

/// Relaxed-inheritance pruning: strip leading subclass tables that carry no
/// set property until the selection class (or a node with values) is hit.
pub fn prune_inheritance(graph: &TypeGraph, paths: Vec<Path>, selection_class: &str) -> Vec<Path> {
    let selection = graph.index_of(selection_class);
    let mut kept: Vec<Path> = Vec::with_capacity(paths.len());
    for path in paths {
        let start = path
            .iter()
            .position(|&idx| Some(idx) == selection || graph.node(idx).has_values());
        if let Some(start) = start {
            let trimmed = path[start..].to_vec();
            if !kept.contains(&trimmed) {
                kept.push(trimmed);
            }
        }
    }
    if kept.is_empty() {
        kept.push(vec![selection.unwrap_or(graph.root_idx())]);
    }
    kept
}
