//! Cycle detection for the relationship graph.
//!
//! # Overview
//!
//! Ownership and attachment relationships must not loop: a VPC that
//! (transitively) contains itself has no meaningful delete order, and the
//! real provider never produces such a topology. When cycle detection is
//! enabled, [`RelationshipGraph::add_edge`] calls [`closing_cycle`] before
//! inserting and rejects the edge if it would close a loop.
//!
//! # Design
//!
//! - **DFS-based**: depth-first reachability from the target of the new
//!   edge back to its source. This finds exactly the cycle the new edge
//!   would close.
//! - **All kinds**: the walk follows every outgoing edge regardless of
//!   relationship kind; a mixed Contains/AssociatedWith loop is still a
//!   loop.
//! - **O(V+E)** per check, visiting each node at most once. Edge mutation
//!   is rare relative to reads in this workload, so the per-add cost is
//!   acceptable.
//!
//! [`RelationshipGraph::add_edge`]: super::relationships::RelationshipGraph::add_edge

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::relationships::RelationshipGraph;
use super::resource::ResourceId;

// ---------------------------------------------------------------------------
// CyclePath
// ---------------------------------------------------------------------------

/// The ordered node sequence of a would-be cycle.
///
/// For a rejected edge `A → B` closing cycle `A → B → C → A`, the path is
/// `[A, B, C, A]` (the source appears at both ends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(pub Vec<ResourceId>);

impl CyclePath {
    /// Number of distinct resources in the cycle (path length minus the
    /// repeated start node).
    pub fn cycle_len(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Returns `true` if the rejected edge was a self-loop.
    pub fn is_self_loop(&self) -> bool {
        self.cycle_len() == 1
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                write!(f, " -> ")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Return the cycle that adding edge `from → to` would close, if any.
///
/// Checks whether a path already runs from `to` back to `from`; if it does,
/// the new edge completes a loop and the full path `[from, to, ..., from]`
/// is returned for the error message. Returns `None` when the edge is safe.
pub fn closing_cycle(
    graph: &RelationshipGraph,
    from: &ResourceId,
    to: &ResourceId,
) -> Option<CyclePath> {
    if from == to {
        return Some(CyclePath(vec![from.clone(), from.clone()]));
    }

    let mut visited: HashSet<ResourceId> = HashSet::new();
    let mut parents: HashMap<ResourceId, ResourceId> = HashMap::new();

    if !dfs_find(graph, to, from, &mut visited, &mut parents) {
        return None;
    }

    // Walk parents back from `from` to `to`, then prepend the new edge's
    // source so the path reads from -> to -> ... -> from.
    let mut tail = vec![from.clone()];
    let mut cursor = from.clone();
    while cursor != *to {
        cursor = parents
            .get(&cursor)
            .cloned()
            .unwrap_or_else(|| to.clone());
        tail.push(cursor.clone());
    }
    tail.reverse();

    let mut path = vec![from.clone()];
    path.extend(tail);
    Some(CyclePath(path))
}

/// Iterative DFS from `start` looking for `goal`, recording the tree in
/// `parents` (child → parent) for path reconstruction.
fn dfs_find(
    graph: &RelationshipGraph,
    start: &ResourceId,
    goal: &ResourceId,
    visited: &mut HashSet<ResourceId>,
    parents: &mut HashMap<ResourceId, ResourceId>,
) -> bool {
    let mut stack = vec![start.clone()];
    visited.insert(start.clone());

    while let Some(current) = stack.pop() {
        if current == *goal {
            return true;
        }
        for next in graph.successors(&current) {
            if visited.insert(next.clone()) {
                parents.insert(next.clone(), current.clone());
                stack.push(next.clone());
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::resource::RelationshipKind;
    use std::collections::BTreeMap;

    fn rid(id: &str) -> ResourceId {
        ResourceId::new("ec2", "node", id)
    }

    /// Graph with the given Contains edges, cycle detection off so tests can
    /// probe `closing_cycle` directly.
    fn graph_of(edges: &[(&str, &str)]) -> RelationshipGraph {
        let mut graph = RelationshipGraph::new(false);
        let mut seen = std::collections::HashSet::new();
        for (from, to) in edges {
            for node in [from, to] {
                if seen.insert(*node) {
                    graph.add_node(rid(node), BTreeMap::new()).expect("add node");
                }
            }
            graph
                .add_edge(&rid(from), &rid(to), RelationshipKind::Contains)
                .expect("add edge");
        }
        graph
    }

    #[test]
    fn no_cycle_on_disconnected_nodes() {
        let graph = graph_of(&[("a", "b")]);
        assert!(closing_cycle(&graph, &rid("b"), &rid("c")).is_none());
    }

    #[test]
    fn self_loop_detected() {
        let graph = graph_of(&[]);
        let path = closing_cycle(&graph, &rid("a"), &rid("a")).expect("self loop");
        assert!(path.is_self_loop());
        assert_eq!(path.0, vec![rid("a"), rid("a")]);
    }

    #[test]
    fn two_node_cycle_detected() {
        let graph = graph_of(&[("a", "b")]);
        let path = closing_cycle(&graph, &rid("b"), &rid("a")).expect("mutual cycle");
        assert_eq!(path.cycle_len(), 2);
        assert_eq!(path.0, vec![rid("b"), rid("a"), rid("b")]);
    }

    #[test]
    fn three_node_cycle_path_is_ordered() {
        // a -> b -> c exists; adding c -> a closes a 3-cycle.
        let graph = graph_of(&[("a", "b"), ("b", "c")]);
        let path = closing_cycle(&graph, &rid("c"), &rid("a")).expect("3-cycle");
        assert_eq!(path.0, vec![rid("c"), rid("a"), rid("b"), rid("c")]);
        assert_eq!(path.cycle_len(), 3);
    }

    #[test]
    fn long_chain_reachability() {
        let graph = graph_of(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
        assert!(closing_cycle(&graph, &rid("e"), &rid("a")).is_some());
        assert!(closing_cycle(&graph, &rid("a"), &rid("e")).is_none());
    }

    #[test]
    fn branches_do_not_false_positive() {
        // Diamond without a back edge: a -> {b, c} -> d.
        let graph = graph_of(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        assert!(closing_cycle(&graph, &rid("a"), &rid("d")).is_none());
        assert!(closing_cycle(&graph, &rid("d"), &rid("a")).is_some());
    }

    #[test]
    fn display_joins_path() {
        let path = CyclePath(vec![rid("a"), rid("b"), rid("a")]);
        assert_eq!(
            path.to_string(),
            "ec2:node/a -> ec2:node/b -> ec2:node/a"
        );
    }
}
