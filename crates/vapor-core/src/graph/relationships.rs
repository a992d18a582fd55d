//! The directed, typed resource relationship graph.
//!
//! # Overview
//!
//! Stores registered nodes and the edges between them, keyed by
//! [`ResourceId`]. Adjacency is kept as insertion-ordered edge lists rather
//! than hash sets so that dependency reports are deterministic within a
//! process run (error messages list blockers in the order the relationships
//! were created).
//!
//! This type is not synchronized; [`crate::graph::manager::ResourceManager`]
//! owns the lock and never exposes the raw graph to callers.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};

use super::cycles;
use super::manager::GraphError;
use super::resource::{Node, RelationshipKind, ResourceId};

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// A directed, typed relationship between two registered resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: ResourceId,
    pub to: ResourceId,
    pub kind: RelationshipKind,
}

// ---------------------------------------------------------------------------
// RelationshipGraph
// ---------------------------------------------------------------------------

/// Directed graph of registered resources and their relationships.
///
/// Edge lists are insertion-ordered and duplicate-free: re-adding an
/// existing `(from, to, kind)` triple is a no-op success.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    /// All registered nodes, keyed by identity.
    nodes: HashMap<ResourceId, Node>,
    /// node → edges leaving it, in insertion order.
    outgoing: HashMap<ResourceId, Vec<Edge>>,
    /// node → edges targeting it, in insertion order.
    incoming: HashMap<ResourceId, Vec<Edge>>,
    /// Reject edges that would close a directed cycle.
    detect_cycles: bool,
}

impl RelationshipGraph {
    /// Create an empty graph.
    pub fn new(detect_cycles: bool) -> Self {
        Self {
            detect_cycles,
            ..Self::default()
        }
    }

    /// Register a node.
    ///
    /// # Errors
    ///
    /// [`GraphError::AlreadyExists`] if the identity is taken.
    pub fn add_node(
        &mut self,
        id: ResourceId,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::AlreadyExists(id));
        }
        self.nodes.insert(id.clone(), Node::new(id, metadata));
        Ok(())
    }

    /// Remove a node and every edge incident to it.
    ///
    /// Deletion policy is the evaluator's job; this method only maintains
    /// structure. Callers go through the manager, which checks deletability
    /// first.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if the node is not registered.
    pub fn remove_node(&mut self, id: &ResourceId) -> Result<Node, GraphError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;

        // Cascade: drop this node's edges from the other endpoint's lists.
        for edge in self.outgoing.remove(id).unwrap_or_default() {
            if let Some(back) = self.incoming.get_mut(&edge.to) {
                back.retain(|e| e.from != *id);
            }
        }
        for edge in self.incoming.remove(id).unwrap_or_default() {
            if let Some(fwd) = self.outgoing.get_mut(&edge.from) {
                fwd.retain(|e| e.to != *id);
            }
        }

        Ok(node)
    }

    /// Return `true` if the identity is registered.
    pub fn has_node(&self, id: &ResourceId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a registered node.
    pub fn node(&self, id: &ResourceId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Add a directed edge.
    ///
    /// Idempotent on an exact `(from, to, kind)` duplicate. With cycle
    /// detection enabled, rejects the edge if a path already runs from `to`
    /// back to `from`; the graph is unchanged on failure.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if either endpoint is unregistered,
    /// [`GraphError::WouldCreateCycle`] if the edge would close a loop.
    pub fn add_edge(
        &mut self,
        from: &ResourceId,
        to: &ResourceId,
        kind: RelationshipKind,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains_key(from) {
            return Err(GraphError::NotFound(from.clone()));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::NotFound(to.clone()));
        }

        if self.edge_exists(from, to, kind) {
            return Ok(());
        }

        if self.detect_cycles {
            if let Some(path) = cycles::closing_cycle(self, from, to) {
                return Err(GraphError::WouldCreateCycle {
                    from: from.clone(),
                    to: to.clone(),
                    kind,
                    path,
                });
            }
        }

        let edge = Edge {
            from: from.clone(),
            to: to.clone(),
            kind,
        };
        self.outgoing
            .entry(from.clone())
            .or_default()
            .push(edge.clone());
        self.incoming.entry(to.clone()).or_default().push(edge);
        Ok(())
    }

    /// Remove an edge. Absent edges (and absent endpoints) are not errors.
    pub fn remove_edge(&mut self, from: &ResourceId, to: &ResourceId, kind: RelationshipKind) {
        if let Some(edges) = self.outgoing.get_mut(from) {
            edges.retain(|e| !(e.to == *to && e.kind == kind));
        }
        if let Some(edges) = self.incoming.get_mut(to) {
            edges.retain(|e| !(e.from == *from && e.kind == kind));
        }
    }

    /// Targets of `id`'s outgoing edges of the given kind, in insertion order.
    pub fn outgoing(&self, id: &ResourceId, kind: RelationshipKind) -> Vec<ResourceId> {
        self.outgoing
            .get(id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| e.kind == kind)
                    .map(|e| e.to.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sources of edges of the given kind targeting `id`, in insertion order.
    pub fn incoming(&self, id: &ResourceId, kind: RelationshipKind) -> Vec<ResourceId> {
        self.incoming
            .get(id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| e.kind == kind)
                    .map(|e| e.from.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All successors of `id` regardless of edge kind. Cycle detection walks
    /// the full reference graph, not one kind at a time.
    pub(crate) fn successors(&self, id: &ResourceId) -> impl Iterator<Item = &ResourceId> {
        self.outgoing
            .get(id)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|e| &e.to))
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }

    /// Return `true` if no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Internal consistency check: every edge endpoint is a registered node
    /// and the outgoing/incoming views agree. Used by tests.
    #[cfg(test)]
    pub fn check_no_dangling_edges(&self) -> bool {
        let out_ok = self.outgoing.iter().all(|(id, edges)| {
            edges
                .iter()
                .all(|e| e.from == *id && self.nodes.contains_key(&e.from) && self.nodes.contains_key(&e.to))
        });
        let in_ok = self.incoming.iter().all(|(id, edges)| {
            edges
                .iter()
                .all(|e| e.to == *id && self.nodes.contains_key(&e.from) && self.nodes.contains_key(&e.to))
        });
        out_ok && in_ok && self.incoming.values().map(Vec::len).sum::<usize>() == self.edge_count()
    }

    fn edge_exists(&self, from: &ResourceId, to: &ResourceId, kind: RelationshipKind) -> bool {
        self.outgoing
            .get(from)
            .is_some_and(|edges| edges.iter().any(|e| e.to == *to && e.kind == kind))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
