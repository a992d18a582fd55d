//! Deletion-safety evaluation.
//!
//! # Overview
//!
//! Decides whether a node may be deleted right now and, if not, which
//! resources block it. The two relationship kinds block in **opposite**
//! edge directions, reflecting their real-world meaning:
//!
//! - `Contains`: a container cannot be deleted while it still has children.
//!   Blockers are the **targets** of the node's outgoing Contains edges.
//! - `AssociatedWith`: a target cannot be deleted while something is still
//!   attached to it. Blockers are the **sources** of the node's incoming
//!   AssociatedWith edges.
//!
//! Deleting the attaching side is never blocked by its own attachment: a
//! policy attached to a role blocks the role, not itself.
//!
//! Blockers are reported in edge insertion order (deterministic within one
//! process run, not alphabetical) and deduplicated first-wins, so error
//! messages are stable.
//!
//! Unconditional non-deletability (provider-seeded defaults) is a caller
//! policy: handlers check node metadata *before* asking this evaluator and
//! return an operation-not-permitted error instead of a dependency
//! violation.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use super::manager::GraphError;
use super::relationships::RelationshipGraph;
use super::resource::{RelationshipKind, ResourceId};

/// The outcome of a deletion-safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionCheck {
    /// `true` when no dependents remain.
    pub deletable: bool,
    /// Dependents currently preventing deletion, in edge insertion order.
    pub blockers: Vec<ResourceId>,
}

/// Evaluate whether `id` may be deleted.
///
/// # Errors
///
/// [`GraphError::NotFound`] if `id` is not registered.
pub fn evaluate(graph: &RelationshipGraph, id: &ResourceId) -> Result<DeletionCheck, GraphError> {
    if !graph.has_node(id) {
        return Err(GraphError::NotFound(id.clone()));
    }

    let mut blockers: Vec<ResourceId> = Vec::new();
    for kind in [RelationshipKind::Contains, RelationshipKind::AssociatedWith] {
        // Exhaustive on purpose: a new kind must decide its direction here.
        let dependents = match kind {
            RelationshipKind::Contains => graph.outgoing(id, kind),
            RelationshipKind::AssociatedWith => graph.incoming(id, kind),
        };
        for dependent in dependents {
            if !blockers.contains(&dependent) {
                blockers.push(dependent);
            }
        }
    }

    Ok(DeletionCheck {
        deletable: blockers.is_empty(),
        blockers,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
