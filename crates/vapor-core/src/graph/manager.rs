//! The resource-manager facade service handlers call.
//!
//! # Overview
//!
//! [`ResourceManager`] composes the relationship graph, the optional schema
//! validator, and the deletion evaluator behind one lock, and owns the
//! strict/permissive consistency policy flag. It is the only entry point
//! handlers use; the raw graph is never exposed.
//!
//! Services that are built without dependency tracking get a
//! [`NoopTracker`] instead of a null check at every call site: every
//! operation succeeds and every resource is deletable, which is exactly how
//! a provider with no cross-resource constraints behaves.
//!
//! # Consistency policy
//!
//! The manager *reports* the policy via [`ResourceTracker::is_strict`]; it
//! is the caller that enforces it. When a relationship-bookkeeping call
//! fails and the policy is strict, the handler must roll back its own
//! state-store mutation and propagate the error. When permissive, the
//! handler logs and proceeds — the state store stays authoritative and the
//! graph is a best-effort overlay. A dependency violation on deletion is
//! surfaced in both modes; deletion safety is never silently bypassed.
//!
//! # Locking
//!
//! One `parking_lot::RwLock` per manager instance. Mutations take the write
//! lock; `can_delete` and the other queries take the read lock, so no
//! mutation can interleave with a deletability evaluation.
//! `unregister_resource` evaluates and removes under a single write lock.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::config::TrackerConfig;
use crate::error::ErrorCode;

use super::cycles::CyclePath;
use super::evaluator::{self, DeletionCheck};
use super::relationships::RelationshipGraph;
use super::resource::{RelationshipKind, ResourceId};
use super::schema::RelationshipSchema;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by graph and manager operations.
///
/// Never recovered internally; every error carries enough structure for the
/// handler to build a provider-faithful response (see
/// [`GraphError::api_code`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The operation referenced an unregistered resource.
    #[error("resource not registered: {0}")]
    NotFound(ResourceId),

    /// A resource is already registered under this identity.
    #[error("resource already registered: {0}")]
    AlreadyExists(ResourceId),

    /// The relationship would close a directed cycle.
    #[error("relationship {from} --{kind}--> {to} would create a cycle: {path}")]
    WouldCreateCycle {
        from: ResourceId,
        to: ResourceId,
        kind: RelationshipKind,
        path: CyclePath,
    },

    /// The relationship shape is not in the configured schema.
    #[error("illegal relationship: {from} --{kind}--> {to}")]
    SchemaViolation {
        from: ResourceId,
        to: ResourceId,
        kind: RelationshipKind,
    },

    /// The resource cannot be deleted while dependents remain.
    #[error("cannot delete {id}: blocked by {}", join_ids(.blockers))]
    DependencyViolation {
        id: ResourceId,
        blockers: Vec<ResourceId>,
    },
}

impl GraphError {
    /// The provider API error code a handler should surface for this error.
    pub const fn api_code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NoSuchEntity,
            Self::AlreadyExists(_) => ErrorCode::EntityAlreadyExists,
            Self::WouldCreateCycle { .. } => ErrorCode::CycleDetected,
            Self::SchemaViolation { .. } => ErrorCode::InvalidRelationship,
            Self::DependencyViolation { .. } => ErrorCode::DependencyViolation,
        }
    }
}

fn join_ids(ids: &[ResourceId]) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&id.to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// ResourceTracker
// ---------------------------------------------------------------------------

/// The dependency-tracking contract consumed by service handlers.
///
/// Handlers hold an `Arc<dyn ResourceTracker>`; whether it is a real
/// [`ResourceManager`] or a [`NoopTracker`] is a construction-time choice.
pub trait ResourceTracker: Send + Sync {
    /// Register a resource, making it visible to all future queries.
    ///
    /// # Errors
    ///
    /// [`GraphError::AlreadyExists`] if the identity is taken.
    fn register_resource(
        &self,
        id: &ResourceId,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), GraphError>;

    /// Check deletability and, if permitted, remove the resource and every
    /// relationship incident to it.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if unregistered,
    /// [`GraphError::DependencyViolation`] while dependents remain.
    fn unregister_resource(&self, id: &ResourceId) -> Result<(), GraphError>;

    /// Record a directed relationship between two registered resources.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] for an unregistered endpoint,
    /// [`GraphError::SchemaViolation`] for an illegal shape,
    /// [`GraphError::WouldCreateCycle`] if the edge closes a loop.
    fn add_relationship(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        kind: RelationshipKind,
    ) -> Result<(), GraphError>;

    /// Remove a relationship. A missing relationship is not an error.
    ///
    /// # Errors
    ///
    /// Infallible for the built-in trackers; fallible in the signature so
    /// other implementations can report backend failures.
    fn remove_relationship(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        kind: RelationshipKind,
    ) -> Result<(), GraphError>;

    /// Evaluate whether the resource may be deleted right now.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] only if `id` is unknown.
    fn can_delete(&self, id: &ResourceId) -> Result<DeletionCheck, GraphError>;

    /// Return `true` if the identity is registered.
    fn has_resource(&self, id: &ResourceId) -> bool;

    /// Snapshot of the resource's metadata, if registered.
    fn resource_metadata(&self, id: &ResourceId) -> Option<BTreeMap<String, String>>;

    /// The configured consistency policy.
    fn is_strict(&self) -> bool;
}

// ---------------------------------------------------------------------------
// NoopTracker
// ---------------------------------------------------------------------------

/// Tracker for services built without dependency tracking.
///
/// Every operation reports success and every resource is deletable, so the
/// service behaves like a provider with no cross-resource constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl ResourceTracker for NoopTracker {
    fn register_resource(
        &self,
        _id: &ResourceId,
        _metadata: BTreeMap<String, String>,
    ) -> Result<(), GraphError> {
        Ok(())
    }

    fn unregister_resource(&self, _id: &ResourceId) -> Result<(), GraphError> {
        Ok(())
    }

    fn add_relationship(
        &self,
        _from: &ResourceId,
        _to: &ResourceId,
        _kind: RelationshipKind,
    ) -> Result<(), GraphError> {
        Ok(())
    }

    fn remove_relationship(
        &self,
        _from: &ResourceId,
        _to: &ResourceId,
        _kind: RelationshipKind,
    ) -> Result<(), GraphError> {
        Ok(())
    }

    fn can_delete(&self, _id: &ResourceId) -> Result<DeletionCheck, GraphError> {
        Ok(DeletionCheck {
            deletable: true,
            blockers: Vec::new(),
        })
    }

    fn has_resource(&self, _id: &ResourceId) -> bool {
        false
    }

    fn resource_metadata(&self, _id: &ResourceId) -> Option<BTreeMap<String, String>> {
        None
    }

    fn is_strict(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// ResourceManager
// ---------------------------------------------------------------------------

/// The real tracker: a locked relationship graph plus optional schema
/// validation and the consistency-policy flag.
///
/// One instance is shared by every in-flight handler invocation of a
/// service; see the module docs for the locking discipline.
#[derive(Debug)]
pub struct ResourceManager {
    graph: RwLock<RelationshipGraph>,
    schema: Option<RelationshipSchema>,
    strict: bool,
}

impl ResourceManager {
    /// Build a manager from its construction-time configuration.
    pub fn new(config: TrackerConfig) -> Self {
        let schema = config.use_aws_schema.then(RelationshipSchema::aws_default);
        Self {
            graph: RwLock::new(RelationshipGraph::new(config.detect_cycles)),
            schema,
            strict: config.strict_validation,
        }
    }

    /// Build a manager with an explicit schema instead of the built-in one.
    pub fn with_schema(config: TrackerConfig, schema: RelationshipSchema) -> Self {
        Self {
            graph: RwLock::new(RelationshipGraph::new(config.detect_cycles)),
            schema: Some(schema),
            strict: config.strict_validation,
        }
    }

    /// Number of registered resources. Exposed for conformance tests.
    pub fn resource_count(&self) -> usize {
        self.graph.read().node_count()
    }
}

impl ResourceTracker for ResourceManager {
    fn register_resource(
        &self,
        id: &ResourceId,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), GraphError> {
        tracing::debug!(resource = %id, "register resource");
        self.graph.write().add_node(id.clone(), metadata)
    }

    fn unregister_resource(&self, id: &ResourceId) -> Result<(), GraphError> {
        // Evaluate and remove under one write lock so no relationship can
        // appear between the check and the removal.
        let mut graph = self.graph.write();
        let check = evaluator::evaluate(&graph, id)?;
        if !check.deletable {
            return Err(GraphError::DependencyViolation {
                id: id.clone(),
                blockers: check.blockers,
            });
        }
        tracing::debug!(resource = %id, "unregister resource");
        graph.remove_node(id).map(|_| ())
    }

    fn add_relationship(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        kind: RelationshipKind,
    ) -> Result<(), GraphError> {
        if let Some(schema) = &self.schema {
            if !schema.allows(&from.resource_type, kind, &to.resource_type) {
                return Err(GraphError::SchemaViolation {
                    from: from.clone(),
                    to: to.clone(),
                    kind,
                });
            }
        }
        tracing::debug!(from = %from, to = %to, %kind, "add relationship");
        self.graph.write().add_edge(from, to, kind)
    }

    fn remove_relationship(
        &self,
        from: &ResourceId,
        to: &ResourceId,
        kind: RelationshipKind,
    ) -> Result<(), GraphError> {
        tracing::debug!(from = %from, to = %to, %kind, "remove relationship");
        self.graph.write().remove_edge(from, to, kind);
        Ok(())
    }

    fn can_delete(&self, id: &ResourceId) -> Result<DeletionCheck, GraphError> {
        evaluator::evaluate(&self.graph.read(), id)
    }

    fn has_resource(&self, id: &ResourceId) -> bool {
        self.graph.read().has_node(id)
    }

    fn resource_metadata(&self, id: &ResourceId) -> Option<BTreeMap<String, String>> {
        self.graph.read().node(id).map(|node| node.metadata.clone())
    }

    fn is_strict(&self) -> bool {
        self.strict
    }
}

// ---------------------------------------------------------------------------
// DefaultVpcTopology
// ---------------------------------------------------------------------------

/// Identities of the provider-seeded default network resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultVpcTopology {
    pub vpc: ResourceId,
    pub subnet: ResourceId,
    pub route_table: ResourceId,
    pub network_acl: ResourceId,
    pub security_group: ResourceId,
}

impl DefaultVpcTopology {
    /// Build the topology for the given service's default resource IDs.
    pub fn new(
        service: &str,
        vpc: &str,
        subnet: &str,
        route_table: &str,
        network_acl: &str,
        security_group: &str,
    ) -> Self {
        Self {
            vpc: ResourceId::new(service, "vpc", vpc),
            subnet: ResourceId::new(service, "subnet", subnet),
            route_table: ResourceId::new(service, "route-table", route_table),
            network_acl: ResourceId::new(service, "network-acl", network_acl),
            security_group: ResourceId::new(service, "security-group", security_group),
        }
    }

    /// All five identities, VPC first.
    pub fn all(&self) -> [&ResourceId; 5] {
        [
            &self.vpc,
            &self.subnet,
            &self.route_table,
            &self.network_acl,
            &self.security_group,
        ]
    }

    /// The four resources the default VPC contains.
    pub fn children(&self) -> [&ResourceId; 4] {
        [
            &self.subnet,
            &self.route_table,
            &self.network_acl,
            &self.security_group,
        ]
    }

    /// Pre-register the provider's default network topology.
    ///
    /// Registers the five default resources with `default = "true"`
    /// metadata and the `Contains` edges from the VPC to each of the other
    /// four, so a freshly constructed network-service tracker already has a
    /// non-deletable default VPC with four dependents.
    ///
    /// # Errors
    ///
    /// [`GraphError::AlreadyExists`] if any of the identities was already
    /// registered with this tracker.
    pub fn seed(&self, tracker: &dyn ResourceTracker) -> Result<(), GraphError> {
        let mut metadata = BTreeMap::new();
        metadata.insert("default".to_string(), "true".to_string());

        for id in self.all() {
            tracker.register_resource(id, metadata.clone())?;
        }
        for child in self.children() {
            tracker.add_relationship(&self.vpc, child, RelationshipKind::Contains)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
