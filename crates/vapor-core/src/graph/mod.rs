//! Resource relationship graph and dependency manager.
//!
//! # Overview
//!
//! Every emulated service registers its resources here and records the
//! directed, typed relationships between them. The graph is the single
//! source of truth for the provider's delete-blocking behavior: a VPC
//! cannot be deleted while a subnet exists inside it, a role cannot be
//! deleted while a policy is attached to it, and so on.
//!
//! The module splits along the seams of that contract:
//!
//! - [`resource`] — identities, relationship kinds, node metadata.
//! - [`relationships`] — the directed graph itself (adjacency, cascades).
//! - [`cycles`] — DFS reachability used to reject cycle-closing edges.
//! - [`schema`] — the static table of legal relationship shapes.
//! - [`evaluator`] — "can this resource be deleted right now?".
//! - [`manager`] — the locked facade service handlers call.
//!
//! # Invariants
//!
//! - Every edge's endpoints are registered nodes (no dangling edges).
//! - No two nodes share a [`resource::ResourceId`].
//! - With cycle detection on, the edge set never contains a directed cycle.
//! - With schema validation on, every edge matches a configured rule.
//! - Unregistering a node requires it to be deletable and cascades away all
//!   of its incident edges.

pub mod cycles;
pub mod evaluator;
pub mod manager;
pub mod relationships;
pub mod resource;
pub mod schema;
