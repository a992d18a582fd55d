//! vapor-core library.
//!
//! The shared control-plane core used by every emulated service: a generic
//! key-value state store for resource records, and the resource relationship
//! graph that answers "can this resource be safely deleted right now?".
//!
//! # Conventions
//!
//! - **Errors**: per-module `thiserror` enums; `anyhow::Result` only at
//!   composition points (config loading).
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod store;

pub use config::TrackerConfig;
pub use graph::manager::{GraphError, NoopTracker, ResourceManager, ResourceTracker};
pub use graph::resource::{RelationshipKind, ResourceId};
pub use store::{MemoryStore, StateStore, StoreError};
