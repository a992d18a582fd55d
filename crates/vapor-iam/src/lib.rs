//! Emulated identity service.
//!
//! Request handlers for users, groups, roles, managed policies, access keys,
//! and instance profiles. Records live in the shared state store; the
//! resource tracker keeps the relationship graph in sync and enforces the
//! provider's delete-blocking behavior (a role with attached policies cannot
//! be deleted, a user with live access keys cannot be deleted, and so on).

pub mod error;
pub mod ids;
pub mod model;
pub mod service;

pub use error::IamError;
pub use service::IamService;
