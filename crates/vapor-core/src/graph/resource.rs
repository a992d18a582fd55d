//! Resource identities, relationship kinds, and graph nodes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ResourceId
// ---------------------------------------------------------------------------

/// A value type uniquely naming one resource across all emulated services.
///
/// Equality and hashing cover all three fields, so a `ResourceId` is usable
/// directly as a map key. Globally unique within one resource manager: no
/// resource may be registered twice under the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    /// Owning service, e.g. `"iam"` or `"ec2"`.
    pub service: String,
    /// Resource type within the service, e.g. `"vpc"` or `"role"`.
    pub resource_type: String,
    /// Service-scoped identifier, e.g. `"vpc-1234"` or `"admin"`.
    pub id: String,
}

impl ResourceId {
    /// Build an identity from its three parts.
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        resource_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.service, self.resource_type, self.id)
    }
}

// ---------------------------------------------------------------------------
// RelationshipKind
// ---------------------------------------------------------------------------

/// The kind of a directed relationship between two resources.
///
/// The two kinds block deletion in **opposite** edge directions (see
/// [`crate::graph::evaluator`]); adding a variant here forces a deliberate
/// decision about its blocking direction via the exhaustive matches there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Ownership/composition: the `from` resource structurally owns the `to`
    /// resource (vpc contains subnet, instance profile contains role).
    /// A container cannot be deleted while it still has children.
    Contains,
    /// Attachment without ownership (policy attached to role). The target
    /// cannot be deleted while something is still attached to it.
    AssociatedWith,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "contains"),
            Self::AssociatedWith => write!(f, "associated-with"),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A registered resource: its identity plus free-form metadata.
///
/// Metadata carries no graph semantics. It exists so deletion-policy checks
/// in handlers can read facts like `default = "true"` or an `arn` without a
/// state-store round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: ResourceId,
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    /// Metadata key for provider-seeded default resources.
    pub const DEFAULT_FLAG: &'static str = "default";

    /// Create a node with the given metadata.
    #[must_use]
    pub const fn new(id: ResourceId, metadata: BTreeMap<String, String>) -> Self {
        Self { id, metadata }
    }

    /// Return `true` if this node carries the `default = "true"` marker.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.metadata.get(Self::DEFAULT_FLAG).map(String::as_str) == Some("true")
    }
}
