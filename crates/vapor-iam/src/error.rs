use vapor_core::error::ErrorCode;
use vapor_core::graph::manager::GraphError;
use vapor_core::store::StoreError;

/// Errors surfaced by identity-service handlers.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    /// The named entity does not exist.
    #[error("{entity} '{name}' does not exist")]
    NoSuchEntity { entity: &'static str, name: String },

    /// An entity with this name already exists.
    #[error("{entity} '{name}' already exists")]
    EntityAlreadyExists { entity: &'static str, name: String },

    /// The entity cannot be deleted in its current state (e.g. a policy
    /// still attached somewhere, a user with live access keys).
    #[error("cannot delete {entity} '{name}': {reason}")]
    DeleteConflict {
        entity: &'static str,
        name: String,
        reason: String,
    },

    /// Relationship bookkeeping failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// State-store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IamError {
    /// The provider API error code a response should carry.
    #[must_use]
    pub fn api_code(&self) -> ErrorCode {
        match self {
            Self::NoSuchEntity { .. } => ErrorCode::NoSuchEntity,
            Self::EntityAlreadyExists { .. } => ErrorCode::EntityAlreadyExists,
            Self::DeleteConflict { .. } => ErrorCode::DeleteConflict,
            Self::Graph(err) => err.api_code(),
            Self::Store(StoreError::NotFound(_)) => ErrorCode::NoSuchEntity,
            Self::Store(StoreError::Codec { .. }) => ErrorCode::MalformedRecord,
        }
    }
}
