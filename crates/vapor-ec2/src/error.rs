use vapor_core::error::ErrorCode;
use vapor_core::graph::manager::GraphError;
use vapor_core::store::StoreError;

/// Errors surfaced by network/compute handlers.
#[derive(Debug, thiserror::Error)]
pub enum Ec2Error {
    /// The referenced resource does not exist.
    #[error("{resource} '{id}' does not exist")]
    NotFound { resource: &'static str, id: String },

    /// Default resources may not be deleted, ever — this is distinct from a
    /// dependency violation and reported before any dependency evaluation.
    #[error("cannot delete default {resource} '{id}'")]
    OperationNotPermitted { resource: &'static str, id: String },

    /// The resource cannot be deleted in its current state.
    #[error("cannot delete {resource} '{id}': {reason}")]
    DeleteConflict {
        resource: &'static str,
        id: String,
        reason: String,
    },

    /// Relationship bookkeeping failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// State-store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Ec2Error {
    /// The provider API error code a response should carry.
    #[must_use]
    pub fn api_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NoSuchEntity,
            Self::OperationNotPermitted { .. } => ErrorCode::OperationNotPermitted,
            Self::DeleteConflict { .. } => ErrorCode::DeleteConflict,
            Self::Graph(err) => err.api_code(),
            Self::Store(StoreError::NotFound(_)) => ErrorCode::NoSuchEntity,
            Self::Store(StoreError::Codec { .. }) => ErrorCode::MalformedRecord,
        }
    }
}
