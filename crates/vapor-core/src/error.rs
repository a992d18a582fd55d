use std::fmt;

/// Machine-readable API error codes shared by every emulated service.
///
/// Handlers map internal errors onto these codes when building provider-style
/// responses, so IaC tooling under test sees the same code/status pairs the
/// real provider would return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoSuchEntity,
    EntityAlreadyExists,
    DeleteConflict,
    DependencyViolation,
    CycleDetected,
    InvalidRelationship,
    OperationNotPermitted,
    MalformedRecord,
    InternalFailure,
}

impl ErrorCode {
    /// Stable wire identifier, matching the provider's error code strings.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NoSuchEntity => "NoSuchEntity",
            Self::EntityAlreadyExists => "EntityAlreadyExists",
            Self::DeleteConflict => "DeleteConflict",
            Self::DependencyViolation => "DependencyViolation",
            Self::CycleDetected => "CycleDetected",
            Self::InvalidRelationship => "InvalidRelationship",
            Self::OperationNotPermitted => "OperationNotPermitted",
            Self::MalformedRecord => "MalformedRecord",
            Self::InternalFailure => "InternalFailure",
        }
    }

    /// HTTP status the provider pairs with this code.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NoSuchEntity => 404,
            Self::EntityAlreadyExists | Self::DeleteConflict => 409,
            Self::DependencyViolation | Self::CycleDetected | Self::InvalidRelationship => 400,
            Self::OperationNotPermitted => 403,
            Self::MalformedRecord => 400,
            Self::InternalFailure => 500,
        }
    }

    /// Short human-facing summary for logs and response messages.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoSuchEntity => "The referenced entity does not exist",
            Self::EntityAlreadyExists => "An entity with that name already exists",
            Self::DeleteConflict => "The entity cannot be deleted in its current state",
            Self::DependencyViolation => "The resource has dependent resources",
            Self::CycleDetected => "The relationship would create a cycle",
            Self::InvalidRelationship => "The relationship is not valid for these resource types",
            Self::OperationNotPermitted => "This operation is not permitted on default resources",
            Self::MalformedRecord => "The stored record could not be decoded",
            Self::InternalFailure => "Internal emulator error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NoSuchEntity,
            ErrorCode::EntityAlreadyExists,
            ErrorCode::DeleteConflict,
            ErrorCode::DependencyViolation,
            ErrorCode::CycleDetected,
            ErrorCode::InvalidRelationship,
            ErrorCode::OperationNotPermitted,
            ErrorCode::MalformedRecord,
            ErrorCode::InternalFailure,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn statuses_are_valid_http() {
        for code in [
            ErrorCode::NoSuchEntity,
            ErrorCode::DependencyViolation,
            ErrorCode::OperationNotPermitted,
            ErrorCode::InternalFailure,
        ] {
            let status = code.http_status();
            assert!((400..=599).contains(&status), "bad status {status}");
        }
    }
}
