//! Identity-service record types, as persisted in the state store.
//!
//! Attachment bookkeeping lives on the *policy* record (`attached_to`): the
//! relationship graph mirrors it as `policy --associated-with--> principal`
//! edges, and the strict/permissive consistency policy decides whether the
//! two may ever diverge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An identity-service user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub user_id: String,
    pub arn: String,
    pub path: String,
    pub created: DateTime<Utc>,
}

/// A group of users. Membership is mirrored in the graph as
/// `user --associated-with--> group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_name: String,
    pub group_id: String,
    pub arn: String,
    pub path: String,
    pub created: DateTime<Utc>,
    pub members: Vec<String>,
}

/// An assumable role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role_name: String,
    pub role_id: String,
    pub arn: String,
    pub path: String,
    pub created: DateTime<Utc>,
    pub assume_role_policy_document: String,
}

/// A customer-managed policy. `attached_to` holds principal record keys
/// (`role/<name>`, `group/<name>`, `user/<name>`) in attachment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedPolicy {
    pub policy_name: String,
    pub policy_id: String,
    pub arn: String,
    pub path: String,
    pub created: DateTime<Utc>,
    pub document: String,
    pub attached_to: Vec<String>,
}

/// A user's access key. The key blocks deletion of its owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    pub access_key_id: String,
    pub user_name: String,
    pub status: AccessKeyStatus,
    pub created: DateTime<Utc>,
}

/// Lifecycle status of an access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKeyStatus {
    Active,
    Inactive,
}

/// An instance profile: a container a role is mounted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceProfile {
    pub profile_name: String,
    pub profile_id: String,
    pub arn: String,
    pub path: String,
    pub created: DateTime<Utc>,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_record_round_trips() {
        let policy = ManagedPolicy {
            policy_name: "read-only".to_string(),
            policy_id: "ANPA0000000000EXAMPLE".to_string(),
            arn: "arn:aws:iam::123456789012:policy/read-only".to_string(),
            path: "/".to_string(),
            created: Utc::now(),
            document: "{}".to_string(),
            attached_to: vec!["role/admin".to_string()],
        };

        let raw = serde_json::to_value(&policy).expect("encode");
        let back: ManagedPolicy = serde_json::from_value(raw).expect("decode");
        assert_eq!(back, policy);
    }

    #[test]
    fn access_key_status_encoding() {
        let raw = serde_json::to_value(AccessKeyStatus::Active).expect("encode");
        assert_eq!(raw, serde_json::json!("Active"));
    }
}
