//! Static legality table for relationship shapes.
//!
//! A guard against silent graph corruption, not a business-rule engine:
//! service handlers can only wire up relationships that correspond to a
//! real provider semantic. The table is populated once at manager
//! construction and read-only afterwards, so it needs no locking.

#![allow(clippy::must_use_candidate)]

use std::collections::HashSet;
use std::fmt;

use super::resource::RelationshipKind;

// ---------------------------------------------------------------------------
// RelationshipRule
// ---------------------------------------------------------------------------

/// One legal `(from type, kind, to type)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipRule {
    pub from_type: String,
    pub kind: RelationshipKind,
    pub to_type: String,
}

impl RelationshipRule {
    pub fn new(from_type: &str, kind: RelationshipKind, to_type: &str) -> Self {
        Self {
            from_type: from_type.to_string(),
            kind,
            to_type: to_type.to_string(),
        }
    }
}

impl fmt::Display for RelationshipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.from_type, self.kind, self.to_type)
    }
}

// ---------------------------------------------------------------------------
// RelationshipSchema
// ---------------------------------------------------------------------------

/// The set of relationship shapes a manager accepts.
#[derive(Debug, Clone, Default)]
pub struct RelationshipSchema {
    rules: HashSet<RelationshipRule>,
}

impl RelationshipSchema {
    /// Build a schema from an explicit rule list.
    pub fn from_rules(rules: impl IntoIterator<Item = RelationshipRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The built-in AWS-shaped table covering the relationships the IAM and
    /// EC2 emulations create.
    pub fn aws_default() -> Self {
        use RelationshipKind::{AssociatedWith, Contains};

        let rules = [
            // IAM
            ("user", Contains, "access-key"),
            ("instance-profile", Contains, "role"),
            ("policy", AssociatedWith, "role"),
            ("policy", AssociatedWith, "group"),
            ("policy", AssociatedWith, "user"),
            ("user", AssociatedWith, "group"),
            // EC2
            ("vpc", Contains, "subnet"),
            ("vpc", Contains, "route-table"),
            ("vpc", Contains, "network-acl"),
            ("vpc", Contains, "security-group"),
            ("subnet", Contains, "instance"),
            ("instance", AssociatedWith, "security-group"),
        ];

        Self::from_rules(
            rules
                .into_iter()
                .map(|(from, kind, to)| RelationshipRule::new(from, kind, to)),
        )
    }

    /// Return `true` if the `(from type, kind, to type)` triple is legal.
    pub fn allows(&self, from_type: &str, kind: RelationshipKind, to_type: &str) -> bool {
        self.rules.contains(&RelationshipRule::new(from_type, kind, to_type))
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Return `true` if no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RelationshipKind::{AssociatedWith, Contains};

    #[test]
    fn aws_table_allows_known_shapes() {
        let schema = RelationshipSchema::aws_default();
        assert!(schema.allows("vpc", Contains, "subnet"));
        assert!(schema.allows("instance-profile", Contains, "role"));
        assert!(schema.allows("policy", AssociatedWith, "role"));
        assert!(schema.allows("user", Contains, "access-key"));
    }

    #[test]
    fn aws_table_rejects_wrong_direction_and_kind() {
        let schema = RelationshipSchema::aws_default();
        // Right types, wrong direction.
        assert!(!schema.allows("subnet", Contains, "vpc"));
        assert!(!schema.allows("role", AssociatedWith, "policy"));
        // Right types and direction, wrong kind.
        assert!(!schema.allows("vpc", AssociatedWith, "subnet"));
        // Never-legal pairing.
        assert!(!schema.allows("user", Contains, "vpc"));
    }

    #[test]
    fn custom_rule_set() {
        let schema = RelationshipSchema::from_rules([RelationshipRule::new(
            "cluster",
            Contains,
            "node-pool",
        )]);
        assert_eq!(schema.len(), 1);
        assert!(schema.allows("cluster", Contains, "node-pool"));
        assert!(!schema.allows("vpc", Contains, "subnet"));
    }

    #[test]
    fn rule_display() {
        let rule = RelationshipRule::new("vpc", Contains, "subnet");
        assert_eq!(rule.to_string(), "vpc --contains--> subnet");
    }
}
