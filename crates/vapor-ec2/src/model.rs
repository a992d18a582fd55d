//! Network/compute record types, as persisted in the state store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A virtual private cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub vpc_id: String,
    pub cidr_block: String,
    pub is_default: bool,
    pub created: DateTime<Utc>,
}

/// A subnet inside a VPC. Contains instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub subnet_id: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub is_default: bool,
    pub created: DateTime<Utc>,
}

/// A route table owned by a VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub route_table_id: String,
    pub vpc_id: String,
    pub is_main: bool,
    pub created: DateTime<Utc>,
}

/// A network ACL owned by a VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAcl {
    pub network_acl_id: String,
    pub vpc_id: String,
    pub is_default: bool,
    pub created: DateTime<Utc>,
}

/// A security group owned by a VPC. Blocked from deletion while attached to
/// a running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub group_id: String,
    pub group_name: String,
    pub vpc_id: String,
    pub is_default: bool,
    pub created: DateTime<Utc>,
}

/// A compute instance living in a subnet, attached to security groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: String,
    pub subnet_id: String,
    pub security_groups: Vec<String>,
    pub state: InstanceState,
    pub created: DateTime<Utc>,
}

/// Instance lifecycle state. Terminated instances keep their record (the
/// provider reports them for a while) but hold no graph presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Running,
    Terminated,
}
