//! Emulated network/compute service.
//!
//! Request handlers for VPCs, subnets, route tables, network ACLs, security
//! groups, and instances. Construction seeds the provider's default network
//! topology: a default VPC containing a default subnet, route table, network
//! ACL, and security group, none of which can be deleted.

pub mod error;
pub mod ids;
pub mod model;
pub mod service;

pub use error::Ec2Error;
pub use service::Ec2Service;
