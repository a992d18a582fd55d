//! Network/compute request handlers.
//!
//! Handlers follow the same ordering contract as the identity service:
//! persist the record, then register the node and its relationships; ask
//! the tracker before deleting a record, aborting on a dependency
//! violation. Default resources are refused deletion by the handler itself
//! (`OperationNotPermitted`), before any dependency evaluation.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use vapor_core::graph::manager::{DefaultVpcTopology, GraphError, ResourceTracker};
use vapor_core::graph::resource::{RelationshipKind, ResourceId};
use vapor_core::store::{StateStore, StoreError, TypedStore, resource_key};

use crate::error::Ec2Error;
use crate::ids;
use crate::model::{Instance, InstanceState, NetworkAcl, RouteTable, SecurityGroup, Subnet, Vpc};

const SERVICE: &str = "ec2";

/// The network/compute handler set. One instance per emulated endpoint,
/// shared across concurrent requests.
pub struct Ec2Service {
    store: Arc<dyn StateStore>,
    tracker: Arc<dyn ResourceTracker>,
    defaults: DefaultVpcTopology,
}

impl Ec2Service {
    /// Build the service and seed the provider's default topology: a
    /// default VPC containing a default subnet, route table, network ACL,
    /// and security group.
    pub fn new(
        store: Arc<dyn StateStore>,
        tracker: Arc<dyn ResourceTracker>,
    ) -> Result<Self, Ec2Error> {
        let defaults = DefaultVpcTopology::new(
            SERVICE,
            &ids::resource_id("vpc"),
            &ids::resource_id("subnet"),
            &ids::resource_id("rtb"),
            &ids::resource_id("acl"),
            &ids::resource_id("sg"),
        );

        let now = Utc::now();
        store.set(
            &resource_key(SERVICE, "vpc", &defaults.vpc.id),
            &Vpc {
                vpc_id: defaults.vpc.id.clone(),
                cidr_block: "172.31.0.0/16".to_string(),
                is_default: true,
                created: now,
            },
        )?;
        store.set(
            &resource_key(SERVICE, "subnet", &defaults.subnet.id),
            &Subnet {
                subnet_id: defaults.subnet.id.clone(),
                vpc_id: defaults.vpc.id.clone(),
                cidr_block: "172.31.0.0/20".to_string(),
                is_default: true,
                created: now,
            },
        )?;
        store.set(
            &resource_key(SERVICE, "route-table", &defaults.route_table.id),
            &RouteTable {
                route_table_id: defaults.route_table.id.clone(),
                vpc_id: defaults.vpc.id.clone(),
                is_main: true,
                created: now,
            },
        )?;
        store.set(
            &resource_key(SERVICE, "network-acl", &defaults.network_acl.id),
            &NetworkAcl {
                network_acl_id: defaults.network_acl.id.clone(),
                vpc_id: defaults.vpc.id.clone(),
                is_default: true,
                created: now,
            },
        )?;
        store.set(
            &resource_key(SERVICE, "security-group", &defaults.security_group.id),
            &SecurityGroup {
                group_id: defaults.security_group.id.clone(),
                group_name: "default".to_string(),
                vpc_id: defaults.vpc.id.clone(),
                is_default: true,
                created: now,
            },
        )?;

        defaults.seed(tracker.as_ref())?;

        Ok(Self {
            store,
            tracker,
            defaults,
        })
    }

    /// Identity of the seeded default VPC.
    pub fn default_vpc_id(&self) -> &str {
        &self.defaults.vpc.id
    }

    /// Identity of the seeded default subnet.
    pub fn default_subnet_id(&self) -> &str {
        &self.defaults.subnet.id
    }

    /// Identity of the seeded default security group.
    pub fn default_security_group_id(&self) -> &str {
        &self.defaults.security_group.id
    }

    // -----------------------------------------------------------------------
    // VPCs
    // -----------------------------------------------------------------------

    pub fn create_vpc(&self, cidr_block: &str) -> Result<Vpc, Ec2Error> {
        let vpc = Vpc {
            vpc_id: ids::resource_id("vpc"),
            cidr_block: cidr_block.to_string(),
            is_default: false,
            created: Utc::now(),
        };
        self.store
            .set(&resource_key(SERVICE, "vpc", &vpc.vpc_id), &vpc)?;

        let registered = self
            .tracker
            .register_resource(&rid("vpc", &vpc.vpc_id), BTreeMap::new());
        let key = resource_key(SERVICE, "vpc", &vpc.vpc_id);
        self.bookkeeping(registered, || Ok(self.store.delete(&key)?))?;

        Ok(vpc)
    }

    pub fn get_vpc(&self, vpc_id: &str) -> Result<Vpc, Ec2Error> {
        self.require(&resource_key(SERVICE, "vpc", vpc_id), "vpc", vpc_id)
    }

    pub fn delete_vpc(&self, vpc_id: &str) -> Result<(), Ec2Error> {
        let key = resource_key(SERVICE, "vpc", vpc_id);
        let vpc: Vpc = self.require(&key, "vpc", vpc_id)?;
        if vpc.is_default {
            return Err(Ec2Error::OperationNotPermitted {
                resource: "vpc",
                id: vpc_id.to_string(),
            });
        }

        self.unregister_for_delete(&rid("vpc", vpc_id))?;
        self.store.delete(&key)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subnets
    // -----------------------------------------------------------------------

    pub fn create_subnet(&self, vpc_id: &str, cidr_block: &str) -> Result<Subnet, Ec2Error> {
        let _vpc = self.get_vpc(vpc_id)?;

        let subnet = Subnet {
            subnet_id: ids::resource_id("subnet"),
            vpc_id: vpc_id.to_string(),
            cidr_block: cidr_block.to_string(),
            is_default: false,
            created: Utc::now(),
        };
        let key = resource_key(SERVICE, "subnet", &subnet.subnet_id);
        self.store.set(&key, &subnet)?;

        let subnet_rid = rid("subnet", &subnet.subnet_id);
        let result = self
            .tracker
            .register_resource(&subnet_rid, BTreeMap::new())
            .and_then(|()| {
                self.tracker.add_relationship(
                    &rid("vpc", vpc_id),
                    &subnet_rid,
                    RelationshipKind::Contains,
                )
            });
        self.bookkeeping(result, || {
            let _ = self.tracker.unregister_resource(&subnet_rid);
            Ok(self.store.delete(&key)?)
        })?;

        Ok(subnet)
    }

    pub fn get_subnet(&self, subnet_id: &str) -> Result<Subnet, Ec2Error> {
        self.require(
            &resource_key(SERVICE, "subnet", subnet_id),
            "subnet",
            subnet_id,
        )
    }

    pub fn delete_subnet(&self, subnet_id: &str) -> Result<(), Ec2Error> {
        let key = resource_key(SERVICE, "subnet", subnet_id);
        let subnet: Subnet = self.require(&key, "subnet", subnet_id)?;
        if subnet.is_default {
            return Err(Ec2Error::OperationNotPermitted {
                resource: "subnet",
                id: subnet_id.to_string(),
            });
        }

        self.unregister_for_delete(&rid("subnet", subnet_id))?;
        self.store.delete(&key)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Route tables and network ACLs
    // -----------------------------------------------------------------------

    pub fn create_route_table(&self, vpc_id: &str) -> Result<RouteTable, Ec2Error> {
        let _vpc = self.get_vpc(vpc_id)?;

        let table = RouteTable {
            route_table_id: ids::resource_id("rtb"),
            vpc_id: vpc_id.to_string(),
            is_main: false,
            created: Utc::now(),
        };
        let key = resource_key(SERVICE, "route-table", &table.route_table_id);
        self.store.set(&key, &table)?;

        let table_rid = rid("route-table", &table.route_table_id);
        let result = self
            .tracker
            .register_resource(&table_rid, BTreeMap::new())
            .and_then(|()| {
                self.tracker.add_relationship(
                    &rid("vpc", vpc_id),
                    &table_rid,
                    RelationshipKind::Contains,
                )
            });
        self.bookkeeping(result, || {
            let _ = self.tracker.unregister_resource(&table_rid);
            Ok(self.store.delete(&key)?)
        })?;

        Ok(table)
    }

    pub fn delete_route_table(&self, route_table_id: &str) -> Result<(), Ec2Error> {
        let key = resource_key(SERVICE, "route-table", route_table_id);
        let table: RouteTable = self.require(&key, "route table", route_table_id)?;
        if table.is_main {
            return Err(Ec2Error::OperationNotPermitted {
                resource: "route table",
                id: route_table_id.to_string(),
            });
        }

        self.unregister_for_delete(&rid("route-table", route_table_id))?;
        self.store.delete(&key)?;
        Ok(())
    }

    pub fn create_network_acl(&self, vpc_id: &str) -> Result<NetworkAcl, Ec2Error> {
        let _vpc = self.get_vpc(vpc_id)?;

        let acl = NetworkAcl {
            network_acl_id: ids::resource_id("acl"),
            vpc_id: vpc_id.to_string(),
            is_default: false,
            created: Utc::now(),
        };
        let key = resource_key(SERVICE, "network-acl", &acl.network_acl_id);
        self.store.set(&key, &acl)?;

        let acl_rid = rid("network-acl", &acl.network_acl_id);
        let result = self
            .tracker
            .register_resource(&acl_rid, BTreeMap::new())
            .and_then(|()| {
                self.tracker.add_relationship(
                    &rid("vpc", vpc_id),
                    &acl_rid,
                    RelationshipKind::Contains,
                )
            });
        self.bookkeeping(result, || {
            let _ = self.tracker.unregister_resource(&acl_rid);
            Ok(self.store.delete(&key)?)
        })?;

        Ok(acl)
    }

    pub fn delete_network_acl(&self, network_acl_id: &str) -> Result<(), Ec2Error> {
        let key = resource_key(SERVICE, "network-acl", network_acl_id);
        let acl: NetworkAcl = self.require(&key, "network ACL", network_acl_id)?;
        if acl.is_default {
            return Err(Ec2Error::OperationNotPermitted {
                resource: "network ACL",
                id: network_acl_id.to_string(),
            });
        }

        self.unregister_for_delete(&rid("network-acl", network_acl_id))?;
        self.store.delete(&key)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Security groups
    // -----------------------------------------------------------------------

    pub fn create_security_group(
        &self,
        vpc_id: &str,
        group_name: &str,
    ) -> Result<SecurityGroup, Ec2Error> {
        let _vpc = self.get_vpc(vpc_id)?;

        let group = SecurityGroup {
            group_id: ids::resource_id("sg"),
            group_name: group_name.to_string(),
            vpc_id: vpc_id.to_string(),
            is_default: false,
            created: Utc::now(),
        };
        let key = resource_key(SERVICE, "security-group", &group.group_id);
        self.store.set(&key, &group)?;

        let group_rid = rid("security-group", &group.group_id);
        let result = self
            .tracker
            .register_resource(&group_rid, BTreeMap::new())
            .and_then(|()| {
                self.tracker.add_relationship(
                    &rid("vpc", vpc_id),
                    &group_rid,
                    RelationshipKind::Contains,
                )
            });
        self.bookkeeping(result, || {
            let _ = self.tracker.unregister_resource(&group_rid);
            Ok(self.store.delete(&key)?)
        })?;

        Ok(group)
    }

    pub fn get_security_group(&self, group_id: &str) -> Result<SecurityGroup, Ec2Error> {
        self.require(
            &resource_key(SERVICE, "security-group", group_id),
            "security group",
            group_id,
        )
    }

    pub fn delete_security_group(&self, group_id: &str) -> Result<(), Ec2Error> {
        let key = resource_key(SERVICE, "security-group", group_id);
        let group: SecurityGroup = self.require(&key, "security group", group_id)?;
        if group.is_default {
            return Err(Ec2Error::OperationNotPermitted {
                resource: "security group",
                id: group_id.to_string(),
            });
        }

        self.unregister_for_delete(&rid("security-group", group_id))?;
        self.store.delete(&key)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// Launch an instance into a subnet, attached to the given security
    /// groups (the default group if none are named).
    pub fn run_instance(
        &self,
        subnet_id: &str,
        security_group_ids: &[String],
    ) -> Result<Instance, Ec2Error> {
        let _subnet = self.get_subnet(subnet_id)?;

        let groups = if security_group_ids.is_empty() {
            vec![self.defaults.security_group.id.clone()]
        } else {
            security_group_ids.to_vec()
        };
        for group_id in &groups {
            let _group = self.get_security_group(group_id)?;
        }

        let instance = Instance {
            instance_id: ids::resource_id("i"),
            subnet_id: subnet_id.to_string(),
            security_groups: groups.clone(),
            state: InstanceState::Running,
            created: Utc::now(),
        };
        let key = resource_key(SERVICE, "instance", &instance.instance_id);
        self.store.set(&key, &instance)?;

        let instance_rid = rid("instance", &instance.instance_id);
        let result = self
            .tracker
            .register_resource(&instance_rid, BTreeMap::new())
            .and_then(|()| {
                self.tracker.add_relationship(
                    &rid("subnet", subnet_id),
                    &instance_rid,
                    RelationshipKind::Contains,
                )
            })
            .and_then(|()| {
                for group_id in &groups {
                    self.tracker.add_relationship(
                        &instance_rid,
                        &rid("security-group", group_id),
                        RelationshipKind::AssociatedWith,
                    )?;
                }
                Ok(())
            });
        self.bookkeeping(result, || {
            let _ = self.tracker.unregister_resource(&instance_rid);
            Ok(self.store.delete(&key)?)
        })?;

        Ok(instance)
    }

    pub fn get_instance(&self, instance_id: &str) -> Result<Instance, Ec2Error> {
        self.require(
            &resource_key(SERVICE, "instance", instance_id),
            "instance",
            instance_id,
        )
    }

    /// Terminate an instance: the record survives in the `terminated` state
    /// but the graph node (and every edge it held) is removed, releasing the
    /// subnet and security groups.
    pub fn terminate_instance(&self, instance_id: &str) -> Result<(), Ec2Error> {
        let key = resource_key(SERVICE, "instance", instance_id);
        let _instance: Instance = self.require(&key, "instance", instance_id)?;

        self.unregister_for_delete(&rid("instance", instance_id))?;
        self.store.update(&key, |record: &mut Instance| {
            record.state = InstanceState::Terminated;
        })?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------------

    fn require<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        resource: &'static str,
        id: &str,
    ) -> Result<T, Ec2Error> {
        match self.store.get(key) {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(Ec2Error::NotFound {
                resource,
                id: id.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn bookkeeping(
        &self,
        result: Result<(), GraphError>,
        rollback: impl FnOnce() -> Result<(), Ec2Error>,
    ) -> Result<(), Ec2Error> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if self.tracker.is_strict() => {
                rollback()?;
                Err(err.into())
            }
            Err(err) => {
                tracing::warn!(error = %err, "relationship bookkeeping failed, continuing in permissive mode");
                Ok(())
            }
        }
    }

    fn unregister_for_delete(&self, id: &ResourceId) -> Result<(), Ec2Error> {
        match self.tracker.unregister_resource(id) {
            Ok(()) => Ok(()),
            Err(err @ GraphError::DependencyViolation { .. }) => Err(err.into()),
            Err(err) if self.tracker.is_strict() => Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "unregister failed, continuing in permissive mode");
                Ok(())
            }
        }
    }
}

fn rid(resource_type: &str, id: &str) -> ResourceId {
    ResourceId::new(SERVICE, resource_type, id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
