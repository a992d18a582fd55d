//! End-to-end checks of the seeded default network topology.

use std::sync::Arc;

use vapor_core::config::TrackerConfig;
use vapor_core::graph::manager::{GraphError, ResourceManager, ResourceTracker};
use vapor_core::graph::resource::ResourceId;
use vapor_core::store::{MemoryStore, StateStore};
use vapor_ec2::{Ec2Error, Ec2Service};

fn build() -> (Ec2Service, Arc<ResourceManager>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let manager = Arc::new(ResourceManager::new(TrackerConfig::default()));
    let ec2 = Ec2Service::new(
        Arc::clone(&store) as Arc<dyn StateStore>,
        Arc::clone(&manager) as Arc<dyn ResourceTracker>,
    )
    .expect("construct service");
    (ec2, manager, store)
}

#[test]
fn fresh_service_seeds_five_default_resources() {
    let (ec2, manager, store) = build();

    let vpc_id = ec2.default_vpc_id().to_string();
    let vpc = ec2.get_vpc(&vpc_id).expect("default vpc record");
    assert!(vpc.is_default);

    // All five defaults are registered with the default flag set.
    assert_eq!(manager.resource_count(), 5);
    let vpc_rid = ResourceId::new("ec2", "vpc", &vpc_id);
    assert!(manager.has_resource(&vpc_rid));
    let metadata = manager.resource_metadata(&vpc_rid).expect("metadata");
    assert_eq!(metadata.get("default").map(String::as_str), Some("true"));

    // And each has a persisted record.
    assert_eq!(store.list("ec2/").len(), 5);
}

#[test]
fn default_vpc_is_blocked_by_its_four_children() {
    let (ec2, manager, _store) = build();

    let vpc_rid = ResourceId::new("ec2", "vpc", ec2.default_vpc_id());
    let check = manager.can_delete(&vpc_rid).expect("check");
    assert!(!check.deletable);
    assert_eq!(check.blockers.len(), 4);

    // Even detached, the handler refuses: default resources are protected
    // before any dependency evaluation runs.
    let err = ec2.delete_vpc(ec2.default_vpc_id()).unwrap_err();
    assert!(matches!(err, Ec2Error::OperationNotPermitted { .. }));
}

#[test]
fn attached_security_group_is_blocked_until_termination() {
    let (ec2, _manager, _store) = build();

    let vpc = ec2.create_vpc("10.0.0.0/16").expect("vpc");
    let subnet = ec2
        .create_subnet(&vpc.vpc_id, "10.0.1.0/24")
        .expect("subnet");
    let group = ec2
        .create_security_group(&vpc.vpc_id, "api")
        .expect("group");
    let instance = ec2
        .run_instance(&subnet.subnet_id, std::slice::from_ref(&group.group_id))
        .expect("run");

    let err = ec2.delete_security_group(&group.group_id).unwrap_err();
    let Ec2Error::Graph(GraphError::DependencyViolation { blockers, .. }) = &err else {
        panic!("expected DependencyViolation, got {err:?}");
    };
    assert_eq!(
        blockers,
        &vec![ResourceId::new("ec2", "instance", &instance.instance_id)]
    );

    ec2.terminate_instance(&instance.instance_id)
        .expect("terminate");
    ec2.delete_security_group(&group.group_id)
        .expect("delete group");
    ec2.delete_subnet(&subnet.subnet_id).expect("delete subnet");
    ec2.delete_vpc(&vpc.vpc_id).expect("delete vpc");
}

#[test]
fn route_table_and_acl_block_their_vpc() {
    let (ec2, _manager, _store) = build();

    let vpc = ec2.create_vpc("10.1.0.0/16").expect("vpc");
    let table = ec2.create_route_table(&vpc.vpc_id).expect("table");
    let acl = ec2.create_network_acl(&vpc.vpc_id).expect("acl");

    let err = ec2.delete_vpc(&vpc.vpc_id).unwrap_err();
    let Ec2Error::Graph(GraphError::DependencyViolation { blockers, .. }) = &err else {
        panic!("expected DependencyViolation, got {err:?}");
    };
    // Insertion order: table registered before acl.
    assert_eq!(
        blockers,
        &vec![
            ResourceId::new("ec2", "route-table", &table.route_table_id),
            ResourceId::new("ec2", "network-acl", &acl.network_acl_id),
        ]
    );

    ec2.delete_route_table(&table.route_table_id)
        .expect("delete table");
    ec2.delete_network_acl(&acl.network_acl_id)
        .expect("delete acl");
    ec2.delete_vpc(&vpc.vpc_id).expect("delete vpc");
}
