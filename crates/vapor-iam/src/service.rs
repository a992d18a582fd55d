//! Identity-service request handlers.
//!
//! # Overview
//!
//! Each handler follows the same ordering contract with the core:
//!
//! - **create**: persist the record, then register the node (and any
//!   relationships) with the tracker.
//! - **delete**: ask the tracker to unregister first — aborting on a
//!   dependency violation — then delete the record.
//! - **attach/detach**: mutate the record's bookkeeping atomically, then
//!   mirror the change as a relationship.
//!
//! # Consistency policy
//!
//! When a tracker call fails mid-operation, [`IamService`] consults
//! `tracker.is_strict()`: strict mode reverts the state-store mutation that
//! was already applied and propagates the error; permissive mode logs the
//! failure and proceeds, leaving the store authoritative and the graph a
//! best-effort overlay. Dependency violations on deletion are surfaced in
//! both modes.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use vapor_core::graph::manager::{GraphError, ResourceTracker};
use vapor_core::graph::resource::{RelationshipKind, ResourceId};
use vapor_core::store::{StateStore, StoreError, TypedStore, resource_key};

use crate::error::IamError;
use crate::ids;
use crate::model::{
    AccessKey, AccessKeyStatus, Group, InstanceProfile, ManagedPolicy, Role, User,
};

const SERVICE: &str = "iam";

/// The identity-service handler set. One instance per emulated endpoint,
/// shared across concurrent requests.
pub struct IamService {
    store: Arc<dyn StateStore>,
    tracker: Arc<dyn ResourceTracker>,
}

impl IamService {
    /// Build the service over a state store and a resource tracker.
    ///
    /// Pass a [`vapor_core::graph::manager::NoopTracker`] to run without
    /// dependency tracking.
    pub fn new(store: Arc<dyn StateStore>, tracker: Arc<dyn ResourceTracker>) -> Self {
        Self { store, tracker }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn create_user(&self, user_name: &str) -> Result<User, IamError> {
        let key = resource_key(SERVICE, "user", user_name);
        self.ensure_absent(&key, "user", user_name)?;

        let user = User {
            user_name: user_name.to_string(),
            user_id: ids::resource_id("AIDA"),
            arn: ids::arn("user", "/", user_name),
            path: "/".to_string(),
            created: Utc::now(),
        };
        self.store.set(&key, &user)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("arn".to_string(), user.arn.clone());
        let registered = self.tracker.register_resource(&rid("user", user_name), metadata);
        self.bookkeeping(registered, || Ok(self.store.delete(&key)?))?;

        Ok(user)
    }

    pub fn get_user(&self, user_name: &str) -> Result<User, IamError> {
        self.require(&resource_key(SERVICE, "user", user_name), "user", user_name)
    }

    /// Delete a user. Fails while the user still owns access keys — checked
    /// directly against the key records, so the check holds even without a
    /// tracker — and while anything else blocks it in the graph.
    pub fn delete_user(&self, user_name: &str) -> Result<(), IamError> {
        let key = resource_key(SERVICE, "user", user_name);
        let _user: User = self.require(&key, "user", user_name)?;

        let live_keys = self.access_keys_of(user_name)?;
        if !live_keys.is_empty() {
            return Err(IamError::DeleteConflict {
                entity: "user",
                name: user_name.to_string(),
                reason: format!("{} access key(s) must be deleted first", live_keys.len()),
            });
        }

        self.unregister_for_delete(&rid("user", user_name))?;
        self.store.delete(&key)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Access keys
    // -----------------------------------------------------------------------

    pub fn create_access_key(&self, user_name: &str) -> Result<AccessKey, IamError> {
        let _user = self.get_user(user_name)?;

        let access_key = AccessKey {
            access_key_id: ids::resource_id("AKIA"),
            user_name: user_name.to_string(),
            status: AccessKeyStatus::Active,
            created: Utc::now(),
        };
        let key = resource_key(SERVICE, "access-key", &access_key.access_key_id);
        self.store.set(&key, &access_key)?;

        let key_rid = rid("access-key", &access_key.access_key_id);
        let result = self
            .tracker
            .register_resource(&key_rid, BTreeMap::new())
            .and_then(|()| {
                // The user contains the key: the key blocks the user's
                // deletion, not the other way around.
                self.tracker.add_relationship(
                    &rid("user", user_name),
                    &key_rid,
                    RelationshipKind::Contains,
                )
            });
        self.bookkeeping(result, || {
            let _ = self.tracker.unregister_resource(&key_rid);
            Ok(self.store.delete(&key)?)
        })?;

        Ok(access_key)
    }

    pub fn delete_access_key(&self, access_key_id: &str) -> Result<(), IamError> {
        let key = resource_key(SERVICE, "access-key", access_key_id);
        let _record: AccessKey = self.require(&key, "access key", access_key_id)?;

        // Unregistering cascades the user->key containment edge.
        self.unregister_for_delete(&rid("access-key", access_key_id))?;
        self.store.delete(&key)?;
        Ok(())
    }

    fn access_keys_of(&self, user_name: &str) -> Result<Vec<AccessKey>, IamError> {
        let mut keys = Vec::new();
        for record_key in self.store.list(&format!("{SERVICE}/access-key/")) {
            let record: AccessKey = self.store.get(&record_key)?;
            if record.user_name == user_name {
                keys.push(record);
            }
        }
        Ok(keys)
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn create_group(&self, group_name: &str) -> Result<Group, IamError> {
        let key = resource_key(SERVICE, "group", group_name);
        self.ensure_absent(&key, "group", group_name)?;

        let group = Group {
            group_name: group_name.to_string(),
            group_id: ids::resource_id("AGPA"),
            arn: ids::arn("group", "/", group_name),
            path: "/".to_string(),
            created: Utc::now(),
            members: Vec::new(),
        };
        self.store.set(&key, &group)?;

        let registered = self
            .tracker
            .register_resource(&rid("group", group_name), BTreeMap::new());
        self.bookkeeping(registered, || Ok(self.store.delete(&key)?))?;

        Ok(group)
    }

    pub fn get_group(&self, group_name: &str) -> Result<Group, IamError> {
        self.require(
            &resource_key(SERVICE, "group", group_name),
            "group",
            group_name,
        )
    }

    pub fn delete_group(&self, group_name: &str) -> Result<(), IamError> {
        let key = resource_key(SERVICE, "group", group_name);
        let _group: Group = self.require(&key, "group", group_name)?;

        self.unregister_for_delete(&rid("group", group_name))?;
        self.store.delete(&key)?;
        Ok(())
    }

    pub fn add_user_to_group(&self, group_name: &str, user_name: &str) -> Result<(), IamError> {
        let group_key = resource_key(SERVICE, "group", group_name);
        let _group: Group = self.require(&group_key, "group", group_name)?;
        let _user = self.get_user(user_name)?;

        let member = user_name.to_string();
        self.store.update(&group_key, |group: &mut Group| {
            if !group.members.contains(&member) {
                group.members.push(member.clone());
            }
        })?;

        let result = self.tracker.add_relationship(
            &rid("user", user_name),
            &rid("group", group_name),
            RelationshipKind::AssociatedWith,
        );
        self.bookkeeping(result, || {
            Ok(self.store.update(&group_key, |group: &mut Group| {
                group.members.retain(|m| m != user_name);
            })?)
        })
    }

    pub fn remove_user_from_group(
        &self,
        group_name: &str,
        user_name: &str,
    ) -> Result<(), IamError> {
        let group_key = resource_key(SERVICE, "group", group_name);
        let _group: Group = self.require(&group_key, "group", group_name)?;

        self.store.update(&group_key, |group: &mut Group| {
            group.members.retain(|m| m != user_name);
        })?;
        self.tracker.remove_relationship(
            &rid("user", user_name),
            &rid("group", group_name),
            RelationshipKind::AssociatedWith,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    pub fn create_role(&self, role_name: &str, assume_role_policy: &str) -> Result<Role, IamError> {
        let key = resource_key(SERVICE, "role", role_name);
        self.ensure_absent(&key, "role", role_name)?;

        let role = Role {
            role_name: role_name.to_string(),
            role_id: ids::resource_id("AROA"),
            arn: ids::arn("role", "/", role_name),
            path: "/".to_string(),
            created: Utc::now(),
            assume_role_policy_document: assume_role_policy.to_string(),
        };
        self.store.set(&key, &role)?;

        let registered = self
            .tracker
            .register_resource(&rid("role", role_name), BTreeMap::new());
        self.bookkeeping(registered, || Ok(self.store.delete(&key)?))?;

        Ok(role)
    }

    pub fn get_role(&self, role_name: &str) -> Result<Role, IamError> {
        self.require(&resource_key(SERVICE, "role", role_name), "role", role_name)
    }

    /// Delete a role. Fails while the role is mounted in an instance
    /// profile (checked against profile records; containment blocks the
    /// profile's deletion, not the role's) or while policies are attached.
    pub fn delete_role(&self, role_name: &str) -> Result<(), IamError> {
        let key = resource_key(SERVICE, "role", role_name);
        let _role: Role = self.require(&key, "role", role_name)?;

        for profile_key in self.store.list(&format!("{SERVICE}/instance-profile/")) {
            let profile: InstanceProfile = self.store.get(&profile_key)?;
            if profile.roles.iter().any(|r| r == role_name) {
                return Err(IamError::DeleteConflict {
                    entity: "role",
                    name: role_name.to_string(),
                    reason: format!(
                        "role is mounted in instance profile '{}'",
                        profile.profile_name
                    ),
                });
            }
        }

        self.unregister_for_delete(&rid("role", role_name))?;
        self.store.delete(&key)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Managed policies
    // -----------------------------------------------------------------------

    pub fn create_policy(&self, policy_name: &str, document: &str) -> Result<ManagedPolicy, IamError> {
        let key = resource_key(SERVICE, "policy", policy_name);
        self.ensure_absent(&key, "policy", policy_name)?;

        let policy = ManagedPolicy {
            policy_name: policy_name.to_string(),
            policy_id: ids::resource_id("ANPA"),
            arn: ids::arn("policy", "/", policy_name),
            path: "/".to_string(),
            created: Utc::now(),
            document: document.to_string(),
            attached_to: Vec::new(),
        };
        self.store.set(&key, &policy)?;

        let registered = self
            .tracker
            .register_resource(&rid("policy", policy_name), BTreeMap::new());
        self.bookkeeping(registered, || Ok(self.store.delete(&key)?))?;

        Ok(policy)
    }

    pub fn get_policy(&self, policy_name: &str) -> Result<ManagedPolicy, IamError> {
        self.require(
            &resource_key(SERVICE, "policy", policy_name),
            "policy",
            policy_name,
        )
    }

    /// Delete a managed policy. The graph never blocks the attaching side,
    /// so the handler enforces the provider rule itself: a policy must be
    /// detached from every principal first.
    pub fn delete_policy(&self, policy_name: &str) -> Result<(), IamError> {
        let key = resource_key(SERVICE, "policy", policy_name);
        let policy: ManagedPolicy = self.require(&key, "policy", policy_name)?;

        if !policy.attached_to.is_empty() {
            return Err(IamError::DeleteConflict {
                entity: "policy",
                name: policy_name.to_string(),
                reason: format!(
                    "policy is still attached to {} principal(s)",
                    policy.attached_to.len()
                ),
            });
        }

        self.unregister_for_delete(&rid("policy", policy_name))?;
        self.store.delete(&key)?;
        Ok(())
    }

    pub fn attach_role_policy(&self, role_name: &str, policy_name: &str) -> Result<(), IamError> {
        let _role = self.get_role(role_name)?;
        self.attach_policy(policy_name, "role", role_name)
    }

    pub fn detach_role_policy(&self, role_name: &str, policy_name: &str) -> Result<(), IamError> {
        self.detach_policy(policy_name, "role", role_name)
    }

    pub fn attach_group_policy(&self, group_name: &str, policy_name: &str) -> Result<(), IamError> {
        let _group = self.get_group(group_name)?;
        self.attach_policy(policy_name, "group", group_name)
    }

    pub fn detach_group_policy(&self, group_name: &str, policy_name: &str) -> Result<(), IamError> {
        self.detach_policy(policy_name, "group", group_name)
    }

    pub fn attach_user_policy(&self, user_name: &str, policy_name: &str) -> Result<(), IamError> {
        let _user = self.get_user(user_name)?;
        self.attach_policy(policy_name, "user", user_name)
    }

    pub fn detach_user_policy(&self, user_name: &str, policy_name: &str) -> Result<(), IamError> {
        self.detach_policy(policy_name, "user", user_name)
    }

    fn attach_policy(
        &self,
        policy_name: &str,
        principal_type: &'static str,
        principal_name: &str,
    ) -> Result<(), IamError> {
        let policy_key = resource_key(SERVICE, "policy", policy_name);
        let _policy: ManagedPolicy = self.require(&policy_key, "policy", policy_name)?;

        let entry = format!("{principal_type}/{principal_name}");
        self.store.update(&policy_key, |policy: &mut ManagedPolicy| {
            if !policy.attached_to.contains(&entry) {
                policy.attached_to.push(entry.clone());
            }
        })?;

        let result = self.tracker.add_relationship(
            &rid("policy", policy_name),
            &rid(principal_type, principal_name),
            RelationshipKind::AssociatedWith,
        );
        self.bookkeeping(result, || {
            Ok(self.store.update(&policy_key, |policy: &mut ManagedPolicy| {
                policy.attached_to.retain(|a| a != &entry);
            })?)
        })
    }

    fn detach_policy(
        &self,
        policy_name: &str,
        principal_type: &'static str,
        principal_name: &str,
    ) -> Result<(), IamError> {
        let policy_key = resource_key(SERVICE, "policy", policy_name);
        let _policy: ManagedPolicy = self.require(&policy_key, "policy", policy_name)?;

        let entry = format!("{principal_type}/{principal_name}");
        self.store.update(&policy_key, |policy: &mut ManagedPolicy| {
            policy.attached_to.retain(|a| a != &entry);
        })?;
        self.tracker.remove_relationship(
            &rid("policy", policy_name),
            &rid(principal_type, principal_name),
            RelationshipKind::AssociatedWith,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Instance profiles
    // -----------------------------------------------------------------------

    pub fn create_instance_profile(&self, profile_name: &str) -> Result<InstanceProfile, IamError> {
        let key = resource_key(SERVICE, "instance-profile", profile_name);
        self.ensure_absent(&key, "instance profile", profile_name)?;

        let profile = InstanceProfile {
            profile_name: profile_name.to_string(),
            profile_id: ids::resource_id("AIPA"),
            arn: ids::arn("instance-profile", "/", profile_name),
            path: "/".to_string(),
            created: Utc::now(),
            roles: Vec::new(),
        };
        self.store.set(&key, &profile)?;

        let registered = self
            .tracker
            .register_resource(&rid("instance-profile", profile_name), BTreeMap::new());
        self.bookkeeping(registered, || Ok(self.store.delete(&key)?))?;

        Ok(profile)
    }

    pub fn get_instance_profile(&self, profile_name: &str) -> Result<InstanceProfile, IamError> {
        self.require(
            &resource_key(SERVICE, "instance-profile", profile_name),
            "instance profile",
            profile_name,
        )
    }

    pub fn delete_instance_profile(&self, profile_name: &str) -> Result<(), IamError> {
        let key = resource_key(SERVICE, "instance-profile", profile_name);
        let _profile: InstanceProfile = self.require(&key, "instance profile", profile_name)?;

        self.unregister_for_delete(&rid("instance-profile", profile_name))?;
        self.store.delete(&key)?;
        Ok(())
    }

    pub fn add_role_to_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<(), IamError> {
        let profile_key = resource_key(SERVICE, "instance-profile", profile_name);
        let _profile: InstanceProfile = self.require(&profile_key, "instance profile", profile_name)?;
        let _role = self.get_role(role_name)?;

        let mounted = role_name.to_string();
        self.store.update(&profile_key, |profile: &mut InstanceProfile| {
            if !profile.roles.contains(&mounted) {
                profile.roles.push(mounted.clone());
            }
        })?;

        let result = self.tracker.add_relationship(
            &rid("instance-profile", profile_name),
            &rid("role", role_name),
            RelationshipKind::Contains,
        );
        self.bookkeeping(result, || {
            Ok(self.store.update(&profile_key, |profile: &mut InstanceProfile| {
                profile.roles.retain(|r| r != role_name);
            })?)
        })
    }

    pub fn remove_role_from_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<(), IamError> {
        let profile_key = resource_key(SERVICE, "instance-profile", profile_name);
        let _profile: InstanceProfile = self.require(&profile_key, "instance profile", profile_name)?;

        self.store.update(&profile_key, |profile: &mut InstanceProfile| {
            profile.roles.retain(|r| r != role_name);
        })?;
        self.tracker.remove_relationship(
            &rid("instance-profile", profile_name),
            &rid("role", role_name),
            RelationshipKind::Contains,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------------

    fn ensure_absent(
        &self,
        key: &str,
        entity: &'static str,
        name: &str,
    ) -> Result<(), IamError> {
        if self.store.exists(key) {
            return Err(IamError::EntityAlreadyExists {
                entity,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn require<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        entity: &'static str,
        name: &str,
    ) -> Result<T, IamError> {
        match self.store.get(key) {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(IamError::NoSuchEntity {
                entity,
                name: name.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply the consistency policy to a bookkeeping result: strict mode
    /// reverts and propagates, permissive mode logs and proceeds.
    fn bookkeeping(
        &self,
        result: Result<(), GraphError>,
        rollback: impl FnOnce() -> Result<(), IamError>,
    ) -> Result<(), IamError> {
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

    /// Unregister a resource ahead of record deletion. A dependency
    /// violation always aborts; other tracker failures follow the
    /// consistency policy.
    fn unregister_for_delete(&self, id: &ResourceId) -> Result<(), IamError> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use vapor_core::config::TrackerConfig;
    use vapor_core::error::ErrorCode;
    use vapor_core::graph::manager::ResourceManager;
    use vapor_core::store::MemoryStore;

    fn service() -> IamService {
        IamService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ResourceManager::new(TrackerConfig::default())),
        )
    }

    // -----------------------------------------------------------------------
    // Users and access keys
    // -----------------------------------------------------------------------

    #[test]
    fn user_lifecycle() {
        let iam = service();
        let user = iam.create_user("alice").expect("create");
        assert_eq!(user.arn, "arn:aws:iam::123456789012:user/alice");
        assert!(user.user_id.starts_with("AIDA"));

        assert_eq!(iam.get_user("alice").expect("get"), user);
        assert!(matches!(
            iam.create_user("alice"),
            Err(IamError::EntityAlreadyExists { .. })
        ));

        iam.delete_user("alice").expect("delete");
        assert!(matches!(
            iam.get_user("alice"),
            Err(IamError::NoSuchEntity { .. })
        ));
        // The name is free again.
        iam.create_user("alice").expect("re-create");
    }

    #[test]
    fn live_access_key_blocks_user_deletion() {
        let iam = service();
        iam.create_user("alice").expect("create user");
        let access_key = iam.create_access_key("alice").expect("create key");

        let err = iam.delete_user("alice").unwrap_err();
        assert!(matches!(err, IamError::DeleteConflict { .. }));
        assert_eq!(err.api_code(), ErrorCode::DeleteConflict);

        iam.delete_access_key(&access_key.access_key_id)
            .expect("delete key");
        iam.delete_user("alice").expect("delete user");
    }

    #[test]
    fn access_key_requires_existing_user() {
        let iam = service();
        assert!(matches!(
            iam.create_access_key("ghost"),
            Err(IamError::NoSuchEntity { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    #[test]
    fn group_membership_blocks_group_deletion() {
        let iam = service();
        iam.create_user("alice").expect("user");
        iam.create_group("devs").expect("group");
        iam.add_user_to_group("devs", "alice").expect("join");

        assert_eq!(iam.get_group("devs").expect("get").members, vec!["alice"]);

        let err = iam.delete_group("devs").unwrap_err();
        assert!(matches!(
            err,
            IamError::Graph(GraphError::DependencyViolation { .. })
        ));

        iam.remove_user_from_group("devs", "alice").expect("leave");
        assert!(iam.get_group("devs").expect("get").members.is_empty());
        iam.delete_group("devs").expect("delete group");
    }

    #[test]
    fn adding_member_twice_is_idempotent() {
        let iam = service();
        iam.create_user("alice").expect("user");
        iam.create_group("devs").expect("group");
        iam.add_user_to_group("devs", "alice").expect("join");
        iam.add_user_to_group("devs", "alice").expect("join again");
        assert_eq!(iam.get_group("devs").expect("get").members, vec!["alice"]);
    }

    // -----------------------------------------------------------------------
    // Roles and policies
    // -----------------------------------------------------------------------

    #[test]
    fn attached_policy_blocks_role_deletion() {
        let iam = service();
        iam.create_role("admin", "{}").expect("role");
        iam.create_policy("read-only", "{}").expect("policy");
        iam.attach_role_policy("admin", "read-only").expect("attach");

        let err = iam.delete_role("admin").unwrap_err();
        let IamError::Graph(GraphError::DependencyViolation { blockers, .. }) = &err else {
            panic!("expected DependencyViolation, got {err:?}");
        };
        assert_eq!(blockers, &vec![ResourceId::new("iam", "policy", "read-only")]);

        iam.detach_role_policy("admin", "read-only").expect("detach");
        iam.delete_role("admin").expect("delete role");
        iam.delete_policy("read-only").expect("delete policy");
    }

    #[test]
    fn attached_policy_cannot_be_deleted() {
        let iam = service();
        iam.create_role("admin", "{}").expect("role");
        iam.create_policy("read-only", "{}").expect("policy");
        iam.attach_role_policy("admin", "read-only").expect("attach");

        // The graph does not block the attaching side; the handler does.
        let err = iam.delete_policy("read-only").unwrap_err();
        assert!(matches!(err, IamError::DeleteConflict { .. }));

        iam.detach_role_policy("admin", "read-only").expect("detach");
        iam.delete_policy("read-only").expect("delete policy");
    }

    #[test]
    fn policy_attachment_list_tracks_principals() {
        let iam = service();
        iam.create_role("admin", "{}").expect("role");
        iam.create_group("devs").expect("group");
        iam.create_policy("read-only", "{}").expect("policy");

        iam.attach_role_policy("admin", "read-only").expect("attach role");
        iam.attach_group_policy("devs", "read-only").expect("attach group");

        let policy = iam.get_policy("read-only").expect("get");
        assert_eq!(policy.attached_to, vec!["role/admin", "group/devs"]);

        iam.detach_group_policy("devs", "read-only").expect("detach");
        assert_eq!(
            iam.get_policy("read-only").expect("get").attached_to,
            vec!["role/admin"]
        );
    }

    #[test]
    fn attach_to_unknown_principal_is_no_such_entity() {
        let iam = service();
        iam.create_policy("read-only", "{}").expect("policy");
        assert!(matches!(
            iam.attach_role_policy("ghost", "read-only"),
            Err(IamError::NoSuchEntity { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Instance profiles
    // -----------------------------------------------------------------------

    #[test]
    fn mounted_role_blocks_profile_and_role_deletion() {
        let iam = service();
        iam.create_role("deployer", "{}").expect("role");
        iam.create_instance_profile("web").expect("profile");
        iam.add_role_to_instance_profile("web", "deployer")
            .expect("mount");

        // The profile is blocked through the graph (Contains, outgoing)...
        let err = iam.delete_instance_profile("web").unwrap_err();
        assert!(matches!(
            err,
            IamError::Graph(GraphError::DependencyViolation { .. })
        ));

        // ...and the role through the handler's own profile scan.
        let err = iam.delete_role("deployer").unwrap_err();
        assert!(matches!(err, IamError::DeleteConflict { .. }));

        iam.remove_role_from_instance_profile("web", "deployer")
            .expect("unmount");
        iam.delete_instance_profile("web").expect("delete profile");
        iam.delete_role("deployer").expect("delete role");
    }
}
