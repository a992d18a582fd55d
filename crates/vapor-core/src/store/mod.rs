//! Generic key-value state store for resource records.
//!
//! Every emulated service persists its resource records here as opaque JSON
//! values under path-style keys (`iam/user/alice`, `ec2/vpc/vpc-1234`).
//! The store knows nothing about resource semantics: the relationship graph
//! (not the store) answers dependency questions, and handlers are
//! responsible for keeping the two in sync.
//!
//! # Key conventions
//!
//! - Keys are `/`-separated paths: `<service>/<resource-type>/<id>`.
//! - [`StateStore::list`] returns keys in lexicographic order so listings
//!   are deterministic across runs.
//!
//! # Atomicity
//!
//! [`StateStore::update`] is an atomic read-modify-write: the mutator runs
//! under the store's write lock, so two concurrent updates to the same
//! record cannot interleave. Handlers use it for attachment lists and other
//! multi-writer fields.

mod memory;

pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by state-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists under the key.
    #[error("no record at key '{0}'")]
    NotFound(String),

    /// A record could not be encoded or decoded.
    #[error("record codec error at key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// The record store contract consumed by every service handler.
///
/// Implementations must be safe for concurrent use; all methods take `&self`.
pub trait StateStore: Send + Sync {
    /// Return `true` if a record exists under `key`.
    fn exists(&self, key: &str) -> bool;

    /// Fetch the raw record under `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no record exists under `key`.
    fn get_raw(&self, key: &str) -> Result<serde_json::Value, StoreError>;

    /// Store `value` under `key`, replacing any existing record.
    ///
    /// # Errors
    ///
    /// Backend-specific write failures.
    fn set_raw(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Delete the record under `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if there is nothing to delete.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List all keys starting with `prefix`, in lexicographic order.
    fn list(&self, prefix: &str) -> Vec<String>;

    /// Atomic read-modify-write of the raw record under `key`.
    ///
    /// The mutator runs while the store's write lock is held, so no other
    /// mutation can interleave with it.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no record exists under `key`.
    fn update_raw(
        &self,
        key: &str,
        mutator: &mut dyn FnMut(&mut serde_json::Value),
    ) -> Result<(), StoreError>;
}

/// Typed convenience layer over the raw [`StateStore`] methods.
///
/// Blanket-implemented for every store; handlers use these instead of
/// touching `serde_json::Value` directly.
pub trait TypedStore: StateStore {
    /// Fetch and decode the record under `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent, [`StoreError::Codec`] if the
    /// stored value does not decode as `T`.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let raw = self.get_raw(key)?;
        serde_json::from_value(raw).map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })
    }

    /// Encode and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Codec`] if `value` fails to encode.
    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_value(value).map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })?;
        self.set_raw(key, raw)
    }

    /// Atomic typed read-modify-write: decode, mutate, re-encode under the
    /// store's write lock.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent, [`StoreError::Codec`] if the
    /// record fails to decode or re-encode.
    fn update<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        mut mutator: impl FnMut(&mut T),
    ) -> Result<(), StoreError> {
        let mut codec_err: Option<serde_json::Error> = None;
        self.update_raw(key, &mut |raw| {
            match serde_json::from_value::<T>(raw.clone()) {
                Ok(mut record) => {
                    mutator(&mut record);
                    match serde_json::to_value(&record) {
                        Ok(encoded) => *raw = encoded,
                        Err(e) => codec_err = Some(e),
                    }
                }
                Err(e) => codec_err = Some(e),
            }
        })?;

        if let Some(source) = codec_err {
            return Err(StoreError::Codec {
                key: key.to_string(),
                source,
            });
        }
        Ok(())
    }
}

impl<S: StateStore + ?Sized> TypedStore for S {}

/// Build a store key from its path segments.
#[must_use]
pub fn resource_key(service: &str, resource_type: &str, id: &str) -> String {
    format!("{service}/{resource_type}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Record {
        name: String,
        attachments: Vec<String>,
    }

    #[test]
    fn typed_round_trip() {
        let store = MemoryStore::new();
        let rec = Record {
            name: "alice".to_string(),
            attachments: vec![],
        };

        store.set("iam/user/alice", &rec).expect("set");
        let back: Record = store.get("iam/user/alice").expect("get");
        assert_eq!(back, rec);
    }

    #[test]
    fn typed_update_mutates_in_place() {
        let store = MemoryStore::new();
        store
            .set(
                "iam/policy/p1",
                &Record {
                    name: "p1".to_string(),
                    attachments: vec![],
                },
            )
            .expect("set");

        store
            .update("iam/policy/p1", |r: &mut Record| {
                r.attachments.push("role/admin".to_string());
            })
            .expect("update");

        let back: Record = store.get("iam/policy/p1").expect("get");
        assert_eq!(back.attachments, vec!["role/admin".to_string()]);
    }

    #[test]
    fn get_wrong_shape_is_codec_error() {
        let store = MemoryStore::new();
        store
            .set_raw("iam/user/bob", serde_json::json!({"unexpected": true}))
            .expect("set");

        let err = store.get::<Record>("iam/user/bob").unwrap_err();
        assert!(matches!(err, StoreError::Codec { .. }));
    }

    #[test]
    fn resource_key_layout() {
        assert_eq!(resource_key("ec2", "vpc", "vpc-1"), "ec2/vpc/vpc-1");
    }
}
