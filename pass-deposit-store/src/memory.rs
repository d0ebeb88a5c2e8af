// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! A versioned entity store held in process memory.
//!
//! Used for dry runs and as the store double in tests. Records are kept in
//! their JSON form so filters evaluate exactly as they would against the
//! serialized representation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use pass_deposit_model::{Entity, EntityId, EntityKind, Version};
use serde_json::Value;
use tracing::trace;

use crate::client::{BinaryReader, Page, PassClient, Selector, WriteOutcome};
use crate::error::{Result, StoreError};

struct Record {
    version: Version,
    body: Value,
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<(EntityKind, EntityId), Record>,
    binaries: HashMap<String, Bytes>,
    next_id: u64,
    /// Number of upcoming updates that lose a race against a phantom writer.
    injected_conflicts: usize,
    updates: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryStore")
            .field("records", &inner.records.len())
            .field("binaries", &inner.binaries.len())
            .finish_non_exhaustive()
    }
}

fn to_json<T: Entity>(entity: &T) -> Result<Value> {
    serde_json::to_value(entity).map_err(|source| StoreError::Serialization {
        kind: T::KIND,
        source,
    })
}

fn from_json<T: Entity>(body: &Value, version: Version) -> Result<T> {
    let mut entity: T =
        serde_json::from_value(body.clone()).map_err(|source| StoreError::Serialization {
            kind: T::KIND,
            source,
        })?;
    entity.set_version(version);
    Ok(entity)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `count` updates fail with a conflict, as if another
    /// writer had modified the record between read and write.
    pub fn inject_conflicts(&self, count: usize) {
        self.lock().injected_conflicts = count;
    }

    /// Number of accepted updates since creation.
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    /// Stores a binary under a caller-chosen id.
    pub fn put_binary(&self, id: impl Into<String>, content: impl Into<Bytes>) {
        self.lock().binaries.insert(id.into(), content.into());
    }

    /// Every stored record of type `T`.
    pub fn all<T: Entity>(&self) -> Result<Vec<T>> {
        let inner = self.lock();
        inner
            .records
            .iter()
            .filter(|((kind, _), _)| *kind == T::KIND)
            .map(|(_, record)| from_json(&record.body, record.version))
            .collect()
    }
}

impl PassClient for MemoryStore {
    async fn create_object<T: Entity>(&self, mut entity: T) -> Result<T> {
        let mut inner = self.lock();
        if entity.id().is_unassigned() {
            inner.next_id += 1;
            let id = format!("{}-{}", T::KIND.to_string().to_lowercase(), inner.next_id);
            entity.set_id(EntityId::new(id));
        }
        entity.set_version(Version(1));
        let body = to_json(&entity)?;
        trace!(kind = %T::KIND, id = %entity.id(), "created record");
        inner.records.insert(
            (T::KIND, entity.id().clone()),
            Record {
                version: Version(1),
                body,
            },
        );
        Ok(entity)
    }

    async fn get_object<T: Entity>(&self, id: &EntityId) -> Result<T> {
        let inner = self.lock();
        let record = inner
            .records
            .get(&(T::KIND, id.clone()))
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.clone(),
            })?;
        from_json(&record.body, record.version)
    }

    async fn update_object<T: Entity>(&self, mut entity: T) -> Result<WriteOutcome<T>> {
        let mut inner = self.lock();
        let inject = inner.injected_conflicts > 0;
        if inject {
            inner.injected_conflicts -= 1;
        }
        let key = (T::KIND, entity.id().clone());
        let record = inner
            .records
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: entity.id().clone(),
            })?;

        if inject {
            record.version = record.version.next();
            return Ok(WriteOutcome::Conflict {
                current: record.version,
            });
        }
        if record.version != entity.version() {
            return Ok(WriteOutcome::Conflict {
                current: record.version,
            });
        }

        let version = record.version.next();
        entity.set_version(version);
        record.body = to_json(&entity)?;
        record.version = version;
        inner.updates += 1;
        Ok(WriteOutcome::Written(entity))
    }

    async fn delete_object<T: Entity>(&self, id: &EntityId) -> Result<()> {
        self.lock()
            .records
            .remove(&(T::KIND, id.clone()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.clone(),
            })
    }

    async fn select_objects<T: Entity>(&self, selector: &Selector) -> Result<Page<T>> {
        let inner = self.lock();
        let matching: Vec<&Record> = inner
            .records
            .iter()
            .filter(|((kind, _), _)| *kind == T::KIND)
            .map(|(_, record)| record)
            .filter(|record| selector.filter.as_ref().is_none_or(|f| f.matches(&record.body)))
            .collect();
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(selector.offset)
            .take(selector.limit.unwrap_or(usize::MAX))
            .map(|record| from_json(&record.body, record.version))
            .collect::<Result<Vec<T>>>()?;
        Ok(Page { items, total })
    }

    async fn upload_binary(&self, name: &str, content: Bytes) -> Result<String> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = format!("binary-{}-{name}", inner.next_id);
        inner.binaries.insert(id.clone(), content);
        Ok(id)
    }

    async fn download_binary(&self, id: &str) -> Result<BinaryReader> {
        let content = self
            .lock()
            .binaries
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::BinaryNotFound { id: id.to_owned() })?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }
}
