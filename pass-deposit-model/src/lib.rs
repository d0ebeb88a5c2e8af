// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Types shared by every deposit crate.
//!
//! Records kept in the entity store implement [`Entity`]: they carry a
//! store-assigned [`EntityId`] and a [`Version`] that the store bumps on
//! every successful write. The version is what optimistic concurrency
//! compares when a mutated record is written back.

use std::fmt;

use derive_more::Display;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod entity;
mod status;
mod submission;

pub use entity::{Deposit, Repository, RepositoryCopy};
pub use status::{CopyStatus, DepositStatus, UnknownStatus};
pub use submission::{
    ArticleMetadata, DepositFile, DepositFileType, DepositMetadata, GrantMetadata,
    JournalMetadata, ManuscriptMetadata, Person, PersonType, Submission,
};

/// Opaque identifier of a record in the entity store.
#[derive(Debug, Display, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An id that has not been assigned by the store yet.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::new(value)
    }
}

/// Store-assigned revision of a record. Zero means never written.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

/// The record types the deposit services read or mutate.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    #[display("Deposit")]
    Deposit,
    #[display("RepositoryCopy")]
    RepositoryCopy,
    #[display("Repository")]
    Repository,
    #[display("Submission")]
    Submission,
}

/// A versioned record held by the entity store.
pub trait Entity: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    fn set_id(&mut self, id: EntityId);

    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl $crate::Entity for $ty {
            const KIND: $crate::EntityKind = $kind;

            fn id(&self) -> &$crate::EntityId {
                &self.id
            }

            fn set_id(&mut self, id: $crate::EntityId) {
                self.id = id;
            }

            fn version(&self) -> $crate::Version {
                self.version
            }

            fn set_version(&mut self, version: $crate::Version) {
                self.version = version;
            }
        }
    };
}

pub(crate) use impl_entity;
