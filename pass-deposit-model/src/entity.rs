// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{CopyStatus, DepositStatus, EntityId, EntityKind, Version};

/// One attempt to place a submission's package into one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub version: Version,
    pub submission: EntityId,
    pub repository: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_copy: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_status: Option<DepositStatus>,
    /// Pointer into the repository's own tracking, e.g. a SWORD statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_status_ref: Option<String>,
}

crate::impl_entity!(Deposit, EntityKind::Deposit);

impl Deposit {
    pub fn new(submission: EntityId, repository: EntityId) -> Self {
        Deposit {
            submission,
            repository,
            ..Deposit::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        !DepositStatus::is_open(self.deposit_status)
    }
}

/// The artifact a deposit produced inside a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCopy {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<EntityId>,
    pub repository: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_status: Option<CopyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<Url>,
    #[serde(default)]
    pub external_ids: Vec<String>,
}

crate::impl_entity!(RepositoryCopy, EntityKind::RepositoryCopy);

/// A deposit target as registered in the entity store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub version: Version,
    pub name: String,
    /// Key of the packager configured for this repository.
    pub repository_key: String,
}

crate::impl_entity!(Repository, EntityKind::Repository);
