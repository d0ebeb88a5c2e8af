// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{EntityId, EntityKind, Version};

/// The logical unit being deposited: metadata plus custodial files.
///
/// Read-only to the deposit services for the duration of an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub version: Version,
    /// Human readable name, used to derive the package file name.
    pub name: String,
    #[serde(default)]
    pub metadata: DepositMetadata,
    /// Free-form metadata blob passed through to packaging strategies.
    #[serde(default)]
    pub submission_meta: serde_json::Value,
    /// Custodial files, in manifest order.
    #[serde(default)]
    pub files: Vec<DepositFile>,
}

crate::impl_entity!(Submission, EntityKind::Submission);

impl Submission {
    /// Title from the metadata blob, falling back to the manuscript title.
    pub fn title(&self) -> Option<&str> {
        self.submission_meta
            .get("title")
            .and_then(serde_json::Value::as_str)
            .or_else(|| self.metadata.manuscript.as_ref().map(|m| m.title.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<JournalMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticleMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manuscript: Option<ManuscriptMetadata>,
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub grants: Vec<GrantMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalMetadata {
    pub journal_title: String,
    #[serde(default)]
    pub issns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_name: Option<String>,
    /// ISO-8601 calendar date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embargo_lift_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManuscriptMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msabstract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manuscript_url: Option<String>,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonType {
    #[display("submitter")]
    Submitter,
    #[display("author")]
    Author,
    #[display("pi")]
    Pi,
    #[display("copi")]
    CoPi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: PersonType,
}

impl Person {
    /// First and middle names joined by a space.
    pub fn given_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {middle}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    /// "Last, First Middle".
    pub fn reversed_name(&self) -> String {
        format!("{}, {}", self.last_name, self.given_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantMetadata {
    pub award_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_local_key: Option<String>,
}

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositFileType {
    #[default]
    #[display("manuscript")]
    Manuscript,
    #[display("supplement")]
    Supplement,
    #[display("figure")]
    Figure,
    #[display("table")]
    Table,
    #[display("bibliography")]
    Bibliography,
}

/// One custodial file reference.
///
/// `location` is URI-like; its prefix selects how bytes are fetched. When
/// no prefix matches, `store_file_id` names a binary in the entity store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file_id: Option<String>,
    #[serde(default, rename = "type")]
    pub file_type: DepositFileType,
}

impl DepositFile {
    /// Whether this reference names any byte source at all.
    pub fn has_source(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty()) || self.store_file_id.is_some()
    }
}
