// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::future::Future;

use bytes::Bytes;
use pass_deposit_model::{Entity, EntityId, Version};
use tokio::io::AsyncRead;

use crate::Result;
use crate::filter::Filter;

/// Bytes of a binary held by the entity store.
pub type BinaryReader = Box<dyn AsyncRead + Send + Unpin>;

/// Result of writing a mutated record back to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    /// The write was accepted; the record carries its new version.
    Written(T),
    /// Another writer got there first. `current` is the version now stored.
    Conflict { current: Version },
}

/// Paging and filtering for [`PassClient::select_objects`].
#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub filter: Option<Filter>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Selector {
    pub fn new(filter: Filter) -> Self {
        Selector {
            filter: Some(filter),
            ..Selector::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matching records across all pages.
    pub total: usize,
}

/// The entity store capability consumed by the deposit services.
///
/// `update_object` compares the record's [`Version`] with the stored one;
/// a mismatch is reported as [`WriteOutcome::Conflict`], never as an error,
/// so callers can retry without inspecting error variants.
pub trait PassClient: Send + Sync + 'static {
    fn create_object<T: Entity>(&self, entity: T) -> impl Future<Output = Result<T>> + Send;

    fn get_object<T: Entity>(&self, id: &EntityId) -> impl Future<Output = Result<T>> + Send;

    fn update_object<T: Entity>(
        &self,
        entity: T,
    ) -> impl Future<Output = Result<WriteOutcome<T>>> + Send;

    fn delete_object<T: Entity>(&self, id: &EntityId) -> impl Future<Output = Result<()>> + Send;

    fn select_objects<T: Entity>(
        &self,
        selector: &Selector,
    ) -> impl Future<Output = Result<Page<T>>> + Send;

    /// Stores `content` and returns the id it can be downloaded by.
    fn upload_binary(
        &self,
        name: &str,
        content: Bytes,
    ) -> impl Future<Output = Result<String>> + Send;

    fn download_binary(&self, id: &str) -> impl Future<Output = Result<BinaryReader>> + Send;
}
