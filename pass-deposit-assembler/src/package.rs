// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pass_deposit_model::{DepositFileType, EntityId, Submission};
use pass_deposit_store::BinaryReader;
use pass_deposit_utils_hash::{Algorithm, Hash};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, warn};

use crate::archive::{ArchiveOptions, ArchiveWriter};
use crate::error::{AssemblyError, Result};
use crate::resolver::ResourceSupplier;
use crate::stream::{ChunkWriter, IN_FLIGHT_CHUNKS, PackageByteStream};
use crate::strategy::PackagingStrategy;

/// Describes the package as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    /// Sanitized submission name.
    pub name: String,
    pub archive: ArchiveOptions,
    pub algorithms: Vec<Algorithm>,
    pub strategy: PackagingStrategy,
    pub submission_id: EntityId,
    pub submission_meta: serde_json::Value,
    /// Backend specific options passed through from configuration.
    pub options: BTreeMap<String, String>,
}

impl PackageMetadata {
    /// Name of the package file, including the archive extension.
    pub fn file_name(&self) -> String {
        match self.archive.extension() {
            Some(ext) => format!("{}.{ext}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.archive.mime_type()
    }
}

/// One custodial file of a package.
#[derive(Clone)]
pub struct Resource {
    /// Sanitized file name.
    pub name: String,
    pub label: Option<String>,
    pub file_type: DepositFileType,
    pub size: u64,
    /// One digest per configured algorithm, in configuration order.
    pub checksums: Vec<Hash>,
    /// Where the bytes come from, for diagnostics.
    pub location: String,
    supplier: ResourceSupplier,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("file_type", &self.file_type)
            .field("size", &self.size)
            .field("checksums", &self.checksums)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Resource {
    pub fn new(
        name: String,
        location: String,
        size: u64,
        checksums: Vec<Hash>,
        supplier: ResourceSupplier,
    ) -> Self {
        Self {
            name,
            label: None,
            file_type: DepositFileType::default(),
            size,
            checksums,
            location,
            supplier,
        }
    }

    pub fn checksum(&self, algorithm: Algorithm) -> Option<&Hash> {
        self.checksums.iter().find(|h| h.algorithm() == algorithm)
    }

    /// Opens a fresh reader over the resource bytes.
    pub async fn open(&self) -> io::Result<BinaryReader> {
        (self.supplier)().await
    }
}

/// An assembled package, ready to be streamed once.
#[derive(Debug)]
pub struct PackageStream {
    metadata: PackageMetadata,
    resources: Arc<[Resource]>,
    submission: Arc<Submission>,
    opened: AtomicBool,
}

impl PackageStream {
    pub fn new(metadata: PackageMetadata, resources: Vec<Resource>, submission: Submission) -> Self {
        Self {
            metadata,
            resources: resources.into(),
            submission: Arc::new(submission),
            opened: AtomicBool::new(false),
        }
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Custodial resources in manifest order. Files added by the packaging
    /// strategy are not listed.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn is_opened(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Starts encoding the package and returns its bytes as a stream.
    ///
    /// Fails with [`AssemblyError::AlreadyOpened`] on the second call and
    /// with the archive configuration error before any byte is produced.
    /// Must be called from within a Tokio runtime; the archive is written
    /// on a blocking worker.
    pub fn open(&self) -> Result<PackageByteStream> {
        if self.opened.swap(true, Ordering::AcqRel) {
            return Err(AssemblyError::AlreadyOpened);
        }
        let handle = Handle::try_current().map_err(|_| AssemblyError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(IN_FLIGHT_CHUNKS);
        let errors = tx.clone();
        let writer = ChunkWriter::new(tx);
        let sink = SyncIoBridge::new_with_handle(writer, handle.clone());
        let archive = ArchiveWriter::wrap(&self.metadata.archive, sink)?;

        let job = PackageJob {
            metadata: self.metadata.clone(),
            resources: Arc::clone(&self.resources),
            submission: Arc::clone(&self.submission),
        };
        debug!(package = %self.metadata.file_name(), resources = self.resources.len(), "opening package stream");

        handle.clone().spawn_blocking(move || {
            if let Err(e) = job.run(archive, &handle) {
                warn!(package = %job.metadata.file_name(), error = %e, "package streaming failed");
                let _ = errors.blocking_send(Err(e));
            }
        });

        Ok(PackageByteStream::new(rx))
    }
}

/// Everything the blocking encoder needs, detached from the borrowed stream.
pub(crate) struct PackageJob {
    pub(crate) metadata: PackageMetadata,
    pub(crate) resources: Arc<[Resource]>,
    pub(crate) submission: Arc<Submission>,
}

impl PackageJob {
    fn run(&self, mut archive: ArchiveWriter<SyncIoBridge<ChunkWriter>>, handle: &Handle) -> io::Result<()> {
        self.metadata.strategy.write_entries(&mut archive, self, handle)?;
        let mut sink = archive.finish()?;
        sink.shutdown()
    }

    /// Copies one custodial resource into `archive` under `path`.
    pub(crate) fn put_resource<W: io::Write>(
        archive: &mut ArchiveWriter<W>,
        path: &str,
        resource: &Resource,
        handle: &Handle,
    ) -> io::Result<()> {
        let reader = handle.block_on(resource.open())?;
        let mut reader = SyncIoBridge::new_with_handle(reader, handle.clone());
        archive.put_entry(path, resource.size, &mut reader)
    }
}
