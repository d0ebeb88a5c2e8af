// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;

use pass_deposit_model::Submission;
use pass_deposit_store::PassClient;
use pass_deposit_utils_hash::{Algorithm, Digests, HashingReader};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::archive::{ArchiveFormat, ArchiveOptions, CompressionFormat};
use crate::error::{AssemblyError, IoErrorContext, Result};
use crate::package::{PackageMetadata, PackageStream, Resource};
use crate::resolver::{Resolver, resolve};
use crate::sanitize::{check_custodial_name, sanitize_filename};
use crate::strategy::PackagingStrategy;

fn default_algorithms() -> Vec<Algorithm> {
    vec![Algorithm::SHA256]
}

/// Per-repository packaging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblerOptions {
    #[serde(default)]
    pub strategy: PackagingStrategy,
    #[serde(default)]
    pub archive: ArchiveFormat,
    #[serde(default)]
    pub compression: CompressionFormat,
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            strategy: PackagingStrategy::default(),
            archive: ArchiveFormat::default(),
            compression: CompressionFormat::default(),
            algorithms: default_algorithms(),
            options: BTreeMap::new(),
        }
    }
}

impl AssemblerOptions {
    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            archive: self.archive,
            compression: self.compression,
        }
    }
}

/// Turns a submission's manifest into a [`PackageStream`].
#[derive(Debug)]
pub struct Assembler<S> {
    resolver: Arc<Resolver<S>>,
}

impl<S> Clone for Assembler<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: PassClient> Assembler<S> {
    pub fn new(resolver: Arc<Resolver<S>>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<Resolver<S>> {
        &self.resolver
    }

    /// Resolves every file of `submission` in manifest order and digests it.
    ///
    /// Each resource is read once here to learn its size and checksums, and
    /// once more when the package is streamed.
    #[instrument(skip_all, fields(submission = %submission.id, files = submission.files.len()))]
    pub async fn assemble(
        &self,
        submission: &Submission,
        options: &AssemblerOptions,
    ) -> Result<PackageStream> {
        let name = sanitize_filename(&submission.name)?;
        let metadata = PackageMetadata {
            name,
            archive: options.archive_options(),
            algorithms: options.algorithms.clone(),
            strategy: options.strategy,
            submission_id: submission.id.clone(),
            submission_meta: submission.submission_meta.clone(),
            options: options.options.clone(),
        };

        let mut resources = Vec::with_capacity(submission.files.len());
        for file in &submission.files {
            let name = check_custodial_name(&file.name).map_err(|source| AssemblyError::CustodialName {
                name: file.name.clone(),
                source,
            })?;
            let location = file
                .location
                .clone()
                .or_else(|| file.store_file_id.clone())
                .unwrap_or_else(|| file.name.clone());
            let to_packaging_error = |source| AssemblyError::Resource {
                location: location.clone(),
                source,
            };

            let handle = resolve(file).map_err(to_packaging_error)?;
            let reader = self.resolver.open(&handle).await.map_err(to_packaging_error)?;

            let (mut hashing, digests) = HashingReader::new(reader, &options.algorithms);
            tokio::io::copy(&mut hashing, &mut tokio::io::sink())
                .await
                .io_context(format!("reading {handle}"))?;
            drop(hashing);
            let digests = Digests::take(&digests);
            let size = digests.len;
            let checksums = digests.finish();
            debug!(file = %file.name, %handle, size, "resolved custodial file");

            let mut resource = Resource::new(
                name.to_owned(),
                handle.to_string(),
                size,
                checksums,
                self.resolver.supplier(handle),
            );
            resource.label = file.label.clone();
            resource.file_type = file.file_type;
            resources.push(resource);
        }

        Ok(PackageStream::new(metadata, resources, submission.clone()))
    }
}
