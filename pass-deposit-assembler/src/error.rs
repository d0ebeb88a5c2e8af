// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use pass_deposit_store::StoreError;
use thiserror::Error;

use crate::archive::{ArchiveFormat, CompressionFormat};
use crate::sanitize::SanitizeError;

/// A custodial file reference that cannot be turned into bytes.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("unable to resolve the location of a submitted file ('{location}') to a resource")]
    Unresolvable { location: String },

    #[error("invalid resource URL: {location}: {source}")]
    MalformedUrl {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid resource location '{location}': {reason}")]
    MalformedLocation { location: String, reason: String },

    #[error("classpath resource '{path}' not found in any resource root")]
    MissingClasspathResource { path: String },

    #[error("failed to open {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to download binary {id}: {source}")]
    Store {
        id: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("invalid package name: {0}")]
    Sanitize(#[from] SanitizeError),

    #[error("invalid custodial file name '{name}': {source}")]
    CustodialName {
        name: String,
        #[source]
        source: SanitizeError,
    },

    #[error("no supported archive format specified")]
    NoArchiveFormat,

    #[error("{compression} compression cannot be combined with {archive} archives")]
    UnsupportedCompression {
        archive: ArchiveFormat,
        compression: CompressionFormat,
    },

    #[error("package stream has already been opened")]
    AlreadyOpened,

    #[error("packaging failed for {location}: {source}")]
    Resource {
        location: String,
        #[source]
        source: ResolutionError,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("package streaming must be started from within a Tokio runtime")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Extension trait for adding context to IO errors
pub trait IoErrorContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AssemblyError::Io {
            context: context.into(),
            source: e,
        })
    }
}
