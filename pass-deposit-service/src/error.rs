// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use pass_deposit_assembler::AssemblyError;
use pass_deposit_model::EntityId;
use pass_deposit_store::{CriticalError, StoreError};
use pass_deposit_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Why a deposit attempt, or one of the jobs around it, did not complete.
#[derive(Error, Debug)]
pub enum DepositError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No packager configured for repository key '{key}'")]
    UnknownRepository { key: String },

    #[error("Packaging failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Repository {repository} is not reachable")]
    Unreachable { repository: String },

    /// The transport rejected the deposit. `status_ref` is kept when the
    /// repository already tracks a partial item.
    #[error("Transport to {repository} failed: {source}")]
    Transport {
        repository: String,
        status_ref: Option<String>,
        #[source]
        source: TransportError,
    },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[source] TransportError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Critical update failed: {0}")]
    Critical(#[from] CriticalError),

    #[error("Deposit {deposit} has no repository copy")]
    MissingCopy { deposit: EntityId },
}

impl DepositError {
    /// The repository could not be reached, as opposed to refusing the
    /// content.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DepositError::Unreachable { .. })
    }

    /// Status reference to record alongside the failure, if any.
    pub fn status_ref(&self) -> Option<&str> {
        match self {
            DepositError::Transport { status_ref, .. } => status_ref.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DepositError>;

pub trait IoErrorContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| DepositError::Io {
            context: context.into(),
            source,
        })
    }
}
