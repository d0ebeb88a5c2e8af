// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use pass_deposit_assembler::AssemblyError;
use thiserror::Error;

/// Why a transport could not deposit a package.
///
/// Sessions never return these from `send`; they travel inside a
/// [`TransportResponse`](crate::TransportResponse).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("protocol error: {reason}")]
    Protocol { reason: String },

    #[error("{matches} drafts are titled '{title}', refusing to pick one")]
    AmbiguousDraft { title: String, matches: usize },

    #[error("failed to parse {document}: {source}")]
    Xml {
        document: String,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("{context}: {source}")]
    Ssh {
        context: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("failed to stream package: {0}")]
    Package(#[from] AssemblyError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        TransportError::Protocol {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Extension trait for adding context to IO errors
pub trait IoErrorContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| TransportError::Io {
            context: context.into(),
            source: e,
        })
    }
}

pub(crate) trait SshErrorContext<T> {
    fn ssh_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> SshErrorContext<T> for std::result::Result<T, ssh2::Error> {
    fn ssh_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| TransportError::Ssh {
            context: context.into(),
            source,
        })
    }
}
