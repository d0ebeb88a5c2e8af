// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Repository transports.
//!
//! A [`Transport`] is built once per configured repository and owns its HTTP
//! client. [`Transport::open`] yields a [`TransportSession`] whose
//! [`send`](TransportSession::send) never fails outright: every error is
//! captured in the returned [`TransportResponse`] so callers can classify
//! it uniformly.

use std::collections::BTreeMap;
use std::time::Duration;

use pass_deposit_assembler::PackageStream;
use tracing::debug;

pub mod config;
mod connectivity;
mod error;
pub mod mapping;
mod response;
pub mod transports;

pub use config::{HttpSettings, Protocol, TransportConfig};
pub use connectivity::ConnectivityService;
pub use error::{IoErrorContext, Result, TransportError};
pub use response::{DepositContext, OnSuccess, TransportResponse};
use transports::devnull::{DevNullSession, DevNullTransport};
use transports::dspace::{DSpaceSession, DSpaceTransport};
use transports::filesystem::{FilesystemSession, FilesystemTransport};
use transports::invenio::{InvenioRdmSession, InvenioRdmTransport, PublishRetry};
use transports::sftp::{SftpSession, SftpTransport};
use transports::sword::{SwordSession, SwordTransport};

/// Metadata key under which the deposit's current status reference is
/// handed to [`TransportSession::send`].
pub const STATUS_REF_HINT: &str = "deposit.status-ref";

/// The configured transport of one repository.
#[derive(Debug, Clone)]
pub enum Transport {
    DevNull(DevNullTransport),
    Filesystem(FilesystemTransport),
    Sword(SwordTransport),
    DSpace(DSpaceTransport),
    InvenioRdm(InvenioRdmTransport),
    Sftp(SftpTransport),
}

/// An open session with a repository.
#[derive(Debug)]
pub enum TransportSession {
    DevNull(DevNullSession),
    Filesystem(FilesystemSession),
    Sword(SwordSession),
    DSpace(DSpaceSession),
    InvenioRdm(InvenioRdmSession),
    Sftp(SftpSession),
}

impl Transport {
    pub fn from_config(
        config: &TransportConfig,
        http: &HttpSettings,
        connectivity: &ConnectivityService,
    ) -> Result<Self> {
        let transport = match config {
            TransportConfig::DevNull => Transport::DevNull(DevNullTransport),
            TransportConfig::Filesystem { directory } => {
                Transport::Filesystem(FilesystemTransport::new(directory.clone()))
            }
            TransportConfig::Sword {
                collection_url,
                username,
                password,
                on_behalf_of,
                packaging,
            } => Transport::Sword(SwordTransport::new(
                collection_url.clone(),
                username.clone(),
                password.clone(),
                on_behalf_of.clone(),
                packaging.clone(),
                http,
                connectivity.clone(),
            )?),
            TransportConfig::DSpace {
                api_url,
                website_url,
                username,
                password,
                collection_handle,
            } => Transport::DSpace(DSpaceTransport::new(
                api_url.clone(),
                website_url.clone(),
                username.clone(),
                password.clone(),
                collection_handle.clone(),
                http,
                connectivity.clone(),
            )?),
            TransportConfig::InvenioRdm {
                api_url,
                api_token,
                verify_tls,
                publish_attempts,
                publish_delay_ms,
            } => Transport::InvenioRdm(InvenioRdmTransport::new(
                api_url.clone(),
                api_token,
                *verify_tls,
                PublishRetry {
                    attempts: *publish_attempts,
                    delay: Duration::from_millis(*publish_delay_ms),
                },
                http,
                connectivity.clone(),
            )?),
            TransportConfig::Sftp {
                host,
                port,
                username,
                password,
                directory,
            } => Transport::Sftp(SftpTransport::new(
                host.clone(),
                *port,
                username.clone(),
                password.clone(),
                directory.clone(),
                http.connect_timeout(),
                connectivity.clone(),
            )),
        };
        Ok(transport)
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Transport::DevNull(_) => Protocol::DevNull,
            Transport::Filesystem(_) => Protocol::Filesystem,
            Transport::Sword(_) => Protocol::Sword,
            Transport::DSpace(_) => Protocol::DSpace,
            Transport::InvenioRdm(_) => Protocol::InvenioRdm,
            Transport::Sftp(_) => Protocol::Sftp,
        }
    }

    /// Establishes whatever session state the backend needs.
    pub async fn open(&self, hints: &BTreeMap<String, String>) -> Result<TransportSession> {
        debug!(protocol = %self.protocol(), hints = hints.len(), "opening transport session");
        Ok(match self {
            Transport::DevNull(t) => TransportSession::DevNull(t.open()),
            Transport::Filesystem(t) => TransportSession::Filesystem(t.open()),
            Transport::Sword(t) => TransportSession::Sword(t.open()),
            Transport::DSpace(t) => TransportSession::DSpace(t.open().await?),
            Transport::InvenioRdm(t) => TransportSession::InvenioRdm(t.open()),
            Transport::Sftp(t) => TransportSession::Sftp(t.open()),
        })
    }

    /// Whether the repository is reachable right now.
    pub async fn check_connectivity(&self, hints: &BTreeMap<String, String>) -> bool {
        let reachable = match self {
            Transport::DevNull(_) => true,
            Transport::Filesystem(t) => t.check_connectivity().await,
            Transport::Sword(t) => t.check_connectivity().await,
            Transport::DSpace(t) => t.check_connectivity().await,
            Transport::InvenioRdm(t) => t.check_connectivity().await,
            Transport::Sftp(t) => t.check_connectivity().await,
        };
        debug!(protocol = %self.protocol(), hints = hints.len(), reachable, "checked connectivity");
        reachable
    }

    /// Reads the repository's own status document for a deposit and returns
    /// its state term. Only statement-based repositories publish one.
    pub async fn statement_state(&self, status_ref: &str) -> Result<String> {
        match self {
            Transport::Sword(t) => t.statement_state(status_ref).await,
            other => Err(TransportError::Protocol {
                reason: format!("{} repositories publish no status statements", other.protocol()),
            }),
        }
    }
}

impl TransportSession {
    /// Deposits `package`. `metadata` carries the repository options plus
    /// [`STATUS_REF_HINT`] when the deposit already has a status reference.
    pub async fn send(
        &self,
        package: &PackageStream,
        metadata: &BTreeMap<String, String>,
    ) -> TransportResponse {
        match self {
            TransportSession::DevNull(s) => s.send(package),
            TransportSession::Filesystem(s) => s.send(package).await,
            TransportSession::Sword(s) => s.send(package).await,
            TransportSession::DSpace(s) => s.send(package, metadata).await,
            TransportSession::InvenioRdm(s) => s.send(package).await,
            TransportSession::Sftp(s) => s.send(package).await,
        }
    }
}
