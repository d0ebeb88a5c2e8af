// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! SFTP uploads.
//!
//! The package file is written into a remote directory over a password
//! authenticated SSH session. The repository ingests it from there on its
//! own schedule, so a finished upload leaves the copy in progress.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream as StdTcpStream;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use pass_deposit_assembler::PackageStream;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, info, warn};
use url::Url;

use crate::connectivity::ConnectivityService;
use crate::error::{IoErrorContext, Result, SshErrorContext, TransportError};
use crate::response::{OnSuccess, TransportResponse};

#[derive(Clone)]
struct Login {
    username: String,
    password: String,
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Where packages go and how to log in there.
#[derive(Debug, Clone)]
struct Target {
    host: String,
    port: u16,
    login: Login,
    directory: PathBuf,
    timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SftpTransport {
    target: Target,
    connectivity: ConnectivityService,
}

#[derive(Debug)]
pub struct SftpSession {
    target: Target,
}

/// An authenticated session with its SFTP channel.
struct Connection {
    session: ssh2::Session,
    sftp: ssh2::Sftp,
}

impl SftpTransport {
    pub fn new(
        host: String,
        port: u16,
        username: String,
        password: String,
        directory: PathBuf,
        timeout: Duration,
        connectivity: ConnectivityService,
    ) -> Self {
        Self {
            target: Target {
                host,
                port,
                login: Login { username, password },
                directory,
                timeout,
            },
            connectivity,
        }
    }

    pub fn open(&self) -> SftpSession {
        SftpSession {
            target: self.target.clone(),
        }
    }

    /// The SSH port accepts TCP connections.
    pub async fn check_connectivity(&self) -> bool {
        self.connectivity
            .verify_connect(&self.target.host, self.target.port)
            .await
    }
}

impl Target {
    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> Result<Connection> {
        let connecting = TcpStream::connect((self.host.as_str(), self.port));
        let tcp = match tokio::time::timeout(self.timeout, connecting).await {
            Ok(connected) => connected,
            Err(elapsed) => Err(elapsed.into()),
        }
        .and_then(TcpStream::into_std)
        .io_context(format!("connecting to {}", self.address()))?;
        tcp.set_nonblocking(false)
            .io_context(format!("configuring connection to {}", self.address()))?;

        let target = self.clone();
        tokio::task::spawn_blocking(move || target.handshake(tcp))
            .await
            .map_err(io::Error::from)
            .io_context("sftp handshake worker")?
    }

    fn handshake(&self, tcp: StdTcpStream) -> Result<Connection> {
        let mut session = ssh2::Session::new().ssh_context("creating ssh session")?;
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .ssh_context(format!("ssh handshake with {}", self.address()))?;
        session
            .userauth_password(&self.login.username, &self.login.password)
            .ssh_context(format!("authenticating as {}", self.login.username))?;
        let sftp = session.sftp().ssh_context("starting the sftp subsystem")?;
        debug!(address = %self.address(), username = %self.login.username, "sftp session ready");
        Ok(Connection { session, sftp })
    }

    /// `sftp://host:port/<remote>`, with each path component escaped.
    fn url(&self, remote: &Path) -> Result<Url> {
        let mut url = Url::parse(&format!("sftp://{}/", self.address()))
            .map_err(|e| TransportError::protocol(format!("{} is not a valid host: {e}", self.host)))?;
        url.path_segments_mut()
            .map_err(|()| TransportError::protocol(format!("sftp URL for {} cannot carry a path", self.host)))?
            .pop_if_empty()
            .extend(remote.components().filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            }));
        Ok(url)
    }
}

impl Connection {
    /// Copies `package` into `remote`, removing the remote file again when
    /// the copy does not complete.
    fn upload(self, remote: &Path, mut package: impl Read) -> Result<u64> {
        let mut file = self
            .sftp
            .create(remote)
            .ssh_context(format!("creating {}", remote.display()))?;
        let copied = io::copy(&mut package, &mut file)
            .and_then(|written| file.flush().map(|()| written))
            .io_context(format!("uploading {}", remote.display()));
        drop(file);

        if copied.is_err() {
            if let Err(e) = self.sftp.unlink(remote) {
                warn!(remote = %remote.display(), error = %e, "could not remove partial upload");
            }
        }
        if let Err(e) = self.session.disconnect(None, "deposit finished", None) {
            debug!(error = %e, "sftp disconnect failed");
        }
        copied
    }
}

impl SftpSession {
    pub async fn send(&self, package: &PackageStream) -> TransportResponse {
        match self.upload(package).await {
            Ok(item_url) => TransportResponse::succeeded(OnSuccess::InProgress {
                item_url: Some(item_url),
            }),
            Err(e) => TransportResponse::failed(e),
        }
    }

    async fn upload(&self, package: &PackageStream) -> Result<Url> {
        let remote = self.target.directory.join(package.metadata().file_name());
        let item_url = self.target.url(&remote)?;
        let connection = self.target.connect().await?;

        let reader = SyncIoBridge::new_with_handle(package.open()?.into_async_read(), Handle::current());
        let written = tokio::task::spawn_blocking(move || connection.upload(&remote, reader))
            .await
            .map_err(io::Error::from)
            .io_context("sftp upload worker")??;

        info!(url = %item_url, bytes = written, "package uploaded");
        Ok(item_url)
    }
}
