// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use pass_deposit_assembler::PackageStream;
use tokio::io::BufWriter;
use tracing::{debug, info};
use url::Url;

use crate::error::{IoErrorContext, Result, TransportError};
use crate::response::{OnSuccess, TransportResponse};

/// Writes packages into a local directory.
#[derive(Debug, Clone)]
pub struct FilesystemTransport {
    directory: PathBuf,
}

#[derive(Debug)]
pub struct FilesystemSession {
    directory: PathBuf,
}

impl FilesystemTransport {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn open(&self) -> FilesystemSession {
        FilesystemSession {
            directory: self.directory.clone(),
        }
    }

    /// The target directory exists.
    pub async fn check_connectivity(&self) -> bool {
        tokio::fs::metadata(&self.directory)
            .await
            .is_ok_and(|m| m.is_dir())
    }
}

impl FilesystemSession {
    pub async fn send(&self, package: &PackageStream) -> TransportResponse {
        match self.write(package).await {
            Ok(path) => match Url::from_file_path(&path) {
                Ok(access_url) => TransportResponse::succeeded(OnSuccess::Complete { access_url }),
                Err(()) => TransportResponse::failed(TransportError::protocol(format!(
                    "{} has no file URL",
                    path.display()
                ))),
            },
            Err(e) => TransportResponse::failed(e),
        }
    }

    async fn write(&self, package: &PackageStream) -> Result<PathBuf> {
        let directory = tokio::fs::canonicalize(&self.directory)
            .await
            .io_context(format!("resolving {}", self.directory.display()))?;
        let path = directory.join(package.metadata().file_name());
        debug!(path = %path.display(), "writing package");

        let stream = package.open()?;
        // Written under a hidden name and renamed once complete; dropping
        // the temporary path on any error removes the partial file.
        let (file, partial) = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&directory)
            .io_context(format!("creating a temporary file in {}", directory.display()))?
            .into_parts();
        let mut writer = BufWriter::new(tokio::fs::File::from_std(file));
        let written = stream
            .write_to(&mut writer)
            .await
            .io_context(format!("writing {}", path.display()))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .io_context(format!("syncing {}", path.display()))?;
        partial
            .persist(&path)
            .map_err(std::io::Error::from)
            .io_context(format!("moving package into {}", path.display()))?;

        info!(path = %path.display(), bytes = written, "package written");
        Ok(path)
    }
}
