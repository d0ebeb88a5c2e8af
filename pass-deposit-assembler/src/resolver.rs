// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Maps custodial file references to byte sources.
//!
//! [`resolve`] only classifies a [`DepositFile`]; nothing is read until
//! [`Resolver::open`] (or a [`ResourceSupplier`] built from the handle) is
//! invoked.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use derive_more::Display;
use futures::TryStreamExt;
use futures::future::BoxFuture;
use pass_deposit_model::DepositFile;
use pass_deposit_store::{BinaryReader, PassClient};
use percent_encoding::percent_decode_str;
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

use crate::error::ResolutionError;

const URL_SCHEMES: [&str; 4] = ["file", "http", "https", "jar"];
const CLASSPATH_PREFIX: &str = "classpath:";
const WILDCARD_CLASSPATH_PREFIX: &str = "classpath*:";
const ENCODED_CLASSPATH_PREFIX: &str = "encodedclasspath:";

/// A lazily opened byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceHandle {
    /// A `file:`, `http:`, `https:` or `jar:` URL.
    Url(Url),
    /// A path looked up in the configured resource roots.
    Classpath { path: String, wildcard: bool },
    /// A binary held by the entity store.
    Store { id: String },
    Filesystem(PathBuf),
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    #[display("url")]
    Url,
    #[display("classpath")]
    Classpath,
    #[display("store")]
    Store,
    #[display("filesystem")]
    Filesystem,
}

impl ResourceHandle {
    pub fn kind(&self) -> HandleKind {
        match self {
            ResourceHandle::Url(_) => HandleKind::Url,
            ResourceHandle::Classpath { .. } => HandleKind::Classpath,
            ResourceHandle::Store { .. } => HandleKind::Store,
            ResourceHandle::Filesystem(_) => HandleKind::Filesystem,
        }
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceHandle::Url(url) => write!(f, "{url}"),
            ResourceHandle::Classpath { path, wildcard } => {
                let prefix = if *wildcard {
                    WILDCARD_CLASSPATH_PREFIX
                } else {
                    CLASSPATH_PREFIX
                };
                write!(f, "{prefix}{path}")
            }
            ResourceHandle::Store { id } => write!(f, "store binary {id}"),
            ResourceHandle::Filesystem(path) => write!(f, "{}", path.display()),
        }
    }
}

fn url_scheme(location: &str) -> Option<&str> {
    let (scheme, _) = location.split_once(':')?;
    URL_SCHEMES
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(scheme))
}

/// Classifies `file` into the handle that will produce its bytes.
///
/// Dispatch order: URL schemes, classpath prefixes, the encoded classpath
/// marker, the store file id, and finally a bare path when the location
/// contains a separator.
pub fn resolve(file: &DepositFile) -> Result<ResourceHandle, ResolutionError> {
    let location = file.location.as_deref().filter(|l| !l.is_empty());

    if let Some(location) = location {
        if url_scheme(location).is_some() {
            return Url::parse(location).map(ResourceHandle::Url).map_err(|source| {
                ResolutionError::MalformedUrl {
                    location: location.to_owned(),
                    source,
                }
            });
        }
        if let Some(path) = location.strip_prefix(WILDCARD_CLASSPATH_PREFIX) {
            return Ok(ResourceHandle::Classpath {
                path: path.to_owned(),
                wildcard: true,
            });
        }
        if let Some(path) = location.strip_prefix(CLASSPATH_PREFIX) {
            return Ok(ResourceHandle::Classpath {
                path: path.to_owned(),
                wildcard: false,
            });
        }
        if let Some(encoded) = location.strip_prefix(ENCODED_CLASSPATH_PREFIX) {
            let path = percent_decode_str(encoded)
                .decode_utf8()
                .map_err(|e| ResolutionError::MalformedLocation {
                    location: location.to_owned(),
                    reason: e.to_string(),
                })?;
            return Ok(ResourceHandle::Classpath {
                path: path.into_owned(),
                wildcard: false,
            });
        }
    }

    if let Some(id) = &file.store_file_id {
        return Ok(ResourceHandle::Store { id: id.clone() });
    }

    match location {
        Some(location) if location.contains(['/', '\\']) => {
            Ok(ResourceHandle::Filesystem(PathBuf::from(location)))
        }
        _ => Err(ResolutionError::Unresolvable {
            location: location.unwrap_or(&file.name).to_owned(),
        }),
    }
}

/// Produces a fresh reader over a resource's bytes on every call.
pub type ResourceSupplier = Arc<dyn Fn() -> BoxFuture<'static, io::Result<BinaryReader>> + Send + Sync>;

/// Opens resource handles.
pub struct Resolver<S> {
    client: Arc<S>,
    http: reqwest::Client,
    classpath_roots: Vec<PathBuf>,
}

impl<S> std::fmt::Debug for Resolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("classpath_roots", &self.classpath_roots)
            .finish_non_exhaustive()
    }
}

impl<S: PassClient> Resolver<S> {
    pub fn new(client: Arc<S>, http: reqwest::Client, classpath_roots: Vec<PathBuf>) -> Self {
        Self {
            client,
            http,
            classpath_roots,
        }
    }

    /// A supplier that opens `handle` each time it is called.
    pub fn supplier(self: &Arc<Self>, handle: ResourceHandle) -> ResourceSupplier {
        let resolver = Arc::clone(self);
        let handle = Arc::new(handle);
        Arc::new(move || {
            let resolver = Arc::clone(&resolver);
            let handle = Arc::clone(&handle);
            Box::pin(async move { resolver.open(&handle).await.map_err(io::Error::other) })
        })
    }

    pub async fn open(&self, handle: &ResourceHandle) -> Result<BinaryReader, ResolutionError> {
        debug!(%handle, kind = %handle.kind(), "opening resource");
        match handle {
            ResourceHandle::Url(url) => self.open_url(url).await,
            ResourceHandle::Classpath { path, .. } => {
                let file = self.find_on_classpath(path)?;
                open_file(&file).await
            }
            ResourceHandle::Store { id } => {
                self.client
                    .download_binary(id)
                    .await
                    .map_err(|source| ResolutionError::Store {
                        id: id.clone(),
                        source,
                    })
            }
            ResourceHandle::Filesystem(path) => open_file(path).await,
        }
    }

    async fn open_url(&self, url: &Url) -> Result<BinaryReader, ResolutionError> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| ResolutionError::MalformedLocation {
                        location: url.to_string(),
                        reason: "not a local file path".to_owned(),
                    })?;
                open_file(&path).await
            }
            "jar" => open_jar_entry(url).await,
            _ => {
                let response = self
                    .http
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|source| ResolutionError::Http {
                        url: url.to_string(),
                        source,
                    })?;
                let body = response.bytes_stream().map_err(io::Error::other);
                Ok(Box::new(StreamReader::new(Box::pin(body))))
            }
        }
    }

    /// Classpath locations are relative to the resource roots, searched in
    /// order; the first root holding the path wins, for wildcard lookups too.
    fn find_on_classpath(&self, path: &str) -> Result<PathBuf, ResolutionError> {
        let relative = path.trim_start_matches('/');
        self.classpath_roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ResolutionError::MissingClasspathResource {
                path: path.to_owned(),
            })
    }
}

async fn open_file(path: &Path) -> Result<BinaryReader, ResolutionError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ResolutionError::Open {
            location: path.display().to_string(),
            source,
        })?;
    Ok(Box::new(file))
}

/// `jar:file:/path/archive.jar!/entry` names one entry of a local zip archive.
async fn open_jar_entry(url: &Url) -> Result<BinaryReader, ResolutionError> {
    let malformed = |reason: &str| ResolutionError::MalformedLocation {
        location: url.to_string(),
        reason: reason.to_owned(),
    };
    let (archive, entry) = url
        .path()
        .split_once("!/")
        .ok_or_else(|| malformed("missing '!/' entry separator"))?;
    let archive = Url::parse(archive).map_err(|source| ResolutionError::MalformedUrl {
        location: url.to_string(),
        source,
    })?;
    let archive = archive
        .to_file_path()
        .map_err(|()| malformed("only local archives are supported"))?;
    let entry = entry.to_owned();
    let location = url.to_string();

    let read = tokio::task::spawn_blocking(move || -> io::Result<Bytes> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file)?;
        let mut entry = zip.by_name(&entry)?;
        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut content)?;
        Ok(content.into())
    });
    let content = read
        .await
        .map_err(io::Error::other)
        .and_then(|r| r)
        .map_err(|source| ResolutionError::Open { location, source })?;
    Ok(Box::new(io::Cursor::new(content)))
}
