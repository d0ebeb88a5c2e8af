// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

pub mod devnull;
pub mod dspace;
pub mod filesystem;
pub mod invenio;
pub mod sftp;
pub mod sword;

use crate::error::{Result, TransportError};

/// Sends `request`, turning transport failures and non-2xx answers into
/// errors that name `url`.
pub(crate) async fn checked(url: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await.map_err(|source| TransportError::Connection {
        url: url.to_owned(),
        source,
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Http {
        url: url.to_owned(),
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn text(url: &str, request: reqwest::RequestBuilder) -> Result<String> {
    checked(url, request)
        .await?
        .text()
        .await
        .map_err(|source| TransportError::Connection {
            url: url.to_owned(),
            source,
        })
}

pub(crate) async fn json(url: &str, request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
    checked(url, request)
        .await?
        .json()
        .await
        .map_err(|source| TransportError::Connection {
            url: url.to_owned(),
            source,
        })
}

/// Appends `segments` to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &url::Url, segments: &[&str]) -> Result<url::Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| TransportError::protocol(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
