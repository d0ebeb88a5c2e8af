// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! InvenioRDM REST deposits.
//!
//! Sequence: delete a stale unpublished draft with the same title, create a
//! draft record, upload every custodial file (register, upload content,
//! commit) and publish. Publishing is retried a bounded number of times
//! with a fixed delay.

use std::time::Duration;

use pass_deposit_assembler::{PackageStream, Resource};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use url::Url;

use super::{checked, endpoint, json};
use crate::config::HttpSettings;
use crate::connectivity::ConnectivityService;
use crate::error::{IoErrorContext, Result, TransportError};
use crate::mapping::invenio_record;
use crate::response::{OnSuccess, TransportResponse};

/// Fixed-delay retry policy for the publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishRetry {
    pub attempts: usize,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct InvenioRdmTransport {
    api_url: Url,
    http: reqwest::Client,
    publish_retry: PublishRetry,
    connectivity: ConnectivityService,
}

#[derive(Debug)]
pub struct InvenioRdmSession {
    api_url: Url,
    http: reqwest::Client,
    publish_retry: PublishRetry,
}

impl InvenioRdmTransport {
    pub fn new(
        api_url: Url,
        api_token: &str,
        verify_tls: bool,
        publish_retry: PublishRetry,
        http: &HttpSettings,
        connectivity: ConnectivityService,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let bearer = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|_| TransportError::protocol("API token is not a valid header value"))?;
        headers.insert(AUTHORIZATION, bearer);
        let client = http
            .client_builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            api_url,
            http: client,
            publish_retry: PublishRetry {
                attempts: publish_retry.attempts.max(1),
                delay: publish_retry.delay,
            },
            connectivity,
        })
    }

    pub fn open(&self) -> InvenioRdmSession {
        InvenioRdmSession {
            api_url: self.api_url.clone(),
            http: self.http.clone(),
            publish_retry: self.publish_retry,
        }
    }

    pub async fn check_connectivity(&self) -> bool {
        self.connectivity.verify_url(self.api_url.as_str()).await
    }
}

/// Ids of unpublished drafts titled exactly `title`.
fn stale_drafts(search: &Value, title: &str) -> Vec<String> {
    search
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|hit| hit.get("is_published").and_then(Value::as_bool) != Some(true))
        .filter(|hit| hit.pointer("/metadata/title").and_then(Value::as_str) == Some(title))
        .filter_map(|hit| hit.get("id").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

impl InvenioRdmSession {
    pub async fn send(&self, package: &PackageStream) -> TransportResponse {
        self.deposit(package)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "error depositing into InvenioRDM");
                TransportResponse::failed(e)
            })
    }

    async fn deposit(&self, package: &PackageStream) -> Result<TransportResponse> {
        let submission = package.submission();
        let title = submission
            .title()
            .ok_or_else(|| TransportError::protocol("submission has no title"))?;

        self.delete_stale_draft(title).await?;

        let url = endpoint(&self.api_url, &["records"])?;
        let request = self.http.post(url.clone()).json(&invenio_record(submission, title));
        let record = json(url.as_str(), request).await?;
        let record_id = record
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::protocol("draft record has no id"))?;
        let access_url = record
            .pointer("/links/latest_html")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::protocol("draft record has no latest_html link"))?;
        let access_url = Url::parse(access_url)
            .map_err(|e| TransportError::protocol(format!("invalid access URL {access_url}: {e}")))?;
        debug!(record = record_id, "created draft record");

        for resource in package.resources() {
            self.upload_file(record_id, resource).await?;
        }
        self.publish(record_id).await?;
        info!(submission = %submission.id, record = record_id, %access_url, "published InvenioRDM record");

        Ok(TransportResponse::succeeded(OnSuccess::Complete { access_url }))
    }

    /// At most one draft may match; several is an error, not a guess.
    async fn delete_stale_draft(&self, title: &str) -> Result<()> {
        let mut url = endpoint(&self.api_url, &["user", "records"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("metadata.title:\"{}\"", title.replace('"', "\\\"")))
            .append_pair("is_published", "false");
        let search = json(url.as_str(), self.http.get(url.clone())).await?;

        match stale_drafts(&search, title).as_slice() {
            [] => Ok(()),
            [id] => {
                warn!(record = %id, title, "deleting stale draft record");
                let url = endpoint(&self.api_url, &["records", id.as_str(), "draft"])?;
                checked(url.as_str(), self.http.delete(url.clone())).await?;
                Ok(())
            }
            drafts => Err(TransportError::AmbiguousDraft {
                title: title.to_owned(),
                matches: drafts.len(),
            }),
        }
    }

    async fn upload_file(&self, record_id: &str, resource: &Resource) -> Result<()> {
        let name = resource.name.as_str();
        let files = endpoint(&self.api_url, &["records", record_id, "draft", "files"])?;
        let request = self.http.post(files.clone()).json(&json!([{ "key": name }]));
        checked(files.as_str(), request).await?;

        let content = endpoint(&self.api_url, &["records", record_id, "draft", "files", name, "content"])?;
        let reader = resource
            .open()
            .await
            .io_context(format!("opening {}", resource.location))?;
        let request = self
            .http
            .put(content.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::CONTENT_LENGTH, resource.size)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(reader)));
        checked(content.as_str(), request).await?;

        let commit = endpoint(&self.api_url, &["records", record_id, "draft", "files", name, "commit"])?;
        checked(commit.as_str(), self.http.post(commit.clone())).await?;
        debug!(record = record_id, file = name, "uploaded draft file");
        Ok(())
    }

    async fn publish(&self, record_id: &str) -> Result<()> {
        let url = endpoint(&self.api_url, &["records", record_id, "draft", "actions", "publish"])?;
        let PublishRetry { attempts, delay } = self.publish_retry;
        let mut attempt = 1;
        loop {
            let request = self.http.post(url.clone()).header(CONTENT_TYPE, "application/json");
            match checked(url.as_str(), request).await {
                Ok(_) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(record = record_id, attempt, error = %e, "publish failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_drafts_match_exact_unpublished_titles() {
        let search = json!({ "hits": { "hits": [
            { "id": "a", "is_published": false, "metadata": { "title": "On Testing" } },
            { "id": "b", "is_published": true, "metadata": { "title": "On Testing" } },
            { "id": "c", "is_published": false, "metadata": { "title": "On Testing, Again" } },
        ] } });
        assert_eq!(stale_drafts(&search, "On Testing"), vec!["a".to_owned()]);
        assert!(stale_drafts(&json!({}), "On Testing").is_empty());
    }
}
