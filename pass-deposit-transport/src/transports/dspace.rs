// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! DSpace 7 REST deposits.
//!
//! Opening a session performs the CSRF and login handshake. A send creates a
//! workspace item carrying the custodial files, patches its metadata and
//! moves it into the workflow. The workspace item id is reported as the
//! status reference (`wsi:<id>`) so a retry resumes the same item instead of
//! creating another one.

use std::collections::BTreeMap;

use pass_deposit_assembler::PackageStream;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use url::Url;

use super::{checked, endpoint, json};
use crate::STATUS_REF_HINT;
use crate::config::HttpSettings;
use crate::connectivity::ConnectivityService;
use crate::error::{IoErrorContext, Result, TransportError};
use crate::mapping::dspace_patch;
use crate::response::{OnSuccess, TransportResponse};

const XSRF_HEADER: &str = "X-XSRF-TOKEN";
const XSRF_RESPONSE_HEADER: &str = "DSPACE-XSRF-TOKEN";
const XSRF_COOKIE: &str = "DSPACE-XSRF-COOKIE";
const WORKSPACE_ITEM_REF_PREFIX: &str = "wsi:";

#[derive(Debug, Clone)]
pub struct DSpaceTransport {
    api_url: Url,
    website_url: Url,
    username: String,
    password: String,
    collection_handle: String,
    http: reqwest::Client,
    connectivity: ConnectivityService,
}

/// Tokens obtained by the login handshake.
#[derive(Debug, Clone)]
struct AuthContext {
    xsrf_token: String,
    auth_token: String,
}

#[derive(Debug)]
pub struct DSpaceSession {
    api_url: Url,
    website_url: Url,
    collection_handle: String,
    http: reqwest::Client,
    auth: AuthContext,
}

fn header_value(response: &reqwest::Response, name: &str) -> Result<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| TransportError::protocol(format!("auth header not found: {name}")))
}

impl DSpaceTransport {
    pub fn new(
        api_url: Url,
        website_url: Url,
        username: String,
        password: String,
        collection_handle: String,
        http: &HttpSettings,
        connectivity: ConnectivityService,
    ) -> Result<Self> {
        Ok(Self {
            api_url,
            website_url,
            username,
            password,
            collection_handle,
            http: http.client()?,
            connectivity,
        })
    }

    pub async fn check_connectivity(&self) -> bool {
        self.connectivity.verify_url(self.api_url.as_str()).await
    }

    pub async fn open(&self) -> Result<DSpaceSession> {
        let auth = self.authenticate().await?;
        Ok(DSpaceSession {
            api_url: self.api_url.clone(),
            website_url: self.website_url.clone(),
            collection_handle: self.collection_handle.clone(),
            http: self.http.clone(),
            auth,
        })
    }

    async fn authenticate(&self) -> Result<AuthContext> {
        // The CSRF endpoint answers 404 but still hands out the token.
        let csrf_url = endpoint(&self.api_url, &["security", "csrf"])?;
        let csrf = self
            .http
            .get(csrf_url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Connection {
                url: csrf_url.to_string(),
                source,
            })?;
        let xsrf_token = header_value(&csrf, XSRF_RESPONSE_HEADER)?;

        let login_url = endpoint(&self.api_url, &["authn", "login"])?;
        let login = self
            .http
            .post(login_url.clone())
            .header(XSRF_HEADER, &xsrf_token)
            .header(COOKIE, format!("{XSRF_COOKIE}={xsrf_token}"))
            .form(&[("user", &self.username), ("password", &self.password)]);
        let login = checked(login_url.as_str(), login).await?;
        let auth_token = header_value(&login, AUTHORIZATION.as_str())?;
        debug!(api = %self.api_url, "authenticated with DSpace");

        Ok(AuthContext {
            xsrf_token,
            auth_token,
        })
    }
}

/// A workspace item document, whether fetched directly or wrapped in the
/// embedded list returned on creation.
fn workspace_item(document: &Value) -> &Value {
    document
        .pointer("/_embedded/workspaceitems/0")
        .unwrap_or(document)
}

fn find_indexable_objects<'a>(value: &'a Value, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "indexableObject" && child.get("handle").is_some() {
                    found.push(child);
                } else {
                    find_indexable_objects(child, found);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| find_indexable_objects(item, found)),
        _ => {}
    }
}

impl DSpaceSession {
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, &self.auth.auth_token)
            .header(XSRF_HEADER, &self.auth.xsrf_token)
            .header(COOKIE, format!("{XSRF_COOKIE}={}", self.auth.xsrf_token))
    }

    pub async fn send(
        &self,
        package: &PackageStream,
        metadata: &BTreeMap<String, String>,
    ) -> TransportResponse {
        let mut status_ref = metadata
            .get(STATUS_REF_HINT)
            .filter(|r| r.starts_with(WORKSPACE_ITEM_REF_PREFIX))
            .cloned();
        match self.deposit(package, &mut status_ref).await {
            Ok(response) => response,
            Err(e) => {
                let response = TransportResponse::failed(e);
                match status_ref {
                    Some(r) => response.with_status_ref(r),
                    None => response,
                }
            }
        }
    }

    async fn deposit(
        &self,
        package: &PackageStream,
        status_ref: &mut Option<String>,
    ) -> Result<TransportResponse> {
        let submission = package.submission();
        info!(submission = %submission.id, "processing DSpace deposit");

        let resumed = status_ref
            .as_deref()
            .and_then(|r| r.strip_prefix(WORKSPACE_ITEM_REF_PREFIX))
            .and_then(|id| id.parse::<u64>().ok());
        let (id, document) = match resumed {
            Some(id) => {
                info!(workspace_item = id, "DSpace workspace item already exists");
                (id, self.get_workspace_item(id).await?)
            }
            None => {
                let document = self.create_workspace_item(package).await?;
                let id = workspace_item(&document)
                    .get("id")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| TransportError::protocol("workspace item has no id"))?;
                *status_ref = Some(format!("{WORKSPACE_ITEM_REF_PREFIX}{id}"));
                debug!(workspace_item = id, "created workspace item");
                (id, document)
            }
        };

        let item = workspace_item(&document)
            .pointer("/_embedded/item")
            .ok_or_else(|| TransportError::protocol("workspace item has no embedded item"))?;
        if item.pointer("/metadata/dc.title").is_none() {
            let patch = dspace_patch(submission);
            debug!(workspace_item = id, %patch, "patching workspace item metadata");
            let url = endpoint(&self.api_url, &["submission", "workspaceitems", &id.to_string()])?;
            let request = self.authorize(self.http.patch(url.clone())).json(&patch);
            checked(url.as_str(), request).await?;
        }

        self.create_workflow_item(id).await?;

        let uuid = item
            .get("uuid")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::protocol("workspace item has no item uuid"))?;
        let access_url = endpoint(&self.website_url, &["items", uuid])?;
        info!(submission = %submission.id, %access_url, "completed DSpace deposit");

        let response = TransportResponse::succeeded(OnSuccess::Complete { access_url });
        Ok(match status_ref {
            Some(r) => response.with_status_ref(r.clone()),
            None => response,
        })
    }

    async fn collection_uuid(&self) -> Result<String> {
        let mut url = endpoint(&self.api_url, &["discover", "search", "objects"])?;
        url.query_pairs_mut()
            .append_pair("query", &format!("handle:{}", self.collection_handle));
        let search = json(url.as_str(), self.authorize(self.http.get(url.clone()))).await?;

        let mut found = Vec::new();
        find_indexable_objects(&search, &mut found);
        match found.as_slice() {
            [object] => object
                .get("uuid")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| TransportError::protocol("collection has no uuid")),
            _ => Err(TransportError::protocol(format!(
                "unable to find object with handle: {}",
                self.collection_handle
            ))),
        }
    }

    async fn create_workspace_item(&self, package: &PackageStream) -> Result<Value> {
        let collection = self.collection_uuid().await?;
        let mut form = Form::new();
        for resource in package.resources() {
            let reader = resource
                .open()
                .await
                .io_context(format!("opening {}", resource.location))?;
            let body = reqwest::Body::wrap_stream(ReaderStream::new(reader));
            let part = Part::stream_with_length(body, resource.size).file_name(resource.name.clone());
            form = form.part("file", part);
        }

        let mut url = endpoint(&self.api_url, &["submission", "workspaceitems"])?;
        url.query_pairs_mut().append_pair("owningCollection", &collection);
        let request = self.authorize(self.http.post(url.clone())).multipart(form);
        json(url.as_str(), request).await
    }

    async fn get_workspace_item(&self, id: u64) -> Result<Value> {
        let url = endpoint(&self.api_url, &["submission", "workspaceitems", &id.to_string()])?;
        json(url.as_str(), self.authorize(self.http.get(url.clone()))).await
    }

    async fn create_workflow_item(&self, id: u64) -> Result<()> {
        let workspace_item = endpoint(&self.api_url, &["submission", "workspaceitems", &id.to_string()])?;
        let url = endpoint(&self.api_url, &["workflow", "workflowitems"])?;
        let request = self
            .authorize(self.http.post(url.clone()))
            .header(CONTENT_TYPE, "text/uri-list")
            .body(workspace_item.to_string());
        checked(url.as_str(), request).await?;
        Ok(())
    }
}
