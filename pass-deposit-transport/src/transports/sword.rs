// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! SWORD v2 deposits.
//!
//! A package is POSTed to a collection in a single request. The deposit
//! receipt links to a statement document, which becomes the deposit's status
//! reference and is later read to learn the item's state.

use pass_deposit_assembler::PackageStream;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::HttpSettings;
use crate::connectivity::ConnectivityService;
use crate::error::{Result, TransportError};
use crate::response::{OnSuccess, TransportResponse};

const STATEMENT_REL: &str = "http://purl.org/net/sword/terms/statement";
const STATE_SCHEME: &str = "http://purl.org/net/sword/terms/state";
const ATOM_FEED_TYPE: &str = "application/atom+xml;type=feed";

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@type", default)]
    media_type: Option<String>,
}

/// The parts of an Atom deposit receipt this transport reads.
#[derive(Debug, Deserialize)]
struct DepositReceipt {
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: String,
    #[serde(rename = "@scheme", default)]
    scheme: Option<String>,
}

/// The parts of an Atom statement this transport reads.
#[derive(Debug, Deserialize)]
struct Statement {
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
}

impl DepositReceipt {
    fn parse(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).map_err(|source| TransportError::Xml {
            document: "deposit receipt".into(),
            source,
        })
    }

    /// The Atom statement link, else any statement link.
    fn statement(&self) -> Option<&str> {
        let statements = || {
            self.links
                .iter()
                .filter(|l| l.rel.as_deref() == Some(STATEMENT_REL))
        };
        statements()
            .find(|l| l.media_type.as_deref() == Some(ATOM_FEED_TYPE))
            .or_else(|| statements().next())
            .map(|l| l.href.as_str())
    }

    fn alternate(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .map(|l| l.href.as_str())
    }
}

/// The SWORD state term of a statement document.
pub(crate) fn parse_statement_state(xml: &str) -> Result<String> {
    let statement: Statement = quick_xml::de::from_str(xml).map_err(|source| TransportError::Xml {
        document: "statement".into(),
        source,
    })?;
    statement
        .categories
        .into_iter()
        .find(|c| c.scheme.as_deref() == Some(STATE_SCHEME))
        .map(|c| c.term)
        .ok_or_else(|| TransportError::protocol("statement carries no SWORD state"))
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
    on_behalf_of: Option<String>,
}

impl Credentials {
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.basic_auth(&self.username, Some(&self.password));
        match &self.on_behalf_of {
            Some(user) => request.header("On-Behalf-Of", user),
            None => request,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwordTransport {
    collection_url: Url,
    packaging: String,
    credentials: Credentials,
    http: reqwest::Client,
    connectivity: ConnectivityService,
}

#[derive(Debug)]
pub struct SwordSession {
    collection_url: Url,
    packaging: String,
    credentials: Credentials,
    http: reqwest::Client,
}

impl SwordTransport {
    pub fn new(
        collection_url: Url,
        username: String,
        password: String,
        on_behalf_of: Option<String>,
        packaging: String,
        http: &HttpSettings,
        connectivity: ConnectivityService,
    ) -> Result<Self> {
        Ok(Self {
            collection_url,
            packaging,
            credentials: Credentials {
                username,
                password,
                on_behalf_of,
            },
            http: http.client()?,
            connectivity,
        })
    }

    pub fn open(&self) -> SwordSession {
        SwordSession {
            collection_url: self.collection_url.clone(),
            packaging: self.packaging.clone(),
            credentials: self.credentials.clone(),
            http: self.http.clone(),
        }
    }

    pub async fn check_connectivity(&self) -> bool {
        self.connectivity.verify_url(self.collection_url.as_str()).await
    }

    /// Fetches the statement at `status_ref` and returns its SWORD state.
    pub async fn statement_state(&self, status_ref: &str) -> Result<String> {
        let request = self.credentials.authorize(self.http.get(status_ref));
        let body = super::text(status_ref, request).await?;
        parse_statement_state(&body)
    }
}

impl SwordSession {
    pub async fn send(&self, package: &PackageStream) -> TransportResponse {
        self.deposit(package)
            .await
            .unwrap_or_else(TransportResponse::failed)
    }

    async fn deposit(&self, package: &PackageStream) -> Result<TransportResponse> {
        let metadata = package.metadata();
        let file_name = metadata.file_name();
        let stream = package.open()?;

        debug!(collection = %self.collection_url, package = %file_name, "posting SWORD deposit");
        let request = self
            .http
            .post(self.collection_url.clone())
            .header(CONTENT_TYPE, metadata.mime_type())
            .header(CONTENT_DISPOSITION, format!("attachment; filename={file_name}"))
            .header("Packaging", &self.packaging)
            .header("In-Progress", "false")
            .body(reqwest::Body::wrap_stream(stream));
        let body = super::text(self.collection_url.as_str(), self.credentials.authorize(request)).await?;

        let receipt = DepositReceipt::parse(&body)?;
        let statement = receipt
            .statement()
            .ok_or_else(|| TransportError::protocol("deposit receipt carries no statement link"))?
            .to_owned();
        let item_url = receipt.alternate().and_then(|href| Url::parse(href).ok());
        info!(statement = %statement, "SWORD deposit accepted");

        Ok(TransportResponse::succeeded(OnSuccess::InProgress { item_url }).with_status_ref(statement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:sword="http://purl.org/net/sword/terms/">
  <title>My Article</title>
  <id>http://repo.example.org/swordv2/edit/42</id>
  <link rel="edit" href="http://repo.example.org/swordv2/edit/42"/>
  <link rel="alternate" href="http://repo.example.org/handle/1774.2/42"/>
  <link rel="http://purl.org/net/sword/terms/statement" type="application/rdf+xml" href="http://repo.example.org/swordv2/statement/42.rdf"/>
  <link rel="http://purl.org/net/sword/terms/statement" type="application/atom+xml;type=feed" href="http://repo.example.org/swordv2/statement/42.atom"/>
  <sword:treatment>Stored in the workflow</sword:treatment>
</entry>"#;

    const STATEMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>http://repo.example.org/swordv2/statement/42.atom</id>
  <category term="http://dspace.org/state/archived" scheme="http://purl.org/net/sword/terms/state" label="State">
    The item has been archived
  </category>
  <category term="http://purl.org/net/sword/terms/originalDeposit" scheme="http://purl.org/net/sword/terms/" label="Orignal Deposit"/>
</feed>"#;

    #[test]
    fn receipt_prefers_atom_statement() {
        let receipt = DepositReceipt::parse(RECEIPT).unwrap();
        assert_eq!(
            receipt.statement(),
            Some("http://repo.example.org/swordv2/statement/42.atom")
        );
        assert_eq!(receipt.alternate(), Some("http://repo.example.org/handle/1774.2/42"));
    }

    #[test]
    fn statement_state() {
        assert_eq!(
            parse_statement_state(STATEMENT).unwrap(),
            "http://dspace.org/state/archived"
        );
    }

    #[test]
    fn statement_without_state() {
        let err = parse_statement_state(r#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap_err();
        assert!(matches!(err, TransportError::Protocol { .. }));
    }
}
