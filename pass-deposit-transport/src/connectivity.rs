// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::time::Duration;

use reqwest::StatusCode;
use tokio::net::TcpStream;
use tracing::{debug, error};

use crate::config::HttpSettings;
use crate::error::Result;

/// Lightweight reachability checks.
#[derive(Debug, Clone)]
pub struct ConnectivityService {
    http: reqwest::Client,
    connect_timeout: Duration,
}

impl ConnectivityService {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            http: settings.client()?,
            connect_timeout: settings.connect_timeout(),
        })
    }

    /// A URL is reachable when it answers with a status below 502.
    pub async fn verify_url(&self, url: &str) -> bool {
        match self.http.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(url, %status, "connectivity check answered");
                status < StatusCode::BAD_GATEWAY
            }
            Err(e) => {
                error!(url, error = %e, "error connecting to transport URL");
                false
            }
        }
    }

    /// Whether a TCP connection to `host:port` opens within the connect
    /// timeout.
    pub async fn verify_connect(&self, host: &str, port: u16) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                error!(host, port, error = %e, "repository is not currently reachable");
                false
            }
            Err(_) => {
                error!(host, port, timeout = ?self.connect_timeout, "repository connect timed out");
                false
            }
        }
    }
}
