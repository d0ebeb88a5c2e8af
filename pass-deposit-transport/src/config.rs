// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::time::Duration;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TransportError};

fn default_connect_timeout_secs() -> u64 {
    60
}

fn default_read_timeout_secs() -> u64 {
    60
}

fn default_pool_idle_timeout_secs() -> u64 {
    600
}

fn default_verify_tls() -> bool {
    true
}

fn default_publish_attempts() -> usize {
    3
}

fn default_publish_delay_ms() -> u64 {
    2000
}

fn default_sftp_port() -> u16 {
    22
}

fn default_sword_packaging() -> String {
    "http://purl.org/net/sword/package/SimpleZip".into()
}

/// Timeouts applied to every HTTP client a transport builds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
        }
    }
}

impl HttpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub(crate) fn client_builder(&self) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .read_timeout(Duration::from_secs(self.read_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
    }

    pub fn client(&self) -> Result<reqwest::Client> {
        self.client_builder().build().map_err(TransportError::Client)
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    #[display("devnull")]
    DevNull,
    #[display("filesystem")]
    Filesystem,
    #[display("sword")]
    Sword,
    #[display("dspace")]
    DSpace,
    #[display("invenio-rdm")]
    InvenioRdm,
    #[display("sftp")]
    Sftp,
}

/// How to reach one repository. Selected by the `protocol` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "protocol", rename_all = "kebab-case", deny_unknown_fields)]
pub enum TransportConfig {
    #[serde(rename = "devnull")]
    DevNull,
    Filesystem {
        /// Directory the package file is written into.
        directory: PathBuf,
    },
    Sword {
        collection_url: Url,
        username: String,
        password: String,
        #[serde(default)]
        on_behalf_of: Option<String>,
        #[serde(default = "default_sword_packaging")]
        packaging: String,
    },
    #[serde(rename = "dspace")]
    DSpace {
        api_url: Url,
        website_url: Url,
        username: String,
        password: String,
        collection_handle: String,
    },
    InvenioRdm {
        api_url: Url,
        api_token: String,
        #[serde(default = "default_verify_tls")]
        verify_tls: bool,
        #[serde(default = "default_publish_attempts")]
        publish_attempts: usize,
        #[serde(default = "default_publish_delay_ms")]
        publish_delay_ms: u64,
    },
    Sftp {
        host: String,
        #[serde(default = "default_sftp_port")]
        port: u16,
        username: String,
        password: String,
        /// Remote directory packages are uploaded into, relative to the
        /// login directory unless absolute.
        #[serde(default)]
        directory: PathBuf,
    },
}

impl TransportConfig {
    pub fn protocol(&self) -> Protocol {
        match self {
            TransportConfig::DevNull => Protocol::DevNull,
            TransportConfig::Filesystem { .. } => Protocol::Filesystem,
            TransportConfig::Sword { .. } => Protocol::Sword,
            TransportConfig::DSpace { .. } => Protocol::DSpace,
            TransportConfig::InvenioRdm { .. } => Protocol::InvenioRdm,
            TransportConfig::Sftp { .. } => Protocol::Sftp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        transport: TransportConfig,
    }

    #[test]
    fn tagged_by_protocol() {
        let parsed: Wrapper = toml::from_str(
            r#"
            [transport]
            protocol = "invenio-rdm"
            api_url = "https://rdm.example.org/api"
            api_token = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.transport,
            TransportConfig::InvenioRdm {
                api_url: Url::parse("https://rdm.example.org/api").unwrap(),
                api_token: "secret".into(),
                verify_tls: true,
                publish_attempts: 3,
                publish_delay_ms: 2000,
            }
        );
        assert_eq!(parsed.transport.protocol(), Protocol::InvenioRdm);
    }

    #[test]
    fn devnull_needs_no_fields() {
        let parsed: Wrapper = toml::from_str("[transport]\nprotocol = \"devnull\"\n").unwrap();
        assert_eq!(parsed.transport, TransportConfig::DevNull);
    }

    #[test]
    fn sftp_defaults_to_port_22_and_the_login_directory() {
        let parsed: Wrapper = toml::from_str(
            r#"
            [transport]
            protocol = "sftp"
            host = "ftp.ncbi.example.org"
            username = "depositor"
            password = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.transport,
            TransportConfig::Sftp {
                host: "ftp.ncbi.example.org".into(),
                port: 22,
                username: "depositor".into(),
                password: "secret".into(),
                directory: PathBuf::new(),
            }
        );
        assert_eq!(parsed.transport.protocol().to_string(), "sftp");
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        assert!(toml::from_str::<Wrapper>("[transport]\nprotocol = \"ftp\"\n").is_err());
    }
}
