// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use pass_deposit_assembler::AssemblerOptions;
use pass_deposit_model::DepositStatus;
use pass_deposit_transport::{HttpSettings, TransportConfig};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, DepositError, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PASS_DEPOSIT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "deposit.toml";

fn default_retry_failed_deposits() -> bool {
    true
}

fn default_critical_max_attempts() -> usize {
    10
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Whether unreachable repositories put deposits into RETRY rather than
    /// FAILED, and whether FAILED deposits are picked up by the retry job.
    #[serde(default = "default_retry_failed_deposits")]
    pub retry_failed_deposits: bool,
    #[serde(default = "default_critical_max_attempts")]
    pub critical_max_attempts: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            retry_failed_deposits: default_retry_failed_deposits(),
            critical_max_attempts: default_critical_max_attempts(),
            workers: default_workers(),
            http: HttpSettings::default(),
            resolver: ResolverConfig::default(),
            repositories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Directories searched, in order, for `classpath:` locations.
    #[serde(default)]
    pub classpath_roots: Vec<PathBuf>,
}

/// One deposit target: how to package for it and how to reach it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Matches `Repository::repository_key`.
    pub key: String,
    #[serde(default)]
    pub assembler: AssemblerOptions,
    pub transport: TransportConfig,
    #[serde(default)]
    pub mapping: Option<StatusMapping>,
}

/// Maps the state terms of a repository's status statements onto deposit
/// statuses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusMapping {
    /// Status for any term without an override.
    pub default: DepositStatus,
    #[serde(default)]
    pub overrides: BTreeMap<String, DepositStatus>,
}

impl StatusMapping {
    pub fn resolve(&self, term: &str) -> DepositStatus {
        self.overrides.get(term).copied().unwrap_or(self.default)
    }
}

impl Config {
    pub fn load(settings_file: &Path) -> Result<Config> {
        let contents = read_to_string(settings_file).map_err(|e| ConfigError::ReadFile {
            path: settings_file.display().to_string(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| DepositError::from(ConfigError::Invalid { reason });
        if self.workers == 0 {
            return Err(invalid("workers must be greater than 0".into()));
        }
        if self.critical_max_attempts == 0 {
            return Err(invalid("critical_max_attempts must be greater than 0".into()));
        }
        let mut keys = BTreeSet::new();
        for repository in &self.repositories {
            if !keys.insert(repository.key.as_str()) {
                return Err(invalid(format!("duplicate repository key '{}'", repository.key)));
            }
        }
        Ok(())
    }

    pub fn repository(&self, key: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.key == key)
    }
}

/// Loads the file named by `PASS_DEPOSIT_CONFIG`, else `deposit.toml` in
/// the working directory, else the defaults.
pub fn load() -> Result<Config> {
    match std::env::var(CONFIG_ENV) {
        Ok(settings_file) => Config::load(Path::new(&settings_file)),
        Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Config::load(Path::new(DEFAULT_CONFIG_FILE))
        }
        Err(_) => {
            debug!("no configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}
