// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;

use pass_deposit_assembler::AssemblerOptions;
use pass_deposit_transport::{ConnectivityService, HttpSettings, Transport};
use tracing::info;

use crate::config::{Config, RepositoryConfig, StatusMapping};
use crate::error::{DepositError, Result};

/// Everything needed to deposit into one repository.
#[derive(Debug)]
pub struct Packager {
    pub key: String,
    pub assembler: AssemblerOptions,
    pub transport: Transport,
    pub mapping: Option<StatusMapping>,
}

impl Packager {
    pub fn new(
        config: &RepositoryConfig,
        http: &HttpSettings,
        connectivity: &ConnectivityService,
    ) -> Result<Self> {
        let transport = Transport::from_config(&config.transport, http, connectivity).map_err(
            |source| DepositError::Transport {
                repository: config.key.clone(),
                status_ref: None,
                source,
            },
        )?;
        Ok(Packager {
            key: config.key.clone(),
            assembler: config.assembler.clone(),
            transport,
            mapping: config.mapping.clone(),
        })
    }

    /// Options handed to the transport along with the package.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.assembler.options
    }
}

/// Packagers by repository key, built once at start-up.
#[derive(Debug, Default)]
pub struct PackagerRegistry {
    packagers: BTreeMap<String, Arc<Packager>>,
}

impl PackagerRegistry {
    pub fn from_config(config: &Config) -> Result<Self> {
        let connectivity =
            ConnectivityService::new(&config.http).map_err(DepositError::HttpClient)?;
        let mut registry = PackagerRegistry::default();
        for repository in &config.repositories {
            let packager = Packager::new(repository, &config.http, &connectivity)?;
            info!(key = %packager.key, protocol = %packager.transport.protocol(), "registered packager");
            registry.insert(packager);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, packager: Packager) {
        self.packagers.insert(packager.key.clone(), Arc::new(packager));
    }

    pub fn get(&self, key: &str) -> Result<Arc<Packager>> {
        self.packagers
            .get(key)
            .cloned()
            .ok_or_else(|| DepositError::UnknownRepository { key: key.to_owned() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Packager>> {
        self.packagers.values()
    }

    pub fn len(&self) -> usize {
        self.packagers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packagers.is_empty()
    }
}
