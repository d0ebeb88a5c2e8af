// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Deposit orchestration.
//!
//! [`DepositTask`] runs one attempt: it assembles the submission's package,
//! checks that the repository is reachable, sends, and records the outcome
//! on the deposit through the critical update protocol. [`DepositUpdater`] later
//! reconciles asynchronous repositories from their status statements, and
//! [`FailedDepositRetry`] re-attempts deposits that did not get through.

use std::sync::Arc;

use pass_deposit_store::{CriticalRepositoryInteraction, PassClient};

pub mod config;
mod error;
mod error_handler;
mod packager;
mod pool;
mod retry;
mod select;
pub mod status;
mod task;
mod updater;

pub use config::{Config, RepositoryConfig, ResolverConfig, StatusMapping};
pub use error::{ConfigError, DepositError, IoErrorContext, Result};
pub use error_handler::DepositErrorHandler;
pub use packager::{Packager, PackagerRegistry};
pub use pool::WorkerPool;
pub use retry::{FailedDepositRetry, RetrySummary};
pub use task::DepositTask;
pub use updater::DepositUpdater;

/// The deposit services wired against one entity store.
pub struct DepositServices<S> {
    pub task: Arc<DepositTask<S>>,
    pub updater: DepositUpdater<S>,
    pub retry: FailedDepositRetry<S>,
    pub pool: WorkerPool,
}

impl<S: PassClient> DepositServices<S> {
    pub fn new(client: Arc<S>, config: &Config) -> Result<Self> {
        let packagers = Arc::new(PackagerRegistry::from_config(config)?);
        Self::with_packagers(client, config, packagers)
    }

    pub fn with_packagers(
        client: Arc<S>,
        config: &Config,
        packagers: Arc<PackagerRegistry>,
    ) -> Result<Self> {
        let pool = WorkerPool::new(config.workers);
        let cri = CriticalRepositoryInteraction::with_max_attempts(
            Arc::clone(&client),
            config.critical_max_attempts,
        );
        let task = Arc::new(DepositTask::new(client, config, Arc::clone(&packagers))?);
        Ok(DepositServices {
            updater: DepositUpdater::new(cri, packagers),
            retry: FailedDepositRetry::new(
                Arc::clone(&task),
                pool.clone(),
                config.retry_failed_deposits,
            ),
            task,
            pool,
        })
    }
}
