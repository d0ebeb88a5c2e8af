// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Reconciles SUBMITTED deposits against the repositories' own status
//! statements.

use std::convert::Infallible;
use std::sync::Arc;

use pass_deposit_model::{Deposit, DepositStatus, EntityId, Repository, RepositoryCopy};
use pass_deposit_store::{CriticalRepositoryInteraction, PassClient};
use tracing::{debug, info, warn};

use crate::error::{DepositError, Result};
use crate::packager::PackagerRegistry;
use crate::pool::WorkerPool;
use crate::select::{select_all, status_filter};
use crate::status::copy_status_for;

pub struct DepositUpdater<S> {
    cri: CriticalRepositoryInteraction<S>,
    packagers: Arc<PackagerRegistry>,
}

impl<S> Clone for DepositUpdater<S> {
    fn clone(&self) -> Self {
        Self {
            cri: self.cri.clone(),
            packagers: Arc::clone(&self.packagers),
        }
    }
}

impl<S: PassClient> DepositUpdater<S> {
    pub fn new(cri: CriticalRepositoryInteraction<S>, packagers: Arc<PackagerRegistry>) -> Self {
        Self { cri, packagers }
    }

    /// Reads the statement of deposit `id` and applies the mapped status
    /// when it is terminal. Returns the status applied, if any.
    pub async fn update(&self, id: &EntityId) -> Result<Option<DepositStatus>> {
        let client = self.cri.client();
        let deposit: Deposit = client.get_object(id).await?;
        let Some(status_ref) = deposit.deposit_status_ref.as_deref() else {
            debug!(deposit = %id, "deposit has no status reference");
            return Ok(None);
        };
        if deposit.deposit_status != Some(DepositStatus::Submitted) {
            debug!(deposit = %id, status = ?deposit.deposit_status, "deposit is not submitted");
            return Ok(None);
        }

        let repository: Repository = client.get_object(&deposit.repository).await?;
        let packager = self.packagers.get(&repository.repository_key)?;
        let Some(mapping) = &packager.mapping else {
            debug!(deposit = %id, repository = %packager.key, "repository has no status mapping");
            return Ok(None);
        };

        let term = packager
            .transport
            .statement_state(status_ref)
            .await
            .map_err(|source| DepositError::Transport {
                repository: packager.key.clone(),
                status_ref: Some(status_ref.to_owned()),
                source,
            })?;
        let status = mapping.resolve(&term);
        if !status.is_terminal() {
            debug!(deposit = %id, %term, %status, "deposit still in progress");
            return Ok(None);
        }

        let result = self
            .cri
            .perform_critical(
                id,
                |d: &Deposit| d.deposit_status == Some(DepositStatus::Submitted),
                move |d: &Deposit, _: &()| d.deposit_status == Some(status),
                move |d: &mut Deposit| {
                    d.deposit_status = Some(status);
                    Ok::<_, Infallible>(())
                },
                false,
            )
            .await?;
        if !result.applied() {
            warn!(deposit = %id, current = ?result.original.deposit_status, "deposit changed while reconciling");
            return Ok(None);
        }
        info!(deposit = %id, %term, %status, "deposit reconciled");

        if let (Some(copy_status), Some(copy)) = (copy_status_for(status), &deposit.repository_copy) {
            self.cri
                .perform_critical(
                    copy,
                    |_: &RepositoryCopy| true,
                    move |rc: &RepositoryCopy, _: &()| rc.copy_status == Some(copy_status),
                    move |rc: &mut RepositoryCopy| {
                        rc.copy_status = Some(copy_status);
                        Ok::<_, Infallible>(())
                    },
                    false,
                )
                .await?;
        }
        Ok(Some(status))
    }

    /// Reconciles every SUBMITTED deposit that carries a status reference.
    pub async fn update_submitted(
        &self,
        pool: &WorkerPool,
    ) -> Result<Vec<(EntityId, Result<Option<DepositStatus>>)>> {
        let deposits: Vec<Deposit> =
            select_all(self.cri.client().as_ref(), status_filter(&[DepositStatus::Submitted])).await?;
        let ids: Vec<EntityId> = deposits
            .into_iter()
            .filter(|d| d.deposit_status_ref.is_some())
            .map(|d| d.id)
            .collect();
        info!(deposits = ids.len(), "reconciling submitted deposits");

        let updater = self.clone();
        Ok(pool
            .run(ids, move |id: EntityId| {
                let updater = updater.clone();
                async move { updater.update(&id).await }
            })
            .await)
    }
}
