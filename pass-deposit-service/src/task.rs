// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! One deposit attempt: package, check connectivity, send, record.

use std::convert::Infallible;
use std::sync::Arc;

use pass_deposit_assembler::{Assembler, Resolver};
use pass_deposit_model::{
    CopyStatus, Deposit, DepositStatus, EntityId, Repository, RepositoryCopy, Submission,
};
use pass_deposit_store::{CriticalRepositoryInteraction, PassClient};
use pass_deposit_transport::{DepositContext, STATUS_REF_HINT, TransportError};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::Config;
use crate::error::{DepositError, Result};
use crate::error_handler::DepositErrorHandler;
use crate::packager::{Packager, PackagerRegistry};

/// Runs deposit attempts against one entity store.
pub struct DepositTask<S> {
    cri: CriticalRepositoryInteraction<S>,
    assembler: Assembler<S>,
    packagers: Arc<PackagerRegistry>,
    errors: DepositErrorHandler<S>,
}

impl<S: PassClient> DepositTask<S> {
    pub fn new(client: Arc<S>, config: &Config, packagers: Arc<PackagerRegistry>) -> Result<Self> {
        let http = config.http.client().map_err(DepositError::HttpClient)?;
        let resolver = Resolver::new(
            Arc::clone(&client),
            http,
            config.resolver.classpath_roots.clone(),
        );
        let cri = CriticalRepositoryInteraction::with_max_attempts(client, config.critical_max_attempts);
        Ok(Self::with_parts(
            cri,
            Assembler::new(Arc::new(resolver)),
            packagers,
            config.retry_failed_deposits,
        ))
    }

    pub fn with_parts(
        cri: CriticalRepositoryInteraction<S>,
        assembler: Assembler<S>,
        packagers: Arc<PackagerRegistry>,
        retry_enabled: bool,
    ) -> Self {
        Self {
            errors: DepositErrorHandler::new(cri.clone(), retry_enabled),
            cri,
            assembler,
            packagers,
        }
    }

    pub fn cri(&self) -> &CriticalRepositoryInteraction<S> {
        &self.cri
    }

    pub fn packagers(&self) -> &Arc<PackagerRegistry> {
        &self.packagers
    }

    /// Creates a deposit of `submission` into `repository` and attempts it.
    pub async fn submit(&self, submission: &EntityId, repository: &EntityId) -> Result<Deposit> {
        let deposit = self
            .cri
            .client()
            .create_object(Deposit::new(submission.clone(), repository.clone()))
            .await?;
        info!(deposit = %deposit.id, %submission, %repository, "created deposit");
        self.run(&deposit.id).await
    }

    /// Attempts the deposit `id` and returns it as the attempt left it.
    ///
    /// Failures of the attempt itself are recorded on the deposit and do
    /// not surface as errors; only failing to read or record does.
    pub async fn run(&self, id: &EntityId) -> Result<Deposit> {
        let client = self.cri.client();
        let deposit: Deposit = client.get_object(id).await?;
        if deposit.is_terminal() {
            debug!(deposit = %id, status = ?deposit.deposit_status, "deposit is terminal, nothing to do");
            return Ok(deposit);
        }
        let submission: Submission = client.get_object(&deposit.submission).await?;
        let repository: Repository = client.get_object(&deposit.repository).await?;

        let span = info_span!(
            "deposit",
            deposit = %deposit.id,
            submission = %submission.id,
            repository = %repository.repository_key
        );
        match self
            .attempt(&deposit, &submission, &repository)
            .instrument(span)
            .await
        {
            Ok(deposit) => Ok(deposit),
            Err(e) => {
                self.errors
                    .handle(&deposit, &repository.repository_key, &e)
                    .await?;
                Ok(client.get_object(id).await?)
            }
        }
    }

    async fn attempt(
        &self,
        deposit: &Deposit,
        submission: &Submission,
        repository: &Repository,
    ) -> Result<Deposit> {
        let packager = self.packagers.get(&repository.repository_key)?;
        let package = self
            .assembler
            .assemble(submission, &packager.assembler)
            .await?;

        let mut hints = packager.options().clone();
        if let Some(status_ref) = &deposit.deposit_status_ref {
            hints.insert(STATUS_REF_HINT.to_owned(), status_ref.clone());
        }

        if !packager.transport.check_connectivity(&hints).await {
            return Err(DepositError::Unreachable {
                repository: packager.key.clone(),
            });
        }

        let session = packager
            .transport
            .open(&hints)
            .await
            .map_err(|source| transport_error(&packager, None, source))?;
        let response = session.send(&package, &hints).await;
        if !response.success {
            let source = response.error.unwrap_or_else(|| TransportError::Protocol {
                reason: "transport reported failure without a cause".into(),
            });
            return Err(transport_error(&packager, response.status_ref, source));
        }
        info!(status_ref = ?response.status_ref, "package sent");

        let copy = self.placeholder_copy(deposit, repository).await?;
        let status_ref = response.status_ref.clone();
        let submitted = self
            .cri
            .perform_critical(
                &deposit.id,
                |d: &Deposit| DepositStatus::can_transition(d.deposit_status, DepositStatus::Submitted),
                |d: &Deposit, _: &()| {
                    d.deposit_status == Some(DepositStatus::Submitted) && d.repository_copy.is_some()
                },
                move |d: &mut Deposit| {
                    d.deposit_status = Some(DepositStatus::Submitted);
                    if let Some(status_ref) = &status_ref {
                        d.deposit_status_ref = Some(status_ref.clone());
                    }
                    d.repository_copy.get_or_insert_with(|| copy.clone());
                    Ok::<_, Infallible>(())
                },
                true,
            )
            .await?;
        if !submitted.applied() {
            warn!(status = ?submitted.original.deposit_status, "deposit became terminal during the attempt");
            return Ok(submitted.resource);
        }

        let deposit = submitted.resource;
        let repository_copy = deposit
            .repository_copy
            .clone()
            .ok_or_else(|| DepositError::MissingCopy {
                deposit: deposit.id.clone(),
            })?;
        if let Some(on_success) = &response.on_success {
            let ctx = DepositContext {
                submission: submission.id.clone(),
                deposit: deposit.id.clone(),
                repository: repository.id.clone(),
                repository_copy,
            };
            on_success.apply(&ctx, &self.cri).await?;
        }

        Ok(self.cri.client().get_object(&deposit.id).await?)
    }

    /// The deposit's repository copy id, creating an in-progress copy when
    /// there is none yet.
    async fn placeholder_copy(&self, deposit: &Deposit, repository: &Repository) -> Result<EntityId> {
        if let Some(copy) = &deposit.repository_copy {
            return Ok(copy.clone());
        }
        let copy = self
            .cri
            .client()
            .create_object(RepositoryCopy {
                repository: repository.id.clone(),
                copy_status: Some(CopyStatus::InProgress),
                ..RepositoryCopy::default()
            })
            .await?;
        debug!(copy = %copy.id, "created placeholder repository copy");
        Ok(copy.id)
    }
}

fn transport_error(packager: &Packager, status_ref: Option<String>, source: TransportError) -> DepositError {
    DepositError::Transport {
        repository: packager.key.clone(),
        status_ref,
        source,
    }
}
