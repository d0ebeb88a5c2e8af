// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use pass_deposit_model::{Deposit, DepositStatus, EntityId, Submission};
use pass_deposit_store::PassClient;
use tracing::{info, warn};

use crate::error::Result;
use crate::pool::WorkerPool;
use crate::select::{select_all, status_filter};
use crate::task::DepositTask;

/// What one retry pass did.
#[derive(Debug, Default)]
pub struct RetrySummary {
    /// Deposits attempted again, with the status the attempt left.
    pub retried: Vec<(EntityId, Option<DepositStatus>)>,
    /// Deposits whose submission cannot be packaged as it stands.
    pub skipped: Vec<EntityId>,
    /// Deposits whose submission could not be read, or whose attempt could
    /// not be recorded.
    pub errors: Vec<(EntityId, String)>,
}

/// Re-attempts deposits left in RETRY, and in FAILED when enabled.
pub struct FailedDepositRetry<S> {
    task: Arc<DepositTask<S>>,
    pool: WorkerPool,
    include_failed: bool,
}

impl<S: PassClient> FailedDepositRetry<S> {
    pub fn new(task: Arc<DepositTask<S>>, pool: WorkerPool, include_failed: bool) -> Self {
        Self {
            task,
            pool,
            include_failed,
        }
    }

    fn statuses(&self) -> Vec<DepositStatus> {
        if self.include_failed {
            vec![DepositStatus::Retry, DepositStatus::Failed]
        } else {
            vec![DepositStatus::Retry]
        }
    }

    pub async fn run(&self) -> Result<RetrySummary> {
        let client = self.task.cri().client();
        let deposits: Vec<Deposit> = select_all(client.as_ref(), status_filter(&self.statuses())).await?;

        let mut summary = RetrySummary::default();
        let mut ids = Vec::new();
        for deposit in deposits {
            let submission: Submission = match client.get_object(&deposit.submission).await {
                Ok(submission) => submission,
                Err(e) => {
                    warn!(
                        deposit = %deposit.id,
                        submission = %deposit.submission,
                        error = %e,
                        "cannot read submission, not retrying"
                    );
                    summary.errors.push((deposit.id, e.to_string()));
                    continue;
                }
            };
            if submission.files.is_empty() || !submission.files.iter().all(|f| f.has_source()) {
                warn!(
                    deposit = %deposit.id,
                    submission = %submission.id,
                    "submission has files without a byte source, not retrying"
                );
                summary.skipped.push(deposit.id);
            } else {
                ids.push(deposit.id);
            }
        }
        info!(
            deposits = ids.len(),
            skipped = summary.skipped.len(),
            unreadable = summary.errors.len(),
            "retrying deposits"
        );

        let task = Arc::clone(&self.task);
        let results = self
            .pool
            .run(ids, move |id: EntityId| {
                let task = Arc::clone(&task);
                async move { task.run(&id).await }
            })
            .await;
        for (id, result) in results {
            match result {
                Ok(deposit) => summary.retried.push((id, deposit.deposit_status)),
                Err(e) => summary.errors.push((id, e.to_string())),
            }
        }
        Ok(summary)
    }
}
