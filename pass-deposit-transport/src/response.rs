// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::convert::Infallible;

use pass_deposit_model::{CopyStatus, Deposit, DepositStatus, EntityId, RepositoryCopy};
use pass_deposit_store::{CriticalError, CriticalRepositoryInteraction, PassClient};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::TransportError;

const DEVNULL_HANDLE_PREFIX: &str = "https://devnull-fake-url/handle/";

/// The records one deposit attempt works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositContext {
    pub submission: EntityId,
    pub deposit: EntityId,
    pub repository: EntityId,
    pub repository_copy: EntityId,
}

/// The store updates a transport asks for once its send succeeded.
///
/// Captured when the response is built and applied later by the
/// orchestrator, always through the critical update protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnSuccess {
    /// The repository published the item: the copy is complete at
    /// `access_url` and the deposit is accepted.
    Complete { access_url: Url },
    /// As [`OnSuccess::Complete`], with a placeholder URL derived from the
    /// repository copy id.
    FakeHandle,
    /// The repository accepted the package and tracks it asynchronously.
    /// The copy stays in progress; the deposit stays submitted.
    InProgress { item_url: Option<Url> },
}

impl OnSuccess {
    /// Performs the updates on the records named by `ctx`.
    pub async fn apply<S: PassClient>(
        &self,
        ctx: &DepositContext,
        cri: &CriticalRepositoryInteraction<S>,
    ) -> Result<(), CriticalError> {
        trace!(
            submission = %ctx.submission,
            deposit = %ctx.deposit,
            copy = %ctx.repository_copy,
            "applying on-success updates"
        );
        match self {
            OnSuccess::Complete { access_url } => {
                complete_copy(ctx, cri, access_url.clone()).await?;
                accept_deposit(ctx, cri).await
            }
            OnSuccess::FakeHandle => {
                let url = format!("{DEVNULL_HANDLE_PREFIX}{}", ctx.repository_copy);
                let access_url = Url::parse(&url).map_err(|e| CriticalError::Critical {
                    kind: pass_deposit_model::EntityKind::RepositoryCopy,
                    id: ctx.repository_copy.clone(),
                    source: Box::new(e),
                })?;
                complete_copy(ctx, cri, access_url).await?;
                accept_deposit(ctx, cri).await
            }
            OnSuccess::InProgress { item_url } => {
                let item_url = item_url.clone();
                cri.perform_critical(
                    &ctx.repository_copy,
                    |_: &RepositoryCopy| true,
                    |rc: &RepositoryCopy, _: &()| rc.copy_status == Some(CopyStatus::InProgress),
                    move |rc: &mut RepositoryCopy| {
                        rc.copy_status = Some(CopyStatus::InProgress);
                        if let Some(url) = &item_url {
                            add_external_id(rc, url.as_str());
                            rc.access_url = Some(url.clone());
                        }
                        Ok::<_, Infallible>(())
                    },
                    false,
                )
                .await?;
                Ok(())
            }
        }
    }
}

fn add_external_id(copy: &mut RepositoryCopy, id: &str) {
    if !copy.external_ids.iter().any(|existing| existing == id) {
        copy.external_ids.push(id.to_owned());
    }
}

async fn complete_copy<S: PassClient>(
    ctx: &DepositContext,
    cri: &CriticalRepositoryInteraction<S>,
    access_url: Url,
) -> Result<(), CriticalError> {
    let expected = access_url.clone();
    cri.perform_critical(
        &ctx.repository_copy,
        |_: &RepositoryCopy| true,
        move |rc: &RepositoryCopy, _: &()| {
            rc.copy_status == Some(CopyStatus::Complete) && rc.access_url.as_ref() == Some(&expected)
        },
        move |rc: &mut RepositoryCopy| {
            add_external_id(rc, access_url.as_str());
            rc.copy_status = Some(CopyStatus::Complete);
            rc.access_url = Some(access_url.clone());
            Ok::<_, Infallible>(())
        },
        true,
    )
    .await?;
    debug!(copy = %ctx.repository_copy, "repository copy complete");
    Ok(())
}

async fn accept_deposit<S: PassClient>(
    ctx: &DepositContext,
    cri: &CriticalRepositoryInteraction<S>,
) -> Result<(), CriticalError> {
    let result = cri
        .perform_critical(
            &ctx.deposit,
            |d: &Deposit| d.deposit_status == Some(DepositStatus::Submitted),
            |d: &Deposit, _: &()| d.deposit_status == Some(DepositStatus::Accepted),
            |d: &mut Deposit| {
                d.deposit_status = Some(DepositStatus::Accepted);
                Ok::<_, Infallible>(())
            },
            true,
        )
        .await?;
    if result.applied() {
        debug!(deposit = %ctx.deposit, "deposit accepted");
    } else {
        warn!(
            deposit = %ctx.deposit,
            status = ?result.original.deposit_status,
            "deposit was not submitted, leaving its status alone"
        );
    }
    Ok(())
}

/// Outcome of one [`send`](crate::TransportSession::send).
#[derive(Debug)]
pub struct TransportResponse {
    pub success: bool,
    pub error: Option<TransportError>,
    /// Where the repository reports on the item asynchronously, once it has
    /// started tracking it. Also set on failures that left a tracked item
    /// behind, so a retry can resume it.
    pub status_ref: Option<String>,
    pub on_success: Option<OnSuccess>,
}

impl TransportResponse {
    pub fn succeeded(on_success: OnSuccess) -> Self {
        Self {
            success: true,
            error: None,
            status_ref: None,
            on_success: Some(on_success),
        }
    }

    pub fn failed(error: TransportError) -> Self {
        Self {
            success: false,
            error: Some(error),
            status_ref: None,
            on_success: None,
        }
    }

    pub fn with_status_ref(mut self, status_ref: impl Into<String>) -> Self {
        self.status_ref = Some(status_ref.into());
        self
    }
}
