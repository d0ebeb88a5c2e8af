// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::convert::Infallible;

use pass_deposit_model::{Deposit, DepositStatus};
use pass_deposit_store::{CriticalError, CriticalRepositoryInteraction, PassClient};
use tracing::{error, warn};

use crate::error::DepositError;
use crate::status::{Connectivity, SendResult, attempt_status};

/// Records a failed attempt on its deposit.
pub struct DepositErrorHandler<S> {
    cri: CriticalRepositoryInteraction<S>,
    retry_enabled: bool,
}

impl<S> Clone for DepositErrorHandler<S> {
    fn clone(&self) -> Self {
        Self {
            cri: self.cri.clone(),
            retry_enabled: self.retry_enabled,
        }
    }
}

impl<S: PassClient> DepositErrorHandler<S> {
    pub fn new(cri: CriticalRepositoryInteraction<S>, retry_enabled: bool) -> Self {
        Self { cri, retry_enabled }
    }

    /// The status a failure with `err` lands the deposit on.
    pub fn classify(&self, err: &DepositError) -> DepositStatus {
        let (connectivity, send) = if err.is_connectivity() {
            (Connectivity::Down, SendResult::Exception)
        } else if matches!(err, DepositError::Transport { .. }) {
            (Connectivity::Up, SendResult::ContentError)
        } else {
            (Connectivity::Up, SendResult::Exception)
        };
        attempt_status(connectivity, send, self.retry_enabled)
    }

    /// Moves `deposit` to the status `err` classifies as, unless another
    /// writer already made it terminal. Returns the status now stored.
    pub async fn handle(
        &self,
        deposit: &Deposit,
        repository: &str,
        err: &DepositError,
    ) -> Result<Option<DepositStatus>, CriticalError> {
        let status = self.classify(err);
        error!(
            deposit = %deposit.id,
            submission = %deposit.submission,
            repository,
            %status,
            error = %err,
            "deposit attempt failed"
        );

        let status_ref = err.status_ref().map(str::to_owned);
        let result = self
            .cri
            .perform_critical(
                &deposit.id,
                move |d: &Deposit| DepositStatus::can_transition(d.deposit_status, status),
                move |d: &Deposit, _: &()| d.deposit_status == Some(status),
                move |d: &mut Deposit| {
                    d.deposit_status = Some(status);
                    if let Some(status_ref) = &status_ref {
                        d.deposit_status_ref = Some(status_ref.clone());
                    }
                    Ok::<_, Infallible>(())
                },
                false,
            )
            .await?;

        if !result.applied() {
            warn!(
                deposit = %deposit.id,
                current = ?result.original.deposit_status,
                "deposit is already terminal, failure not recorded"
            );
        }
        Ok(result.resource.deposit_status)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pass_deposit_model::EntityId;
    use pass_deposit_store::MemoryStore;
    use pass_deposit_transport::TransportError;
    use rstest::rstest;

    use super::*;

    fn handler(retry: bool) -> (Arc<MemoryStore>, DepositErrorHandler<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cri = CriticalRepositoryInteraction::new(store.clone());
        (store, DepositErrorHandler::new(cri, retry))
    }

    fn unreachable() -> DepositError {
        DepositError::Unreachable {
            repository: "repo".into(),
        }
    }

    fn rejected(status_ref: Option<&str>) -> DepositError {
        DepositError::Transport {
            repository: "repo".into(),
            status_ref: status_ref.map(str::to_owned),
            source: TransportError::Http {
                url: "http://repo.example.org/deposit".into(),
                status: 400,
                body: "bad package".into(),
            },
        }
    }

    #[rstest]
    #[case(unreachable(), true, DepositStatus::Retry)]
    #[case(unreachable(), false, DepositStatus::Failed)]
    #[case(rejected(None), true, DepositStatus::Failed)]
    #[case(DepositError::UnknownRepository { key: "x".into() }, true, DepositStatus::Failed)]
    fn classification(#[case] err: DepositError, #[case] retry: bool, #[case] expected: DepositStatus) {
        assert_eq!(handler(retry).1.classify(&err), expected);
    }

    #[test_log::test(tokio::test)]
    async fn records_failure_and_status_ref() {
        let (store, handler) = handler(true);
        let deposit = store
            .create_object(Deposit::new(EntityId::new("s"), EntityId::new("r")))
            .await
            .unwrap();

        let status = handler
            .handle(&deposit, "repo", &rejected(Some("wsi:3")))
            .await
            .unwrap();
        assert_eq!(status, Some(DepositStatus::Failed));

        let stored: Deposit = store.get_object(&deposit.id).await.unwrap();
        assert_eq!(stored.deposit_status, Some(DepositStatus::Failed));
        assert_eq!(stored.deposit_status_ref.as_deref(), Some("wsi:3"));
    }

    #[test_log::test(tokio::test)]
    async fn terminal_deposits_are_left_alone() {
        let (store, handler) = handler(true);
        let mut deposit = Deposit::new(EntityId::new("s"), EntityId::new("r"));
        deposit.deposit_status = Some(DepositStatus::Accepted);
        let deposit = store.create_object(deposit).await.unwrap();
        let updates = store.update_count();

        let status = handler.handle(&deposit, "repo", &unreachable()).await.unwrap();
        assert_eq!(status, Some(DepositStatus::Accepted));
        assert_eq!(store.update_count(), updates);
    }
}
