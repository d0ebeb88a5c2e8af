// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::convert::Infallible;
use std::sync::Arc;

use pass_deposit_model::{Deposit, DepositStatus, EntityId};
use pass_deposit_store::{
    CriticalError, CriticalOutcome, CriticalRepositoryInteraction, MemoryStore, PassClient,
};
use proptest::prelude::*;

async fn seeded(status: Option<DepositStatus>) -> (Arc<MemoryStore>, EntityId) {
    let store = Arc::new(MemoryStore::new());
    let mut deposit = Deposit::new("submission-1".into(), "repository-1".into());
    deposit.deposit_status = status;
    let deposit = store.create_object(deposit).await.unwrap();
    (store, deposit.id)
}

fn submit(deposit: &mut Deposit) -> Result<DepositStatus, Infallible> {
    deposit.deposit_status = Some(DepositStatus::Submitted);
    Ok(DepositStatus::Submitted)
}

#[test_log::test(tokio::test)]
async fn applies_update() {
    let (store, id) = seeded(None).await;
    let cri = CriticalRepositoryInteraction::new(Arc::clone(&store));

    let result = cri
        .perform_critical(
            &id,
            |d: &Deposit| !d.is_terminal(),
            |d: &Deposit, _: &DepositStatus| d.deposit_status == Some(DepositStatus::Submitted),
            submit,
            false,
        )
        .await
        .unwrap();

    assert!(result.applied());
    assert_eq!(result.original.deposit_status, None);
    assert_eq!(result.resource.deposit_status, Some(DepositStatus::Submitted));
    assert_eq!(result.result(), Some(&DepositStatus::Submitted));
    assert_eq!(result.attempts, 1);

    let stored: Deposit = store.get_object(&id).await.unwrap();
    assert_eq!(stored.deposit_status, Some(DepositStatus::Submitted));
}

#[test_log::test(tokio::test)]
async fn precondition_unmet_is_not_an_error() {
    let (store, id) = seeded(Some(DepositStatus::Accepted)).await;
    let cri = CriticalRepositoryInteraction::new(Arc::clone(&store));

    let result = cri
        .perform_critical(
            &id,
            |d: &Deposit| !d.is_terminal(),
            |_: &Deposit, _: &DepositStatus| true,
            submit,
            false,
        )
        .await
        .unwrap();

    assert_eq!(result.outcome, CriticalOutcome::PreconditionUnmet);
    assert_eq!(result.resource, result.original);
    assert_eq!(store.update_count(), 0);
}

#[test_log::test(tokio::test)]
async fn postcondition_failure_never_writes() {
    let (store, id) = seeded(None).await;
    let cri = CriticalRepositoryInteraction::new(Arc::clone(&store));

    let err = cri
        .perform_critical(
            &id,
            |_: &Deposit| true,
            |d: &Deposit, _: &DepositStatus| d.deposit_status == Some(DepositStatus::Accepted),
            submit,
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CriticalError::PostconditionFailed { .. }));
    assert_eq!(store.update_count(), 0);
    let stored: Deposit = store.get_object(&id).await.unwrap();
    assert_eq!(stored.deposit_status, None);
}

#[test_log::test(tokio::test)]
async fn critical_function_error_is_surfaced() {
    let (store, id) = seeded(None).await;
    let cri = CriticalRepositoryInteraction::new(Arc::clone(&store));

    let err = cri
        .perform_critical(
            &id,
            |_: &Deposit| true,
            |_: &Deposit, _: &()| true,
            |_: &mut Deposit| Err::<(), _>("status document could not be mapped"),
            false,
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.critical_source().map(ToString::to_string).as_deref(),
        Some("status document could not be mapped")
    );
    assert_eq!(store.update_count(), 0);
}

#[test_log::test(tokio::test)]
async fn missing_record_is_a_store_error() {
    let store = Arc::new(MemoryStore::new());
    let cri = CriticalRepositoryInteraction::new(store);

    let err = cri
        .perform_critical(
            &EntityId::new("deposit-404"),
            |_: &Deposit| true,
            |_: &Deposit, _: &DepositStatus| true,
            submit,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CriticalError::Store(_)));
}

#[test_log::test(tokio::test)]
async fn fresh_value_is_reread() {
    let (store, id) = seeded(None).await;
    let cri = CriticalRepositoryInteraction::new(Arc::clone(&store));

    let result = cri
        .perform_critical(
            &id,
            |_: &Deposit| true,
            |_: &Deposit, _: &DepositStatus| true,
            submit,
            true,
        )
        .await
        .unwrap();
    let stored: Deposit = store.get_object(&id).await.unwrap();
    assert_eq!(result.resource, stored);
}

async fn run_with_conflicts(conflicts: usize, max_attempts: usize) -> Result<usize, CriticalError> {
    let (store, id) = seeded(None).await;
    store.inject_conflicts(conflicts);
    let cri = CriticalRepositoryInteraction::with_max_attempts(Arc::clone(&store), max_attempts);
    cri.perform_critical(
        &id,
        |_: &Deposit| true,
        |d: &Deposit, _: &DepositStatus| d.deposit_status == Some(DepositStatus::Submitted),
        submit,
        false,
    )
    .await
    .map(|result| result.attempts)
}

#[test_log::test(tokio::test)]
async fn retries_until_conflicts_clear() {
    assert_eq!(run_with_conflicts(3, 4).await.unwrap(), 4);
}

#[test_log::test(tokio::test)]
async fn gives_up_after_max_attempts() {
    let err = run_with_conflicts(4, 4).await.unwrap_err();
    assert!(matches!(
        err,
        CriticalError::AttemptsExhausted { attempts: 4, .. }
    ));
}

proptest! {
    #[test]
    fn retry_bound_holds(conflicts in 0usize..8, max_attempts in 1usize..8) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let outcome = runtime.block_on(run_with_conflicts(conflicts, max_attempts));
        if conflicts < max_attempts {
            prop_assert_eq!(outcome.unwrap(), conflicts + 1);
        } else {
            let exhausted = matches!(outcome, Err(CriticalError::AttemptsExhausted { .. }));
            prop_assert!(exhausted);
        }
    }
}

#[test_log::test(tokio::test)]
async fn concurrent_writers_all_land() {
    let (store, id) = seeded(None).await;
    let cri = CriticalRepositoryInteraction::with_max_attempts(Arc::clone(&store), 64);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let cri = cri.clone();
            let id = id.clone();
            tokio::spawn(async move {
                cri.perform_critical(
                    &id,
                    |_: &Deposit| true,
                    |_: &Deposit, _: &()| true,
                    move |d: &mut Deposit| {
                        let refs = d.deposit_status_ref.take().unwrap_or_default();
                        d.deposit_status_ref = Some(format!("{refs}{i}"));
                        Ok::<_, Infallible>(())
                    },
                    false,
                )
                .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored: Deposit = store.get_object(&id).await.unwrap();
    let mut digits: Vec<char> = stored.deposit_status_ref.unwrap().chars().collect();
    digits.sort_unstable();
    assert_eq!(digits, vec!['0', '1', '2', '3', '4', '5', '6', '7']);
}
