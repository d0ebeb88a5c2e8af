// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Compare-and-swap updates of versioned records.
//!
//! [`CriticalRepositoryInteraction::perform_critical`] is the only place in
//! the deposit services that writes a mutated record back to the store. One
//! attempt is:
//!
//! 1. read the record,
//! 2. check the precondition (a failed check ends the interaction without
//!    writing and is not an error),
//! 3. apply the critical function to a copy,
//! 4. check the postcondition on the copy (a failed check is fatal and the
//!    copy is never written),
//! 5. write the copy back carrying the version that was read.
//!
//! A [`WriteOutcome::Conflict`] restarts the cycle from step 1 until the
//! configured number of attempts runs out.

use std::error::Error as StdError;
use std::sync::Arc;

use pass_deposit_model::{Entity, EntityId, EntityKind};
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::client::{PassClient, WriteOutcome};
use crate::error::StoreError;

/// Attempts made before giving up on a contended record.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Error, Debug)]
pub enum CriticalError {
    #[error("{kind} {id}: postcondition not met after applying the update")]
    PostconditionFailed { kind: EntityKind, id: EntityId },

    #[error("{kind} {id}: could not apply update after {attempts} attempts")]
    AttemptsExhausted {
        kind: EntityKind,
        id: EntityId,
        attempts: usize,
    },

    #[error("{kind} {id}: {source}")]
    Critical {
        kind: EntityKind,
        id: EntityId,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CriticalError {
    /// The error raised by the caller's critical function, if that is what
    /// ended the interaction.
    pub fn critical_source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            CriticalError::Critical { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// How an interaction that did not error ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CriticalOutcome<R> {
    /// The update was written; carries the critical function's result.
    Applied(R),
    /// The precondition rejected the record; nothing was written.
    PreconditionUnmet,
}

#[derive(Debug, Clone)]
pub struct CriticalResult<T, R> {
    /// The record as read on the final attempt.
    pub original: T,
    /// The record as written, re-read when a fresh value was requested.
    /// Equal to `original` when the precondition was not met.
    pub resource: T,
    pub outcome: CriticalOutcome<R>,
    pub attempts: usize,
}

impl<T, R> CriticalResult<T, R> {
    pub fn applied(&self) -> bool {
        matches!(self.outcome, CriticalOutcome::Applied(_))
    }

    pub fn result(&self) -> Option<&R> {
        match &self.outcome {
            CriticalOutcome::Applied(r) => Some(r),
            CriticalOutcome::PreconditionUnmet => None,
        }
    }
}

/// Runs critical updates against one store.
pub struct CriticalRepositoryInteraction<S> {
    client: Arc<S>,
    max_attempts: usize,
}

impl<S> Clone for CriticalRepositoryInteraction<S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S: PassClient> CriticalRepositoryInteraction<S> {
    pub fn new(client: Arc<S>) -> Self {
        Self::with_max_attempts(client, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(client: Arc<S>, max_attempts: usize) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn client(&self) -> &Arc<S> {
        &self.client
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Reads the record `id`, mutates it with `critical` and writes it back,
    /// retrying on conflicting writes.
    ///
    /// `precondition` sees the record as read; `postcondition` sees the
    /// mutated copy and the critical function's result. With `fresh` set the
    /// returned resource is re-read after the write so it reflects any
    /// server-assigned fields.
    pub async fn perform_critical<T, R, E, Pre, Post, F>(
        &self,
        id: &EntityId,
        precondition: Pre,
        postcondition: Post,
        mut critical: F,
        fresh: bool,
    ) -> Result<CriticalResult<T, R>, CriticalError>
    where
        T: Entity,
        R: Send,
        E: Into<BoxError>,
        Pre: Fn(&T) -> bool + Send,
        Post: Fn(&T, &R) -> bool + Send,
        F: FnMut(&mut T) -> Result<R, E> + Send,
    {
        for attempt in 1..=self.max_attempts {
            let original: T = self.client.get_object(id).await?;
            if !precondition(&original) {
                debug!(kind = %T::KIND, %id, attempt, "precondition not met, skipping update");
                return Ok(CriticalResult {
                    resource: original.clone(),
                    original,
                    outcome: CriticalOutcome::PreconditionUnmet,
                    attempts: attempt,
                });
            }

            let mut candidate = original.clone();
            let result = critical(&mut candidate).map_err(|e| CriticalError::Critical {
                kind: T::KIND,
                id: id.clone(),
                source: e.into(),
            })?;

            if !postcondition(&candidate, &result) {
                error!(
                    kind = %T::KIND,
                    %id,
                    candidate = ?candidate,
                    "postcondition not met, refusing to write update"
                );
                return Err(CriticalError::PostconditionFailed {
                    kind: T::KIND,
                    id: id.clone(),
                });
            }

            match self.client.update_object(candidate).await? {
                WriteOutcome::Written(written) => {
                    trace!(kind = %T::KIND, %id, version = %written.version(), attempt, "update written");
                    let resource = if fresh {
                        self.client.get_object(id).await?
                    } else {
                        written
                    };
                    return Ok(CriticalResult {
                        original,
                        resource,
                        outcome: CriticalOutcome::Applied(result),
                        attempts: attempt,
                    });
                }
                WriteOutcome::Conflict { current } => {
                    debug!(
                        kind = %T::KIND,
                        %id,
                        attempt,
                        read = %original.version(),
                        %current,
                        "conflicting write, retrying"
                    );
                }
            }
        }

        error!(kind = %T::KIND, %id, attempts = self.max_attempts, "giving up on contended update");
        Err(CriticalError::AttemptsExhausted {
            kind: T::KIND,
            id: id.clone(),
            attempts: self.max_attempts,
        })
    }
}
