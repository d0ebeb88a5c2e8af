// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Where a deposit attempt leaves the deposit.
//!
//! A single attempt can only ever produce SUBMITTED, FAILED or RETRY.
//! ACCEPTED and REJECTED are reached through on-success updates or
//! statement reconciliation afterwards.

use pass_deposit_model::{CopyStatus, DepositStatus};

/// Whether the repository passed the connectivity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Up,
    Down,
}

/// What the send produced, had it been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    Success,
    /// The repository refused the package or its metadata.
    ContentError,
    /// Anything else failed on the way: packaging, session set-up, I/O.
    Exception,
}

/// The status an attempt lands on.
pub fn attempt_status(
    connectivity: Connectivity,
    send: SendResult,
    retry_enabled: bool,
) -> DepositStatus {
    match (connectivity, send) {
        (Connectivity::Down, _) if retry_enabled => DepositStatus::Retry,
        (Connectivity::Down, _) => DepositStatus::Failed,
        (Connectivity::Up, SendResult::Success) => DepositStatus::Submitted,
        (Connectivity::Up, SendResult::ContentError | SendResult::Exception) => {
            DepositStatus::Failed
        }
    }
}

/// Copy status matching a reconciled terminal deposit status.
pub fn copy_status_for(status: DepositStatus) -> Option<CopyStatus> {
    match status {
        DepositStatus::Accepted => Some(CopyStatus::Complete),
        DepositStatus::Rejected => Some(CopyStatus::Rejected),
        _ => None,
    }
}
