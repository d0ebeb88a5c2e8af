// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} status '{value}'")]
pub struct UnknownStatus {
    kind: &'static str,
    value: String,
}

/// Lifecycle of a Deposit.
///
/// ```text
///  (none) ──► SUBMITTED ──► ACCEPTED
///    │  ▲        │    └───► REJECTED
///    │  │        ▼
///    ├──┴──► FAILED ◄──► RETRY
/// ```
///
/// ACCEPTED and REJECTED are terminal. FAILED is blocked but may be
/// re-attempted by the retry job; RETRY is waiting for the repository to
/// come back.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    #[display("submitted")]
    Submitted,
    #[display("accepted")]
    Accepted,
    #[display("rejected")]
    Rejected,
    #[display("failed")]
    Failed,
    #[display("retry")]
    Retry,
}

impl DepositStatus {
    pub const ALL: [DepositStatus; 5] = [
        DepositStatus::Submitted,
        DepositStatus::Accepted,
        DepositStatus::Rejected,
        DepositStatus::Failed,
        DepositStatus::Retry,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, DepositStatus::Accepted | DepositStatus::Rejected)
    }

    /// `status` is absent or not terminal.
    pub fn is_open(status: Option<DepositStatus>) -> bool {
        !status.is_some_and(DepositStatus::is_terminal)
    }

    /// Whether a deposit may move from `from` to `to`.
    pub fn can_transition(from: Option<DepositStatus>, to: DepositStatus) -> bool {
        use DepositStatus::*;
        match from {
            None => matches!(to, Submitted | Failed | Retry),
            Some(Submitted) => matches!(to, Submitted | Accepted | Rejected | Failed | Retry),
            Some(Failed) | Some(Retry) => matches!(to, Submitted | Failed | Retry),
            Some(Accepted) | Some(Rejected) => false,
        }
    }
}

impl FromStr for DepositStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DepositStatus::ALL
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus {
                kind: "deposit",
                value: s.to_owned(),
            })
    }
}

/// Status of the artifact inside the target repository.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyStatus {
    #[display("accepted")]
    Accepted,
    #[display("in-progress")]
    InProgress,
    #[display("stalled")]
    Stalled,
    #[display("complete")]
    Complete,
    #[display("rejected")]
    Rejected,
}

impl FromStr for CopyStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use CopyStatus::*;
        [Accepted, InProgress, Stalled, Complete, Rejected]
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus {
                kind: "copy",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DepositStatus::Accepted, true)]
    #[case(DepositStatus::Rejected, true)]
    #[case(DepositStatus::Failed, false)]
    #[case(DepositStatus::Submitted, false)]
    #[case(DepositStatus::Retry, false)]
    fn terminal_states(#[case] status: DepositStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in DepositStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in DepositStatus::ALL {
                assert!(!DepositStatus::can_transition(Some(from), to), "{from} -> {to}");
            }
        }
    }

    #[rstest]
    #[case(None, DepositStatus::Submitted, true)]
    #[case(None, DepositStatus::Accepted, false)]
    #[case(Some(DepositStatus::Retry), DepositStatus::Submitted, true)]
    #[case(Some(DepositStatus::Failed), DepositStatus::Accepted, false)]
    #[case(Some(DepositStatus::Submitted), DepositStatus::Rejected, true)]
    fn transitions(
        #[case] from: Option<DepositStatus>,
        #[case] to: DepositStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(DepositStatus::can_transition(from, to), allowed);
    }

    #[test]
    fn parse_statuses() {
        assert_eq!("ACCEPTED".parse::<DepositStatus>().unwrap(), DepositStatus::Accepted);
        assert_eq!("in-progress".parse::<CopyStatus>().unwrap(), CopyStatus::InProgress);
        assert_eq!(
            "archived".parse::<DepositStatus>().unwrap_err().to_string(),
            "unknown deposit status 'archived'"
        );
    }
}
