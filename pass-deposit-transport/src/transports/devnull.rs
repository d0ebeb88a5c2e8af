// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use pass_deposit_assembler::PackageStream;
use tracing::warn;

use crate::response::{OnSuccess, TransportResponse};

/// Accepts every package without reading it.
#[derive(Debug, Clone, Default)]
pub struct DevNullTransport;

#[derive(Debug)]
pub struct DevNullSession;

impl DevNullTransport {
    pub fn open(&self) -> DevNullSession {
        DevNullSession
    }
}

impl DevNullSession {
    pub fn send(&self, package: &PackageStream) -> TransportResponse {
        warn!(submission = %package.submission().id, "depositing to devnull");
        TransportResponse::succeeded(OnSuccess::FakeHandle)
    }
}
