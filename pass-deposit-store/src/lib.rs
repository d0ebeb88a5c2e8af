// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Access to the shared entity store.
//!
//! The store itself is external; this crate defines the capability the
//! deposit services consume ([`PassClient`]), the filter language used to
//! select records, and the critical update protocol through which every
//! record mutation is made.

mod client;
pub mod critical;
mod error;
pub mod filter;
pub mod memory;

pub use client::{BinaryReader, Page, PassClient, Selector, WriteOutcome};
pub use critical::{
    CriticalError, CriticalOutcome, CriticalRepositoryInteraction, CriticalResult,
};
pub use error::{IoErrorContext, Result, StoreError};
pub use filter::Filter;
pub use memory::MemoryStore;
