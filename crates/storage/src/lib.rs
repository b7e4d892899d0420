// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmdx-storage: persisted cache entries and the audit log

mod audit;
mod cache_store;

pub use audit::{AuditError, AuditLog, AuditRecord};
pub use cache_store::{CacheStore, StoreError, StoredEntry};
