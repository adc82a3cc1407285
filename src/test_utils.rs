//! Test utilities for common test setup.
//!
//! This module provides shared test helpers used across multiple test modules.

#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(test)]
/// What: Provide a process-wide mutex serializing tests that mutate the
/// environment (`HOME`, `XDG_*`).
///
/// Inputs: None
///
/// Output: Reference to the shared lock; poisoned locks are recovered by
/// callers via `unwrap_or_else(PoisonError::into_inner)`.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}
