// src/lock.rs

use std::sync::{Mutex, MutexGuard};

/// Acquire mutex guard, ignoring poisoning.
///
/// Every mutex in this crate guards plain bookkeeping (handler maps,
/// connection state, pending calls) that stays consistent even if a
/// holder panicked, so the poisoned guard is used as is.
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
