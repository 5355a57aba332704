//! Locking helper shared by the synchronous state holders.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, taking the data over if a previous holder panicked.
///
/// Guarded state is only ever replaced whole or updated by single map
/// operations, so it is still consistent after a poisoning panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
