/*!
 * Scoped acquisition of externally owned locks.
 *
 * Backends often expose a mutex as a pair of `lock()`/`unlock()` calls rather
 * than a guard type. [`lock_guard`] brackets a scope around such a resource:
 * the returned guard releases it exactly once when dropped, whether the scope
 * ends normally, returns early, propagates an error or unwinds.
 */
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tracing::trace;

/// A resource with explicit acquire and release calls.
///
/// Implementations are not expected to be re-entrant; acquiring twice from the
/// same thread may deadlock.
pub trait Lockable {
    /// Block until the resource is held by the caller
    fn acquire(&self);

    /// Release a resource previously acquired by the caller
    fn release(&self);
}

impl<L: Lockable + ?Sized> Lockable for Arc<L> {
    fn acquire(&self) {
        (**self).acquire();
    }

    fn release(&self) {
        (**self).release();
    }
}

/// Holds a [`Lockable`] until dropped
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, L: Lockable + ?Sized> {
    lockable: &'a L,
}

impl<L: Lockable + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        self.lockable.release();
        trace!("Lock released");
    }
}

/// Acquire `lockable` and return a guard that releases it on drop
pub fn lock_guard<L: Lockable + ?Sized>(lockable: &L) -> LockGuard<'_, L> {
    lockable.acquire();
    trace!("Lock acquired");
    LockGuard { lockable }
}

/// Run `body` while holding `lockable`
pub fn with_lock<L, F, R>(lockable: &L, body: F) -> R
where
    L: Lockable + ?Sized,
    F: FnOnce() -> R,
{
    let _guard = lock_guard(lockable);
    body()
}

/// A plain binary lock with split acquire/release calls.
///
/// Useful when the acquiring and releasing code paths cannot share a guard
/// value, e.g. when the lock is handed across an FFI boundary.
#[derive(Debug, Default)]
pub struct BlockingLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl BlockingLock {
    /// Create an unlocked lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the lock is currently held
    pub fn is_held(&self) -> bool {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Lockable for BlockingLock {
    fn acquire(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
    }

    fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        self.released.notify_one();
    }
}
