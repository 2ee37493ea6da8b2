use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// What a `refresh()` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// State was re-read from git
    Refreshed,
    /// Another refresh of the same state was in flight; nothing was done
    Skipped,
}

impl RefreshOutcome {
    pub fn was_skipped(self) -> bool {
        self == RefreshOutcome::Skipped
    }
}

/// At-most-one-in-flight guard.
///
/// A second caller does not wait: `try_acquire` returns `None` and the caller
/// drops its request.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    busy: AtomicBool,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or `None` if someone else holds it
    pub fn try_acquire(&self) -> Option<RefreshTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshTicket { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held while a refresh runs; releases the guard on drop, including on error paths
#[derive(Debug)]
pub struct RefreshTicket<'a> {
    guard: &'a RefreshGuard,
}

impl Drop for RefreshTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

/// Parsed state readable while a refresh builds its replacement.
///
/// Readers always see a complete value: refreshes parse into a fresh value
/// and swap it in.
#[derive(Debug, Default)]
pub(crate) struct StateCell<T> {
    inner: RwLock<T>,
}

impl<T: Clone> StateCell<T> {
    pub(crate) fn get(&self) -> T {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn replace(&self, value: T) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}
