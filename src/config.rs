/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Explicit, non-global configuration for a proof attempt (§5, §9 REDESIGN FLAGS).
//!
//! The source carries `max_thread_count` and a fatal-signal-driven cancellation
//! flag as process-wide globals. This port threads both through `prove` as
//! ordinary values instead, per the design note recommending exactly that.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Interval at which an admission-wait wakes to re-poll the cancellation token,
/// matching the source's ≈4s periodic wake (§5).
const ADMISSION_POLL: Duration = Duration::from_secs(4);

/// A flag a caller may flip from any thread (a signal handler, a watchdog, a
/// test) to cooperatively cancel an in-flight proof attempt.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that starts out not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Flip this token and every clone of it to the cancelled state.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether this token (or any clone) has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared admission state for the parallel driver's thread-count cap (§5).
#[derive(Debug)]
pub(crate) struct PoolState {
    max_thread_count: usize,
    cur_thread_count: AtomicUsize,
    admission: Mutex<()>,
    condvar: Condvar,
    cancellation: CancellationToken,
}

impl PoolState {
    fn new(max_thread_count: usize, cancellation: CancellationToken) -> Self {
        Self {
            max_thread_count,
            cur_thread_count: AtomicUsize::new(0),
            admission: Mutex::new(()),
            condvar: Condvar::new(),
            cancellation,
        }
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Block until there is room for one more worker thread under the cap, or
    /// until cancellation is observed. Zero means unlimited (never blocks).
    pub(crate) fn acquire(&self) {
        if self.max_thread_count == 0 {
            self.cur_thread_count.fetch_add(1, Ordering::SeqCst);
            return;
        }
        let mut guard = self.admission.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if self.cancellation.is_cancelled() {
                // Let the caller observe cancellation rather than block forever.
                self.cur_thread_count.fetch_add(1, Ordering::SeqCst);
                return;
            }
            if self.cur_thread_count.load(Ordering::SeqCst) < self.max_thread_count {
                self.cur_thread_count.fetch_add(1, Ordering::SeqCst);
                return;
            }
            let (next_guard, _timeout) = self
                .condvar
                .wait_timeout(guard, ADMISSION_POLL)
                .unwrap_or_else(|e| e.into_inner());
            guard = next_guard;
        }
    }

    /// Release a slot acquired via `acquire`, waking any admission-waiters.
    pub(crate) fn release(&self) {
        self.cur_thread_count.fetch_sub(1, Ordering::SeqCst);
        self.condvar.notify_all();
    }
}

/// Configuration for one top-level [`crate::search::prove`] attempt, carried
/// explicitly (never as a process global) through every recursive call.
#[derive(Clone, Debug)]
pub struct ProverConfig {
    pub(crate) pool: Arc<PoolState>,
}

impl ProverConfig {
    /// Build a configuration with an explicit thread cap (`0` means unlimited)
    /// and cancellation token.
    #[must_use]
    pub fn new(max_thread_count: usize, cancellation: CancellationToken) -> Self {
        Self {
            pool: Arc::new(PoolState::new(max_thread_count, cancellation)),
        }
    }

    /// The cancellation token this configuration was built with.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        self.pool.cancellation()
    }

    /// The configured thread cap (`0` means unlimited).
    #[must_use]
    pub fn max_thread_count(&self) -> usize {
        self.pool.max_thread_count
    }
}

impl Default for ProverConfig {
    /// A nonzero cap equal to hardware concurrency, matching the documented
    /// external default (§6).
    fn default() -> Self {
        let cap = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(cap, CancellationToken::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thread_count_is_never_zero() {
        assert!(ProverConfig::default().max_thread_count() > 0);
    }

    #[test]
    fn cancellation_token_is_shared_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn unlimited_pool_never_blocks() {
        let pool = PoolState::new(0, CancellationToken::new());
        for _ in 0..100 {
            pool.acquire();
        }
        for _ in 0..100 {
            pool.release();
        }
    }
}
