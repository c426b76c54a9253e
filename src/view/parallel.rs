/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The short-circuit parallel driver (§4.2, §5): turns "evaluate a boolean task
//! over each element of a view" into a pool-bounded set of worker threads.

use crate::config::ProverConfig;
use crate::error::ProverError;
use crate::view::View;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Which absorbing Boolean value and combining operator a driver run uses (§4.2).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// `for_all`: accumulator starts `true`, combines by AND, short-circuits on `false`.
    All,
    /// `for_any`: accumulator starts `false`, combines by OR, short-circuits on `true`.
    Any,
}

impl Mode {
    const fn absorbing(self) -> bool {
        matches!(self, Self::Any)
    }
}

thread_local! {
    /// Whether the current thread already occupies a pool slot (it was spawned
    /// by an ancestor `run_parallel` call). The top-level call to `prove` never
    /// holds one. See §5: "decrements the counter for the calling thread...
    /// before spawning children, and re-increments on return".
    static IS_WORKER: Cell<bool> = const { Cell::new(false) };
}

/// Run `task` over every element of `view`, short-circuiting per `mode` (§4.2).
///
/// # Errors
/// Returns the first error captured from any task (including a task that
/// panicked, surfaced as [`ProverError::Thread`]) once every already-started
/// task has been joined.
pub fn run_parallel<T, F>(
    view: &dyn View<Item = T>,
    config: &ProverConfig,
    mode: Mode,
    task: F,
) -> Result<bool, ProverError>
where
    T: Clone + Send + Sync,
    F: Fn(T) -> Result<bool, ProverError> + Send + Sync,
{
    let n = view.size();
    let absorbing = mode.absorbing();
    if n == 0 {
        return Ok(!absorbing);
    }

    let accumulator = AtomicBool::new(!absorbing);
    let decided = AtomicBool::new(false);
    let first_error: Mutex<Option<ProverError>> = Mutex::new(None);
    let pool = &config.pool;

    // This thread is about to spawn children and block on them: release its
    // own slot first so deep recursion can't deadlock against a small cap.
    let was_worker = IS_WORKER.with(Cell::get);
    if was_worker {
        pool.release();
    }

    std::thread::scope(|scope| {
        for index in 0..n {
            if decided.load(Ordering::SeqCst) || pool.cancellation().is_cancelled() {
                break;
            }
            let item = match view.get(index) {
                Ok(item) => item,
                Err(err) => {
                    let mut guard = first_error.lock().unwrap_or_else(|e| e.into_inner());
                    guard.get_or_insert(err);
                    decided.store(true, Ordering::SeqCst);
                    break;
                }
            };
            pool.acquire();
            let task = &task;
            let accumulator = &accumulator;
            let decided = &decided;
            let first_error = &first_error;
            scope.spawn(move || {
                IS_WORKER.with(|w| w.set(true));
                let outcome =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task(item)));
                pool.release();
                match outcome {
                    Ok(Ok(value)) => {
                        if mode == Mode::All {
                            accumulator.fetch_and(value, Ordering::SeqCst);
                        } else {
                            accumulator.fetch_or(value, Ordering::SeqCst);
                        }
                        if value == absorbing {
                            decided.store(true, Ordering::SeqCst);
                        }
                    }
                    Ok(Err(err)) => {
                        let mut guard = first_error.lock().unwrap_or_else(|e| e.into_inner());
                        guard.get_or_insert(err);
                        decided.store(true, Ordering::SeqCst);
                    }
                    Err(panic) => {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| (*s).to_owned())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "task panicked".to_owned());
                        let mut guard = first_error.lock().unwrap_or_else(|e| e.into_inner());
                        guard.get_or_insert(ProverError::Thread(message));
                        decided.store(true, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    if was_worker {
        pool.acquire();
    }

    if let Some(err) = first_error.into_inner().unwrap_or_else(|e| e.into_inner()) {
        return Err(err);
    }
    Ok(accumulator.load(Ordering::SeqCst))
}

/// `for_all`: every element's task must return `true`.
///
/// # Errors
/// See [`run_parallel`].
pub fn for_all<T, F>(view: &dyn View<Item = T>, config: &ProverConfig, task: F) -> Result<bool, ProverError>
where
    T: Clone + Send + Sync,
    F: Fn(T) -> Result<bool, ProverError> + Send + Sync,
{
    run_parallel(view, config, Mode::All, task)
}

/// `for_any`: some element's task must return `true`.
///
/// # Errors
/// See [`run_parallel`].
pub fn for_any<T, F>(view: &dyn View<Item = T>, config: &ProverConfig, task: F) -> Result<bool, ProverError>
where
    T: Clone + Send + Sync,
    F: Fn(T) -> Result<bool, ProverError> + Send + Sync,
{
    run_parallel(view, config, Mode::Any, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CancellationToken;
    use crate::view::Unfold;
    use std::sync::Arc;

    fn config_with_cap(cap: usize) -> ProverConfig {
        ProverConfig::new(cap, CancellationToken::new())
    }

    #[test]
    fn for_all_true_when_every_task_true() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![1, 2, 3]));
        let config = config_with_cap(4);
        assert!(for_all(view.as_ref(), &config, |x| Ok(x > 0)).unwrap());
    }

    #[test]
    fn for_all_false_when_any_task_false() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![1, -2, 3]));
        let config = config_with_cap(4);
        assert!(!for_all(view.as_ref(), &config, |x| Ok(x > 0)).unwrap());
    }

    #[test]
    fn for_any_true_when_some_task_true() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![-1, -2, 3]));
        let config = config_with_cap(4);
        assert!(for_any(view.as_ref(), &config, |x| Ok(x > 0)).unwrap());
    }

    #[test]
    fn for_any_false_when_every_task_false() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![-1, -2, -3]));
        let config = config_with_cap(4);
        assert!(!for_any(view.as_ref(), &config, |x| Ok(x > 0)).unwrap());
    }

    #[test]
    fn empty_for_all_is_true() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(Vec::new()));
        let config = config_with_cap(4);
        assert!(for_all(view.as_ref(), &config, |x| Ok(x > 0)).unwrap());
    }

    #[test]
    fn empty_for_any_is_false() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(Vec::new()));
        let config = config_with_cap(4);
        assert!(!for_any(view.as_ref(), &config, |x| Ok(x > 0)).unwrap());
    }

    #[test]
    fn error_propagates_after_join() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![1, 2, 3]));
        let config = config_with_cap(4);
        let result = for_all(view.as_ref(), &config, |x| {
            if x == 2 {
                Err(ProverError::Runtime("boom".to_owned()))
            } else {
                Ok(true)
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn bounded_pool_does_not_deadlock_on_nested_recursion() {
        let view: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![1, 2, 3, 4]));
        let config = config_with_cap(1);
        let result = for_all(view.as_ref(), &config, |x| {
            let inner: Arc<dyn View<Item = i32>> = Arc::new(Unfold::from_vec(vec![x, x]));
            for_all(inner.as_ref(), &config, |y| Ok(y == x))
        });
        assert!(result.unwrap());
    }
}
