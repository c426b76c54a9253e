/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The typed error taxonomy every fallible operation in this crate surfaces through.

/// Everything that can go wrong inside a proof attempt.
///
/// `Ok(false)` from [`crate::search::prove`] means "not derivable"; any variant here
/// means "the prover could not answer because something went wrong inside" (§7).
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// Violated indexing contract on a view: `index` was out of `[0, size)`.
    #[error("index {index} out of bounds for a view of size {size} ({context})")]
    Index {
        /// The index that was requested.
        index: usize,
        /// The view's reported size.
        size: usize,
        /// What was being indexed, for diagnostics.
        context: &'static str,
    },

    /// Two views were combined in a way that requires matching sizes (e.g. `Zip`)
    /// but didn't have them.
    #[error("cannot combine views of size {left} and {right} ({context})")]
    Iterator {
        /// Size of the left-hand view.
        left: usize,
        /// Size of the right-hand view.
        right: usize,
        /// What combinator raised the mismatch.
        context: &'static str,
    },

    /// An internal invariant was violated: a "should not be here" path.
    #[error("internal invariant violated: {0}")]
    Runtime(String),

    /// A task spawned by the parallel driver panicked or returned an error.
    #[error("a parallel task failed: {0}")]
    Thread(String),

    /// A locking discipline was violated (upgrading an already-upgraded read
    /// lock, or downgrading an inactive write lock).
    #[error("locking discipline violated: {0}")]
    Locking(&'static str),

    /// A transaction's validator rejected a commit and the caller's retry
    /// budget was exhausted.
    #[error("transaction rejected after {attempts} attempt(s)")]
    Transaction {
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// A debug-only invariant check failed, carrying its source location.
    #[error("assertion failed at {file}:{line}: {message}")]
    Assertion {
        /// The message describing what was expected.
        message: String,
        /// Source file of the failed assertion.
        file: &'static str,
        /// Source line of the failed assertion.
        line: u32,
    },

    /// `breakdown` was asked to decompose a relation or quantifier formula it
    /// has no propositional rule for (§4.4a).
    #[error("no breakdown rule for connective {symbol} on the {side} side")]
    UnsupportedConnective {
        /// Display name of the offending symbol.
        symbol: String,
        /// Which side of the turnstile it appeared on.
        side: &'static str,
    },
}

/// Raise a debug-only [`ProverError::Assertion`] if `cond` is false. A no-op in
/// release builds, matching the source's `#[cfg_attr(any(test, debug_assertions), ...)]`
/// convention of tightening checks outside release.
#[macro_export]
macro_rules! prover_assert {
    ($cond:expr, $($arg:tt)*) => {
        if cfg!(any(test, debug_assertions)) && !($cond) {
            return Err($crate::error::ProverError::Assertion {
                message: format!($($arg)*),
                file: file!(),
                line: line!(),
            });
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_displays_non_empty() {
        let errs: Vec<ProverError> = vec![
            ProverError::Index {
                index: 3,
                size: 2,
                context: "test",
            },
            ProverError::Iterator {
                left: 1,
                right: 2,
                context: "test",
            },
            ProverError::Runtime("bug".to_owned()),
            ProverError::Thread("panic".to_owned()),
            ProverError::Locking("double upgrade"),
            ProverError::Transaction { attempts: 4 },
            ProverError::Assertion {
                message: "x".to_owned(),
                file: "f.rs",
                line: 1,
            },
            ProverError::UnsupportedConnective {
                symbol: "ForAll".to_owned(),
                side: "Gamma",
            },
        ];
        for err in errs {
            assert!(!err.to_string().is_empty());
        }
    }
}
