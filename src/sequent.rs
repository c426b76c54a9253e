/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! A two-sided sequent Γ ⊢ Δ and the heuristics guiding proof search order (§4.4, §4.6).

use crate::config::ProverConfig;
use crate::equality::EqualityCache;
use crate::error::ProverError;
use crate::formula::Formula;
use crate::view::{DynView, Unfold, View};
use std::sync::Arc;

/// Which side of the turnstile a tagged formula came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Gamma,
    Delta,
}

impl Side {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Gamma => "Gamma",
            Self::Delta => "Delta",
        }
    }
}

/// Pairs every element of an underlying view with a fixed [`Side`] tag, so a
/// `Concat` of a tagged Γ and a tagged Δ can be sorted and iterated as one
/// view while `breakdown` still knows which side each formula came from.
pub(crate) struct Tagged {
    inner: DynView<Arc<Formula>>,
    side: Side,
}

impl Tagged {
    pub(crate) fn new(inner: DynView<Arc<Formula>>, side: Side) -> Self {
        Self { inner, side }
    }
}

impl View for Tagged {
    type Item = (Side, Arc<Formula>);
    fn size(&self) -> usize {
        self.inner.size()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        Ok((self.side, self.inner.get(index)?))
    }
}

/// Cheap pairs first: `(|p|+|q|)·(1+||p|−|q||)`, used to order the initial-sequent
/// axiom's Cartesian search (§4.4, step 2).
pub(crate) fn guide_equal(p: &Arc<Formula>, q: &Arc<Formula>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let (a, b) = (p.total_size() as f64, q.total_size() as f64);
    (a + b) * (1.0 + (a - b).abs())
}

/// Breakdown-ordering key for a formula known to sit on Γ: `|f|`.
pub(crate) fn guide_negative(f: &Arc<Formula>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let size = f.total_size() as f64;
    size
}

/// Breakdown-ordering key for a formula known to sit on Δ: `|f|`.
pub(crate) fn guide_positive(f: &Arc<Formula>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let size = f.total_size() as f64;
    size
}

/// A two-sided sequent. Owns a fresh [`EqualityCache`] when built via [`Self::new`]
/// (top-level); sub-sequents constructed during search share the top-level
/// cache instead (§4.6), so equalities proved in one branch are visible to
/// sibling and later branches of the same proof attempt.
pub struct Sequent {
    pub(crate) gamma: DynView<Arc<Formula>>,
    pub(crate) delta: DynView<Arc<Formula>>,
    pub(crate) cache: Arc<EqualityCache>,
}

impl Sequent {
    /// Build a top-level sequent over owned formula sequences, with a fresh cache.
    #[must_use]
    pub fn new(gamma: Vec<Arc<Formula>>, delta: Vec<Arc<Formula>>) -> Self {
        Self {
            gamma: Arc::new(Unfold::from_vec(gamma)),
            delta: Arc::new(Unfold::from_vec(delta)),
            cache: Arc::new(EqualityCache::new()),
        }
    }

    /// Attempt to prove this sequent, short-circuited per §4.4.
    ///
    /// # Errors
    /// Propagates any [`ProverError`] raised during search (view/index errors,
    /// exhausted transaction retries, an unsupported connective, or a
    /// propagated worker-thread failure).
    pub fn prove(&self, config: &ProverConfig) -> Result<bool, ProverError> {
        crate::search::sub_prove(
            Arc::clone(&self.gamma),
            Arc::clone(&self.delta),
            &self.cache,
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::atom;

    #[test]
    fn guide_equal_prefers_small_pairs_over_large_ones() {
        let small = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let c = Arc::new(atom("c"));
        let big = Arc::new(crate::formula::and([b, c]));
        assert!(guide_equal(&small, &small) < guide_equal(&big, &big));
    }

    #[test]
    fn guide_negative_and_guide_positive_agree_on_size() {
        let f = Arc::new(atom("a"));
        assert_eq!(guide_negative(&f), guide_positive(&f));
    }
}
