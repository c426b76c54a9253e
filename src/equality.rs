/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The formula equality oracle (§4.3): a union-find cache over pointer identity,
//! hash pre-filtering, and AC-aware (associative-commutative) structural comparison.

use crate::error::ProverError;
use crate::formula::Formula;
use crate::transaction::SharedMap;
use std::sync::Arc;

/// Retry budgets (§4.3): small optimistic windows for cheap operations, a wider
/// one for the comparison that may recurse into `value_compare`, and a final
/// wide window standing in for the source's upgrade-to-exclusive-lock fallback.
const HASH_ATTEMPTS: u32 = 2;
const FIND_ATTEMPTS: u32 = 4;
const JOIN_ATTEMPTS: u32 = 4;
const EQUAL_ATTEMPTS: u32 = 6;
const EQUAL_FALLBACK_ATTEMPTS: u32 = 10;

fn retry<T>(attempts: u32, mut f: impl FnMut() -> Result<T, ProverError>) -> Result<T, ProverError> {
    let mut last_error = None;
    for _ in 0..attempts.max(1) {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or(ProverError::Transaction {
        attempts,
    }))
}

/// Caches structural hashes and a union-find partition over formula identities,
/// so two pointer-distinct but structurally equal formulae are recognized as
/// equal in amortized near-constant time after the first comparison.
#[derive(Debug, Default)]
pub struct EqualityCache {
    hashes: SharedMap<usize, u64>,
    parents: SharedMap<usize, usize>,
}

impl EqualityCache {
    /// Build an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hashes: SharedMap::new(),
            parents: SharedMap::new(),
        }
    }

    /// Memoized structural hash of `formula`, stable for the lifetime of this cache.
    ///
    /// # Errors
    /// Returns [`ProverError::Transaction`] if the retry budget is exhausted.
    pub fn hash(&self, formula: &Arc<Formula>) -> Result<u64, ProverError> {
        retry(HASH_ATTEMPTS, || self.try_hash(formula))
    }

    fn try_hash(&self, formula: &Arc<Formula>) -> Result<u64, ProverError> {
        let key = formula.identity();
        let mut txn = self.hashes.transaction();
        if let Some(cached) = txn.get(&key) {
            return Ok(cached);
        }
        let computed = self.compute_hash(formula)?;
        txn.set(key, computed);
        txn.commit()?;
        Ok(computed)
    }

    /// Structural hash, order-independent over children of AC connectives
    /// (§4.3, GLOSSARY: AC-connective), recursing through the same cache so
    /// shared subformulae are hashed only once.
    fn compute_hash(&self, formula: &Arc<Formula>) -> Result<u64, ProverError> {
        use core::hash::{Hash, Hasher};
        match formula.as_ref() {
            Formula::Connective { symbol, children } => {
                let mut child_hashes = children
                    .iter()
                    .map(|child| self.hash(child))
                    .collect::<Result<Vec<_>, _>>()?;
                if symbol.is_ac() {
                    child_hashes.sort_unstable();
                }
                let mut hasher = rustc_hash::FxHasher::default();
                symbol.name().hash(&mut hasher);
                for child_hash in child_hashes {
                    child_hash.hash(&mut hasher);
                }
                Ok(hasher.finish())
            }
            Formula::Relation { symbol, children } => {
                let mut hasher = rustc_hash::FxHasher::default();
                symbol.name().hash(&mut hasher);
                for (index, child) in children.iter().enumerate() {
                    #[allow(clippy::cast_possible_truncation)]
                    child.hash_seeded(index as u64).hash(&mut hasher);
                }
                Ok(hasher.finish())
            }
            Formula::Quantifier {
                symbol,
                variable,
                body,
            } => {
                let body_hash = self.hash(body)?;
                let mut hasher = rustc_hash::FxHasher::default();
                symbol.name().hash(&mut hasher);
                variable.hash(&mut hasher);
                body_hash.hash(&mut hasher);
                Ok(hasher.finish())
            }
        }
    }

    /// Union-find root of `key`, compressing the path it walked along the way.
    ///
    /// # Errors
    /// Returns [`ProverError::Transaction`] if the retry budget is exhausted.
    pub(crate) fn find(&self, key: usize) -> Result<usize, ProverError> {
        retry(FIND_ATTEMPTS, || self.try_find(key))
    }

    fn try_find(&self, key: usize) -> Result<usize, ProverError> {
        let mut txn = self.parents.transaction();
        let mut path = Vec::new();
        let mut cur = key;
        loop {
            match txn.get(&cur) {
                Some(parent) if parent != cur => {
                    path.push(cur);
                    cur = parent;
                }
                _ => break,
            }
        }
        let root = cur;
        for node in path {
            txn.set(node, root);
        }
        txn.commit()?;
        Ok(root)
    }

    /// Union the partitions containing `a` and `b`, lower address becomes root
    /// (a deterministic, order-independent tie-break).
    ///
    /// # Errors
    /// Returns [`ProverError::Transaction`] if the retry budget is exhausted.
    pub(crate) fn join(&self, a: usize, b: usize) -> Result<(), ProverError> {
        retry(JOIN_ATTEMPTS, || self.try_join(a, b))
    }

    fn try_join(&self, a: usize, b: usize) -> Result<(), ProverError> {
        let root_a = self.find(a)?;
        let root_b = self.find(b)?;
        if root_a == root_b {
            return Ok(());
        }
        let (child, root) = if root_a < root_b {
            (root_b, root_a)
        } else {
            (root_a, root_b)
        };
        let mut txn = self.parents.transaction();
        txn.set(child, root);
        txn.commit()
    }

    /// Whether `a` and `b` are structurally equal, AC-aware over the
    /// connectives the GLOSSARY marks as such.
    ///
    /// Checks pointer identity, then the union-find partition, then a hash
    /// pre-filter, before falling back to a full [`Self::value_compare`]. A
    /// positive comparison is cached by joining the two formulae's partitions,
    /// so a repeated comparison is O(1) afterward.
    ///
    /// # Errors
    /// Returns [`ProverError::Transaction`] if both retry tiers are exhausted.
    pub fn equal(&self, a: &Arc<Formula>, b: &Arc<Formula>) -> Result<bool, ProverError> {
        if Arc::ptr_eq(a, b) {
            return Ok(true);
        }
        match retry(EQUAL_ATTEMPTS, || self.try_equal(a, b)) {
            Ok(value) => Ok(value),
            Err(_) => retry(EQUAL_FALLBACK_ATTEMPTS, || self.try_equal(a, b)),
        }
    }

    fn try_equal(&self, a: &Arc<Formula>, b: &Arc<Formula>) -> Result<bool, ProverError> {
        let (key_a, key_b) = (a.identity(), b.identity());
        if self.find(key_a)? == self.find(key_b)? {
            return Ok(true);
        }
        if self.hash(a)? != self.hash(b)? {
            return Ok(false);
        }
        let equal = self.value_compare(a, b)?;
        if equal {
            self.join(key_a, key_b)?;
        }
        Ok(equal)
    }

    /// Structural comparison: multiset comparison of children for AC
    /// connectives, positional comparison otherwise, recursing through `equal`
    /// (and so through the same cache) for every child formula.
    ///
    /// # Errors
    /// Propagates any [`ProverError`] from a recursive `equal` call.
    fn value_compare(&self, a: &Arc<Formula>, b: &Arc<Formula>) -> Result<bool, ProverError> {
        match (a.as_ref(), b.as_ref()) {
            (
                Formula::Connective {
                    symbol: sym_a,
                    children: children_a,
                },
                Formula::Connective {
                    symbol: sym_b,
                    children: children_b,
                },
            ) => {
                if sym_a != sym_b {
                    return Ok(false);
                }
                if sym_a.is_ac() {
                    // AC connectives are idempotent (GLOSSARY: `And(a, a)` structurally
                    // equals `And(a)`), so arity need not match here.
                    self.multiset_equal(children_a, children_b)
                } else {
                    if children_a.len() != children_b.len() {
                        return Ok(false);
                    }
                    for (x, y) in children_a.iter().zip(children_b.iter()) {
                        if !self.equal(x, y)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
            }
            (
                Formula::Relation {
                    symbol: sym_a,
                    children: children_a,
                },
                Formula::Relation {
                    symbol: sym_b,
                    children: children_b,
                },
            ) => Ok(sym_a == sym_b
                && children_a.len() == children_b.len()
                && children_a
                    .iter()
                    .zip(children_b.iter())
                    .all(|(x, y)| x.identical(y))),
            (
                Formula::Quantifier {
                    symbol: sym_a,
                    variable: var_a,
                    body: body_a,
                },
                Formula::Quantifier {
                    symbol: sym_b,
                    variable: var_b,
                    body: body_b,
                },
            ) => Ok(sym_a == sym_b && var_a == var_b && self.equal(body_a, body_b)?),
            _ => Ok(false),
        }
    }

    /// Order-insensitive, idempotent comparison of two connectives' children
    /// (GLOSSARY: AC-connective): every element of `left` has an `equal`
    /// partner somewhere in `right`, and vice versa.
    ///
    /// Deliberately *not* a consuming bipartite match (each element claiming
    /// one unused partner on the other side): a consuming match enforces a
    /// same-cardinality bijection between the two sides, which both rejects
    /// the idempotent case (`And(a, a)` has no bijection onto `And(a)`) and
    /// is unsound in its own right — a naive greedy claim can fail to find a
    /// bijection that exists (e.g. `left = [p, q]`, `right = [r, s]` with
    /// `p~r`, `p~s`, `q~r` but not `q~s`: claiming `p -> r` first strands `q`
    /// with no partner, even though `p -> s, q -> r` is a valid pairing).
    /// Mutual containment avoids both problems at once: it never holds a
    /// partner hostage from another element that might also need it.
    ///
    /// # Errors
    /// Propagates any [`ProverError`] from a recursive `equal` call.
    fn multiset_equal(&self, left: &[Arc<Formula>], right: &[Arc<Formula>]) -> Result<bool, ProverError> {
        Ok(self.each_has_a_partner(left, right)? && self.each_has_a_partner(right, left)?)
    }

    /// Whether every element of `xs` has an `equal` partner somewhere in `ys`.
    fn each_has_a_partner(&self, xs: &[Arc<Formula>], ys: &[Arc<Formula>]) -> Result<bool, ProverError> {
        for x in xs {
            let mut found = false;
            for y in ys {
                if self.equal(x, y)? {
                    found = true;
                    break;
                }
            }
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{and, atom, impl_};

    #[test]
    fn pointer_identical_formulae_are_equal() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        assert!(cache.equal(&a, &a).unwrap());
    }

    #[test]
    fn ac_connective_tolerates_permutation() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let lhs = Arc::new(and([Arc::clone(&a), Arc::clone(&b)]));
        let rhs = Arc::new(and([Arc::clone(&b), Arc::clone(&a)]));
        assert!(cache.equal(&lhs, &rhs).unwrap());
    }

    #[test]
    fn non_ac_connective_rejects_permutation() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let lhs = Arc::new(impl_([Arc::clone(&a), Arc::clone(&b)]));
        let rhs = Arc::new(impl_([Arc::clone(&b), Arc::clone(&a)]));
        assert!(!cache.equal(&lhs, &rhs).unwrap());
    }

    #[test]
    fn distinct_atoms_are_not_equal() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        assert!(!cache.equal(&a, &b).unwrap());
    }

    #[test]
    fn repeated_comparison_is_cached_via_union_find() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let lhs = Arc::new(and([Arc::clone(&a), Arc::clone(&b)]));
        let rhs = Arc::new(and([Arc::clone(&b), Arc::clone(&a)]));
        assert!(cache.equal(&lhs, &rhs).unwrap());
        assert_eq!(cache.find(lhs.identity()).unwrap(), cache.find(rhs.identity()).unwrap());
        // Second call takes the union-find fast path, not value_compare again.
        assert!(cache.equal(&lhs, &rhs).unwrap());
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        assert_eq!(cache.hash(&a).unwrap(), cache.hash(&a).unwrap());
    }

    #[test]
    fn idempotent_duplicate_collapses_in_ac_connective() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let dup = Arc::new(and([Arc::clone(&a), Arc::clone(&a)]));
        let single = Arc::new(and([Arc::clone(&a)]));
        assert!(cache.equal(&dup, &single).unwrap());
    }

    #[test]
    fn ac_mutual_containment_ignores_arity_mismatch_from_duplicates() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let left = Arc::new(and([Arc::clone(&a), Arc::clone(&a), Arc::clone(&b)]));
        let right = Arc::new(and([Arc::clone(&b), Arc::clone(&a)]));
        assert!(cache.equal(&left, &right).unwrap());
    }

    #[test]
    fn non_ac_connective_still_rejects_arity_mismatch() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let binary = Arc::new(impl_([Arc::clone(&a), Arc::clone(&b)]));
        let unary = Arc::new(Formula::connective(&crate::symbol::IMPL, vec![Arc::clone(&a)]));
        assert!(!cache.equal(&binary, &unary).unwrap());
    }

    #[test]
    fn hash_matches_for_ac_permutations() {
        let cache = EqualityCache::new();
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let lhs = Arc::new(and([Arc::clone(&a), Arc::clone(&b)]));
        let rhs = Arc::new(and([Arc::clone(&b), Arc::clone(&a)]));
        assert_eq!(cache.hash(&lhs).unwrap(), cache.hash(&rhs).unwrap());
    }
}
