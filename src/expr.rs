/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The term sub-language: expressions that appear as children of relation formulae.

use crate::error::ProverError;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A named, unbound (until substituted) term variable.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variable(pub Arc<str>);

impl Variable {
    /// Build a variable from any string-like argument.
    #[must_use]
    #[inline]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }
}

impl core::fmt::Display for Variable {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The term sub-language. Extensible for function application in future work;
/// only `Variable` and `Reference` are exercised by the propositional prover.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Expression {
    /// A named variable.
    Variable(Variable),
    /// Transparent forwarding to another expression, used for sharing subterms
    /// without copying them.
    Reference(Arc<Expression>),
}

impl core::fmt::Display for Expression {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Variable(v) => write!(f, "{v}"),
            Self::Reference(inner) => write!(f, "{inner}"),
        }
    }
}

/// A mapping from variables to the expressions that should replace them.
pub type Substitution = std::collections::BTreeMap<Variable, Expression>;

impl Expression {
    /// Follow `Reference` links down to the first non-reference expression.
    #[inline]
    fn resolve(&self) -> &Self {
        let mut cur = self;
        while let Self::Reference(inner) = cur {
            cur = inner;
        }
        cur
    }

    /// Whether this expression contains no free variables.
    #[must_use]
    #[inline]
    pub fn is_ground(&self) -> bool {
        self.free_variables().is_empty()
    }

    /// The set of variables free in this expression.
    #[must_use]
    pub fn free_variables(&self) -> BTreeSet<Variable> {
        match self.resolve() {
            Self::Variable(v) => core::iter::once(v.clone()).collect(),
            Self::Reference(_) => unreachable!("resolve() strips all references"),
        }
    }

    /// Structural equality, transparent to `Reference` indirection.
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        match (self.resolve(), other.resolve()) {
            (Self::Variable(a), Self::Variable(b)) => a == b,
            (Self::Reference(_), _) | (_, Self::Reference(_)) => {
                unreachable!("resolve() strips all references")
            }
        }
    }

    /// Number of nodes in this expression, transparent to references.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Variable(_) => 1,
            Self::Reference(inner) => inner.size(),
        }
    }

    /// Index into this expression's immediate children (there are none for the
    /// variants the prover exercises; reserved for future function-application
    /// support per the OUT OF SCOPE note).
    ///
    /// # Errors
    /// Returns [`ProverError::Index`] for any index, since the exercised variants
    /// have no indexable children.
    pub fn at(&self, index: usize) -> Result<&Self, ProverError> {
        Err(ProverError::Index {
            index,
            size: 0,
            context: "Expression::at",
        })
    }

    /// A seeded structural hash, stable across process runs for a given seed.
    #[must_use]
    pub fn hash_seeded(&self, seed: u64) -> u64 {
        use core::hash::{Hash, Hasher};
        let mut hasher = rustc_hash::FxHasher::default();
        seed.hash(&mut hasher);
        match self.resolve() {
            Self::Variable(v) => {
                0u8.hash(&mut hasher);
                v.hash(&mut hasher);
            }
            Self::Reference(_) => unreachable!("resolve() strips all references"),
        }
        hasher.finish()
    }

    /// Replace every free occurrence of a variable bound by `sigma` with its
    /// mapped expression, leaving everything else untouched.
    #[must_use]
    pub fn substitute(&self, sigma: &Substitution) -> Self {
        match self.resolve() {
            Self::Variable(v) => sigma.get(v).cloned().unwrap_or_else(|| self.clone()),
            Self::Reference(_) => unreachable!("resolve() strips all references"),
        }
    }
}

#[cfg(feature = "quickcheck")]
impl quickcheck::Arbitrary for Variable {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let name = *g.choose(&["x", "y", "z", "w"]).expect("non-empty");
        Self::new(name)
    }
}

#[cfg(feature = "quickcheck")]
impl quickcheck::Arbitrary for Expression {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self::Variable(Variable::arbitrary(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expression {
        Expression::Variable(Variable::new(name))
    }

    #[test]
    fn reference_is_transparent_to_identical() {
        let x = var("x");
        let wrapped = Expression::Reference(Arc::new(x.clone()));
        assert!(x.identical(&wrapped));
    }

    #[test]
    fn reference_is_transparent_to_size() {
        let x = var("x");
        let wrapped = Expression::Reference(Arc::new(x.clone()));
        assert_eq!(x.size(), wrapped.size());
    }

    #[test]
    fn substitute_replaces_bound_variable() {
        let x = var("x");
        let y = var("y");
        let mut sigma = Substitution::new();
        let Expression::Variable(vx) = x.clone() else {
            unreachable!()
        };
        sigma.insert(vx, y.clone());
        assert!(x.substitute(&sigma).identical(&y));
    }

    #[test]
    fn unbound_variable_is_free() {
        let x = var("x");
        assert!(!x.is_ground());
        assert_eq!(x.free_variables().len(), 1);
    }
}
