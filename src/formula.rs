/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The formula tree: propositional connectives, relation atoms, and (scaffolded)
//! quantifiers over expressions.

use crate::expr::{Expression, Variable};
use crate::symbol::{self, Symbol};
use std::sync::Arc;

/// A formula node. The variant in play always matches `symbol.class()` (§3's
/// representation invariant): connectives carry formula children, relations
/// carry expression children, quantifiers carry one bound variable and a body.
///
/// Formulae are immutable after construction and shared via `Arc`, which
/// doubles as the stable pointer identity the equality cache (§4.3) keys on.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Formula {
    /// A connective applied to zero or more formula children (`And`, `Or`, `Not`, ...).
    Connective {
        /// The heading symbol; `symbol.class() == Class::Connective`.
        symbol: &'static Symbol,
        /// Child formulae.
        children: Vec<Arc<Formula>>,
    },
    /// A relation applied to expression children (`Ident`, `Equal`, `Pred`, ...).
    Relation {
        /// The heading symbol; `symbol.class() == Class::Relation`.
        symbol: &'static Symbol,
        /// Child expressions.
        children: Vec<Expression>,
    },
    /// A quantifier binding one variable over a body formula (`ForAll`, `Exists`).
    Quantifier {
        /// The heading symbol; `symbol.class() == Class::Quantifier`.
        symbol: &'static Symbol,
        /// The bound variable.
        variable: Variable,
        /// The formula in which `variable` is bound.
        body: Arc<Formula>,
    },
}

impl core::fmt::Display for Formula {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connective { symbol, children } => {
                write!(f, "{symbol}[")?;
                let mut iter = children.iter();
                if let Some(first) = iter.next() {
                    write!(f, "{first}")?;
                    for next in iter {
                        write!(f, ", {next}")?;
                    }
                }
                write!(f, "]")
            }
            Self::Relation { symbol, children } => {
                write!(f, "{symbol}(")?;
                let mut iter = children.iter();
                if let Some(first) = iter.next() {
                    write!(f, "{first}")?;
                    for next in iter {
                        write!(f, ", {next}")?;
                    }
                }
                write!(f, ")")
            }
            Self::Quantifier {
                symbol,
                variable,
                body,
            } => write!(f, "{symbol}[{variable}]({body})"),
        }
    }
}

impl Formula {
    /// The symbol heading this node.
    #[must_use]
    #[inline]
    pub fn symbol(&self) -> &'static Symbol {
        match self {
            Self::Connective { symbol, .. }
            | Self::Relation { symbol, .. }
            | Self::Quantifier { symbol, .. } => symbol,
        }
    }

    /// Construct a connective formula, panicking in debug builds if `symbol`
    /// isn't a connective symbol (mirrors the source's representation invariant).
    #[must_use]
    pub fn connective(symbol: &'static Symbol, children: Vec<Arc<Self>>) -> Self {
        debug_assert!(matches!(symbol.class(), symbol::Class::Connective));
        Self::Connective { symbol, children }
    }

    /// Construct a relation formula.
    #[must_use]
    pub fn relation(symbol: &'static Symbol, children: Vec<Expression>) -> Self {
        debug_assert!(matches!(symbol.class(), symbol::Class::Relation));
        Self::Relation { symbol, children }
    }

    /// Construct a quantifier formula.
    #[must_use]
    pub fn quantifier(symbol: &'static Symbol, variable: Variable, body: Arc<Self>) -> Self {
        debug_assert!(matches!(symbol.class(), symbol::Class::Quantifier));
        Self::Quantifier {
            symbol,
            variable,
            body,
        }
    }

    /// Number of nodes in this formula's tree, counting itself.
    #[must_use]
    pub fn total_size(&self) -> usize {
        match self {
            Self::Connective { children, .. } => {
                1 + children.iter().map(|c| c.total_size()).sum::<usize>()
            }
            Self::Relation { children, .. } => {
                1 + children.iter().map(Expression::size).sum::<usize>()
            }
            Self::Quantifier { body, .. } => 1 + body.total_size(),
        }
    }

    /// Longest root-to-leaf path, counting the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Connective { children, .. } => {
                1 + children.iter().map(|c| c.depth()).max().unwrap_or(0)
            }
            Self::Relation { .. } => 1,
            Self::Quantifier { body, .. } => 1 + body.depth(),
        }
    }

    /// Pointer identity of this formula handle, for use as a union-find key.
    #[must_use]
    #[inline]
    pub fn identity(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as usize
    }
}

/// Build a connective formula from child formulae. Mirrors the source's
/// "symbol as a callable" sugar (`Or(a, b)`).
macro_rules! connective_ctor {
    ($(#[$meta:meta])* $name:ident => $sym:ident) => {
        $(#[$meta])*
        #[must_use]
        pub fn $name(children: impl IntoIterator<Item = Arc<Formula>>) -> Formula {
            Formula::connective(&symbol::$sym, children.into_iter().collect())
        }
    };
}

connective_ctor!(
    /// `Not(x)`.
    not => NOT
);
connective_ctor!(
    /// `And(xs...)`.
    and => AND
);
connective_ctor!(
    /// `Or(xs...)`.
    or => OR
);
connective_ctor!(
    /// `NAnd(xs...)`.
    nand => NAND
);
connective_ctor!(
    /// `NOr(xs...)`.
    nor => NOR
);
connective_ctor!(
    /// `Xor(xs...)`.
    xor => XOR
);
connective_ctor!(
    /// `NXor(xs...)`.
    nxor => NXOR
);
connective_ctor!(
    /// `Equiv(xs...)`.
    equiv => EQUIV
);
connective_ctor!(
    /// `NEquiv(xs...)`.
    nequiv => NEQUIV
);
connective_ctor!(
    /// `Impl(x, y)`.
    impl_ => IMPL
);
connective_ctor!(
    /// `NImpl(x, y)`.
    nimpl => NIMPL
);
connective_ctor!(
    /// `RImpl(x, y)`.
    rimpl => RIMPL
);
connective_ctor!(
    /// `NRImpl(x, y)`.
    nrimpl => NRIMPL
);

/// `True`, nullary.
#[must_use]
pub fn truth() -> Formula {
    Formula::connective(&symbol::TRUE, Vec::new())
}

/// `False`, nullary.
#[must_use]
pub fn falsity() -> Formula {
    Formula::connective(&symbol::FALSE, Vec::new())
}

/// Build an atomic propositional symbol: a nullary `Id`-style connective
/// distinguished only by its display name, used for the `a, b, c` atoms of §8's
/// scenarios.
#[must_use]
pub fn atom(name: &'static str) -> Formula {
    Formula::relation(&symbol::IDENT, vec![Expression::Variable(Variable::new(name))])
}

impl core::ops::Not for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn not(self) -> Self::Output {
        not([self])
    }
}

impl core::ops::BitAnd for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        and([self, rhs])
    }
}

impl core::ops::BitOr for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        or([self, rhs])
    }
}

impl core::ops::BitXor for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        xor([self, rhs])
    }
}

impl core::ops::Shl for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn shl(self, rhs: Self) -> Self::Output {
        impl_([self, rhs])
    }
}

impl core::ops::Shr for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn shr(self, rhs: Self) -> Self::Output {
        rimpl([self, rhs])
    }
}

impl core::ops::Rem for Arc<Formula> {
    type Output = Formula;
    #[inline]
    fn rem(self, rhs: Self) -> Self::Output {
        equiv([self, rhs])
    }
}

#[cfg(feature = "quickcheck")]
impl quickcheck::Arbitrary for Formula {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let leaves: [fn(usize) -> Self; 2] = [|_| atom("a"), |_| atom("b")];
        let branches: [fn(usize) -> Self; 3] = [
            |s| not([Arc::new(Self::arbitrary(&mut quickcheck::Gen::new(s)))]),
            |s| {
                let mut sub = quickcheck::Gen::new(s);
                and([
                    Arc::new(Self::arbitrary(&mut sub)),
                    Arc::new(Self::arbitrary(&mut sub)),
                ])
            },
            |s| {
                let mut sub = quickcheck::Gen::new(s);
                impl_([
                    Arc::new(Self::arbitrary(&mut sub)),
                    Arc::new(Self::arbitrary(&mut sub)),
                ])
            },
        ];
        let size = g.size();
        if size == 0 {
            return (*g.choose(&leaves).expect("non-empty"))(0);
        }
        let shrunk = size.saturating_sub(1);
        let mut options: Vec<fn(usize) -> Self> = leaves.to_vec();
        options.extend_from_slice(&branches);
        (*g.choose(&options).expect("non-empty"))(shrunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_size_counts_all_nodes() {
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let f = impl_([a, b]);
        assert_eq!(f.total_size(), 3);
    }

    #[test]
    fn depth_of_atom_is_one() {
        assert_eq!(atom("a").depth(), 1);
    }

    #[test]
    fn every_formula_has_size_and_depth_at_least_one() {
        let a = Arc::new(atom("a"));
        let f = not([Arc::clone(&a)]);
        assert!(f.total_size() >= 1);
        assert!(f.depth() >= 1);
    }

    #[test]
    fn operator_sugar_matches_named_constructors() {
        let a = Arc::new(atom("a"));
        let b = Arc::new(atom("b"));
        let via_sugar = format!("{}", Arc::clone(&a) << Arc::clone(&b));
        let via_ctor = format!("{}", impl_([a, b]));
        assert_eq!(via_sugar, via_ctor);
    }
}
