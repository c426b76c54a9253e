/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Connective, relation, and quantifier atoms that head a [`crate::formula::Formula`] node.

use core::hash::{Hash, Hasher};

/// What kind of children a [`Symbol`] expects a [`crate::formula::Formula`] node to carry.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Class {
    /// Children are formulae (`And`, `Or`, `Not`, `Impl`, ...).
    Connective,
    /// Children are expressions (`Id`, `Equal`, `Pred`, ...).
    Relation,
    /// A single bound variable plus a body formula (`ForAll`, `Exists`).
    Quantifier,
}

/// An immutable atom heading a formula node.
///
/// Equality and hashing are defined over `(is_relation, is_quantifier, display)`,
/// matching the source's "three-field" equality contract exactly.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialOrd)]
pub struct Symbol {
    display: &'static str,
    is_relation: bool,
    is_quantifier: bool,
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.is_relation == other.is_relation
            && self.is_quantifier == other.is_quantifier
            && self.display == other.display
    }
}

impl Hash for Symbol {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_relation.hash(state);
        self.is_quantifier.hash(state);
        self.display.hash(state);
    }
}

impl core::fmt::Display for Symbol {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.display)
    }
}

impl Symbol {
    /// Build a connective symbol (children will be formulae).
    const fn connective(display: &'static str) -> Self {
        Self {
            display,
            is_relation: false,
            is_quantifier: false,
        }
    }

    /// Build a relation symbol (children will be expressions).
    const fn relation(display: &'static str) -> Self {
        Self {
            display,
            is_relation: true,
            is_quantifier: false,
        }
    }

    /// Build a quantifier symbol (a bound variable plus a body formula).
    const fn quantifier(display: &'static str) -> Self {
        Self {
            display,
            is_relation: false,
            is_quantifier: true,
        }
    }

    /// Display string this symbol was constructed with.
    #[must_use]
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.display
    }

    /// Which shape of children this symbol's formula nodes carry.
    #[must_use]
    #[inline]
    pub const fn class(&self) -> Class {
        if self.is_quantifier {
            Class::Quantifier
        } else if self.is_relation {
            Class::Relation
        } else {
            Class::Connective
        }
    }

    /// Whether the equality oracle should treat this connective's children as an
    /// unordered, idempotent multiset (associative-commutative) rather than a
    /// positional tuple. See the GLOSSARY entry for AC-connective.
    #[must_use]
    #[inline]
    pub fn is_ac(&self) -> bool {
        matches!(
            self.display,
            "And" | "Or" | "NAnd" | "NOr" | "Xor" | "NXor" | "Equiv" | "NEquiv"
        )
    }
}

macro_rules! catalogue {
    ($($(#[$meta:meta])* $name:ident => $ctor:ident($display:literal);)+) => {
        $(
            $(#[$meta])*
            pub static $name: Symbol = Symbol::$ctor($display);
        )+
    };
}

catalogue! {
    /// Unary negation.
    NOT => connective("Not");
    /// Conjunction, AC.
    AND => connective("And");
    /// Disjunction, AC.
    OR => connective("Or");
    /// Negated conjunction (NAND), AC.
    NAND => connective("NAnd");
    /// Negated disjunction (NOR), AC.
    NOR => connective("NOr");
    /// Exclusive or, AC.
    XOR => connective("Xor");
    /// Negated exclusive or, AC.
    NXOR => connective("NXor");
    /// Biconditional, AC.
    EQUIV => connective("Equiv");
    /// Negated biconditional, AC.
    NEQUIV => connective("NEquiv");
    /// Material implication.
    IMPL => connective("Impl");
    /// Negated material implication.
    NIMPL => connective("NImpl");
    /// Reverse (converse) implication.
    RIMPL => connective("RImpl");
    /// Negated reverse implication.
    NRIMPL => connective("NRImpl");
    /// Nullary truth.
    TRUE => connective("True");
    /// Nullary falsehood.
    FALSE => connective("False");
    /// Identity connective (single child, no rewrite).
    ID_CONNECTIVE => connective("Id");
    /// Universal quantifier.
    FOR_ALL => quantifier("ForAll");
    /// Existential quantifier.
    EXISTS => quantifier("Exists");
    /// Identity relation between two expressions.
    IDENT => relation("Ident");
    /// Negated identity relation.
    NIDENT => relation("NIdent");
    /// Equality relation between two expressions.
    EQUAL => relation("Equal");
    /// Negated equality relation.
    NEQUAL => relation("NEqual");
    /// Predecessor relation.
    PRED => relation("Pred");
    /// Successor relation.
    SUCC => relation("Succ");
    /// "Eventually predecessor" relation.
    E_PRED => relation("EPred");
    /// "Eventually successor" relation.
    E_SUCC => relation("ESucc");
    /// Negated predecessor relation.
    N_PRED => relation("NPred");
    /// Negated successor relation.
    N_SUCC => relation("NSucc");
}

#[cfg(feature = "quickcheck")]
impl quickcheck::Arbitrary for Symbol {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        *g.choose(&[
            NOT, AND, OR, NAND, NOR, XOR, NXOR, EQUIV, NEQUIV, IMPL, NIMPL, RIMPL, NRIMPL, TRUE,
            FALSE, ID_CONNECTIVE, FOR_ALL, EXISTS, IDENT, NIDENT, EQUAL, NEQUAL, PRED, SUCC,
            E_PRED, E_SUCC, N_PRED, N_SUCC,
        ])
        .expect("catalogue is non-empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_three_field() {
        assert_eq!(AND, AND);
        assert_ne!(AND, OR);
    }

    #[test]
    fn ac_connectives_match_glossary() {
        assert!(AND.is_ac());
        assert!(OR.is_ac());
        assert!(!NOT.is_ac());
        assert!(!IMPL.is_ac());
    }

    #[test]
    fn class_matches_catalogue_shape() {
        assert_eq!(AND.class(), Class::Connective);
        assert_eq!(IDENT.class(), Class::Relation);
        assert_eq!(FOR_ALL.class(), Class::Quantifier);
    }
}
