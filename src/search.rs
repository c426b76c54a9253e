/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Gentzen-style two-sided sequent proof search (§4.4): the empty axiom, the
//! initial-sequent axiom, and the `breakdown` rule table, each short-circuited
//! and run in parallel via `view::parallel`.

use crate::config::ProverConfig;
use crate::equality::EqualityCache;
use crate::error::ProverError;
use crate::formula::Formula;
use crate::sequent::{guide_equal, guide_negative, guide_positive, Sequent, Side, Tagged};
use crate::view::parallel::{for_all, for_any};
use crate::view::{Cartesian, Concat, Difference, DynView, Reorder, Singleton, Unfold, View};
use std::sync::Arc;

/// Prove `Γ ⊢ Δ` under the rules of §4.4.
///
/// # Errors
/// Propagates any [`ProverError`] raised during search.
pub fn prove(
    gamma: Vec<Arc<Formula>>,
    delta: Vec<Arc<Formula>>,
    config: &ProverConfig,
) -> Result<bool, ProverError> {
    Sequent::new(gamma, delta).prove(config)
}

fn minus(view: &DynView<Arc<Formula>>, f: &Arc<Formula>) -> Result<DynView<Arc<Formula>>, ProverError> {
    let single: DynView<Arc<Formula>> = Arc::new(Singleton::new(Arc::clone(f)));
    let diff = Difference::new(view.as_ref(), single.as_ref(), |a: &Arc<Formula>, b: &Arc<Formula>| {
        Arc::ptr_eq(a, b)
    })?;
    Ok(Arc::new(diff))
}

fn plus_one(view: &DynView<Arc<Formula>>, x: Arc<Formula>) -> DynView<Arc<Formula>> {
    let single: DynView<Arc<Formula>> = Arc::new(Singleton::new(x));
    Arc::new(Concat::new(Arc::clone(view), single))
}

fn plus_many(view: &DynView<Arc<Formula>>, xs: Vec<Arc<Formula>>) -> DynView<Arc<Formula>> {
    let extra: DynView<Arc<Formula>> = Arc::new(Unfold::from_vec(xs));
    Arc::new(Concat::new(Arc::clone(view), extra))
}

/// Branch order heuristic (§4.4): children of a branching rule are tried
/// smallest-first. Never applied to the ordered binary connectives
/// (`Impl`/`RImpl`/`NImpl`/`NRImpl`), whose two children are antecedent and
/// consequent, not an interchangeable multiset.
fn sorted_by_size(mut xs: Vec<Arc<Formula>>) -> Vec<Arc<Formula>> {
    xs.sort_by_key(|f| f.total_size());
    xs
}

fn exactly_two(children: &[Arc<Formula>]) -> Result<(Arc<Formula>, Arc<Formula>), ProverError> {
    match children {
        [x, y] => Ok((Arc::clone(x), Arc::clone(y))),
        other => Err(ProverError::Runtime(format!(
            "expected a binary connective, found {} children",
            other.len()
        ))),
    }
}

fn for_all_indices<F>(n: usize, config: &ProverConfig, task: F) -> Result<bool, ProverError>
where
    F: Fn(usize) -> Result<bool, ProverError> + Send + Sync,
{
    let view: DynView<usize> = Arc::new(Unfold::from_vec((0..n).collect()));
    for_all(view.as_ref(), config, task)
}

fn for_any_indices<F>(n: usize, config: &ProverConfig, task: F) -> Result<bool, ProverError>
where
    F: Fn(usize) -> Result<bool, ProverError> + Send + Sync,
{
    let view: DynView<usize> = Arc::new(Unfold::from_vec((0..n).collect()));
    for_any(view.as_ref(), config, task)
}

/// The core recursive search (§4.4, steps 1-3): empty axiom, initial-sequent
/// axiom, then try breaking down any single formula.
#[tracing::instrument(level = "debug", skip_all, fields(gamma_size = gamma.size(), delta_size = delta.size()))]
pub(crate) fn sub_prove(
    gamma: DynView<Arc<Formula>>,
    delta: DynView<Arc<Formula>>,
    cache: &Arc<EqualityCache>,
    config: &ProverConfig,
) -> Result<bool, ProverError> {
    if gamma.size() == 0 && delta.size() == 0 {
        tracing::debug!("empty axiom");
        return Ok(true);
    }

    if config.cancellation().is_cancelled() {
        return Ok(false);
    }

    let cartesian: DynView<(Arc<Formula>, Arc<Formula>)> =
        Arc::new(Cartesian::new(Arc::clone(&gamma), Arc::clone(&delta)));
    let sorted_pairs = Reorder::new(cartesian, |(p, q)| guide_equal(p, q))?;
    let pair_count = sorted_pairs.size();
    let sorted_pairs: DynView<(Arc<Formula>, Arc<Formula>)> = Arc::new(sorted_pairs);

    let found_axiom = for_any_indices(pair_count, config, {
        let sorted_pairs = Arc::clone(&sorted_pairs);
        let cache = Arc::clone(cache);
        move |i| {
            let (p, q) = sorted_pairs.get(i)?;
            cache.equal(&p, &q)
        }
    })?;
    if found_axiom {
        tracing::debug!("initial-sequent axiom");
        return Ok(true);
    }

    let tagged_gamma: DynView<(Side, Arc<Formula>)> = Arc::new(Tagged::new(Arc::clone(&gamma), Side::Gamma));
    let tagged_delta: DynView<(Side, Arc<Formula>)> = Arc::new(Tagged::new(Arc::clone(&delta), Side::Delta));
    let combined: DynView<(Side, Arc<Formula>)> = Arc::new(Concat::new(tagged_gamma, tagged_delta));
    let sorted = Reorder::new(combined, |(side, f)| match side {
        Side::Gamma => guide_negative(f),
        Side::Delta => guide_positive(f),
    })?;
    let candidate_count = sorted.size();
    let sorted: DynView<(Side, Arc<Formula>)> = Arc::new(sorted);

    for_any_indices(candidate_count, config, {
        let sorted = Arc::clone(&sorted);
        let gamma = Arc::clone(&gamma);
        let delta = Arc::clone(&delta);
        let cache = Arc::clone(cache);
        move |i| {
            let (side, f) = sorted.get(i)?;
            breakdown(side, &f, Arc::clone(&gamma), Arc::clone(&delta), &cache, config)
        }
    })
}

/// The rule table of §4.4, indexed by side and top symbol. Relation and
/// quantifier formulae have no propositional rule (§4.4a): they surface
/// [`ProverError::UnsupportedConnective`] rather than silently failing.
fn breakdown(
    side: Side,
    f: &Arc<Formula>,
    gamma: DynView<Arc<Formula>>,
    delta: DynView<Arc<Formula>>,
    cache: &Arc<EqualityCache>,
    config: &ProverConfig,
) -> Result<bool, ProverError> {
    let Formula::Connective { symbol, children } = f.as_ref() else {
        return Err(ProverError::UnsupportedConnective {
            symbol: f.symbol().to_string(),
            side: side.name(),
        });
    };

    match side {
        Side::Gamma => {
            let gamma_minus = minus(&gamma, f)?;
            match symbol.name() {
                "True" => sub_prove(gamma_minus, delta, cache, config),
                "False" => Ok(true),
                "Not" => {
                    let x = Arc::clone(children.first().ok_or_else(|| {
                        ProverError::Runtime("Not with no child".to_owned())
                    })?);
                    sub_prove(gamma_minus, plus_one(&delta, x), cache, config)
                }
                "And" => sub_prove(plus_many(&gamma_minus, children.clone()), delta, cache, config),
                "Or" => {
                    let ordered = sorted_by_size(children.clone());
                    for_all_indices(ordered.len(), config, {
                        let gamma_minus = Arc::clone(&gamma_minus);
                        let delta = Arc::clone(&delta);
                        let cache = Arc::clone(cache);
                        let ordered = ordered.clone();
                        move |i| {
                            sub_prove(
                                plus_one(&gamma_minus, Arc::clone(&ordered[i])),
                                Arc::clone(&delta),
                                &cache,
                                config,
                            )
                        }
                    })
                }
                "NOr" => sub_prove(gamma_minus, plus_many(&delta, children.clone()), cache, config),
                "NAnd" => {
                    let ordered = sorted_by_size(children.clone());
                    for_all_indices(ordered.len(), config, {
                        let gamma_minus = Arc::clone(&gamma_minus);
                        let delta = Arc::clone(&delta);
                        let cache = Arc::clone(cache);
                        let ordered = ordered.clone();
                        move |i| {
                            sub_prove(
                                Arc::clone(&gamma_minus),
                                plus_one(&delta, Arc::clone(&ordered[i])),
                                &cache,
                                config,
                            )
                        }
                    })
                }
                "Impl" => {
                    let (x, y) = exactly_two(children)?;
                    for_any_indices(2, config, {
                        let gamma_minus = Arc::clone(&gamma_minus);
                        let delta = Arc::clone(&delta);
                        let cache = Arc::clone(cache);
                        move |i| match i {
                            0 => sub_prove(
                                plus_one(&gamma_minus, Arc::clone(&y)),
                                Arc::clone(&delta),
                                &cache,
                                config,
                            ),
                            1 => sub_prove(
                                Arc::clone(&gamma_minus),
                                plus_one(&delta, Arc::clone(&x)),
                                &cache,
                                config,
                            ),
                            _ => unreachable!("indices bounded to [0, 2)"),
                        }
                    })
                }
                "RImpl" => {
                    let (x, y) = exactly_two(children)?;
                    for_any_indices(2, config, {
                        let gamma_minus = Arc::clone(&gamma_minus);
                        let delta = Arc::clone(&delta);
                        let cache = Arc::clone(cache);
                        move |i| match i {
                            0 => sub_prove(
                                plus_one(&gamma_minus, Arc::clone(&x)),
                                Arc::clone(&delta),
                                &cache,
                                config,
                            ),
                            1 => sub_prove(
                                Arc::clone(&gamma_minus),
                                plus_one(&delta, Arc::clone(&y)),
                                &cache,
                                config,
                            ),
                            _ => unreachable!("indices bounded to [0, 2)"),
                        }
                    })
                }
                "NImpl" => {
                    let (x, y) = exactly_two(children)?;
                    sub_prove(
                        plus_one(&gamma_minus, y),
                        plus_one(&delta, x),
                        cache,
                        config,
                    )
                }
                "NRImpl" => {
                    let (x, y) = exactly_two(children)?;
                    sub_prove(
                        plus_one(&gamma_minus, x),
                        plus_one(&delta, y),
                        cache,
                        config,
                    )
                }
                _ => Ok(false),
            }
        }
        Side::Delta => {
            let delta_minus = minus(&delta, f)?;
            match symbol.name() {
                "False" => sub_prove(gamma, delta_minus, cache, config),
                "True" => Ok(true),
                "Not" => {
                    let x = Arc::clone(children.first().ok_or_else(|| {
                        ProverError::Runtime("Not with no child".to_owned())
                    })?);
                    sub_prove(plus_one(&gamma, x), delta_minus, cache, config)
                }
                "Or" => sub_prove(gamma, plus_many(&delta_minus, children.clone()), cache, config),
                "And" => {
                    let ordered = sorted_by_size(children.clone());
                    for_all_indices(ordered.len(), config, {
                        let gamma = Arc::clone(&gamma);
                        let delta_minus = Arc::clone(&delta_minus);
                        let cache = Arc::clone(cache);
                        let ordered = ordered.clone();
                        move |i| {
                            sub_prove(
                                Arc::clone(&gamma),
                                plus_one(&delta_minus, Arc::clone(&ordered[i])),
                                &cache,
                                config,
                            )
                        }
                    })
                }
                "NAnd" => sub_prove(plus_many(&gamma, children.clone()), delta_minus, cache, config),
                "NOr" => {
                    let ordered = sorted_by_size(children.clone());
                    for_all_indices(ordered.len(), config, {
                        let gamma = Arc::clone(&gamma);
                        let delta_minus = Arc::clone(&delta_minus);
                        let cache = Arc::clone(cache);
                        let ordered = ordered.clone();
                        move |i| {
                            sub_prove(
                                plus_one(&gamma, Arc::clone(&ordered[i])),
                                Arc::clone(&delta_minus),
                                &cache,
                                config,
                            )
                        }
                    })
                }
                "Impl" => {
                    let (x, y) = exactly_two(children)?;
                    sub_prove(
                        plus_one(&gamma, x),
                        plus_one(&delta_minus, y),
                        cache,
                        config,
                    )
                }
                "RImpl" => {
                    let (x, y) = exactly_two(children)?;
                    sub_prove(
                        plus_one(&gamma, y),
                        plus_one(&delta_minus, x),
                        cache,
                        config,
                    )
                }
                // Polarity asymmetry, reproduced verbatim (SPEC_FULL.md §9 / DESIGN.md):
                // both disjuncts recurse against the *original* Δ, not Δ₋, unlike every
                // other Δ-side rule in this table.
                "NImpl" => {
                    let (x, y) = exactly_two(children)?;
                    for_any_indices(2, config, {
                        let gamma = Arc::clone(&gamma);
                        let delta = Arc::clone(&delta);
                        let cache = Arc::clone(cache);
                        move |i| match i {
                            0 => sub_prove(plus_one(&gamma, Arc::clone(&y)), Arc::clone(&delta), &cache, config),
                            1 => sub_prove(Arc::clone(&gamma), plus_one(&delta, Arc::clone(&x)), &cache, config),
                            _ => unreachable!("indices bounded to [0, 2)"),
                        }
                    })
                }
                "NRImpl" => {
                    let (x, y) = exactly_two(children)?;
                    for_any_indices(2, config, {
                        let gamma = Arc::clone(&gamma);
                        let delta = Arc::clone(&delta);
                        let cache = Arc::clone(cache);
                        move |i| match i {
                            0 => sub_prove(plus_one(&gamma, Arc::clone(&x)), Arc::clone(&delta), &cache, config),
                            1 => sub_prove(Arc::clone(&gamma), plus_one(&delta, Arc::clone(&y)), &cache, config),
                            _ => unreachable!("indices bounded to [0, 2)"),
                        }
                    })
                }
                _ => Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{and, atom, impl_, not, or};

    fn default_config() -> ProverConfig {
        ProverConfig::default()
    }

    fn a() -> Arc<Formula> {
        Arc::new(atom("a"))
    }
    fn b() -> Arc<Formula> {
        Arc::new(atom("b"))
    }
    fn c() -> Arc<Formula> {
        Arc::new(atom("c"))
    }

    #[test]
    fn empty_sequent_is_provable() {
        assert!(prove(vec![], vec![], &default_config()).unwrap());
    }

    #[test]
    fn identical_atom_on_both_sides_is_provable() {
        assert!(prove(vec![a()], vec![a()], &default_config()).unwrap());
    }

    #[test]
    fn distinct_atoms_are_not_provable() {
        assert!(!prove(vec![a()], vec![b()], &default_config()).unwrap());
    }

    #[test]
    fn law_of_excluded_middle() {
        let lem = Arc::new(or([a(), Arc::new(not([a()]))]));
        assert!(prove(vec![], vec![lem], &default_config()).unwrap());
    }

    #[test]
    fn modus_ponens() {
        let premise = Arc::new(impl_([a(), b()]));
        assert!(prove(vec![a(), premise], vec![b()], &default_config()).unwrap());
    }

    #[test]
    fn transitivity_of_implication() {
        let ab = Arc::new(impl_([a(), b()]));
        let bc = Arc::new(impl_([b(), c()]));
        let ac = Arc::new(impl_([a(), c()]));
        assert!(prove(vec![ab, bc], vec![ac], &default_config()).unwrap());
    }

    #[test]
    fn converse_of_implication_is_not_entailed() {
        let ab = Arc::new(impl_([a(), b()]));
        let ba = Arc::new(impl_([b(), a()]));
        assert!(!prove(vec![ab], vec![ba], &default_config()).unwrap());
    }

    #[test]
    fn conjunction_on_gamma_splits_into_both_conjuncts() {
        let conj = Arc::new(and([a(), b()]));
        assert!(prove(vec![conj], vec![a()], &default_config()).unwrap());
    }

    #[test]
    fn disjunction_on_delta_is_provable_from_either_disjunct() {
        let disj = Arc::new(or([a(), b()]));
        assert!(prove(vec![a()], vec![disj], &default_config()).unwrap());
    }

    #[test]
    fn unsupported_relation_symbol_surfaces_typed_error() {
        let id_relation = Arc::new(Formula::relation(
            &crate::symbol::PRED,
            vec![crate::expr::Expression::Variable(crate::expr::Variable::new("x"))],
        ));
        let err = prove(vec![], vec![id_relation], &default_config()).unwrap_err();
        assert!(matches!(err, ProverError::UnsupportedConnective { .. }));
    }

    #[test]
    fn cancelled_token_returns_false_without_full_search() {
        let token = crate::config::CancellationToken::new();
        token.cancel();
        let config = ProverConfig::new(1, token);
        // A large-ish formula that would otherwise take real search effort.
        let deep = Arc::new(and(vec![Arc::new(atom("a")); 8]));
        assert!(!prove(vec![deep], vec![], &config).unwrap());
    }

    /// Pins the Δ/NImpl and Δ/NRImpl rule's polarity asymmetry (SPEC_FULL.md
    /// §9): both disjuncts recurse against Δ unchanged, not Δ₋. If this regresses
    /// to the more "obviously sound" Δ₋ form, it should be a deliberate audited
    /// change, not an accident, so this test pins current behavior by exhibiting
    /// a sequent only provable because Δ still carries the original formula.
    #[test]
    fn delta_nimpl_is_disjunctive_per_source() {
        // Γ = {a}, Δ = {NImpl(b, a)}. Via breakdown Δ/NImpl(x=b, y=a):
        //   branch 0: Γ + {a} ⊢ Δ            — Γ already has a, trivially closes.
        // This only closes because branch 0 checks against Δ's *unmodified*
        // form (the rule never even needs Δ₋ for this case to succeed), which
        // is the behavior this test pins.
        let nimpl_b_a = Arc::new(crate::formula::nimpl([b(), a()]));
        assert!(prove(vec![a()], vec![nimpl_b_a], &default_config()).unwrap());
    }

    /// Neither Γ nor Δ is a sequence the breakdown rules rely on positionally;
    /// permuting either side must not change provability.
    #[test]
    fn provability_is_invariant_under_permutation_of_either_side() {
        let lhs = vec![a(), Arc::new(impl_([a(), b()])), Arc::new(impl_([b(), c()]))];
        let rhs = vec![c()];
        let forward = prove(lhs.clone(), rhs.clone(), &default_config()).unwrap();

        let mut lhs_reversed = lhs.clone();
        lhs_reversed.reverse();
        let reversed_gamma = prove(lhs_reversed, rhs.clone(), &default_config()).unwrap();
        assert_eq!(forward, reversed_gamma);

        let disj = vec![Arc::new(or([a(), b()])), Arc::new(or([b(), a()]))];
        let base = prove(vec![a()], disj.clone(), &default_config()).unwrap();
        let mut disj_reversed = disj;
        disj_reversed.reverse();
        let reversed_delta = prove(vec![a()], disj_reversed, &default_config()).unwrap();
        assert_eq!(base, reversed_delta);
    }
}
