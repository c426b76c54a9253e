/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Worked examples of classical two-sided sequent proof search.

#![deny(warnings)]

use sequentia::config::ProverConfig;
use sequentia::formula::{and, atom, impl_, not, or};
use sequentia::search::prove;
use std::sync::Arc;

fn main() {}

#[test]
fn excluded_middle_is_provable() {
    let a = Arc::new(atom("a"));
    let formula = Arc::new(or([Arc::clone(&a), Arc::new(not([a]))]));
    let config = ProverConfig::default();
    assert_eq!(prove(Vec::new(), vec![formula], &config), Ok(true));
}

#[test]
fn modus_ponens_is_provable() {
    let a = Arc::new(atom("a"));
    let b = Arc::new(atom("b"));
    let conditional = Arc::new(impl_([Arc::clone(&a), Arc::clone(&b)]));
    let config = ProverConfig::default();
    assert_eq!(prove(vec![a, conditional], vec![b], &config), Ok(true));
}

#[test]
fn a_with_b_implies_a() {
    let a = Arc::new(atom("a"));
    let b = Arc::new(atom("b"));
    let conjunction = Arc::new(and([Arc::clone(&a), b]));
    let config = ProverConfig::default();
    assert_eq!(prove(vec![conjunction], vec![a], &config), Ok(true));
}

#[test]
fn unrelated_atoms_are_not_provable() {
    let a = Arc::new(atom("a"));
    let b = Arc::new(atom("b"));
    let config = ProverConfig::default();
    assert_eq!(prove(vec![a], vec![b], &config), Ok(false));
}

#[test]
fn converse_of_implication_is_not_entailed() {
    let a = Arc::new(atom("a"));
    let b = Arc::new(atom("b"));
    let forward = Arc::new(impl_([Arc::clone(&a), Arc::clone(&b)]));
    let backward = Arc::new(impl_([b, a]));
    let config = ProverConfig::default();
    assert_eq!(prove(vec![forward], vec![backward], &config), Ok(false));
}

#[test]
fn proof_search_spans_are_observable_under_a_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("sequentia=trace")
        .try_init();

    let a = Arc::new(atom("a"));
    let formula = Arc::new(or([Arc::clone(&a), Arc::new(not([a]))]));
    let config = ProverConfig::default();
    assert_eq!(prove(Vec::new(), vec![formula], &config), Ok(true));
}
