/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! A parallel, classical two-sided sequent calculus prover.
//!
//! Formulae (propositional connectives over relation atoms) are checked for
//! derivability (`Γ ⊢ Δ`) by recursive rule breakdown, short-circuited and run
//! across a bounded worker-thread pool. See [`search::prove`] for the entry point.

pub mod config;
pub mod equality;
pub mod error;
pub mod expr;
pub mod formula;
pub mod search;
pub mod sequent;
pub mod symbol;
pub mod transaction;
pub mod view;

pub use config::{CancellationToken, ProverConfig};
pub use error::ProverError;
pub use expr::{Expression, Substitution, Variable};
pub use formula::Formula;
pub use search::prove;
pub use sequent::Sequent;
pub use symbol::{Class, Symbol};
