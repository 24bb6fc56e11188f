//! Completion predicates over the coin list.
//!
//! Each quest definition names a [`PredicateKind`]; the check itself is a
//! pure function of the current coins, so the quest set stays data-driven
//! and testable without an engine.

use crate::coin::Coin;

use super::definition::PredicateKind;

/// Evaluate a predicate against the current coin list.
pub fn evaluate(kind: PredicateKind, coins: &[Coin]) -> bool {
    match kind {
        PredicateKind::AnySuperposed => {
            coins.iter().any(|c| c.is_superposed && !c.is_measured)
        }
        PredicateKind::AnyMeasured => coins.iter().any(|c| c.is_measured),
        PredicateKind::EntangledPairMeasured => {
            coins
                .iter()
                .filter(|c| c.is_entangled() && c.is_measured)
                .count()
                >= 2
        }
        PredicateKind::ReturnedDeterministic => coins
            .iter()
            .any(|c| c.has_been_toggled && !c.is_superposed && !c.is_measured),
        PredicateKind::TwoMeasured => {
            coins.iter().filter(|c| c.is_measured).count() >= 2
        }
    }
}
