//! Quantum coin model.
//!
//! A coin stands in for a two-level quantum system. `probability_of_heads`
//! carries the whole state: 1.0 is deterministic Heads, 0.0 deterministic
//! Tails, and anything strictly between is a superposition. Measurement
//! collapses the coin to a definite face exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinId(Uuid);

impl CoinId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CoinId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoinId {
    /// Short form: the first 8 hex characters, enough to tell coins apart
    /// in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.0.simple().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// The definite state a coin collapses to when measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Heads,
    Tails,
}

impl Face {
    pub fn as_str(&self) -> &'static str {
        match self {
            Face::Heads => "heads",
            Face::Tails => "tails",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single quantum coin.
///
/// Invariants: `is_measured` holds exactly when `result` is set, and a
/// measured coin never changes again. `partner` is symmetric: when it points
/// at another coin, that coin points back here. The link is an id into the
/// shared coin list, never an owning reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: CoinId,
    /// Chance of observing Heads, in `[0.0, 1.0]`.
    pub probability_of_heads: f64,
    /// Whether the coin currently sits in gate-induced superposition.
    pub is_superposed: bool,
    /// Whether a gate has ever acted on this coin.
    pub has_been_toggled: bool,
    /// Once true, the coin is classical and no gate can act on it.
    pub is_measured: bool,
    /// The definite face after measurement. Set exactly once.
    pub result: Option<Face>,
    /// Entangled partner, if any.
    pub partner: Option<CoinId>,
}

impl Coin {
    /// Create a fresh, unmeasured coin. Out-of-range probabilities are
    /// clamped.
    pub fn new(probability_of_heads: f64) -> Self {
        Self {
            id: CoinId::new(),
            probability_of_heads: probability_of_heads.clamp(0.0, 1.0),
            is_superposed: false,
            has_been_toggled: false,
            is_measured: false,
            result: None,
            partner: None,
        }
    }

    pub fn is_entangled(&self) -> bool {
        self.partner.is_some()
    }
}
