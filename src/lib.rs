//! Quest-driven quantum coin engine.
//!
//! Simulates simplified quantum mechanics through a coin metaphor:
//! superposition (a 50/50 coin), measurement (an irreversible weighted
//! draw), and entanglement (a symmetric link that makes two coins collapse
//! together). A ten-quest campaign gates progression on what the player
//! does to those coins.
//!
//! The crate is UI-agnostic. Hosts call the mutating operations on
//! [`QuestStateEngine`], render from its queries, and drain
//! [`QuestStateEngine::poll_events`] for animation cues.
//!
//! ```
//! use quantum_quest::{Face, QuestStateEngine};
//!
//! let mut engine = QuestStateEngine::with_seed(42);
//!
//! let coin = engine.add_coin();          // deterministic Heads
//! engine.apply_gate(coin).unwrap();      // now a 50/50 superposition
//! let face = engine.measure(coin).unwrap();
//! assert!(matches!(face, Face::Heads | Face::Tails));
//! assert!(engine.quest_log().is_completed(1));
//! ```

pub mod coin;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod quest;

pub use coin::{Coin, CoinId, Face};
pub use engine::{EngineSnapshot, QuestPopup, QuestStateEngine};
pub use error::EngineError;
pub use events::EngineEvent;
pub use quest::{
    PredicateKind, Quest, QuestCatalog, QuestId, QuestLog, QuestRecord, QuestStatus,
};
