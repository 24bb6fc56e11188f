//! Quest System Module
//!
//! Quest definitions are plain data (TOML-backed), completion checks are
//! keyed predicates over the coin list, and campaign progress is a linear
//! unlock chain.

pub mod definition;
pub mod predicate;
pub mod registry;
pub mod state;

pub use definition::{PredicateKind, Quest, QuestId, RawQuest, RawQuestFile};
pub use registry::QuestCatalog;
pub use state::{QuestLog, QuestRecord, QuestStatus};
