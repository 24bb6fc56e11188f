//! Engine event stream.
//!
//! Every mutation pushes one or more events onto the engine's queue. A
//! rendering layer drains them each frame with
//! [`QuestStateEngine::poll_events`](crate::engine::QuestStateEngine::poll_events)
//! and decides how to animate each one; the engine itself knows nothing
//! about any UI framework.

use serde::{Deserialize, Serialize};

use crate::coin::{CoinId, Face};
use crate::quest::QuestId;

/// State transitions worth telling a rendering layer about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A fresh coin entered play.
    CoinAdded { coin: CoinId },

    /// A gate toggled a coin between deterministic and superposed.
    GateApplied { coin: CoinId, superposed: bool },

    /// A coin collapsed to a definite face.
    Measured { coin: CoinId, face: Face },

    /// An entangled partner was dragged into the same collapse.
    PartnerCollapsed { coin: CoinId, face: Face },

    /// Two coins were linked into shared superposition.
    Entangled { first: CoinId, second: CoinId },

    /// A quest's completion predicate fired.
    QuestCompleted { quest: QuestId, score_awarded: i64 },

    /// The player moved on to the next level.
    LevelAdvanced { level: u32 },

    /// The board was wiped for a new round.
    CoinsCleared,

    /// A transient advisory line was posted for the player.
    StatusPosted { text: String },
}

impl EngineEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::CoinAdded { .. } => "coin_added",
            EngineEvent::GateApplied { .. } => "gate_applied",
            EngineEvent::Measured { .. } => "measured",
            EngineEvent::PartnerCollapsed { .. } => "partner_collapsed",
            EngineEvent::Entangled { .. } => "entangled",
            EngineEvent::QuestCompleted { .. } => "quest_completed",
            EngineEvent::LevelAdvanced { .. } => "level_advanced",
            EngineEvent::CoinsCleared => "coins_cleared",
            EngineEvent::StatusPosted { .. } => "status_posted",
        }
    }
}
