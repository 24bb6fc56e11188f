//! Quest Definition Structures
//!
//! These structures are deserialized from TOML quest files.

use serde::{Deserialize, Serialize};

/// Sequential quest identifier, 1-based.
pub type QuestId = u32;

/// Base score for clearing a quest.
const BASE_SCORE: i64 = 100;

/// Extra score per position in the chain.
const SCORE_STEP: i64 = 25;

/// A quest catalog file as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    #[serde(default)]
    pub quests: Vec<RawQuest>,
}

/// Raw quest data as it appears in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: QuestId,
    pub title: String,
    /// Educational background text for the theory sheet.
    #[serde(default)]
    pub theory: String,
    pub objective: String,
    #[serde(default)]
    pub hint: String,
    /// Name of the completion predicate to evaluate.
    pub predicate: String,
    pub popup_title: String,
    pub popup_message: String,
    /// Score override; the chain formula applies when absent.
    pub score: Option<i64>,
}

/// Completion predicates a quest can be checked against.
///
/// Several shipped quests deliberately share a predicate: the narrative
/// framing differs, the underlying check does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateKind {
    /// Some coin sits in superposition.
    AnySuperposed,
    /// Some coin has been measured.
    AnyMeasured,
    /// At least two coins are entangled and measured.
    EntangledPairMeasured,
    /// A coin was toggled into superposition and back out, unmeasured.
    ReturnedDeterministic,
    /// At least two coins have been measured.
    TwoMeasured,
}

impl PredicateKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "any_superposed" | "superposed" => Some(PredicateKind::AnySuperposed),
            "any_measured" | "measured" => Some(PredicateKind::AnyMeasured),
            "entangled_pair_measured" | "entangled_measured" => {
                Some(PredicateKind::EntangledPairMeasured)
            }
            "returned_deterministic" | "round_trip" => Some(PredicateKind::ReturnedDeterministic),
            "two_measured" => Some(PredicateKind::TwoMeasured),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::AnySuperposed => "any_superposed",
            PredicateKind::AnyMeasured => "any_measured",
            PredicateKind::EntangledPairMeasured => "entangled_pair_measured",
            PredicateKind::ReturnedDeterministic => "returned_deterministic",
            PredicateKind::TwoMeasured => "two_measured",
        }
    }
}

/// A fully resolved quest definition.
#[derive(Debug, Clone, Serialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    /// Educational background text for the theory sheet.
    pub theory: String,
    /// What the player must do to clear the quest.
    pub objective: String,
    pub hint: String,
    /// Completion check evaluated over the coin list.
    pub predicate: PredicateKind,
    /// Headline for the popup shown when the quest clears.
    pub popup_title: String,
    /// Educational popup body.
    pub popup_message: String,
    /// Score awarded on completion.
    pub score: i64,
}

impl Quest {
    /// Default chain score: 100 points plus 25 per position past the first.
    pub fn default_score(id: QuestId) -> i64 {
        BASE_SCORE + SCORE_STEP * i64::from(id.saturating_sub(1))
    }

    /// Create a Quest from raw TOML data.
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        if raw.id == 0 {
            return Err(format!("Quest '{}' has id 0; ids are 1-based", raw.title));
        }

        let predicate = PredicateKind::from_str(&raw.predicate).ok_or_else(|| {
            format!("Invalid predicate '{}' in quest {}", raw.predicate, raw.id)
        })?;

        Ok(Self {
            id: raw.id,
            title: raw.title.clone(),
            theory: raw.theory.clone(),
            objective: raw.objective.clone(),
            hint: raw.hint.clone(),
            predicate,
            popup_title: raw.popup_title.clone(),
            popup_message: raw.popup_message.clone(),
            score: raw.score.unwrap_or_else(|| Self::default_score(raw.id)),
        })
    }
}
