//! Quest State Engine
//!
//! Owns the coin list and campaign progress, and exposes the quantum
//! operations that drive play. Every mutation ends with a quest-progress
//! check; everything a rendering layer needs is queryable or arrives on
//! the event queue.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coin::{Coin, CoinId, Face};
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::quest::{predicate, Quest, QuestCatalog, QuestLog, QuestRecord};

/// How long a transient status line stays visible.
const STATUS_TTL_SECS: i64 = 3;

/// Popup raised when a quest clears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestPopup {
    pub title: String,
    pub message: String,
}

/// Transient advisory line with its display deadline.
#[derive(Debug, Clone)]
struct StatusLine {
    text: String,
    expires_at: DateTime<Utc>,
}

/// Campaign progress snapshot for host-side storage.
///
/// Coins are deliberately absent: the board is wiped between rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub score: i64,
    pub current_level: u32,
    pub quest_log: QuestLog,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

/// The state container behind the game.
///
/// Single-threaded and synchronous: operations mutate in place and return,
/// nothing blocks or suspends.
pub struct QuestStateEngine {
    coins: Vec<Coin>,
    catalog: QuestCatalog,
    quest_log: QuestLog,
    score: i64,
    current_level: u32,
    status: Option<StatusLine>,
    popup: Option<QuestPopup>,
    pending_events: Vec<EngineEvent>,
    rng: StdRng,
}

impl Default for QuestStateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestStateEngine {
    /// Engine with the builtin campaign and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_catalog(QuestCatalog::builtin())
    }

    pub fn with_catalog(catalog: QuestCatalog) -> Self {
        Self::build(catalog, StdRng::from_entropy())
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(QuestCatalog::builtin(), StdRng::seed_from_u64(seed))
    }

    pub fn with_catalog_and_seed(catalog: QuestCatalog, seed: u64) -> Self {
        Self::build(catalog, StdRng::seed_from_u64(seed))
    }

    fn build(catalog: QuestCatalog, rng: StdRng) -> Self {
        let quest_log = QuestLog::new(catalog.all());
        Self {
            coins: Vec::new(),
            catalog,
            quest_log,
            score: 0,
            current_level: 1,
            status: None,
            popup: None,
            pending_events: Vec::new(),
            rng,
        }
    }

    fn index_of(&self, id: CoinId) -> Option<usize> {
        self.coins.iter().position(|c| c.id == id)
    }

    // ------------------------------------------------------------------
    // Mutating operations
    // ------------------------------------------------------------------

    /// Add a fresh coin (deterministic Heads).
    pub fn add_coin(&mut self) -> CoinId {
        self.add_coin_with_probability(1.0)
    }

    /// Add a coin with a chosen Heads probability, clamped to `[0, 1]`.
    pub fn add_coin_with_probability(&mut self, probability: f64) -> CoinId {
        let coin = Coin::new(probability);
        let id = coin.id;
        debug!("Coin {} added (p = {})", id, coin.probability_of_heads);
        self.coins.push(coin);
        self.push_event(EngineEvent::CoinAdded { coin: id });
        self.check_quest_progress();
        id
    }

    /// Toggle a coin between deterministic and superposed.
    ///
    /// The gate is its own inverse: a second application returns the coin
    /// to deterministic Heads, though `has_been_toggled` remembers the
    /// trip.
    pub fn apply_gate(&mut self, coin: CoinId) -> Result<(), EngineError> {
        let idx = self
            .index_of(coin)
            .ok_or(EngineError::InvalidTarget { coin })?;

        if self.coins[idx].is_measured {
            warn!("Gate rejected: coin {} already measured", coin);
            self.post_status("Cannot apply the gate: this coin has already collapsed.");
            return Err(EngineError::AlreadyCollapsed { coin });
        }

        let superposed = {
            let c = &mut self.coins[idx];
            if c.is_superposed {
                c.probability_of_heads = 1.0;
                c.is_superposed = false;
            } else {
                c.probability_of_heads = 0.5;
                c.is_superposed = true;
            }
            c.has_been_toggled = true;
            c.is_superposed
        };

        info!(
            "Gate applied: coin {} now has p = {}",
            coin, self.coins[idx].probability_of_heads
        );
        self.push_event(EngineEvent::GateApplied { coin, superposed });
        self.check_quest_progress();
        Ok(())
    }

    /// Collapse a coin to a definite face.
    ///
    /// Idempotent: measuring an already-collapsed coin returns the stored
    /// face without touching any state. When the coin has an unmeasured
    /// entangled partner, the partner collapses to the identical face in
    /// the same call.
    pub fn measure(&mut self, coin: CoinId) -> Result<Face, EngineError> {
        let idx = self
            .index_of(coin)
            .ok_or(EngineError::InvalidTarget { coin })?;

        if let Some(face) = self.coins[idx].result {
            debug!("Coin {} already measured: {}", coin, face);
            return Ok(face);
        }

        let probability = self.coins[idx].probability_of_heads;
        let roll: f64 = self.rng.gen_range(0.0..1.0);
        let face = if roll < probability {
            Face::Heads
        } else {
            Face::Tails
        };

        {
            let c = &mut self.coins[idx];
            c.result = Some(face);
            c.is_measured = true;
        }
        info!(
            "Measured coin {} as {} (rolled {:.3} against p = {})",
            coin, face, roll, probability
        );
        self.push_event(EngineEvent::Measured { coin, face });

        // Entanglement propagation: exactly one level, never transitive.
        if let Some(partner_id) = self.coins[idx].partner {
            if let Some(pidx) = self.index_of(partner_id) {
                if !self.coins[pidx].is_measured {
                    let p = &mut self.coins[pidx];
                    p.result = Some(face);
                    p.is_measured = true;
                    info!("Entangled partner {} collapsed to {}", partner_id, face);
                    self.push_event(EngineEvent::PartnerCollapsed {
                        coin: partner_id,
                        face,
                    });
                }
            }
        }

        self.check_quest_progress();
        Ok(face)
    }

    /// Link two coins into shared superposition.
    ///
    /// Both coins end up at p = 0.5 with mutual partner links. Refused if
    /// the ids match, either id is unknown, or either coin has already
    /// collapsed.
    pub fn entangle(&mut self, first: CoinId, second: CoinId) -> Result<(), EngineError> {
        if first == second {
            warn!("Entangle rejected: coin {} cannot pair with itself", first);
            return Err(EngineError::InvalidTarget { coin: second });
        }

        let a = self
            .index_of(first)
            .ok_or(EngineError::InvalidTarget { coin: first })?;
        let b = self
            .index_of(second)
            .ok_or(EngineError::InvalidTarget { coin: second })?;

        for idx in [a, b] {
            if self.coins[idx].is_measured {
                let coin = self.coins[idx].id;
                warn!("Entangle rejected: coin {} already measured", coin);
                self.post_status(
                    "Cannot entangle: wave function already collapsed! Use the gate to return to superposition.",
                );
                return Err(EngineError::AlreadyCollapsed { coin });
            }
        }

        // A coin holds one partner at a time; drop any stale back-reference
        // so the link stays symmetric.
        self.unlink_partner(a);
        self.unlink_partner(b);

        self.coins[a].partner = Some(second);
        self.coins[b].partner = Some(first);
        for idx in [a, b] {
            self.coins[idx].probability_of_heads = 0.5;
            self.coins[idx].is_superposed = true;
        }

        info!("Coins {} and {} entangled (p = 0.5)", first, second);
        self.push_event(EngineEvent::Entangled { first, second });
        self.check_quest_progress();
        Ok(())
    }

    /// Drop all coins for a new round. Level and score survive.
    pub fn reset_coins(&mut self) {
        self.coins.clear();
        self.status = None;
        info!("Board cleared");
        self.push_event(EngineEvent::CoinsCleared);
    }

    /// Move to the next level and wipe the board. Hosts call this when the
    /// completion popup is dismissed.
    pub fn advance_level(&mut self) {
        self.current_level += 1;
        self.reset_coins();
        info!("Advanced to level {}", self.current_level);
        self.push_event(EngineEvent::LevelAdvanced {
            level: self.current_level,
        });
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn coin(&self, id: CoinId) -> Option<&Coin> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Current level, 1-based. Levels map one-to-one onto quest ids.
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// The quest the player is currently on, if the campaign has not run
    /// out.
    pub fn current_quest(&self) -> Option<&Quest> {
        self.catalog.get(self.current_level)
    }

    /// Definition and progress for every quest, in chain order.
    pub fn quests(&self) -> impl Iterator<Item = (&Quest, &QuestRecord)> {
        self.catalog.all().iter().zip(self.quest_log.records())
    }

    pub fn quest_log(&self) -> &QuestLog {
        &self.quest_log
    }

    pub fn catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    pub fn cleared_count(&self) -> usize {
        self.quest_log.cleared_count()
    }

    /// Current advisory line, if one is posted and has not expired.
    pub fn status_message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.text.as_str())
    }

    pub fn popup(&self) -> Option<&QuestPopup> {
        self.popup.as_ref()
    }

    pub fn dismiss_popup(&mut self) {
        self.popup = None;
    }

    /// Drain events accumulated since the last poll.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Capture campaign progress for host-side storage.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            score: self.score,
            current_level: self.current_level,
            quest_log: self.quest_log.clone(),
        }
    }

    /// Restore campaign progress from a snapshot. The board starts empty.
    pub fn restore_snapshot(&mut self, snapshot: EngineSnapshot) {
        self.score = snapshot.score;
        self.current_level = snapshot.current_level;
        self.quest_log = snapshot.quest_log;
        self.coins.clear();
        self.status = None;
        self.popup = None;
        info!(
            "Restored snapshot: level {}, score {}",
            self.current_level, self.score
        );
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Clear the back-reference of this coin's current partner, if any.
    fn unlink_partner(&mut self, idx: usize) {
        if let Some(old) = self.coins[idx].partner.take() {
            if let Some(oidx) = self.index_of(old) {
                self.coins[oidx].partner = None;
            }
        }
    }

    fn post_status(&mut self, text: &str) {
        self.status = Some(StatusLine {
            text: text.to_string(),
            expires_at: Utc::now() + Duration::seconds(STATUS_TTL_SECS),
        });
        self.push_event(EngineEvent::StatusPosted {
            text: text.to_string(),
        });
    }

    fn push_event(&mut self, event: EngineEvent) {
        debug!("Event: {}", event.event_type());
        self.pending_events.push(event);
    }

    /// Evaluate the current quest's predicate. First satisfaction marks it
    /// completed, banks the score, unlocks the successor, and raises the
    /// popup. Guarded by the completed status, so re-checking is a no-op.
    fn check_quest_progress(&mut self) {
        let quest_id = self.current_level;
        let Some(quest) = self.catalog.get(quest_id) else {
            return;
        };
        if self.quest_log.is_completed(quest_id) || !self.quest_log.is_unlocked(quest_id) {
            return;
        }
        if !predicate::evaluate(quest.predicate, &self.coins) {
            return;
        }

        let awarded = quest.score;
        let popup = QuestPopup {
            title: quest.popup_title.clone(),
            message: quest.popup_message.clone(),
        };
        let title = quest.title.clone();

        self.quest_log.complete(quest_id);
        self.score += awarded;
        self.popup = Some(popup);
        info!("Quest {} ('{}') cleared, score +{}", quest_id, title, awarded);
        self.push_event(EngineEvent::QuestCompleted {
            quest: quest_id,
            score_awarded: awarded,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine with no quests, for exercising coin mechanics in isolation.
    fn bare_engine() -> QuestStateEngine {
        QuestStateEngine::with_catalog_and_seed(QuestCatalog::new(), 7)
    }

    #[test]
    fn test_add_coin_defaults_to_heads() {
        let mut engine = bare_engine();
        let id = engine.add_coin();
        let coin = engine.coin(id).unwrap();
        assert_eq!(coin.probability_of_heads, 1.0);
        assert!(!coin.is_measured);
    }

    #[test]
    fn test_gate_toggles_superposition() {
        let mut engine = bare_engine();
        let id = engine.add_coin();

        engine.apply_gate(id).unwrap();
        let coin = engine.coin(id).unwrap();
        assert_eq!(coin.probability_of_heads, 0.5);
        assert!(coin.is_superposed);
        assert!(coin.has_been_toggled);

        engine.apply_gate(id).unwrap();
        let coin = engine.coin(id).unwrap();
        assert_eq!(coin.probability_of_heads, 1.0);
        assert!(!coin.is_superposed);
        assert!(coin.has_been_toggled);
    }

    #[test]
    fn test_gate_on_unknown_coin() {
        let mut engine = bare_engine();
        let ghost = CoinId::new();
        assert_eq!(
            engine.apply_gate(ghost),
            Err(EngineError::InvalidTarget { coin: ghost })
        );
    }

    #[test]
    fn test_gate_on_measured_coin_changes_nothing() {
        let mut engine = bare_engine();
        let id = engine.add_coin();
        engine.measure(id).unwrap();

        let before = engine.coin(id).unwrap().clone();
        assert_eq!(
            engine.apply_gate(id),
            Err(EngineError::AlreadyCollapsed { coin: id })
        );
        assert_eq!(engine.coin(id).unwrap(), &before);
        assert!(engine.status_message().is_some());
    }

    #[test]
    fn test_measure_sets_result_iff_measured() {
        let mut engine = bare_engine();
        let id = engine.add_coin();
        assert!(engine.coin(id).unwrap().result.is_none());

        engine.measure(id).unwrap();
        let coin = engine.coin(id).unwrap();
        assert!(coin.is_measured);
        assert!(coin.result.is_some());
    }

    #[test]
    fn test_deterministic_probabilities() {
        let mut engine = bare_engine();

        // The draw is in [0, 1), so p = 1.0 always lands Heads and p = 0.0
        // always lands Tails.
        let heads = engine.add_coin_with_probability(1.0);
        assert_eq!(engine.measure(heads).unwrap(), Face::Heads);

        let tails = engine.add_coin_with_probability(0.0);
        assert_eq!(engine.measure(tails).unwrap(), Face::Tails);
    }

    #[test]
    fn test_measure_is_idempotent() {
        let mut engine = bare_engine();
        let id = engine.add_coin_with_probability(0.5);

        let first = engine.measure(id).unwrap();
        let second = engine.measure(id).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.coin(id).unwrap().result, Some(first));
    }

    #[test]
    fn test_measure_unknown_coin() {
        let mut engine = bare_engine();
        let ghost = CoinId::new();
        assert_eq!(
            engine.measure(ghost),
            Err(EngineError::InvalidTarget { coin: ghost })
        );
    }

    #[test]
    fn test_entangle_is_symmetric() {
        let mut engine = bare_engine();
        let a = engine.add_coin();
        let b = engine.add_coin();

        engine.entangle(a, b).unwrap();

        assert_eq!(engine.coin(a).unwrap().partner, Some(b));
        assert_eq!(engine.coin(b).unwrap().partner, Some(a));
        assert_eq!(engine.coin(a).unwrap().probability_of_heads, 0.5);
        assert_eq!(engine.coin(b).unwrap().probability_of_heads, 0.5);
    }

    #[test]
    fn test_entangle_with_self() {
        let mut engine = bare_engine();
        let a = engine.add_coin();
        assert_eq!(
            engine.entangle(a, a),
            Err(EngineError::InvalidTarget { coin: a })
        );
        assert!(engine.coin(a).unwrap().partner.is_none());
    }

    #[test]
    fn test_entangle_measured_coin_is_rejected() {
        let mut engine = bare_engine();
        let a = engine.add_coin();
        let b = engine.add_coin();
        engine.measure(a).unwrap();

        assert_eq!(
            engine.entangle(a, b),
            Err(EngineError::AlreadyCollapsed { coin: a })
        );
        assert!(engine.coin(a).unwrap().partner.is_none());
        assert!(engine.coin(b).unwrap().partner.is_none());
        assert!(engine.status_message().is_some());
    }

    #[test]
    fn test_reentangle_clears_stale_partner() {
        let mut engine = bare_engine();
        let a = engine.add_coin();
        let b = engine.add_coin();
        let c = engine.add_coin();

        engine.entangle(a, b).unwrap();
        engine.entangle(a, c).unwrap();

        assert_eq!(engine.coin(a).unwrap().partner, Some(c));
        assert_eq!(engine.coin(c).unwrap().partner, Some(a));
        assert!(engine.coin(b).unwrap().partner.is_none());
    }

    #[test]
    fn test_measuring_entangled_pair_collapses_both() {
        let mut engine = bare_engine();
        let a = engine.add_coin();
        let b = engine.add_coin();

        engine.entangle(a, b).unwrap();
        let face = engine.measure(a).unwrap();

        let partner = engine.coin(b).unwrap();
        assert!(partner.is_measured);
        assert_eq!(partner.result, Some(face));
    }

    #[test]
    fn test_partner_propagation_is_one_level() {
        let mut engine = bare_engine();
        let a = engine.add_coin();
        let b = engine.add_coin();

        engine.entangle(a, b).unwrap();
        engine.measure(b).unwrap();

        // Re-measuring the already-collapsed partner keeps its face.
        let stored = engine.coin(a).unwrap().result.unwrap();
        assert_eq!(engine.measure(a).unwrap(), stored);
    }

    #[test]
    fn test_reset_coins_keeps_score_and_level() {
        let mut engine = QuestStateEngine::with_seed(11);
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();
        let score = engine.score();

        engine.reset_coins();
        assert!(engine.coins().is_empty());
        assert_eq!(engine.score(), score);
        assert_eq!(engine.current_level(), 1);
    }

    #[test]
    fn test_quest_chain_progression() {
        let mut engine = QuestStateEngine::with_seed(3);

        // Quest 2 stays locked until quest 1's predicate fires.
        assert!(!engine.quest_log().is_unlocked(2));

        // Quest 1: put a coin into superposition.
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();

        assert!(engine.quest_log().is_completed(1));
        assert!(engine.quest_log().is_unlocked(2));
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.cleared_count(), 1);

        let popup = engine.popup().unwrap();
        assert_eq!(popup.title, "Superposition Achieved!");
        engine.dismiss_popup();
        assert!(engine.popup().is_none());

        // Quest 2: measure a coin. 100 + 25 * 1 on top.
        engine.advance_level();
        assert_eq!(engine.current_level(), 2);
        let id = engine.add_coin();
        engine.measure(id).unwrap();

        assert!(engine.quest_log().is_completed(2));
        assert_eq!(engine.score(), 225);

        // Quest 3: entangle a pair and collapse it.
        engine.advance_level();
        let a = engine.add_coin();
        let b = engine.add_coin();
        engine.entangle(a, b).unwrap();
        engine.measure(a).unwrap();

        assert!(engine.quest_log().is_completed(3));
        assert_eq!(engine.score(), 225 + 150);
    }

    #[test]
    fn test_completed_quest_is_not_rechecked() {
        let mut engine = QuestStateEngine::with_seed(5);
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();
        assert_eq!(engine.score(), 100);

        // Still on level 1; more superposed coins award nothing further.
        let other = engine.add_coin();
        engine.apply_gate(other).unwrap();
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.cleared_count(), 1);
    }

    #[test]
    fn test_round_trip_quest() {
        let mut engine = QuestStateEngine::with_seed(9);

        // Clear quests 1-3 the intended way.
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();
        engine.advance_level();
        let id = engine.add_coin();
        engine.measure(id).unwrap();
        engine.advance_level();
        let a = engine.add_coin();
        let b = engine.add_coin();
        engine.entangle(a, b).unwrap();
        engine.measure(a).unwrap();
        engine.advance_level();

        // Quest 4: gate in, gate out, no measurement.
        assert_eq!(engine.current_level(), 4);
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();
        assert!(!engine.quest_log().is_completed(4));
        engine.apply_gate(id).unwrap();
        assert!(engine.quest_log().is_completed(4));
    }

    #[test]
    fn test_event_stream() {
        let mut engine = QuestStateEngine::with_seed(1);
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();

        let events = engine.poll_events();
        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["coin_added", "gate_applied", "quest_completed"]);

        // Drained queue stays empty until the next mutation.
        assert!(engine.poll_events().is_empty());
    }

    #[test]
    fn test_idempotent_measure_emits_no_event() {
        let mut engine = bare_engine();
        let id = engine.add_coin();
        engine.measure(id).unwrap();
        engine.poll_events();

        engine.measure(id).unwrap();
        assert!(engine.poll_events().is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut engine = QuestStateEngine::with_seed(2);
        let id = engine.add_coin();
        engine.apply_gate(id).unwrap();
        engine.advance_level();

        let json = engine.snapshot().to_json();
        let snapshot = EngineSnapshot::from_json(&json).unwrap();

        let mut restored = QuestStateEngine::with_seed(2);
        restored.restore_snapshot(snapshot);

        assert_eq!(restored.score(), 100);
        assert_eq!(restored.current_level(), 2);
        assert!(restored.quest_log().is_completed(1));
        assert!(restored.coins().is_empty());
    }

    #[test]
    fn test_campaign_end_is_quiet() {
        let mut engine = QuestStateEngine::with_catalog_and_seed(QuestCatalog::new(), 4);
        assert!(engine.current_quest().is_none());

        // No quests loaded: mutations still work, nothing completes.
        let id = engine.add_coin();
        engine.measure(id).unwrap();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.cleared_count(), 0);
    }
}
