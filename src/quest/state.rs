//! Quest State Tracking
//!
//! Records per-quest status and timing, and enforces the linear unlock
//! chain: a quest opens only when its predecessor completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::definition::{Quest, QuestId};

/// Status of a quest in the campaign chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    /// Waiting for the previous quest in the chain.
    Locked,
    /// Open for play.
    Unlocked,
    /// Cleared. Terminal.
    Completed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Locked => "locked",
            QuestStatus::Unlocked => "unlocked",
            QuestStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "locked" => Some(QuestStatus::Locked),
            "unlocked" => Some(QuestStatus::Unlocked),
            "completed" => Some(QuestStatus::Completed),
            _ => None,
        }
    }
}

/// Progress on a single quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestRecord {
    pub quest_id: QuestId,
    pub status: QuestStatus,
    /// When the quest opened for play.
    pub started_at: Option<DateTime<Utc>>,
    /// When the completion predicate first fired.
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds from unlock to completion.
    pub completion_secs: Option<i64>,
}

impl QuestRecord {
    pub fn locked(quest_id: QuestId) -> Self {
        Self {
            quest_id,
            status: QuestStatus::Locked,
            started_at: None,
            completed_at: None,
            completion_secs: None,
        }
    }

    /// Open the quest and start its clock.
    pub fn unlock(&mut self) {
        if self.status == QuestStatus::Locked {
            self.status = QuestStatus::Unlocked;
            self.started_at = Some(Utc::now());
        }
    }

    /// Mark completed and stamp the elapsed time.
    pub fn complete(&mut self) {
        if self.status == QuestStatus::Completed {
            return;
        }
        let now = Utc::now();
        self.status = QuestStatus::Completed;
        self.completion_secs = self.started_at.map(|start| (now - start).num_seconds());
        self.completed_at = Some(now);
    }

    pub fn is_completed(&self) -> bool {
        self.status == QuestStatus::Completed
    }

    /// True once the quest has ever been opened. Stays true after
    /// completion.
    pub fn is_unlocked(&self) -> bool {
        self.status != QuestStatus::Locked
    }

    /// Completion time as "1m 23s" / "45s".
    pub fn formatted_time(&self) -> Option<String> {
        let secs = self.completion_secs?;
        let minutes = secs / 60;
        let seconds = secs % 60;
        if minutes > 0 {
            Some(format!("{}m {}s", minutes, seconds))
        } else {
            Some(format!("{}s", seconds))
        }
    }
}

/// Progress for the whole campaign, aligned with catalog order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLog {
    records: Vec<QuestRecord>,
}

impl QuestLog {
    /// Fresh log: everything locked except the first quest, whose clock
    /// starts immediately.
    pub fn new(quests: &[Quest]) -> Self {
        let mut records: Vec<QuestRecord> =
            quests.iter().map(|q| QuestRecord::locked(q.id)).collect();
        if let Some(first) = records.first_mut() {
            first.unlock();
        }
        Self { records }
    }

    pub fn get(&self, id: QuestId) -> Option<&QuestRecord> {
        self.records.iter().find(|r| r.quest_id == id)
    }

    pub fn records(&self) -> &[QuestRecord] {
        &self.records
    }

    /// Complete a quest and unlock its successor in the chain. Returns
    /// false when the quest is locked, already completed, or unknown.
    pub fn complete(&mut self, id: QuestId) -> bool {
        let Some(pos) = self.records.iter().position(|r| r.quest_id == id) else {
            return false;
        };
        if self.records[pos].status != QuestStatus::Unlocked {
            return false;
        }

        self.records[pos].complete();

        if let Some(next) = self.records.get_mut(pos + 1) {
            next.unlock();
            info!("Quest {} unlocked", next.quest_id);
        }
        true
    }

    pub fn is_completed(&self, id: QuestId) -> bool {
        self.get(id).map_or(false, |r| r.is_completed())
    }

    pub fn is_unlocked(&self, id: QuestId) -> bool {
        self.get(id).map_or(false, |r| r.is_unlocked())
    }

    /// Number of cleared quests.
    pub fn cleared_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_completed()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize records to JSON for host-side storage.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.records).unwrap_or_else(|_| "[]".to_string())
    }

    /// Restore a log from JSON produced by [`QuestLog::to_json`].
    pub fn from_json(json: &str) -> Self {
        Self {
            records: serde_json::from_str(json).unwrap_or_default(),
        }
    }
}
