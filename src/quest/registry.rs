//! Quest Catalog
//!
//! Loads and validates quest definitions from TOML. The builtin campaign
//! ships embedded in the crate; hosts can merge extra quest packs from a
//! data directory.

use std::path::Path;

use tracing::{info, warn};

use super::definition::{Quest, QuestId, RawQuestFile};

/// The ten-quest campaign shipped with the engine.
const BUILTIN_QUESTS: &str = include_str!("../../data/quests.toml");

/// Ordered collection of quest definitions.
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: Vec<Quest>,
}

impl QuestCatalog {
    pub fn new() -> Self {
        Self { quests: Vec::new() }
    }

    /// The embedded campaign.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog
            .merge_toml(BUILTIN_QUESTS, "builtin")
            .expect("builtin quest catalog must parse");
        catalog.validate();
        catalog
    }

    /// Parse a TOML document and append its quests.
    fn merge_toml(&mut self, content: &str, source: &str) -> Result<usize, String> {
        let raw: RawQuestFile = toml::from_str(content)
            .map_err(|e| format!("Failed to parse quest file {}: {}", source, e))?;

        let resolved: Vec<Quest> = raw
            .quests
            .iter()
            .map(Quest::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        let count = resolved.len();
        for quest in resolved {
            if self.contains(quest.id) {
                warn!("Duplicate quest id {} in {}, overwriting", quest.id, source);
                self.quests.retain(|q| q.id != quest.id);
            }
            self.quests.push(quest);
        }

        self.quests.sort_by_key(|q| q.id);
        Ok(count)
    }

    /// Merge additional quest packs from a directory of TOML files.
    ///
    /// Bad files are skipped with a warning so one broken pack cannot take
    /// down the rest of the catalog.
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<(), String> {
        if !dir.exists() {
            warn!("Quest directory does not exist: {:?}", dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("Failed to read quest directory {:?}: {}", dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

                match self.merge_toml(&content, &path.display().to_string()) {
                    Ok(n) => info!("Loaded {} quest(s) from {:?}", n, path),
                    Err(e) => warn!("Skipping quest file {:?}: {}", path, e),
                }
            }
        }

        self.validate();
        Ok(())
    }

    /// Warn about holes in the unlock chain.
    fn validate(&self) {
        if self.quests.is_empty() {
            warn!("Quest catalog is empty");
            return;
        }

        for pair in self.quests.windows(2) {
            if pair[1].id != pair[0].id + 1 {
                warn!(
                    "Quest chain gap: quest {} is followed by quest {}",
                    pair[0].id, pair[1].id
                );
            }
        }

        info!("Quest catalog holds {} quest definitions", self.quests.len());
    }

    /// Get a quest by id.
    pub fn get(&self, id: QuestId) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn contains(&self, id: QuestId) -> bool {
        self.quests.iter().any(|q| q.id == id)
    }

    /// All quests, ordered by id.
    pub fn all(&self) -> &[Quest] {
        &self.quests
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::PredicateKind;
    use tempfile::TempDir;

    fn extra_quest_toml() -> &'static str {
        r#"
[[quests]]
id = 11
title = "Bonus Round"
objective = "Measure one more coin"
predicate = "any_measured"
popup_title = "Bonus!"
popup_message = "An extra quest from a quest pack."
score = 1000
"#
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = QuestCatalog::builtin();
        assert_eq!(catalog.len(), 10);

        // Ids are 1..=10 with no gaps.
        for (idx, quest) in catalog.all().iter().enumerate() {
            assert_eq!(quest.id, idx as QuestId + 1);
        }

        let first = catalog.get(1).unwrap();
        assert_eq!(first.predicate, PredicateKind::AnySuperposed);
        assert_eq!(first.score, 100);

        let third = catalog.get(3).unwrap();
        assert_eq!(third.predicate, PredicateKind::EntangledPairMeasured);
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("bonus.toml"), extra_quest_toml()).unwrap();

        let mut catalog = QuestCatalog::builtin();
        catalog.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(catalog.len(), 11);
        let bonus = catalog.get(11).unwrap();
        assert_eq!(bonus.title, "Bonus Round");
        assert_eq!(bonus.score, 1000);
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("broken.toml"),
            "[[quests]]\nid = 11\ntitle = \"Broken\"\nobjective = \"x\"\npredicate = \"kill_monster\"\npopup_title = \"x\"\npopup_message = \"x\"\n",
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("bonus.toml"), extra_quest_toml()).unwrap();

        let mut catalog = QuestCatalog::builtin();
        catalog.load_from_directory(temp_dir.path()).unwrap();

        // The broken pack is dropped, the good one still loads.
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.get(11).unwrap().title, "Bonus Round");
    }

    #[test]
    fn test_duplicate_id_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("override.toml"),
            r#"
[[quests]]
id = 1
title = "Rewritten Opener"
objective = "Measure instead"
predicate = "any_measured"
popup_title = "Changed!"
popup_message = "The first quest was replaced."
"#,
        )
        .unwrap();

        let mut catalog = QuestCatalog::builtin();
        catalog.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.get(1).unwrap().title, "Rewritten Opener");
    }

    #[test]
    fn test_missing_directory_is_ok() {
        let mut catalog = QuestCatalog::builtin();
        assert!(catalog
            .load_from_directory(Path::new("/nonexistent/quests"))
            .is_ok());
        assert_eq!(catalog.len(), 10);
    }
}
