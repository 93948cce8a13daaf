//! Entity registry: maps raw entity names to stable character ids.
//!
//! Resolution runs two passes over the characters in ascending id order, so
//! the earliest created character wins ties:
//!
//! 1. exact: the normalized name is a known variation and equals the
//!    normalized canonical name,
//! 2. fuzzy: the best similarity against any variation or the canonical name
//!    is strictly above the configured threshold.
//!
//! Otherwise a new character takes the next id. The registry is an owned
//! value with an explicit lifecycle: [`EntityRegistry::from_table`], mutate,
//! [`EntityRegistry::to_table`].

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use fusion_models::{Appearance, Character, CharacterId, SceneRecord, MAX_CHARACTERS};

use crate::appearance::AppearanceIndex;
use crate::error::{CatalogError, CatalogResult};
use crate::normalize::{normalize_name, similarity};
use crate::table::{CharacterRow, CharacterTable};

/// Default fuzzy match threshold (0..=100).
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 60.0;

/// Registry tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryConfig {
    /// A fuzzy candidate must score strictly above this value
    pub fuzzy_threshold: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl RegistryConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            fuzzy_threshold: threshold.clamp(0.0, 100.0),
        }
    }
}

/// Counts gathered while recording scenes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
    pub characters_loaded: usize,
    pub characters_created: usize,
    pub appearances_added: usize,
    pub names_skipped: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    character: Character,
    canonical_key: String,
}

/// Owner of all characters and appearances during a run.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    config: RegistryConfig,
    // ascending id order
    entries: Vec<Entry>,
    appearances: Vec<Appearance>,
    seen: HashSet<(CharacterId, String)>,
    report: RegistryReport,
}

impl EntityRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            appearances: Vec::new(),
            seen: HashSet::new(),
            report: RegistryReport::default(),
        }
    }

    /// Seed the registry from a persisted table.
    ///
    /// Each character starts with its normalized name as the only variation.
    /// Appearances are rebuilt from the per-character clip lists.
    pub fn from_table(table: &CharacterTable, config: RegistryConfig) -> Self {
        let mut registry = Self::new(config);

        for row in table.rows() {
            let canonical_key = normalize_name(&row.name);
            let mut variations = BTreeSet::new();
            if !canonical_key.is_empty() {
                variations.insert(canonical_key.clone());
            }
            registry.entries.push(Entry {
                character: Character {
                    id: row.id,
                    canonical_name: row.name.clone(),
                    variations,
                },
                canonical_key,
            });
            for video in &row.videos {
                registry.insert_appearance(row.id, video);
            }
        }

        registry.report = RegistryReport {
            characters_loaded: registry.entries.len(),
            ..RegistryReport::default()
        };
        debug!(
            characters = registry.entries.len(),
            appearances = registry.appearances.len(),
            "Seeded entity registry"
        );
        registry
    }

    /// Resolve a raw name to a character id, creating the character if needed.
    pub fn resolve_or_create(&mut self, raw_name: &str) -> CatalogResult<CharacterId> {
        let key = normalize_name(raw_name);
        if key.is_empty() {
            return Err(CatalogError::EmptyName(raw_name.to_string()));
        }

        if let Some(id) = self.find_exact(&key) {
            return Ok(id);
        }
        if let Some(id) = self.find_fuzzy(&key) {
            return Ok(id);
        }
        self.create(raw_name, key)
    }

    /// Resolve `raw_name` and record its appearance on `clip_name`.
    ///
    /// Re-recording the same (character, clip) pair is a no-op.
    pub fn record_appearance(&mut self, raw_name: &str, clip_name: &str) -> CatalogResult<CharacterId> {
        let id = self.resolve_or_create(raw_name)?;
        if self.insert_appearance(id, clip_name) {
            self.report.appearances_added += 1;
        }
        Ok(id)
    }

    /// Record every entity of every scene.
    ///
    /// Names that cannot be registered are skipped; a fatal error stops the
    /// whole batch.
    pub fn record_scenes(&mut self, scenes: &[SceneRecord]) -> CatalogResult<RegistryReport> {
        for scene in scenes {
            for entity in &scene.entities {
                match self.record_appearance(entity, &scene.clip_name) {
                    Ok(_) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(clip = %scene.clip_name, error = %e, "Skipping entity name");
                        self.report.names_skipped += 1;
                    }
                }
            }
        }

        info!(
            loaded = self.report.characters_loaded,
            created = self.report.characters_created,
            appearances = self.report.appearances_added,
            skipped = self.report.names_skipped,
            "Recorded scene entities"
        );
        Ok(self.report)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.entries.iter().map(|e| &e.character)
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters().find(|c| c.id == id)
    }

    pub fn appearances(&self) -> &[Appearance] {
        &self.appearances
    }

    pub fn index(&self) -> AppearanceIndex<'_> {
        AppearanceIndex::new(&self.appearances)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn report(&self) -> RegistryReport {
        self.report
    }

    /// Snapshot the registry as a table: one row per character with its
    /// normalized name and clips in appearance order.
    pub fn to_table(&self) -> CharacterTable {
        let index = self.index();
        CharacterTable::from_rows(self.entries.iter().map(|entry| {
            let id = entry.character.id;
            CharacterRow::new(
                id,
                entry.canonical_key.clone(),
                index.videos_for(id).into_iter().map(String::from).collect(),
            )
        }))
    }

    fn find_exact(&self, key: &str) -> Option<CharacterId> {
        self.entries
            .iter()
            .find(|e| e.canonical_key == key && e.character.variations.contains(key))
            .map(|e| e.character.id)
    }

    fn find_fuzzy(&mut self, key: &str) -> Option<CharacterId> {
        let threshold = self.config.fuzzy_threshold;
        let entry = self.entries.iter_mut().find(|e| {
            let best = e
                .character
                .variations
                .iter()
                .chain(std::iter::once(&e.canonical_key))
                .map(|candidate| similarity(key, candidate))
                .fold(0.0_f64, f64::max);
            best > threshold
        })?;

        debug!(
            name = key,
            character_id = %entry.character.id,
            canonical = %entry.character.canonical_name,
            "Fuzzy matched entity"
        );
        entry.character.variations.insert(key.to_string());
        Some(entry.character.id)
    }

    fn create(&mut self, raw_name: &str, key: String) -> CatalogResult<CharacterId> {
        let highest = self
            .entries
            .iter()
            .map(|e| e.character.id.value())
            .max()
            .unwrap_or(0);
        let count = u16::try_from(self.entries.len()).unwrap_or(u16::MAX);
        let next = match CharacterId::new(count.max(highest)) {
            Some(last) => last.next(),
            None => CharacterId::new(1),
        };

        let id = match next {
            Some(id) => id,
            None => {
                warn!(name = raw_name, limit = MAX_CHARACTERS, "Character capacity exceeded");
                return Err(CatalogError::CapacityExceeded);
            }
        };

        debug!(name = raw_name, character_id = %id, "Created character");
        self.entries.push(Entry {
            character: Character {
                id,
                canonical_name: raw_name.trim().to_string(),
                variations: BTreeSet::from([key.clone()]),
            },
            canonical_key: key,
        });
        self.report.characters_created += 1;
        Ok(id)
    }

    fn insert_appearance(&mut self, id: CharacterId, clip_name: &str) -> bool {
        if !self.seen.insert((id, clip_name.to_string())) {
            return false;
        }
        self.appearances.push(Appearance::new(id, clip_name));
        true
    }
}
