//! Random build generation.
//!
//! Characters are a plain uniform draw without replacement. Equipment is
//! drawn from an oversampled candidate pool and walked in random order,
//! skipping any item whose special category is already represented.

use crate::error::{BuildrollError, Result};
use crate::types::{Attribute, Character, DatasetKind, Equipment};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do when the candidate pool runs out before the equipment target
/// is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Return the short list as-is.
    #[default]
    ReturnShort,
    /// Keep drawing from the rest of the eligible set until the target is
    /// met or every item has been considered.
    Refill,
}

/// One special category and the display-name marker identifying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMarker {
    pub category: String,
    pub marker: String,
}

impl CategoryMarker {
    pub fn new(category: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            marker: marker.into(),
        }
    }
}

/// Ordered marker table. Matching is a case-insensitive substring test on
/// the display name; the first matching entry wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    entries: Vec<CategoryMarker>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(
            ["dagon", "aghanim", "blink", "necronomicon"]
                .into_iter()
                .map(|m| CategoryMarker::new(m, m))
                .collect(),
        )
    }
}

impl CategoryTable {
    pub fn new(entries: Vec<CategoryMarker>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_marker(mut self, category: impl Into<String>, marker: impl Into<String>) -> Self {
        self.entries.push(CategoryMarker::new(category, marker));
        self
    }

    pub fn entries(&self) -> &[CategoryMarker] {
        &self.entries
    }

    pub fn category_of(&self, display_name: &str) -> Option<&str> {
        let name = display_name.to_lowercase();
        self.entries
            .iter()
            .find(|e| name.contains(e.marker.to_lowercase().as_str()))
            .map(|e| e.category.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            if entry.category.is_empty() || entry.marker.is_empty() {
                return Err(BuildrollError::Validation(
                    "category table entries need a non-empty category and marker".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Largest character or equipment count a single build may ask for.
pub const MAX_PICK_COUNT: usize = 64;

/// Build size and sampling settings.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Characters per build. Default: 3.
    pub character_count: usize,

    /// Target equipment per build. Default: 6.
    pub equipment_count: usize,

    /// Candidate pool is `equipment_count × oversample_factor`. Default: 2.
    pub oversample_factor: usize,

    pub exhaustion: ExhaustionPolicy,

    pub categories: CategoryTable,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            character_count: 3,
            equipment_count: 6,
            oversample_factor: 2,
            exhaustion: ExhaustionPolicy::ReturnShort,
            categories: CategoryTable::default(),
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character_count(mut self, count: usize) -> Self {
        self.character_count = count;
        self
    }

    pub fn with_equipment_count(mut self, count: usize) -> Self {
        self.equipment_count = count;
        self
    }

    pub fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.oversample_factor = factor;
        self
    }

    pub fn with_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.character_count == 0 {
            return Err(BuildrollError::Validation(
                "character_count must be > 0".into(),
            ));
        }

        if self.equipment_count == 0 {
            return Err(BuildrollError::Validation(
                "equipment_count must be > 0".into(),
            ));
        }

        if self.character_count > MAX_PICK_COUNT || self.equipment_count > MAX_PICK_COUNT {
            return Err(BuildrollError::Validation(format!(
                "counts must be at most {}",
                MAX_PICK_COUNT
            )));
        }

        if self.oversample_factor == 0 {
            return Err(BuildrollError::Validation(
                "oversample_factor must be > 0".into(),
            ));
        }

        self.categories.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPick {
    pub name: String,
    pub attribute: Attribute,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentPick {
    pub name: String,
    pub cost: u32,
}

/// A generated build. `equipment` may be shorter than requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub characters: Vec<CharacterPick>,
    pub equipment: Vec<EquipmentPick>,
}

impl Build {
    pub fn total_cost(&self) -> u64 {
        self.equipment.iter().map(|e| u64::from(e.cost)).sum()
    }
}

pub struct BuildGenerator {
    config: BuildConfig,
}

impl BuildGenerator {
    pub fn new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Exactly `character_count` distinct characters, or `InsufficientData`.
    pub fn pick_characters<'a, R: Rng + ?Sized>(
        &self,
        characters: &'a [Character],
        rng: &mut R,
    ) -> Result<Vec<&'a Character>> {
        let wanted = self.config.character_count;
        if characters.len() < wanted {
            return Err(BuildrollError::InsufficientData {
                dataset: DatasetKind::Characters,
                requested: wanted,
                available: characters.len(),
            });
        }

        Ok(shuffled_indices(characters.len(), rng)
            .into_iter()
            .take(wanted)
            .map(|i| &characters[i])
            .collect())
    }

    /// Up to `equipment_count` items with at most one per special category.
    pub fn pick_equipment<'a, R: Rng + ?Sized>(
        &self,
        equipment: &'a [Equipment],
        rng: &mut R,
    ) -> Vec<&'a Equipment> {
        let target = self.config.equipment_count;
        let order = shuffled_indices(equipment.len(), rng);
        let pool_size = target
            .saturating_mul(self.config.oversample_factor)
            .min(order.len());
        let (pool, rest) = order.split_at(pool_size);

        let mut used = HashSet::new();
        let mut picked = Vec::with_capacity(target.min(equipment.len()));
        self.take_distinct(pool, equipment, &mut used, &mut picked);

        if picked.len() < target && self.config.exhaustion == ExhaustionPolicy::Refill {
            self.take_distinct(rest, equipment, &mut used, &mut picked);
        }

        picked
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        characters: &[Character],
        equipment: &[Equipment],
        rng: &mut R,
    ) -> Result<Build> {
        let characters = self
            .pick_characters(characters, rng)?
            .into_iter()
            .map(|c| CharacterPick {
                name: c.display_name.clone(),
                attribute: c.primary_attribute,
                roles: c.roles.clone(),
            })
            .collect();

        let equipment = self
            .pick_equipment(equipment, rng)
            .into_iter()
            .map(|e| EquipmentPick {
                name: e.display_name.clone(),
                cost: e.cost,
            })
            .collect();

        Ok(Build {
            characters,
            equipment,
        })
    }

    fn take_distinct<'a, 's>(
        &'s self,
        order: &[usize],
        equipment: &'a [Equipment],
        used: &mut HashSet<&'s str>,
        picked: &mut Vec<&'a Equipment>,
    ) {
        for &i in order {
            if picked.len() >= self.config.equipment_count {
                break;
            }

            let item = &equipment[i];
            match self.config.categories.category_of(&item.display_name) {
                Some(category) if used.contains(category) => continue,
                Some(category) => {
                    used.insert(category);
                    picked.push(item);
                }
                None => picked.push(item),
            }
        }
    }
}

/// Full Fisher–Yates permutation of `0..len`.
fn shuffled_indices<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}
