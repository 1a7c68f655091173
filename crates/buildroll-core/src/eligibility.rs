//! Rules deciding which raw catalog records may enter the cache.

use crate::error::Result;
use crate::reference::ReferenceData;
use crate::types::{Character, Equipment, RawCharacter, RawEquipment};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Why a raw character record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterRejection {
    MissingInternalName,
    MissingDisplayName,
    Excluded,
}

/// Why a raw equipment record was dropped. Variants are listed in the order
/// the rules are checked; the first failing rule is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentRejection {
    BelowMinimumCost,
    Recipe,
    Free,
    Unavailable,
    NoComponents,
    ComponentKey,
}

impl fmt::Display for CharacterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CharacterRejection::MissingInternalName => "missing internal name",
            CharacterRejection::MissingDisplayName => "missing display name",
            CharacterRejection::Excluded => "excluded",
        };
        f.write_str(s)
    }
}

impl fmt::Display for EquipmentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EquipmentRejection::BelowMinimumCost => "below minimum cost",
            EquipmentRejection::Recipe => "recipe",
            EquipmentRejection::Free => "free",
            EquipmentRejection::Unavailable => "unavailable",
            EquipmentRejection::NoComponents => "no components",
            EquipmentRejection::ComponentKey => "component key",
        };
        f.write_str(s)
    }
}

/// Admitted records plus a tally of rejections by reason.
#[derive(Debug, Clone)]
pub struct FilterOutcome<T, R> {
    pub admitted: Vec<T>,
    pub rejected: BTreeMap<R, usize>,
}

impl<T, R: Ord> FilterOutcome<T, R> {
    fn new() -> Self {
        Self {
            admitted: Vec::new(),
            rejected: BTreeMap::new(),
        }
    }

    fn reject(&mut self, reason: R) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

impl<T, R: fmt::Display> FilterOutcome<T, R> {
    /// `reason=count` pairs for log lines.
    pub fn rejection_summary(&self) -> String {
        self.rejected
            .iter()
            .map(|(reason, n)| format!("{}={}", reason, n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Eligibility rule set shared by both datasets.
#[derive(Debug, Clone)]
pub struct EligibilityRules {
    /// Items must cost strictly more than this. Default: 2500.
    pub minimum_cost: u32,

    pub reference: Arc<ReferenceData>,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            minimum_cost: 2500,
            reference: Arc::new(ReferenceData::default()),
        }
    }
}

impl EligibilityRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minimum_cost(mut self, minimum_cost: u32) -> Self {
        self.minimum_cost = minimum_cost;
        self
    }

    pub fn with_reference(mut self, reference: Arc<ReferenceData>) -> Self {
        self.reference = reference;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.reference.validate()
    }

    pub fn check_character(&self, raw: &RawCharacter) -> std::result::Result<(), CharacterRejection> {
        let internal_name = match raw.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(CharacterRejection::MissingInternalName),
        };

        if raw.localized_name.as_deref().map_or(true, str::is_empty) {
            return Err(CharacterRejection::MissingDisplayName);
        }

        if self.reference.is_excluded_character(internal_name) {
            return Err(CharacterRejection::Excluded);
        }

        Ok(())
    }

    /// Checks the six equipment rules in order. Rules `Recipe` and
    /// `NoComponents` overlap on purpose and both stay.
    pub fn check_equipment(
        &self,
        key: &str,
        raw: &RawEquipment,
    ) -> std::result::Result<(), EquipmentRejection> {
        let cost = raw.cost.unwrap_or(0);

        if cost <= i64::from(self.minimum_cost) {
            return Err(EquipmentRejection::BelowMinimumCost);
        }

        if raw.is_recipe() {
            return Err(EquipmentRejection::Recipe);
        }

        if cost == 0 {
            return Err(EquipmentRejection::Free);
        }

        if self.reference.is_unavailable_equipment(key) {
            return Err(EquipmentRejection::Unavailable);
        }

        if raw.components.as_ref().map_or(true, Vec::is_empty) {
            return Err(EquipmentRejection::NoComponents);
        }

        if self.reference.is_component_key(key) {
            return Err(EquipmentRejection::ComponentKey);
        }

        Ok(())
    }

    pub fn filter_characters(
        &self,
        raw: Vec<RawCharacter>,
    ) -> FilterOutcome<Character, CharacterRejection> {
        let mut outcome = FilterOutcome::new();
        for record in raw {
            match self.check_character(&record) {
                Ok(()) => outcome.admitted.push(Character::from_raw(record)),
                Err(reason) => outcome.reject(reason),
            }
        }
        outcome
    }

    pub fn filter_equipment(
        &self,
        raw: IndexMap<String, RawEquipment>,
    ) -> FilterOutcome<Equipment, EquipmentRejection> {
        let mut outcome = FilterOutcome::new();
        for (key, record) in raw {
            match self.check_equipment(&key, &record) {
                Ok(()) => outcome.admitted.push(Equipment::from_raw(&key, record)),
                Err(reason) => outcome.reject(reason),
            }
        }
        outcome
    }
}
