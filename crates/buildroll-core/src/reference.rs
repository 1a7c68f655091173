//! Static reference tables consulted by the eligibility filter.
//!
//! Loaded once at startup and shared read-only behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Characters never offered in a build.
pub const EXCLUDED_CHARACTERS: &[&str] = &[
    "npc_dota_hero_broodmother",
    "npc_dota_hero_meepo",
    "npc_dota_hero_chen",
    "npc_dota_hero_visage",
    "npc_dota_hero_arc_warden",
];

/// Items unavailable under the current ruleset (removed, neutral, or
/// drop-only), plus a few large components that slip through the other rules.
pub const UNAVAILABLE_EQUIPMENT: &[&str] = &[
    "wraith_pact",
    "helm_of_the_overlord",
    "trident",
    "vampire_fangs",
    "helm_of_the_undying",
    "third_eye",
    "royal_jelly",
    "witless_shako",
    "princes_knife",
    "repair_kit",
    "greater_faerie_fire",
    "minotaur_horn",
    "poor_mans_shield",
    "iron_talon",
    "ring_of_aquila",
    "arcane_ring",
    "imp_claw",
    "ballista",
    "woodland_striders",
    "mind_breaker",
    "orb_of_destruction",
    "titan_sliver",
    "stormcrafter",
    "penta_edged_sword",
    "elven_tunic",
    "necronomicon",
    "necronomicon_1",
    "necronomicon_2",
    "necronomicon_3",
    "undefined",
    "aghanims_blessing_roshan",
    "sacred_relic",
    "mystic_staff",
    "reaver",
    "eagle",
    "relic",
    "ultimate_scepter_roshan",
    "ultimate_orb",
    "soul_booster",
];

/// Substrings marking intermediate components by catalog key.
pub const COMPONENT_MARKERS: &[&str] = &[
    "relic",
    "eaglesong",
    "reaver",
    "mystic_staff",
    "hyperstone",
    "void_stone",
    "platemail",
    "talisman_of_evasion",
    "staff_of_wizardry",
    "claymore",
    "blade_of_alacrity",
    "ogre_axe",
    "mithril_hammer",
    "ultimate_orb",
    "demon_edge",
    "broadsword",
    "quarterstaff",
    "javelin",
    "ring_of_health",
    "vitality_booster",
    "energy_booster",
    "point_booster",
    "oblivion_staff",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub excluded_characters: HashSet<String>,
    pub unavailable_equipment: HashSet<String>,
    pub component_markers: Vec<String>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            excluded_characters: to_set(EXCLUDED_CHARACTERS),
            unavailable_equipment: to_set(UNAVAILABLE_EQUIPMENT),
            component_markers: COMPONENT_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ReferenceData {
    /// Tables with nothing excluded. Mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            excluded_characters: HashSet::new(),
            unavailable_equipment: HashSet::new(),
            component_markers: Vec::new(),
        }
    }

    pub fn with_excluded_characters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_characters = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unavailable_equipment<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unavailable_equipment = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_component_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_excluded_character(&self, internal_name: &str) -> bool {
        self.excluded_characters.contains(internal_name)
    }

    pub fn is_unavailable_equipment(&self, key: &str) -> bool {
        self.unavailable_equipment.contains(key)
    }

    pub fn is_component_key(&self, key: &str) -> bool {
        self.component_markers
            .iter()
            .any(|marker| !marker.is_empty() && key.contains(marker.as_str()))
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.component_markers.iter().any(|m| m.is_empty()) {
            return Err(crate::error::BuildrollError::Validation(
                "component_markers must not contain empty strings".into(),
            ));
        }
        Ok(())
    }
}

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
