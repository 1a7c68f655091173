use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which of the two cached datasets something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Characters,
    Equipment,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Characters => "characters",
            DatasetKind::Equipment => "equipment",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary attribute of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Agility,
    Intelligence,
    Universal,
    Unknown,
}

impl Attribute {
    /// Normalize a raw catalog short code. Unrecognized or missing codes map
    /// to [`Attribute::Unknown`].
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("str") => Attribute::Strength,
            Some("agi") => Attribute::Agility,
            Some("int") => Attribute::Intelligence,
            Some("all") => Attribute::Universal,
            _ => Attribute::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Agility => "Agility",
            Attribute::Intelligence => "Intelligence",
            Attribute::Universal => "Universal",
            Attribute::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog identifier of a character. The catalog serves integers, but the
/// value is opaque and a string id is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacterId {
    Int(i64),
    Text(String),
}

impl Default for CharacterId {
    fn default() -> Self {
        CharacterId::Int(0)
    }
}

impl From<i64> for CharacterId {
    fn from(id: i64) -> Self {
        CharacterId::Int(id)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterId::Int(id) => write!(f, "{}", id),
            CharacterId::Text(id) => f.write_str(id),
        }
    }
}

/// A playable character admitted into the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    /// Catalog key, e.g. `npc_dota_hero_axe`
    pub internal_name: String,
    pub display_name: String,
    pub primary_attribute: Attribute,
    pub roles: Vec<String>,
}

impl Character {
    /// Build a character from a raw record. Callers are expected to have run
    /// the record through the eligibility filter first.
    pub fn from_raw(raw: RawCharacter) -> Self {
        let primary_attribute = Attribute::from_code(raw.primary_attr.as_deref());
        Self {
            id: raw.id.unwrap_or_default(),
            internal_name: raw.name.unwrap_or_default(),
            display_name: raw.localized_name.unwrap_or_default(),
            primary_attribute,
            roles: raw.roles.unwrap_or_default(),
        }
    }
}

/// A purchasable, finished equipment item admitted into the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Catalog key, e.g. `blink`
    pub id: String,
    pub display_name: String,
    pub cost: u32,
    pub components: Vec<String>,
}

impl Equipment {
    /// Build an item from its catalog key and raw record.
    ///
    /// The display name prefers `localized_name`, then `dname`, then the key.
    pub fn from_raw(key: &str, raw: RawEquipment) -> Self {
        let display_name = raw
            .localized_name
            .filter(|n| !n.is_empty())
            .or(raw.dname.filter(|n| !n.is_empty()))
            .unwrap_or_else(|| key.to_string());
        let cost = raw
            .cost
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(0);
        Self {
            id: key.to_string(),
            display_name,
            cost,
            components: raw.components.unwrap_or_default(),
        }
    }
}

/// Decode a field, treating a value of the wrong type like a missing one.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Character record as served by the catalog. Every field is optional and
/// mistyped fields decode as absent, so a single bad record is rejected by the
/// filter instead of failing the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCharacter {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<CharacterId>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub localized_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub primary_attr: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub roles: Option<Vec<String>>,
}

/// Equipment record as served by the catalog, keyed externally by catalog key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEquipment {
    #[serde(default, deserialize_with = "lenient")]
    pub dname: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub localized_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cost: Option<i64>,
    /// Usually a bool, but treated by truthiness.
    #[serde(default)]
    pub recipe: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub components: Option<Vec<String>>,
}

impl RawEquipment {
    pub fn is_recipe(&self) -> bool {
        match &self.recipe {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attribute_codes_normalize() {
        assert_eq!(Attribute::from_code(Some("str")), Attribute::Strength);
        assert_eq!(Attribute::from_code(Some("agi")), Attribute::Agility);
        assert_eq!(Attribute::from_code(Some("int")), Attribute::Intelligence);
        assert_eq!(Attribute::from_code(Some("all")), Attribute::Universal);
        assert_eq!(Attribute::from_code(Some("xyz")), Attribute::Unknown);
        assert_eq!(Attribute::from_code(None), Attribute::Unknown);
        assert_eq!(Attribute::Strength.to_string(), "Strength");
    }

    #[test]
    fn character_from_raw_defaults_roles() {
        let raw: RawCharacter = serde_json::from_value(json!({
            "id": 2,
            "name": "npc_dota_hero_axe",
            "localized_name": "Axe",
            "primary_attr": "str"
        }))
        .unwrap();
        let c = Character::from_raw(raw);
        assert_eq!(c.id, CharacterId::Int(2));
        assert_eq!(c.display_name, "Axe");
        assert_eq!(c.primary_attribute, Attribute::Strength);
        assert!(c.roles.is_empty());
    }

    #[test]
    fn equipment_display_name_fallbacks() {
        let raw: RawEquipment = serde_json::from_value(json!({
            "localized_name": "Blink Dagger",
            "cost": 2250,
            "components": null
        }))
        .unwrap();
        let e = Equipment::from_raw("blink", raw);
        assert_eq!(e.display_name, "Blink Dagger");
        assert_eq!(e.cost, 2250);
        assert!(e.components.is_empty());

        let both = RawEquipment {
            dname: Some("Dagon".into()),
            localized_name: Some("Dagon 2".into()),
            ..Default::default()
        };
        assert_eq!(Equipment::from_raw("dagon_2", both).display_name, "Dagon 2");

        let bare = Equipment::from_raw("mystery", RawEquipment::default());
        assert_eq!(bare.display_name, "mystery");
        assert_eq!(bare.cost, 0);
    }

    #[test]
    fn mistyped_character_fields_decode_as_absent() {
        let raw: Vec<RawCharacter> = serde_json::from_value(json!([
            {"id": 1, "name": "npc_dota_hero_axe", "localized_name": "Axe", "primary_attr": "str"},
            {"id": "x2", "name": "npc_dota_hero_lina", "localized_name": "Lina", "roles": "Nuker"},
            {"id": 3.5, "name": 7, "localized_name": "Sven"}
        ]))
        .unwrap();

        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0].id, Some(CharacterId::Int(1)));
        assert_eq!(raw[1].id, Some(CharacterId::Text("x2".into())));
        assert_eq!(raw[1].roles, None);
        assert_eq!(raw[2].id, None);
        assert_eq!(raw[2].name, None);
        assert_eq!(Character::from_raw(raw[1].clone()).id.to_string(), "x2");
    }

    #[test]
    fn mistyped_equipment_fields_decode_as_absent() {
        let raw: indexmap::IndexMap<String, RawEquipment> = serde_json::from_value(json!({
            "satanic": {"dname": "Satanic", "cost": 5050, "components": ["lifesteal", "claymore"]},
            "weird": {"dname": "Weird", "cost": "3000", "components": ["a", 1]}
        }))
        .unwrap();

        assert_eq!(raw["satanic"].cost, Some(5050));
        assert_eq!(raw["weird"].cost, None);
        assert_eq!(raw["weird"].components, None);
        assert_eq!(raw["weird"].dname.as_deref(), Some("Weird"));
    }

    #[test]
    fn recipe_flag_truthiness() {
        let mut raw = RawEquipment::default();
        assert!(!raw.is_recipe());
        raw.recipe = Some(json!(true));
        assert!(raw.is_recipe());
        raw.recipe = Some(json!(false));
        assert!(!raw.is_recipe());
        raw.recipe = Some(json!(1));
        assert!(raw.is_recipe());
        raw.recipe = Some(json!(0));
        assert!(!raw.is_recipe());
    }
}
