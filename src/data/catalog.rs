//! In-memory card catalog: factions, ships, pilots and upgrade definitions.
//! Loaded once from the JSON definition document and read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::data::statistics::StatBlock;

/// Slot types the catalog is expected to use. Unknown slot types are a validation warning.
pub const KNOWN_SLOT_TYPES: &[&str] = &[
    "astromech",
    "cannon",
    "cargo",
    "command",
    "configuration",
    "crew",
    "force",
    "gunner",
    "hardpoint",
    "illicit",
    "missile",
    "modification",
    "payload",
    "sensor",
    "tactical relay",
    "talent",
    "team",
    "tech",
    "title",
    "torpedo",
    "turret",
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unable to read catalog '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("upgrade '{upgrade}' has no cost entry for {attribute}={key}")]
    MissingCostEntry {
        upgrade: String,
        attribute: String,
        key: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseSize {
    Small,
    Medium,
    Large,
    Huge,
}

impl BaseSize {
    pub const ALL: [BaseSize; 4] = [Self::Small, Self::Medium, Self::Large, Self::Huge];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Huge => "huge",
        }
    }
}

impl fmt::Display for BaseSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action on a ship/pilot bar, optionally linked to a second action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub action: String,
    pub color: String,
    #[serde(default)]
    pub action_link: Option<String>,
    #[serde(default)]
    pub color_link: Option<String>,
}

impl Action {
    pub fn new(action: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            color: color.into(),
            action_link: None,
            color_link: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pilot {
    pub name: String,
    /// Copies allowed per squad; 0 means unlimited.
    #[serde(default)]
    pub limit: u32,
    pub initiative: u32,
    pub cost: u32,
    #[serde(default)]
    pub statistics: StatBlock,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub upgrade_slots: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub name: String,
    pub base: BaseSize,
    #[serde(default)]
    pub statistics: StatBlock,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub upgrade_slots: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub pilots: Vec<Pilot>,
}

impl Ship {
    pub fn get_pilot(&self, pilot_name: &str) -> Option<&Pilot> {
        self.pilots.iter().find(|pilot| pilot.name == pilot_name)
    }

    pub fn pilot_names(&self) -> Vec<&str> {
        self.pilots.iter().map(|pilot| pilot.name.as_str()).collect()
    }

    /// Pilots in browsing order: initiative, then cost, then name.
    pub fn pilots_by_initiative_cost_name(&self) -> Vec<&Pilot> {
        let mut pilots: Vec<&Pilot> = self.pilots.iter().collect();
        pilots.sort_by(|left, right| {
            left.initiative
                .cmp(&right.initiative)
                .then_with(|| left.cost.cmp(&right.cost))
                .then_with(|| left.name.cmp(&right.name))
        });
        pilots
    }

    pub fn initiative_list(&self) -> Vec<u32> {
        let mut initiatives: Vec<u32> = self.pilots.iter().map(|pilot| pilot.initiative).collect();
        initiatives.sort_unstable();
        initiatives
    }

    pub fn point_list(&self) -> Vec<u32> {
        self.pilots.iter().map(|pilot| pilot.cost).collect()
    }

    pub fn point_range(&self) -> Option<(u32, u32)> {
        let points = self.point_list();
        Some((*points.iter().min()?, *points.iter().max()?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    #[serde(default)]
    pub ships: Vec<Ship>,
}

impl Faction {
    pub fn get_ship(&self, ship_name: &str) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.name == ship_name)
    }

    pub fn ship_names(&self) -> Vec<&str> {
        self.ships.iter().map(|ship| ship.name.as_str()).collect()
    }
}

/// Cost table keyed by one unit attribute, e.g. `{"attribute": "agility", "0": 2, "1": 3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCost {
    pub attribute: String,
    #[serde(flatten)]
    pub table: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpgradeCost {
    Fixed(u32),
    Variable(VariableCost),
}

impl UpgradeCost {
    pub fn fixed(&self) -> Option<u32> {
        match self {
            Self::Fixed(cost) => Some(*cost),
            Self::Variable(_) => None,
        }
    }

    /// Label shown in unfiltered listings.
    pub fn label(&self) -> String {
        match self {
            Self::Fixed(cost) => cost.to_string(),
            Self::Variable(_) => "Variable".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotModifications {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

/// Effects applied to a unit while the upgrade is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifications {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub upgrade_slots: SlotModifications,
}

impl Modifications {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
            && self.upgrade_slots.added.is_empty()
            && self.upgrade_slots.removed.is_empty()
    }
}

/// Restriction kind name -> raw payload. Payloads are interpreted by the restriction registry.
pub type RestrictionSet = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub name: String,
    #[serde(rename = "upgrade_slot_types", default)]
    pub slots: Vec<String>,
    pub cost: UpgradeCost,
    #[serde(default, deserialize_with = "null_as_default")]
    pub restrictions: RestrictionSet,
    #[serde(default)]
    pub modifications: Option<Modifications>,
    #[serde(default, deserialize_with = "flag")]
    pub epic: bool,
    #[serde(default, deserialize_with = "flag")]
    pub autoinclude: bool,
    #[serde(default, deserialize_with = "flag")]
    pub solitary: bool,
}

/// Flags are stored as "True"/"False" strings in older documents; only "False" is false.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => false,
        Some(Flag::Bool(value)) => value,
        Some(Flag::Text(text)) => !text.trim().eq_ignore_ascii_case("false"),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    factions: Vec<Faction>,
    #[serde(default)]
    upgrades: Vec<UpgradeDefinition>,
}

/// Read-only catalog. Upgrade definitions are shared with candidate lists via `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    factions: Vec<Faction>,
    upgrades: Vec<Arc<UpgradeDefinition>>,
}

impl Catalog {
    pub fn new(factions: Vec<Faction>, upgrades: Vec<UpgradeDefinition>) -> Self {
        Self {
            factions,
            upgrades: upgrades.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        debug!(
            path = %path.display(),
            factions = catalog.factions.len(),
            upgrades = catalog.upgrades.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Catalog, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Ok(Self::new(document.factions, document.upgrades))
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn faction_names(&self) -> Vec<&str> {
        self.factions.iter().map(|faction| faction.name.as_str()).collect()
    }

    pub fn get_faction(&self, faction_name: &str) -> Option<&Faction> {
        self.factions.iter().find(|faction| faction.name == faction_name)
    }

    pub fn get_ship(&self, faction_name: &str, ship_name: &str) -> Option<&Ship> {
        self.get_faction(faction_name)?.get_ship(ship_name)
    }

    pub fn get_pilot(&self, faction_name: &str, ship_name: &str, pilot_name: &str) -> Option<&Pilot> {
        self.get_ship(faction_name, ship_name)?.get_pilot(pilot_name)
    }

    /// First faction flying `ship_name` with a seat named `pilot_name`.
    pub fn find_pilot(&self, ship_name: &str, pilot_name: &str) -> Option<(&Faction, &Ship, &Pilot)> {
        self.factions.iter().find_map(|faction| {
            let ship = faction.get_ship(ship_name)?;
            let pilot = ship.get_pilot(pilot_name)?;
            Some((faction, ship, pilot))
        })
    }

    pub fn upgrades(&self) -> &[Arc<UpgradeDefinition>] {
        &self.upgrades
    }

    pub fn upgrade_names(&self) -> Vec<&str> {
        self.upgrades.iter().map(|upgrade| upgrade.name.as_str()).collect()
    }

    pub fn get_upgrade(&self, upgrade_name: &str) -> Option<&Arc<UpgradeDefinition>> {
        self.upgrades.iter().find(|upgrade| upgrade.name == upgrade_name)
    }

    /// Every upgrade as (name, cost label), fixed costs first by value then name,
    /// variable costs last by name.
    pub fn upgrade_listing(&self) -> Vec<(&str, String)> {
        let mut upgrades: Vec<&UpgradeDefinition> = self.upgrades.iter().map(Arc::as_ref).collect();
        upgrades.sort_by(|left, right| crate::rules::cost::listing_order(left, right));
        upgrades
            .into_iter()
            .map(|upgrade| (upgrade.name.as_str(), upgrade.cost.label()))
            .collect()
    }
}
