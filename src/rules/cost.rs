//! Cost resolution and presentation ordering for upgrades.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::data::catalog::{CatalogError, UpgradeCost, UpgradeDefinition};
use crate::squad::build::UnitBuild;

/// A unit attribute as read for variable-cost lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Number(u32),
}

impl AttributeValue {
    /// Key used in a variable-cost table.
    pub fn as_key(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Resolve an upgrade's point cost for one unit. A variable-cost table without an
/// entry for the unit's attribute value is a catalog error, never a silent zero.
pub fn resolve_cost(upgrade: &UpgradeDefinition, unit: &UnitBuild) -> Result<u32, CatalogError> {
    match &upgrade.cost {
        UpgradeCost::Fixed(cost) => Ok(*cost),
        UpgradeCost::Variable(variable) => {
            let key = unit.get_attribute(&variable.attribute).as_key();
            variable
                .table
                .get(&key)
                .copied()
                .ok_or_else(|| CatalogError::MissingCostEntry {
                    upgrade: upgrade.name.clone(),
                    attribute: variable.attribute.clone(),
                    key,
                })
        }
    }
}

/// A catalog upgrade with its cost resolved against one unit. The definition is
/// shared with the catalog and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedUpgrade {
    #[serde(skip)]
    pub definition: Arc<UpgradeDefinition>,
    pub name: String,
    pub slots: Vec<String>,
    pub cost: u32,
}

impl ResolvedUpgrade {
    pub fn new(definition: Arc<UpgradeDefinition>, cost: u32) -> Self {
        Self {
            name: definition.name.clone(),
            slots: definition.slots.clone(),
            definition,
            cost,
        }
    }

    pub fn requires_slot(&self, slot: &str) -> bool {
        self.slots.iter().any(|required| required == slot)
    }
}

/// Ascending cost, then name.
pub fn presentation_order(left: &ResolvedUpgrade, right: &ResolvedUpgrade) -> Ordering {
    left.cost
        .cmp(&right.cost)
        .then_with(|| left.name.cmp(&right.name))
}

pub fn sort_for_presentation(upgrades: &mut [ResolvedUpgrade]) {
    upgrades.sort_by(presentation_order);
}

/// Unresolved listing order: fixed costs ascending, variable costs after all of
/// them; name breaks ties in both groups.
pub fn listing_order(left: &UpgradeDefinition, right: &UpgradeDefinition) -> Ordering {
    fn key(cost: &UpgradeCost) -> (bool, u32) {
        match cost {
            UpgradeCost::Fixed(value) => (false, *value),
            UpgradeCost::Variable(_) => (true, 0),
        }
    }
    key(&left.cost)
        .cmp(&key(&right.cost))
        .then_with(|| left.name.cmp(&right.name))
}
