//! One equipped unit: chassis and pilot merged into effective statistics, plus the
//! upgrades currently attached and the cached list of legal candidates.

use std::sync::Arc;

use thiserror::Error;

use crate::data::catalog::{Action, BaseSize, Catalog, Faction, Pilot, Ship, UpgradeDefinition};
use crate::data::statistics::StatBlock;
use crate::rules::cost::{AttributeValue, ResolvedUpgrade};
use crate::rules::restrictions::first_missing_slot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("no free '{slot}' slot for '{upgrade}'")]
    NoSlotCapacity { upgrade: String, slot: String },
    #[error("'{0}' is solitary and already equipped")]
    AlreadyEquipped(String),
    #[error("'{upgrade}' removes a '{slot}' slot that is not free")]
    RemovedSlotUnavailable { upgrade: String, slot: String },
    #[error("removing '{upgrade}' would leave '{slot}' over capacity")]
    SlotStillInUse { upgrade: String, slot: String },
    #[error("'{0}' is not equipped")]
    NotEquipped(String),
}

/// What an attached upgrade changed on its unit, kept so unequip can undo it exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AppliedModifications {
    added_slots: Vec<String>,
    /// (position in the slot list at removal time, slot type)
    removed_slots: Vec<(usize, String)>,
    added_actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquippedUpgrade {
    pub definition: Arc<UpgradeDefinition>,
    pub name: String,
    pub slots: Vec<String>,
    pub cost: u32,
    applied: AppliedModifications,
}

#[derive(Debug, Clone)]
pub struct UnitBuild {
    faction: String,
    ship: String,
    pilot: String,
    base: BaseSize,
    initiative: u32,
    cost: u32,
    pilot_limit: u32,
    keywords: Vec<String>,
    statistics: StatBlock,
    actions: Vec<Action>,
    slots: Vec<String>,
    equipped: Vec<EquippedUpgrade>,
    candidates: Vec<ResolvedUpgrade>,
}

impl UnitBuild {
    pub fn new(faction: &Faction, ship: &Ship, pilot: &Pilot) -> Self {
        let mut actions = ship.actions.clone();
        actions.extend(pilot.actions.iter().cloned());
        let mut slots = ship.upgrade_slots.clone();
        slots.extend(pilot.upgrade_slots.iter().cloned());
        let mut keywords = ship.keywords.clone();
        keywords.extend(pilot.keywords.iter().cloned());

        Self {
            faction: faction.name.clone(),
            ship: ship.name.clone(),
            pilot: pilot.name.clone(),
            base: ship.base,
            initiative: pilot.initiative,
            cost: pilot.cost,
            pilot_limit: pilot.limit,
            keywords,
            statistics: StatBlock::merged(&ship.statistics, &pilot.statistics),
            actions,
            slots,
            equipped: Vec::new(),
            candidates: Vec::new(),
        }
    }

    /// `None` when any of the three names is unknown.
    pub fn from_catalog(
        catalog: &Catalog,
        faction_name: &str,
        ship_name: &str,
        pilot_name: &str,
    ) -> Option<Self> {
        let faction = catalog.get_faction(faction_name)?;
        let ship = faction.get_ship(ship_name)?;
        let pilot = ship.get_pilot(pilot_name)?;
        Some(Self::new(faction, ship, pilot))
    }

    pub fn faction_name(&self) -> &str {
        &self.faction
    }

    pub fn ship_name(&self) -> &str {
        &self.ship
    }

    pub fn pilot_name(&self) -> &str {
        &self.pilot
    }

    pub fn base(&self) -> BaseSize {
        self.base
    }

    pub fn initiative(&self) -> u32 {
        self.initiative
    }

    /// Pilot point cost, without upgrades.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Copies of this pilot allowed per squad; 0 means unlimited.
    pub fn pilot_limit(&self) -> u32 {
        self.pilot_limit
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn statistics(&self) -> &StatBlock {
        &self.statistics
    }

    pub fn arc_types(&self) -> Vec<&str> {
        self.statistics.arc_types()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Full slot multiset, including slots granted or removed by attached upgrades.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Value of a unit attribute for variable-cost lookups. `base` and `initiative`
    /// are read directly, `agility` from the merged statistics (missing is 0), and
    /// any other name yields the highest attack value.
    pub fn get_attribute(&self, name: &str) -> AttributeValue {
        match name {
            "base" => AttributeValue::Text(self.base.as_str().to_string()),
            "initiative" => AttributeValue::Number(self.initiative),
            "agility" => AttributeValue::Number(self.statistics.agility.unwrap_or(0)),
            _ => AttributeValue::Number(self.statistics.max_attack()),
        }
    }

    /// Slot multiset minus one occurrence per slot occupied by an equipped upgrade.
    pub fn available_slots(&self) -> Vec<String> {
        let mut available = self.slots.clone();
        for slot in self.equipped.iter().flat_map(|upgrade| upgrade.slots.iter()) {
            if let Some(idx) = available.iter().position(|candidate| candidate == slot) {
                available.remove(idx);
            }
        }
        available
    }

    pub fn equipped_upgrades(&self) -> &[EquippedUpgrade] {
        &self.equipped
    }

    pub fn equipped_upgrade_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.equipped.iter().map(|upgrade| upgrade.name.as_str())
    }

    pub fn is_equipped(&self, upgrade_name: &str) -> bool {
        self.equipped.iter().any(|upgrade| upgrade.name == upgrade_name)
    }

    pub fn total_equipped_upgrade_cost(&self) -> u32 {
        self.equipped.iter().map(|upgrade| upgrade.cost).sum()
    }

    /// Pilot cost plus every equipped upgrade.
    pub fn total_cost(&self) -> u32 {
        self.cost + self.total_equipped_upgrade_cost()
    }

    /// Candidates from the last full filter pass, cost-resolved and in presentation order.
    pub fn candidates(&self) -> &[ResolvedUpgrade] {
        &self.candidates
    }

    pub fn candidate(&self, upgrade_name: &str) -> Option<&ResolvedUpgrade> {
        self.candidates.iter().find(|upgrade| upgrade.name == upgrade_name)
    }

    pub(crate) fn set_candidates(&mut self, candidates: Vec<ResolvedUpgrade>) {
        self.candidates = candidates;
    }

    pub fn equip(&mut self, upgrade: &ResolvedUpgrade) -> Result<(), EquipError> {
        self.equip_upgrade(Arc::clone(&upgrade.definition), upgrade.cost)
    }

    /// Attach an upgrade at an already resolved cost. Legality is the caller's
    /// concern; only slot capacity and solitary duplicates are checked here.
    /// Modifications apply in order: added slots, removed slots, added actions.
    /// Nothing changes when an error is returned.
    pub fn equip_upgrade(
        &mut self,
        definition: Arc<UpgradeDefinition>,
        cost: u32,
    ) -> Result<(), EquipError> {
        let name = definition.name.clone();
        if definition.solitary && self.is_equipped(&name) {
            return Err(EquipError::AlreadyEquipped(name));
        }
        let available = self.available_slots();
        if let Some(slot) = first_missing_slot(&definition.slots, &available) {
            return Err(EquipError::NoSlotCapacity {
                upgrade: name,
                slot: slot.to_string(),
            });
        }

        let mut slots = self.slots.clone();
        let mut actions = self.actions.clone();
        let mut applied = AppliedModifications::default();

        if let Some(modifications) = &definition.modifications {
            for slot in &modifications.upgrade_slots.added {
                slots.push(slot.clone());
                applied.added_slots.push(slot.clone());
            }

            // Free capacity after this upgrade takes its own slots.
            let mut free = available;
            free.extend(applied.added_slots.iter().cloned());
            for slot in &definition.slots {
                if let Some(idx) = free.iter().position(|candidate| candidate == slot) {
                    free.remove(idx);
                }
            }
            for slot in &modifications.upgrade_slots.removed {
                let free_idx = free.iter().position(|candidate| candidate == slot);
                let slot_idx = slots.iter().rposition(|candidate| candidate == slot);
                let (Some(free_idx), Some(slot_idx)) = (free_idx, slot_idx) else {
                    return Err(EquipError::RemovedSlotUnavailable {
                        upgrade: name,
                        slot: slot.clone(),
                    });
                };
                free.remove(free_idx);
                slots.remove(slot_idx);
                applied.removed_slots.push((slot_idx, slot.clone()));
            }

            for action in &modifications.actions {
                actions.push(action.clone());
                applied.added_actions.push(action.clone());
            }
        }

        self.slots = slots;
        self.actions = actions;
        self.equipped.push(EquippedUpgrade {
            slots: definition.slots.clone(),
            definition,
            name,
            cost,
            applied,
        });
        Ok(())
    }

    /// Detach the most recently equipped copy of `upgrade_name` and undo its
    /// modifications. Rejected when the remaining upgrades would no longer fit.
    pub fn unequip_upgrade(&mut self, upgrade_name: &str) -> Result<EquippedUpgrade, EquipError> {
        let Some(position) = self
            .equipped
            .iter()
            .rposition(|upgrade| upgrade.name == upgrade_name)
        else {
            return Err(EquipError::NotEquipped(upgrade_name.to_string()));
        };
        let applied = &self.equipped[position].applied;

        let mut slots = self.slots.clone();
        for (idx, slot) in applied.removed_slots.iter().rev() {
            slots.insert((*idx).min(slots.len()), slot.clone());
        }
        for slot in applied.added_slots.iter().rev() {
            if let Some(idx) = slots.iter().rposition(|candidate| candidate == slot) {
                slots.remove(idx);
            }
        }
        let mut actions = self.actions.clone();
        for action in applied.added_actions.iter().rev() {
            if let Some(idx) = actions.iter().rposition(|candidate| candidate == action) {
                actions.remove(idx);
            }
        }

        let occupied: Vec<String> = self
            .equipped
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != position)
            .flat_map(|(_, upgrade)| upgrade.slots.iter().cloned())
            .collect();
        if let Some(slot) = first_missing_slot(&occupied, &slots) {
            return Err(EquipError::SlotStillInUse {
                upgrade: upgrade_name.to_string(),
                slot: slot.to_string(),
            });
        }

        self.slots = slots;
        self.actions = actions;
        Ok(self.equipped.remove(position))
    }
}
