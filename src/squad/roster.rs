//! The squad being built: equipped units in insertion order, cross-unit rules and
//! cost totals. Every mutation refreshes the candidate cache of every unit, since
//! squad-wide restrictions (overrides, solitary names) depend on all of them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameMode;
use crate::data::catalog::CatalogError;
use crate::rules::filter::UpgradeFilterEngine;
use crate::rules::restrictions::SquadFacts;
use crate::squad::build::{EquipError, EquippedUpgrade, UnitBuild};
use crate::squad::export::RosterSummary;

/// Opaque identity of one unit within a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("pilot '{pilot}' is limited to {limit} per squad")]
    PilotLimitReached { pilot: String, limit: u32 },
    #[error("'{found}' does not match the squad faction '{expected}' in {mode} mode")]
    FactionMismatch {
        expected: String,
        found: String,
        mode: GameMode,
    },
    #[error("no unit with id {0}")]
    UnknownUnit(UnitId),
    #[error("upgrade '{upgrade}' is not available to '{pilot}'")]
    NotLegal { upgrade: String, pilot: String },
    #[error(transparent)]
    Equip(#[from] EquipError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone)]
pub struct Roster {
    name: String,
    engine: Arc<UpgradeFilterEngine>,
    units: Vec<(UnitId, UnitBuild)>,
}

impl Roster {
    pub fn new(name: impl Into<String>, engine: Arc<UpgradeFilterEngine>) -> Self {
        Self {
            name: name.into(),
            engine,
            units: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn engine(&self) -> &UpgradeFilterEngine {
        &self.engine
    }

    pub fn mode(&self) -> GameMode {
        self.engine.config().mode
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in insertion order.
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &UnitBuild)> + '_ {
        self.units.iter().map(|(id, unit)| (*id, unit))
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|(id, _)| *id).collect()
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&UnitBuild> {
        self.units
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, unit)| unit)
    }

    /// Direct access bypasses the candidate refresh; call
    /// [Roster::refresh_candidates] after changing squad-visible state.
    pub fn get_unit_mut(&mut self, id: UnitId) -> Option<&mut UnitBuild> {
        self.units
            .iter_mut()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, unit)| unit)
    }

    pub fn find_by_pilot_name(&self, pilot_name: &str) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, unit)| unit.pilot_name() == pilot_name)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn pilot_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, unit) in &self.units {
            *counts.entry(unit.pilot_name().to_string()).or_default() += 1;
        }
        counts
    }

    /// Distinct factions in insertion order.
    pub fn factions(&self) -> Vec<&str> {
        let mut factions: Vec<&str> = Vec::new();
        for (_, unit) in &self.units {
            if !factions.contains(&unit.faction_name()) {
                factions.push(unit.faction_name());
            }
        }
        factions
    }

    pub fn squad_facts(&self) -> SquadFacts {
        SquadFacts::from_units(self.units.iter().map(|(_, unit)| unit))
    }

    /// Reject when the pilot's copy limit is reached, or when the mode requires a
    /// single faction and the unit's faction differs from the squad's.
    pub fn add_unit(&mut self, unit: UnitBuild) -> Result<UnitId, RosterError> {
        self.check_admission(&unit)?;
        let id = UnitId::new();
        let pilot = unit.pilot_name().to_string();
        self.units.push((id, unit));
        if let Err(err) = self.refresh_candidates() {
            self.units.pop();
            return Err(err.into());
        }
        debug!(unit = %id, pilot = %pilot, "unit added");
        Ok(id)
    }

    /// [Roster::add_unit] after equipping the unit's legal autoinclude upgrades.
    pub fn add_unit_with_autoinclude(&mut self, mut unit: UnitBuild) -> Result<UnitId, RosterError> {
        self.check_admission(&unit)?;
        let attached = self.engine.auto_include(&mut unit, &self.squad_facts())?;
        if !attached.is_empty() {
            debug!(pilot = unit.pilot_name(), ?attached, "autoinclude upgrades equipped");
        }
        self.add_unit(unit)
    }

    fn check_admission(&self, unit: &UnitBuild) -> Result<(), RosterError> {
        let limit = unit.pilot_limit();
        if limit > 0 {
            let copies = self
                .units
                .iter()
                .filter(|(_, current)| current.pilot_name() == unit.pilot_name())
                .count();
            if copies >= limit as usize {
                let err = RosterError::PilotLimitReached {
                    pilot: unit.pilot_name().to_string(),
                    limit,
                };
                info!(%err, "unit rejected");
                return Err(err);
            }
        }

        let mode = self.mode();
        if mode.requires_single_faction() {
            if let Some((_, first)) = self.units.first() {
                if first.faction_name() != unit.faction_name() {
                    let err = RosterError::FactionMismatch {
                        expected: first.faction_name().to_string(),
                        found: unit.faction_name().to_string(),
                        mode,
                    };
                    info!(%err, "unit rejected");
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    pub fn remove_unit(&mut self, id: UnitId) -> Result<UnitBuild, RosterError> {
        let position = self.position(id)?;
        let entry = self.units.remove(position);
        if let Err(err) = self.refresh_candidates() {
            self.units.insert(position, entry);
            return Err(err.into());
        }
        debug!(unit = %id, pilot = entry.1.pilot_name(), "unit removed");
        Ok(entry.1)
    }

    /// Attach a catalog upgrade at the cost resolved for this unit. The upgrade
    /// must be among the unit's cached candidates and fit its free slots.
    pub fn equip_upgrade(&mut self, id: UnitId, upgrade_name: &str) -> Result<u32, RosterError> {
        let position = self.position(id)?;
        let unit = &mut self.units[position].1;
        let Some(upgrade) = unit.candidate(upgrade_name).cloned() else {
            let err = RosterError::NotLegal {
                upgrade: upgrade_name.to_string(),
                pilot: unit.pilot_name().to_string(),
            };
            info!(%err, "equip rejected");
            return Err(err);
        };
        if let Err(err) = unit.equip(&upgrade) {
            info!(%err, pilot = unit.pilot_name(), "equip rejected");
            return Err(err.into());
        }

        if let Err(err) = self.refresh_candidates() {
            if let Err(undo_err) = self.units[position].1.unequip_upgrade(upgrade_name) {
                warn!(%undo_err, upgrade = upgrade_name, "equip rollback incomplete");
            }
            return Err(err.into());
        }
        Ok(upgrade.cost)
    }

    pub fn unequip_upgrade(
        &mut self,
        id: UnitId,
        upgrade_name: &str,
    ) -> Result<EquippedUpgrade, RosterError> {
        let position = self.position(id)?;
        let unit = &mut self.units[position].1;
        let removed = match unit.unequip_upgrade(upgrade_name) {
            Ok(removed) => removed,
            Err(err) => {
                info!(%err, pilot = unit.pilot_name(), "unequip rejected");
                return Err(err.into());
            }
        };

        if let Err(err) = self.refresh_candidates() {
            let unit = &mut self.units[position].1;
            let restored = unit.equip_upgrade(Arc::clone(&removed.definition), removed.cost);
            if let Err(restore_err) = restored {
                warn!(%restore_err, "unequip rollback incomplete");
            }
            return Err(err.into());
        }
        Ok(removed)
    }

    /// Recompute every unit's candidate list against the current squad. Nothing is
    /// replaced unless every unit resolves.
    pub fn refresh_candidates(&mut self) -> Result<(), CatalogError> {
        let squad = self.squad_facts();
        let mut refreshed = Vec::with_capacity(self.units.len());
        for (_, unit) in &self.units {
            refreshed.push(self.engine.filter_with_squad(unit, &squad)?);
        }
        for ((_, unit), candidates) in self.units.iter_mut().zip(refreshed) {
            unit.set_candidates(candidates);
        }
        debug!(units = self.units.len(), "candidates refreshed");
        Ok(())
    }

    pub fn total_pilot_cost(&self) -> u32 {
        self.units.iter().map(|(_, unit)| unit.cost()).sum()
    }

    pub fn total_upgrade_cost(&self) -> u32 {
        self.units
            .iter()
            .map(|(_, unit)| unit.total_equipped_upgrade_cost())
            .sum()
    }

    pub fn total_cost(&self) -> u32 {
        self.total_pilot_cost() + self.total_upgrade_cost()
    }

    pub fn summary(&self) -> RosterSummary {
        RosterSummary::from_roster(self)
    }

    fn position(&self, id: UnitId) -> Result<usize, RosterError> {
        self.units
            .iter()
            .position(|(candidate, _)| *candidate == id)
            .ok_or(RosterError::UnknownUnit(id))
    }
}
