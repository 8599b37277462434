//! Candidate upgrade lists for a unit.
//!
//! A full pass ([UpgradeFilterEngine::filter_by_unit]) evaluates every restriction
//! against the unit's total slot capacity and resolves costs; its result is cached
//! on the unit. Slot-scoped queries reuse that cache and only redo slot arithmetic
//! against the slots that are currently free.

use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::data::catalog::{Catalog, CatalogError};
use crate::data::names::root_name;
use crate::rules::cost::{resolve_cost, sort_for_presentation, ResolvedUpgrade};
use crate::rules::restrictions::{
    epic_allowed, slots_available, RestrictionContext, RestrictionRegistry, SquadFacts,
};
use crate::squad::build::UnitBuild;
use crate::squad::roster::Roster;

#[derive(Debug, Clone)]
pub struct UpgradeFilterEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    registry: RestrictionRegistry,
}

impl UpgradeFilterEngine {
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        Self::with_registry(catalog, config, RestrictionRegistry::standard())
    }

    pub fn with_registry(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        registry: RestrictionRegistry,
    ) -> Self {
        Self {
            catalog,
            config,
            registry,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn registry(&self) -> &RestrictionRegistry {
        &self.registry
    }

    /// Every upgrade legal for `unit`, cost-resolved and in presentation order.
    /// Squad rules see the roster's units (if any) plus `unit` itself.
    pub fn filter_by_unit(
        &self,
        unit: &UnitBuild,
        roster: Option<&Roster>,
    ) -> Result<Vec<ResolvedUpgrade>, CatalogError> {
        let mut squad = roster
            .map(|roster| SquadFacts::from_units(roster.units().map(|(_, member)| member)))
            .unwrap_or_default();
        squad.insert_unit(unit);
        self.filter_with_squad(unit, &squad)
    }

    pub fn filter_with_squad(
        &self,
        unit: &UnitBuild,
        squad: &SquadFacts,
    ) -> Result<Vec<ResolvedUpgrade>, CatalogError> {
        let ctx = RestrictionContext { unit, squad };
        let mut candidates = Vec::new();
        for upgrade in self.catalog.upgrades() {
            if !epic_allowed(upgrade.epic, self.config.mode) {
                continue;
            }
            if !slots_available(&upgrade.slots, unit.slots()) {
                continue;
            }
            if !self.registry.allows(
                &upgrade.name,
                &upgrade.restrictions,
                &ctx,
                self.config.unknown_restrictions,
            ) {
                continue;
            }
            if upgrade.solitary && squad.contains(root_name(&upgrade.name)) {
                continue;
            }
            let cost = resolve_cost(upgrade, unit)?;
            candidates.push(ResolvedUpgrade::new(Arc::clone(upgrade), cost));
        }
        sort_for_presentation(&mut candidates);
        debug!(
            pilot = unit.pilot_name(),
            candidates = candidates.len(),
            "candidates filtered"
        );
        Ok(candidates)
    }

    /// Cached candidates that need `slot` and still fit in the unit's free slots.
    pub fn filter_by_unit_and_slot(&self, unit: &UnitBuild, slot: &str) -> Vec<ResolvedUpgrade> {
        let available = unit.available_slots();
        unit.candidates()
            .iter()
            .filter(|upgrade| upgrade.requires_slot(slot))
            .filter(|upgrade| slots_available(&upgrade.slots, &available))
            .cloned()
            .collect()
    }

    /// Whether `upgrade_name` can be attached to `unit` right now.
    pub fn is_legal(&self, unit: &UnitBuild, upgrade_name: &str) -> bool {
        unit.candidate(upgrade_name)
            .is_some_and(|upgrade| slots_available(&upgrade.slots, &unit.available_slots()))
    }

    /// Equip every legal autoinclude upgrade that is not already on the unit and
    /// still fits. Returns the names attached.
    pub fn auto_include(
        &self,
        unit: &mut UnitBuild,
        squad: &SquadFacts,
    ) -> Result<Vec<String>, CatalogError> {
        let mut squad = squad.clone();
        squad.insert_unit(unit);
        let candidates = self.filter_with_squad(unit, &squad)?;
        let mut attached = Vec::new();
        for upgrade in candidates.iter().filter(|upgrade| upgrade.definition.autoinclude) {
            if unit.is_equipped(&upgrade.name) {
                continue;
            }
            match unit.equip(upgrade) {
                Ok(()) => attached.push(upgrade.name.clone()),
                Err(err) => debug!(upgrade = %upgrade.name, %err, "autoinclude skipped"),
            }
        }
        Ok(attached)
    }
}
