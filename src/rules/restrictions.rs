//! Restriction predicates and the registry that maps restriction kinds to them.
//!
//! Every predicate is pure. The free functions take plain facts so they can be
//! tested in isolation; the registered predicates adapt a raw catalog payload and
//! a [RestrictionContext] onto them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{GameMode, UnknownRestrictionPolicy};
use crate::data::catalog::{Action, RestrictionSet};
use crate::data::names::root_name;
use crate::data::statistics::{Compound, CompoundStat};
use crate::squad::build::UnitBuild;

pub const FACTIONS: &str = "factions";
pub const SQUAD_OVERRIDE: &str = "squad_override";

/// Bounds used when a range restriction leaves one side open.
pub const RANGE_FLOOR: u32 = 0;
pub const RANGE_CEILING: u32 = 100;

#[derive(Debug, Error)]
pub enum RestrictionError {
    #[error("malformed '{kind}' restriction: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// `{low, high}`; low inclusive, high exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRange {
    #[serde(default)]
    pub low: Option<u32>,
    #[serde(default)]
    pub high: Option<u32>,
}

impl StatRange {
    pub fn new(low: Option<u32>, high: Option<u32>) -> Self {
        Self { low, high }
    }

    /// A missing unit value counts as 0.
    pub fn contains(&self, value: Option<u32>) -> bool {
        let low = self.low.unwrap_or(RANGE_FLOOR);
        let high = self.high.unwrap_or(RANGE_CEILING);
        (low..high).contains(&value.unwrap_or(0))
    }
}

/// Required action. Matches only an action equal in every field, so an unset link
/// matches only an unlinked action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequirement {
    pub action: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub action_link: Option<String>,
    #[serde(default)]
    pub color_link: Option<String>,
}

impl ActionRequirement {
    pub fn matches(&self, action: &Action) -> bool {
        self.action == action.action
            && self.color.as_deref() == Some(action.color.as_str())
            && self.action_link == action.action_link
            && self.color_link == action.color_link
    }
}

/// Names present anywhere in the squad (pilots and equipped upgrades), by root name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SquadFacts {
    names: BTreeSet<String>,
}

impl SquadFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units<'a, I>(units: I) -> Self
    where
        I: IntoIterator<Item = &'a UnitBuild>,
    {
        let mut facts = Self::new();
        for unit in units {
            facts.insert_unit(unit);
        }
        facts
    }

    pub fn insert_unit(&mut self, unit: &UnitBuild) {
        self.insert_name(unit.pilot_name());
        for name in unit.equipped_upgrade_names() {
            self.insert_name(name);
        }
    }

    pub fn insert_name(&mut self, name: &str) {
        self.names.insert(root_name(name).to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(root_name(name))
    }
}

/// Facts a registered predicate may consult.
#[derive(Debug, Clone, Copy)]
pub struct RestrictionContext<'a> {
    pub unit: &'a UnitBuild,
    pub squad: &'a SquadFacts,
}

pub fn slots_available(required: &[String], available: &[String]) -> bool {
    first_missing_slot(required, available).is_none()
}

/// First required slot type whose count exceeds what `available` offers.
pub fn first_missing_slot<'a>(required: &'a [String], available: &[String]) -> Option<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for slot in available {
        *counts.entry(slot.as_str()).or_default() += 1;
    }
    for slot in required {
        match counts.get_mut(slot.as_str()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return Some(slot.as_str()),
        }
    }
    None
}

/// Empty allow-list means unrestricted.
pub fn name_allowed(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|name| name == value)
}

pub fn any_name_allowed(allowed: &[String], values: &[&str]) -> bool {
    allowed.is_empty() || values.iter().any(|value| name_allowed(allowed, value))
}

pub fn within_range(range: &StatRange, value: Option<u32>) -> bool {
    range.contains(value)
}

/// Every restricted sub-field must pass; sub-fields without a range are unrestricted.
pub fn within_compound_range(
    ranges: &BTreeMap<String, StatRange>,
    stat: CompoundStat,
    compound: &Compound,
) -> bool {
    ranges
        .iter()
        .all(|(key, range)| range.contains(compound.sub_field(stat, key)))
}

pub fn has_required_action(required: &[ActionRequirement], actions: &[Action]) -> bool {
    required.is_empty()
        || actions
            .iter()
            .any(|action| required.iter().any(|requirement| requirement.matches(action)))
}

/// `{upgrade name: max copies}` on one unit; 0 means unlimited.
pub fn under_equip_limit(limits: &BTreeMap<String, u32>, equipped: &[&str]) -> bool {
    limits.iter().all(|(name, max)| {
        let copies = equipped.iter().filter(|current| **current == name.as_str()).count();
        *max == 0 || copies < *max as usize
    })
}

pub fn squad_includes_any(names: &[String], squad: &SquadFacts) -> bool {
    names.iter().any(|name| squad.contains(name))
}

pub fn epic_allowed(epic_only: bool, mode: GameMode) -> bool {
    !epic_only || mode == GameMode::Epic
}

/// Common signature of every registered restriction kind.
pub type Predicate = fn(&Value, &RestrictionContext<'_>) -> Result<bool, RestrictionError>;

fn parse<'a, T: Deserialize<'a>>(kind: &str, payload: &'a Value) -> Result<T, RestrictionError> {
    T::deserialize(payload).map_err(|source| RestrictionError::Malformed {
        kind: kind.to_string(),
        source,
    })
}

fn factions(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let allowed: Vec<String> = parse(FACTIONS, payload)?;
    Ok(name_allowed(&allowed, ctx.unit.faction_name()))
}

fn ships(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let allowed: Vec<String> = parse("ships", payload)?;
    Ok(name_allowed(&allowed, ctx.unit.ship_name()))
}

fn base_sizes(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let allowed: Vec<String> = parse("base_sizes", payload)?;
    Ok(name_allowed(&allowed, ctx.unit.base().as_str()))
}

fn arc_types(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let allowed: Vec<String> = parse("arc_types", payload)?;
    Ok(any_name_allowed(&allowed, &ctx.unit.arc_types()))
}

fn keywords(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let allowed: Vec<String> = parse("keywords", payload)?;
    let values: Vec<&str> = ctx.unit.keywords().iter().map(String::as_str).collect();
    Ok(any_name_allowed(&allowed, &values))
}

fn hull(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let range: StatRange = parse("hull", payload)?;
    Ok(within_range(&range, ctx.unit.statistics().hull))
}

fn agility(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let range: StatRange = parse("agility", payload)?;
    Ok(within_range(&range, ctx.unit.statistics().agility))
}

fn initiative(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let range: StatRange = parse("initiative", payload)?;
    Ok(within_range(&range, Some(ctx.unit.initiative())))
}

fn attack(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let range: StatRange = parse("attack", payload)?;
    Ok(within_range(&range, Some(ctx.unit.statistics().max_attack())))
}

fn compound(
    stat: CompoundStat,
    payload: &Value,
    ctx: &RestrictionContext<'_>,
) -> Result<bool, RestrictionError> {
    let ranges: BTreeMap<String, StatRange> = parse(stat.as_str(), payload)?;
    Ok(within_compound_range(&ranges, stat, ctx.unit.statistics().compound(stat)))
}

fn shield(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    compound(CompoundStat::Shield, payload, ctx)
}

fn force(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    compound(CompoundStat::Force, payload, ctx)
}

fn energy(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    compound(CompoundStat::Energy, payload, ctx)
}

fn charge(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    compound(CompoundStat::Charge, payload, ctx)
}

fn actions(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let required: Vec<ActionRequirement> = parse("actions", payload)?;
    Ok(has_required_action(&required, ctx.unit.actions()))
}

fn limit(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let limits: BTreeMap<String, u32> = parse("limit", payload)?;
    let equipped: Vec<&str> = ctx.unit.equipped_upgrade_names().collect();
    Ok(under_equip_limit(&limits, &equipped))
}

fn squad_override(payload: &Value, ctx: &RestrictionContext<'_>) -> Result<bool, RestrictionError> {
    let names: Vec<String> = parse(SQUAD_OVERRIDE, payload)?;
    Ok(squad_includes_any(&names, ctx.squad))
}

/// Restriction kind -> predicate. New kinds register without touching the filter engine.
#[derive(Debug, Clone)]
pub struct RestrictionRegistry {
    kinds: BTreeMap<String, Predicate>,
}

impl Default for RestrictionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl RestrictionRegistry {
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        let builtin: [(&str, Predicate); 15] = [
            (FACTIONS, factions),
            ("ships", ships),
            ("base_sizes", base_sizes),
            ("arc_types", arc_types),
            ("keywords", keywords),
            ("hull", hull),
            ("agility", agility),
            ("initiative", initiative),
            ("attack", attack),
            ("shield", shield),
            ("force", force),
            ("energy", energy),
            ("charge", charge),
            ("actions", actions),
            ("limit", limit),
        ];
        for (kind, predicate) in builtin {
            registry.register(kind, predicate);
        }
        registry.register(SQUAD_OVERRIDE, squad_override);
        registry
    }

    /// Returns the predicate previously registered under `kind`, if any.
    pub fn register(&mut self, kind: impl Into<String>, predicate: Predicate) -> Option<Predicate> {
        self.kinds.insert(kind.into(), predicate)
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// `None` when the kind is not registered.
    pub fn evaluate(
        &self,
        kind: &str,
        payload: &Value,
        ctx: &RestrictionContext<'_>,
    ) -> Option<Result<bool, RestrictionError>> {
        self.kinds.get(kind).map(|predicate| predicate(payload, ctx))
    }

    /// Conjunction of every restriction on an upgrade. The faction restriction and
    /// the squad override form a single conjunct: either one admits the unit.
    pub fn allows(
        &self,
        upgrade_name: &str,
        restrictions: &RestrictionSet,
        ctx: &RestrictionContext<'_>,
        policy: UnknownRestrictionPolicy,
    ) -> bool {
        let has_override = restrictions.contains_key(SQUAD_OVERRIDE);
        for (kind, payload) in restrictions {
            let legal = if kind == FACTIONS && has_override {
                continue;
            } else if kind == SQUAD_OVERRIDE {
                self.conjunct(upgrade_name, kind, payload, ctx, policy)
                    || restrictions.get(FACTIONS).is_some_and(|factions| {
                        self.conjunct(upgrade_name, FACTIONS, factions, ctx, policy)
                    })
            } else {
                self.conjunct(upgrade_name, kind, payload, ctx, policy)
            };
            if !legal {
                return false;
            }
        }
        true
    }

    fn conjunct(
        &self,
        upgrade_name: &str,
        kind: &str,
        payload: &Value,
        ctx: &RestrictionContext<'_>,
        policy: UnknownRestrictionPolicy,
    ) -> bool {
        match self.evaluate(kind, payload, ctx) {
            Some(Ok(legal)) => legal,
            Some(Err(err)) => {
                warn!(upgrade = upgrade_name, %err, "restriction cannot be evaluated");
                false
            }
            None => {
                debug!(upgrade = upgrade_name, kind, ?policy, "unknown restriction kind");
                policy == UnknownRestrictionPolicy::Permissive
            }
        }
    }
}
