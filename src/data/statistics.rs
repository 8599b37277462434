//! Ship and pilot statistic blocks.
//!
//! The catalog stores statistics as a list of single-key objects
//! (`[{"attacks": [...]}, {"agility": 2}, {"shield": {"shield": 3, "recharge": null}}]`).
//! [StatBlock] is the keyed view of that list; a pilot block only carries the
//! entries that override its chassis.

use serde::{Deserialize, Serialize};

/// One primary weapon profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    #[serde(default)]
    pub attack: Option<u32>,
    #[serde(default)]
    pub arc_type: Option<String>,
}

/// A stat with recharge/decharge rates (shield, force, energy, charge).
/// The value field is keyed by the stat's own name in the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compound {
    #[serde(
        default,
        alias = "shield",
        alias = "force",
        alias = "energy",
        alias = "charge"
    )]
    pub value: Option<u32>,
    #[serde(default)]
    pub recharge: Option<u32>,
    #[serde(default, alias = "dicharge")]
    pub decharge: Option<u32>,
}

impl Compound {
    /// Any non-null sub-field marks a pilot override as present.
    pub fn is_present(&self) -> bool {
        self.value.is_some() || self.recharge.is_some() || self.decharge.is_some()
    }

    /// Sub-field lookup used by compound range restrictions.
    pub fn sub_field(&self, stat: CompoundStat, key: &str) -> Option<u32> {
        match key {
            "recharge" => self.recharge,
            "decharge" | "dicharge" => self.decharge,
            "value" => self.value,
            other if other == stat.as_str() => self.value,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundStat {
    Shield,
    Force,
    Energy,
    Charge,
}

impl CompoundStat {
    pub const ALL: [CompoundStat; 4] = [Self::Shield, Self::Force, Self::Energy, Self::Charge];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shield => "shield",
            Self::Force => "force",
            Self::Energy => "energy",
            Self::Charge => "charge",
        }
    }
}

/// One entry of the catalog's statistics list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticEntry {
    Attacks(Vec<Attack>),
    Agility(Option<u32>),
    Hull(Option<u32>),
    Shield(Compound),
    Force(Compound),
    Energy(Compound),
    Charge(Compound),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<StatisticEntry>", into = "Vec<StatisticEntry>")]
pub struct StatBlock {
    pub attacks: Vec<Attack>,
    pub agility: Option<u32>,
    pub hull: Option<u32>,
    pub shield: Compound,
    pub force: Compound,
    pub energy: Compound,
    pub charge: Compound,
}

impl From<Vec<StatisticEntry>> for StatBlock {
    fn from(entries: Vec<StatisticEntry>) -> Self {
        let mut block = StatBlock::default();
        for entry in entries {
            match entry {
                StatisticEntry::Attacks(attacks) => block.attacks = attacks,
                StatisticEntry::Agility(value) => block.agility = value,
                StatisticEntry::Hull(value) => block.hull = value,
                StatisticEntry::Shield(value) => block.shield = value,
                StatisticEntry::Force(value) => block.force = value,
                StatisticEntry::Energy(value) => block.energy = value,
                StatisticEntry::Charge(value) => block.charge = value,
            }
        }
        block
    }
}

impl From<StatBlock> for Vec<StatisticEntry> {
    fn from(block: StatBlock) -> Self {
        vec![
            StatisticEntry::Attacks(block.attacks),
            StatisticEntry::Agility(block.agility),
            StatisticEntry::Hull(block.hull),
            StatisticEntry::Shield(block.shield),
            StatisticEntry::Force(block.force),
            StatisticEntry::Energy(block.energy),
            StatisticEntry::Charge(block.charge),
        ]
    }
}

impl StatBlock {
    /// Merge a pilot block over its chassis: each pilot entry wins when present
    /// (non-empty list, any non-null compound sub-field, non-null scalar).
    pub fn merged(chassis: &StatBlock, pilot: &StatBlock) -> StatBlock {
        let pick = |pilot: &Compound, chassis: &Compound| {
            if pilot.is_present() {
                *pilot
            } else {
                *chassis
            }
        };
        StatBlock {
            attacks: if pilot.attacks.is_empty() {
                chassis.attacks.clone()
            } else {
                pilot.attacks.clone()
            },
            agility: pilot.agility.or(chassis.agility),
            hull: pilot.hull.or(chassis.hull),
            shield: pick(&pilot.shield, &chassis.shield),
            force: pick(&pilot.force, &chassis.force),
            energy: pick(&pilot.energy, &chassis.energy),
            charge: pick(&pilot.charge, &chassis.charge),
        }
    }

    pub fn compound(&self, stat: CompoundStat) -> &Compound {
        match stat {
            CompoundStat::Shield => &self.shield,
            CompoundStat::Force => &self.force,
            CompoundStat::Energy => &self.energy,
            CompoundStat::Charge => &self.charge,
        }
    }

    /// Highest attack value across all weapon profiles; 0 without any.
    pub fn max_attack(&self) -> u32 {
        self.attacks
            .iter()
            .filter_map(|attack| attack.attack)
            .max()
            .unwrap_or(0)
    }

    pub fn arc_types(&self) -> Vec<&str> {
        self.attacks
            .iter()
            .filter_map(|attack| attack.arc_type.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> StatBlock {
        serde_json::from_str(raw).expect("statistics should parse")
    }

    #[test]
    fn parses_single_key_entries() {
        let block = parse(
            r#"[
                {"attacks": [{"attack": 3, "arc_type": "front"}, {"attack": 2, "arc_type": "rear"}]},
                {"agility": 2},
                {"hull": 4},
                {"shield": {"shield": 2, "recharge": null, "decharge": null}},
                {"charge": {"charge": 2, "recharge": 1}}
            ]"#,
        );
        assert_eq!(block.max_attack(), 3);
        assert_eq!(block.arc_types(), vec!["front", "rear"]);
        assert_eq!(block.agility, Some(2));
        assert_eq!(block.shield.value, Some(2));
        assert_eq!(block.charge.recharge, Some(1));
        assert!(!block.force.is_present());
    }

    #[test]
    fn pilot_overrides_only_when_present() {
        let chassis = parse(
            r#"[{"attacks": [{"attack": 2, "arc_type": "front"}]}, {"agility": 3}, {"hull": 3},
                {"shield": {"shield": 0, "recharge": null, "decharge": null}}]"#,
        );
        let pilot = parse(
            r#"[{"attacks": []}, {"agility": null}, {"hull": 4},
                {"shield": {"shield": null, "recharge": 1, "decharge": null}},
                {"force": {"force": null, "recharge": null, "decharge": null}}]"#,
        );
        let merged = StatBlock::merged(&chassis, &pilot);
        assert_eq!(merged.max_attack(), 2);
        assert_eq!(merged.agility, Some(3));
        assert_eq!(merged.hull, Some(4));
        // compound overrides are taken whole
        assert_eq!(merged.shield.value, None);
        assert_eq!(merged.shield.recharge, Some(1));
        assert!(!merged.force.is_present());
    }

    #[test]
    fn accepts_legacy_decharge_spelling() {
        let block = parse(r#"[{"force": {"force": 2, "recharge": 1, "dicharge": 1}}]"#);
        assert_eq!(block.force.decharge, Some(1));
        assert_eq!(block.force.sub_field(CompoundStat::Force, "force"), Some(2));
    }
}
