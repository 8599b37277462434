//! Roster projection and its CSV form.
//!
//! Layout (rows):
//! `Squad Name,<name>` / `Faction,<faction or Mixed>` / blank /
//! `Pilot Name,Ship Name,Pilot Cost,Upgrades Cost,Upgrades` / one row per unit with
//! upgrade names as trailing columns / blank / the three totals.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GameMode;
use crate::data::names::{catalog_key, prettify_name};
use crate::rules::filter::UpgradeFilterEngine;
use crate::squad::build::UnitBuild;
use crate::squad::roster::{Roster, RosterError, UnitId};

pub const SQUAD_NAME_LABEL: &str = "Squad Name";
pub const FACTION_LABEL: &str = "Faction";
pub const MIXED_FACTION: &str = "Mixed";
pub const HEADER: [&str; 5] = [
    "Pilot Name",
    "Ship Name",
    "Pilot Cost",
    "Upgrades Cost",
    "Upgrades",
];
pub const TOTAL_PILOT_COST_LABEL: &str = "Total Pilot Cost";
pub const TOTAL_UPGRADE_COST_LABEL: &str = "Total Upgrade Cost";
pub const TOTAL_SQUAD_COST_LABEL: &str = "Total Squad Cost";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unable to write squad csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to write squad csv: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unable to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("unable to parse squad csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown pilot '{pilot}' on '{ship}'")]
    UnknownPilot {
        row: usize,
        ship: String,
        pilot: String,
    },
    #[error("row {row}: unknown upgrade '{upgrade}'")]
    UnknownUpgrade { row: usize, upgrade: String },
    #[error("row {row}: {source}")]
    Rejected {
        row: usize,
        #[source]
        source: RosterError,
    },
    #[error("row {row}: unexpected row '{label}'")]
    UnexpectedRow { row: usize, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: UnitId,
    pub faction: String,
    pub pilot_name: String,
    pub ship_name: String,
    pub pilot_cost: u32,
    pub upgrade_cost: u32,
    /// In equip order.
    pub upgrades: Vec<String>,
}

impl UnitSummary {
    pub fn from_unit(id: UnitId, unit: &UnitBuild) -> Self {
        Self {
            id,
            faction: unit.faction_name().to_string(),
            pilot_name: unit.pilot_name().to_string(),
            ship_name: unit.ship_name().to_string(),
            pilot_cost: unit.cost(),
            upgrade_cost: unit.total_equipped_upgrade_cost(),
            upgrades: unit.equipped_upgrade_names().map(str::to_string).collect(),
        }
    }
}

/// Everything an export needs, detached from the live roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub name: String,
    pub mode: GameMode,
    pub factions: Vec<String>,
    pub units: Vec<UnitSummary>,
    pub total_pilot_cost: u32,
    pub total_upgrade_cost: u32,
    pub total_cost: u32,
}

impl RosterSummary {
    pub fn from_roster(roster: &Roster) -> Self {
        Self {
            name: roster.name().to_string(),
            mode: roster.mode(),
            factions: roster.factions().into_iter().map(str::to_string).collect(),
            units: roster
                .units()
                .map(|(id, unit)| UnitSummary::from_unit(id, unit))
                .collect(),
            total_pilot_cost: roster.total_pilot_cost(),
            total_upgrade_cost: roster.total_upgrade_cost(),
            total_cost: roster.total_cost(),
        }
    }

    /// Display name of the squad faction; "Mixed" when units come from several.
    pub fn faction_label(&self) -> String {
        match self.factions.as_slice() {
            [] => String::new(),
            [faction] => prettify_name(faction),
            _ => MIXED_FACTION.to_string(),
        }
    }
}

pub fn write_csv<W: Write>(summary: &RosterSummary, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv.write_record([SQUAD_NAME_LABEL, summary.name.as_str()])?;
    csv.write_record([FACTION_LABEL, summary.faction_label().as_str()])?;
    csv.write_record([""])?;
    csv.write_record(HEADER)?;
    for unit in &summary.units {
        let mut record = vec![
            prettify_name(&unit.pilot_name),
            prettify_name(&unit.ship_name),
            unit.pilot_cost.to_string(),
            unit.upgrade_cost.to_string(),
        ];
        record.extend(unit.upgrades.iter().map(|upgrade| prettify_name(upgrade)));
        csv.write_record(&record)?;
    }
    csv.write_record([""])?;
    csv.write_record([TOTAL_PILOT_COST_LABEL, summary.total_pilot_cost.to_string().as_str()])?;
    csv.write_record([
        TOTAL_UPGRADE_COST_LABEL,
        summary.total_upgrade_cost.to_string().as_str(),
    ])?;
    csv.write_record([TOTAL_SQUAD_COST_LABEL, summary.total_cost.to_string().as_str()])?;
    csv.flush()?;
    Ok(())
}

pub fn to_csv_string(summary: &RosterSummary) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(summary, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn export_to_path(summary: &RosterSummary, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(summary, file)
}

#[derive(Debug, Default)]
struct ExpectedTotals {
    pilot: Option<u32>,
    upgrade: Option<u32>,
    squad: Option<u32>,
}

/// Rebuild a roster from its CSV export. Every unit is added first, then each
/// unit's upgrades are equipped in row order. The first rejected row aborts the import.
pub fn read_csv<R: Read>(reader: R, engine: Arc<UpgradeFilterEngine>) -> Result<Roster, ImportError> {
    let lookup = Arc::clone(&engine);
    let catalog = lookup.catalog();
    let mut roster = Roster::new("", engine);
    let mut faction: Option<String> = None;
    let mut in_units = false;
    let mut expected = ExpectedTotals::default();
    let mut pending: Vec<(usize, UnitId, Vec<String>)> = Vec::new();

    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    for (index, record) in csv.records().enumerate() {
        let record = record?;
        let row = index + 1;
        let label = record.get(0).unwrap_or("").trim();
        let value = record.get(1).unwrap_or("").trim();

        match label {
            "" => in_units = false,
            SQUAD_NAME_LABEL => roster.set_name(value),
            FACTION_LABEL => {
                faction = match value {
                    "" | MIXED_FACTION => None,
                    named => Some(catalog_key(named)),
                }
            }
            "Pilot Name" => in_units = true,
            TOTAL_PILOT_COST_LABEL => expected.pilot = value.parse().ok(),
            TOTAL_UPGRADE_COST_LABEL => expected.upgrade = value.parse().ok(),
            TOTAL_SQUAD_COST_LABEL => expected.squad = value.parse().ok(),
            pilot_label if in_units => {
                let pilot = catalog_key(pilot_label);
                let ship = catalog_key(value);
                let unit = match faction.as_deref() {
                    Some(faction) => UnitBuild::from_catalog(catalog, faction, &ship, &pilot),
                    None => catalog
                        .find_pilot(&ship, &pilot)
                        .map(|(faction, ship, pilot)| UnitBuild::new(faction, ship, pilot)),
                };
                let Some(unit) = unit else {
                    return Err(ImportError::UnknownPilot { row, ship, pilot });
                };

                let id = roster
                    .add_unit(unit)
                    .map_err(|source| ImportError::Rejected { row, source })?;
                let mut upgrades = Vec::new();
                for upgrade in record.iter().skip(HEADER.len() - 1) {
                    if upgrade.trim().is_empty() {
                        continue;
                    }
                    let upgrade = catalog_key(upgrade);
                    if catalog.get_upgrade(&upgrade).is_none() {
                        return Err(ImportError::UnknownUpgrade { row, upgrade });
                    }
                    upgrades.push(upgrade);
                }
                pending.push((row, id, upgrades));
            }
            other => {
                return Err(ImportError::UnexpectedRow {
                    row,
                    label: other.to_string(),
                })
            }
        }
    }

    // Equip only once every unit is in, so squad-wide requirements see later rows.
    for (row, id, upgrades) in pending {
        for upgrade in upgrades {
            roster
                .equip_upgrade(id, &upgrade)
                .map_err(|source| ImportError::Rejected { row, source })?;
        }
    }

    let rebuilt = [
        (TOTAL_PILOT_COST_LABEL, expected.pilot, roster.total_pilot_cost()),
        (TOTAL_UPGRADE_COST_LABEL, expected.upgrade, roster.total_upgrade_cost()),
        (TOTAL_SQUAD_COST_LABEL, expected.squad, roster.total_cost()),
    ];
    for (label, recorded, actual) in rebuilt {
        if let Some(recorded) = recorded {
            if recorded != actual {
                warn!(total = label, recorded, actual, "imported squad costs differ from export");
            }
        }
    }
    debug!(squad = roster.name(), units = roster.len(), "squad imported");
    Ok(roster)
}

pub fn import_from_path(
    path: impl AsRef<Path>,
    engine: Arc<UpgradeFilterEngine>,
) -> Result<Roster, ImportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ImportError::Read {
        path: path.display().to_string(),
        source,
    })?;
    read_csv(file, engine)
}
