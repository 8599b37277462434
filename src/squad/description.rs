//! Squad description files: a named list of units and their upgrades, written by
//! hand in YAML (or JSON, which the YAML parser also accepts).
//!
//! ```yaml
//! name: shuttle escort
//! mode: standard
//! units:
//!   - faction: galactic empire
//!     ship: lambda-class t-4a shuttle
//!     pilot: omicron group pilot
//!     upgrades: [darth vader, fire-control system]
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{EngineConfig, GameMode};
use crate::rules::filter::UpgradeFilterEngine;
use crate::squad::build::UnitBuild;
use crate::squad::roster::{Roster, RosterError};

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("unable to read squad '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse squad: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unit {index}: unknown pilot '{pilot}' on '{ship}' for '{faction}'")]
    UnknownPilot {
        index: usize,
        faction: String,
        ship: String,
        pilot: String,
    },
    #[error("unit {index}: {source}")]
    Rejected {
        index: usize,
        #[source]
        source: RosterError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescription {
    pub faction: String,
    pub ship: String,
    pub pilot: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadDescription {
    #[serde(default)]
    pub name: String,
    /// Overrides the configured mode when present.
    #[serde(default)]
    pub mode: Option<GameMode>,
    #[serde(default)]
    pub autoinclude: bool,
    #[serde(default)]
    pub units: Vec<UnitDescription>,
}

impl SquadDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DescriptionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, DescriptionError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// `base` with this squad's mode applied.
    pub fn config(&self, base: EngineConfig) -> EngineConfig {
        EngineConfig {
            mode: self.mode.unwrap_or(base.mode),
            ..base
        }
    }

    /// Replay the description through a roster: add each unit in order, then equip
    /// its upgrades in order.
    pub fn build(&self, engine: Arc<UpgradeFilterEngine>) -> Result<Roster, DescriptionError> {
        let lookup = Arc::clone(&engine);
        let mut roster = Roster::new(self.name.clone(), engine);

        let mut added_ids = Vec::with_capacity(self.units.len());
        for (index, description) in self.units.iter().enumerate() {
            let unit = UnitBuild::from_catalog(
                lookup.catalog(),
                &description.faction,
                &description.ship,
                &description.pilot,
            )
            .ok_or_else(|| DescriptionError::UnknownPilot {
                index,
                faction: description.faction.clone(),
                ship: description.ship.clone(),
                pilot: description.pilot.clone(),
            })?;

            let added = if self.autoinclude {
                roster.add_unit_with_autoinclude(unit)
            } else {
                roster.add_unit(unit)
            };
            added_ids.push(added.map_err(|source| DescriptionError::Rejected { index, source })?);
        }

        // Upgrades go on after every unit is in, so requirements on later units hold.
        for (index, (description, id)) in self.units.iter().zip(added_ids).enumerate() {
            for upgrade in &description.upgrades {
                roster
                    .equip_upgrade(id, upgrade)
                    .map_err(|source| DescriptionError::Rejected { index, source })?;
            }
        }
        Ok(roster)
    }
}
