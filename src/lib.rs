pub mod cli;
pub mod config;
pub mod data;
pub mod rules;
pub mod squad;

pub use config::{EngineConfig, GameMode, UnknownRestrictionPolicy};
pub use data::catalog::{Catalog, CatalogError};
pub use rules::filter::UpgradeFilterEngine;
pub use squad::{Roster, RosterError, UnitBuild, UnitId};
