pub mod catalog;
pub mod names;
pub mod statistics;
pub mod validate;

pub use catalog::{
    Action, BaseSize, Catalog, CatalogError, Faction, Modifications, Pilot, RestrictionSet, Ship,
    SlotModifications, UpgradeCost, UpgradeDefinition, VariableCost,
};
pub use names::{catalog_key, prettify_name, root_name};
pub use statistics::{Attack, Compound, CompoundStat, StatBlock};
pub use validate::{
    validate_catalog, validate_catalog_file, ValidationDiagnostic, ValidationReport,
    ValidationSeverity,
};
