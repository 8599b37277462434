pub mod build;
pub mod description;
pub mod export;
pub mod roster;

pub use build::{EquipError, EquippedUpgrade, UnitBuild};
pub use description::{DescriptionError, SquadDescription, UnitDescription};
pub use export::{ExportError, ImportError, RosterSummary, UnitSummary};
pub use roster::{Roster, RosterError, UnitId};
