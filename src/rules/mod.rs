pub mod cost;
pub mod filter;
pub mod restrictions;

pub use cost::{resolve_cost, AttributeValue, ResolvedUpgrade};
pub use filter::UpgradeFilterEngine;
pub use restrictions::{RestrictionContext, RestrictionError, RestrictionRegistry, SquadFacts};
