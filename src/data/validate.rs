use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use tracing::warn;

use crate::data::catalog::{Catalog, CatalogError, UpgradeCost, UpgradeDefinition, KNOWN_SLOT_TYPES};
use crate::rules::restrictions::RestrictionRegistry;

/// Attributes a variable-cost table may be keyed by.
pub const COST_ATTRIBUTES: &[&str] = &["agility", "attack", "base", "initiative"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

pub fn validate_catalog_file(path: impl AsRef<Path>) -> Result<ValidationReport, CatalogError> {
    let catalog = Catalog::load(path)?;
    Ok(validate_catalog(&catalog))
}

pub fn validate_catalog(catalog: &Catalog) -> ValidationReport {
    validate_catalog_with(catalog, &RestrictionRegistry::standard())
}

/// Check a catalog for data errors the engine would otherwise hit at filter time.
pub fn validate_catalog_with(catalog: &Catalog, registry: &RestrictionRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut faction_names = HashSet::new();

    for faction in catalog.factions() {
        let faction_context = format!("factions['{}']", faction.name);
        if !faction_names.insert(faction.name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                faction_context.clone(),
                "duplicate faction name",
            );
        }

        let mut ship_names = HashSet::new();
        for ship in &faction.ships {
            let ship_context = format!("{faction_context}.ships['{}']", ship.name);
            if !ship_names.insert(ship.name.as_str()) {
                report.push(ValidationSeverity::Error, ship_context.clone(), "duplicate ship name");
            }
            check_slot_types(&mut report, &ship_context, &ship.upgrade_slots);

            let mut pilot_names = HashSet::new();
            for pilot in &ship.pilots {
                let pilot_context = format!("{ship_context}.pilots['{}']", pilot.name);
                if !pilot_names.insert(pilot.name.as_str()) {
                    report.push(
                        ValidationSeverity::Error,
                        pilot_context.clone(),
                        "duplicate pilot name",
                    );
                }
                check_slot_types(&mut report, &pilot_context, &pilot.upgrade_slots);
            }
        }
    }

    let mut upgrade_names = HashSet::new();
    for upgrade in catalog.upgrades() {
        let context = format!("upgrades['{}']", upgrade.name);
        if !upgrade_names.insert(upgrade.name.as_str()) {
            report.push(ValidationSeverity::Error, context.clone(), "duplicate upgrade name");
        }
        validate_upgrade(&mut report, catalog, registry, &context, upgrade);
    }

    report.push(
        ValidationSeverity::Info,
        "catalog",
        format!(
            "{} faction(s), {} upgrade(s)",
            catalog.factions().len(),
            catalog.upgrades().len()
        ),
    );

    for diag in report
        .diagnostics
        .iter()
        .filter(|diag| diag.severity != ValidationSeverity::Info)
    {
        warn!(severity = %diag.severity, context = %diag.context, "{}", diag.message);
    }
    report
}

fn validate_upgrade(
    report: &mut ValidationReport,
    catalog: &Catalog,
    registry: &RestrictionRegistry,
    context: &str,
    upgrade: &UpgradeDefinition,
) {
    if upgrade.slots.is_empty() {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.upgrade_slot_types"),
            "upgrade requires no slot",
        );
    }
    check_slot_types(report, context, &upgrade.slots);

    if let Some(modifications) = &upgrade.modifications {
        let slots = &modifications.upgrade_slots;
        check_slot_types(report, &format!("{context}.modifications"), &slots.added);
        check_slot_types(report, &format!("{context}.modifications"), &slots.removed);
    }

    for kind in upgrade.restrictions.keys() {
        if !registry.is_registered(kind) {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.restrictions"),
                format!("restriction '{kind}' is not recognized and will be ignored"),
            );
        }
    }

    let UpgradeCost::Variable(variable) = &upgrade.cost else {
        return;
    };
    let cost_context = format!("{context}.cost");
    if !COST_ATTRIBUTES.contains(&variable.attribute.as_str()) {
        report.push(
            ValidationSeverity::Error,
            cost_context.clone(),
            format!("unsupported cost attribute '{}'", variable.attribute),
        );
    }
    if variable.table.is_empty() {
        report.push(ValidationSeverity::Error, cost_context.clone(), "empty cost table");
    }

    if variable.attribute == "base" {
        let mut bases: Vec<&str> = catalog
            .factions()
            .iter()
            .flat_map(|faction| faction.ships.iter())
            .map(|ship| ship.base.as_str())
            .collect();
        bases.sort_unstable();
        bases.dedup();
        for base in bases {
            if !variable.table.contains_key(base) {
                report.push(
                    ValidationSeverity::Error,
                    cost_context.clone(),
                    format!("no cost entry for base '{base}'"),
                );
            }
        }
    }
}

fn check_slot_types(report: &mut ValidationReport, context: &str, slots: &[String]) {
    for slot in slots {
        if !KNOWN_SLOT_TYPES.contains(&slot.as_str()) {
            report.push(
                ValidationSeverity::Warning,
                context.to_string(),
                format!("unknown slot type '{slot}'"),
            );
        }
    }
}
