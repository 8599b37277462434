use std::io;
use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, EngineConfig};
use crate::data::catalog::{Catalog, CatalogError};
use crate::data::validate::{validate_catalog, ValidationSeverity};
use crate::rules::filter::UpgradeFilterEngine;
use crate::squad::build::UnitBuild;
use crate::squad::description::{DescriptionError, SquadDescription};
use crate::squad::export::{import_from_path, write_csv, ExportError, ImportError};
use crate::squad::roster::Roster;

pub const LOG_ENV: &str = "WINGMAN_LOG";

const USAGE: &str = "usage: wingman <catalog|validate|filter|build|export|import> <catalog.json> ...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Catalog,
    Validate,
    Filter,
    Build,
    Export,
    Import,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("catalog") => Some(Command::Catalog),
        Some("validate") => Some(Command::Validate),
        Some("filter") => Some(Command::Filter),
        Some("build") => Some(Command::Build),
        Some("export") => Some(Command::Export),
        Some("import") => Some(Command::Import),
        _ => None,
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Description(#[from] DescriptionError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown pilot '{pilot}' on '{ship}' for '{faction}'")]
    UnknownPilot {
        faction: String,
        ship: String,
        pilot: String,
    },
    #[error("catalog has {0} validation error(s)")]
    Invalid(usize),
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let outcome = match command {
        Command::Catalog => handle_catalog(args),
        Command::Validate => handle_validate(args),
        Command::Filter => handle_filter(args),
        Command::Build => handle_build(args),
        Command::Export => handle_export(args),
        Command::Import => handle_import(args),
    };

    match outcome {
        Ok(()) => 0,
        Err(CliError::Usage(usage)) => {
            eprintln!("{usage}");
            2
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn load_catalog(args: &[String], usage: &'static str) -> Result<Catalog, CliError> {
    let path = args.get(2).ok_or(CliError::Usage(usage))?;
    Ok(Catalog::load(path)?)
}

fn load_engine(
    args: &[String],
    usage: &'static str,
    config: EngineConfig,
) -> Result<Arc<UpgradeFilterEngine>, CliError> {
    let catalog = load_catalog(args, usage)?;
    Ok(Arc::new(UpgradeFilterEngine::new(Arc::new(catalog), config)))
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_catalog(args: &[String]) -> Result<(), CliError> {
    let catalog = load_catalog(args, "usage: wingman catalog <catalog.json>")?;
    let factions: Vec<_> = catalog
        .factions()
        .iter()
        .map(|faction| {
            let ships: Vec<_> = faction
                .ships
                .iter()
                .map(|ship| {
                    let pilots: Vec<&str> = ship
                        .pilots_by_initiative_cost_name()
                        .into_iter()
                        .map(|pilot| pilot.name.as_str())
                        .collect();
                    json!({
                        "name": ship.name,
                        "base": ship.base,
                        "pilots": pilots,
                        "initiatives": ship.initiative_list(),
                        "point_range": ship.point_range(),
                    })
                })
                .collect();
            json!({ "name": faction.name, "ships": ships })
        })
        .collect();
    let upgrades: Vec<_> = catalog
        .upgrade_listing()
        .into_iter()
        .map(|(name, cost)| json!({ "name": name, "cost": cost }))
        .collect();
    print_json(&json!({ "factions": factions, "upgrades": upgrades }))
}

fn handle_validate(args: &[String]) -> Result<(), CliError> {
    let catalog = load_catalog(args, "usage: wingman validate <catalog.json>")?;
    let report = validate_catalog(&catalog);
    for diag in &report.diagnostics {
        println!("{diag}");
    }
    if report.has_errors() {
        return Err(CliError::Invalid(report.count(ValidationSeverity::Error)));
    }
    println!("validation passed: {} warning(s)", report.count(ValidationSeverity::Warning));
    Ok(())
}

fn handle_filter(args: &[String]) -> Result<(), CliError> {
    const FILTER_USAGE: &str = "usage: wingman filter <catalog.json> <faction> <ship> <pilot> [slot]";
    let engine = load_engine(args, FILTER_USAGE, EngineConfig::from_env()?)?;
    let (Some(faction), Some(ship), Some(pilot)) = (args.get(3), args.get(4), args.get(5)) else {
        return Err(CliError::Usage(FILTER_USAGE));
    };

    let mut unit = UnitBuild::from_catalog(engine.catalog(), faction, ship, pilot).ok_or_else(
        || CliError::UnknownPilot {
            faction: faction.clone(),
            ship: ship.clone(),
            pilot: pilot.clone(),
        },
    )?;
    let candidates = engine.filter_by_unit(&unit, None)?;
    unit.set_candidates(candidates);

    match args.get(6) {
        Some(slot) => print_json(&engine.filter_by_unit_and_slot(&unit, slot)),
        None => print_json(&unit.candidates()),
    }
}

fn build_roster(args: &[String], usage: &'static str) -> Result<Roster, CliError> {
    let config = EngineConfig::from_env()?;
    let squad_path = args.get(3).ok_or(CliError::Usage(usage))?;
    let description = SquadDescription::load(squad_path)?;
    let engine = load_engine(args, usage, description.config(config))?;
    Ok(description.build(engine)?)
}

fn handle_build(args: &[String]) -> Result<(), CliError> {
    let roster = build_roster(args, "usage: wingman build <catalog.json> <squad.yaml>")?;
    print_json(&roster.summary())
}

fn handle_export(args: &[String]) -> Result<(), CliError> {
    let roster = build_roster(args, "usage: wingman export <catalog.json> <squad.yaml>")?;
    write_csv(&roster.summary(), io::stdout().lock())?;
    Ok(())
}

fn handle_import(args: &[String]) -> Result<(), CliError> {
    const IMPORT_USAGE: &str = "usage: wingman import <catalog.json> <squad.csv>";
    let engine = load_engine(args, IMPORT_USAGE, EngineConfig::from_env()?)?;
    let csv_path = args.get(3).ok_or(CliError::Usage(IMPORT_USAGE))?;
    let roster = import_from_path(csv_path, engine)?;
    print_json(&roster.summary())
}
