use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/catalog.json");

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_wingman")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("wingman-{name}-{stamp}.{extension}"))
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("WINGMAN_MODE")
        .env_remove("WINGMAN_CONFIG")
        .env("WINGMAN_LOG", "off")
        .output()
        .expect("wingman should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("command should emit json")
}

const SQUAD: &str = "name: escort
units:
  - faction: galactic empire
    ship: lambda-class t-4a shuttle
    pilot: omicron group pilot
    upgrades: [fire-control system]
  - faction: galactic empire
    ship: tie/ln fighter
    pilot: academy pilot
    upgrades: [hull upgrade]
";

#[test]
fn unknown_command_prints_usage() {
    let output = run(&["serve"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("usage: wingman"));
}

#[test]
fn catalog_command_lists_factions_and_upgrades() {
    let output = run(&["catalog", FIXTURE]);
    assert_eq!(output.status.code(), Some(0));

    let payload = stdout_json(&output);
    let factions = payload["factions"].as_array().expect("factions should be an array");
    assert_eq!(factions.len(), 4);
    assert_eq!(factions[0]["name"], "galactic empire");
    assert_eq!(factions[0]["ships"][0]["point_range"], serde_json::json!([43, 48]));

    let upgrades = payload["upgrades"].as_array().expect("upgrades should be an array");
    assert_eq!(upgrades[0]["name"], "servomotor s-foils");
    assert_eq!(upgrades.last().map(|upgrade| &upgrade["cost"]), Some(&serde_json::json!("Variable")));
}

#[test]
fn validate_command_passes_on_fixture() {
    let output = run(&["validate", FIXTURE]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("validation passed: 1 warning(s)"));
}

#[test]
fn validate_command_returns_non_zero_on_invalid_catalog() {
    let path = unique_temp_path("invalid-catalog", "json");
    fs::write(
        &path,
        r#"{"factions": [], "upgrades": [
            {"name": "nothing", "upgrade_slot_types": [], "cost": 1}
        ]}"#,
    )
    .expect("fixture should be written");

    let output = run(&["validate", path.to_string_lossy().as_ref()]);
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("upgrade requires no slot"));
}

#[test]
fn filter_command_lists_candidates() {
    let output = run(&[
        "filter",
        FIXTURE,
        "galactic empire",
        "lambda-class t-4a shuttle",
        "omicron group pilot",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let payload = stdout_json(&output);
    let names: Vec<&str> = payload
        .as_array()
        .expect("candidates should be an array")
        .iter()
        .filter_map(|upgrade| upgrade["name"].as_str())
        .collect();
    assert_eq!(names.first(), Some(&"fake upgrade"));
    assert_eq!(names.last(), Some(&"darth vader"));
    assert!(!names.contains(&"admiral ozzel"));
}

#[test]
fn filter_command_scopes_to_slot() {
    let output = run(&[
        "filter",
        FIXTURE,
        "galactic empire",
        "tie/ln fighter",
        "academy pilot",
        "modification",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let payload = stdout_json(&output);
    let hull = payload
        .as_array()
        .expect("candidates should be an array")
        .iter()
        .find(|upgrade| upgrade["name"] == "hull upgrade")
        .expect("hull upgrade should be offered");
    assert_eq!(hull["cost"], 7);
}

#[test]
fn filter_command_rejects_unknown_pilot() {
    let output = run(&["filter", FIXTURE, "galactic empire", "tie/ln fighter", "han solo"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown pilot 'han solo'"));

    let output = run(&["filter", FIXTURE, "galactic empire"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn build_and_export_commands_read_squad_descriptions() {
    let squad = unique_temp_path("squad", "yaml");
    fs::write(&squad, SQUAD).expect("squad should be written");
    let squad_arg = squad.to_string_lossy().to_string();

    let built = run(&["build", FIXTURE, &squad_arg]);
    assert_eq!(built.status.code(), Some(0));
    let payload = stdout_json(&built);
    assert_eq!(payload["name"], "escort");
    assert_eq!(payload["total_cost"], 75);

    let exported = run(&["export", FIXTURE, &squad_arg]);
    let _ = fs::remove_file(&squad);
    assert_eq!(exported.status.code(), Some(0));
    let csv = String::from_utf8_lossy(&exported.stdout);
    assert!(csv
        .lines()
        .any(|line| line == "Academy Pilot,Tie/ln Fighter,23,7,Hull Upgrade"));
    assert!(csv.lines().any(|line| line == "Total Squad Cost,75"));
}

#[test]
fn build_command_reports_rejected_units() {
    let squad = unique_temp_path("bad-squad", "yaml");
    fs::write(
        &squad,
        "units:\n  - faction: galactic empire\n    ship: tie/ln fighter\n    pilot: academy pilot\n    upgrades: [ion cannon]\n",
    )
    .expect("squad should be written");

    let output = run(&["build", FIXTURE, squad.to_string_lossy().as_ref()]);
    let _ = fs::remove_file(&squad);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ion cannon"));
}

#[test]
fn import_command_rebuilds_exported_squad() {
    let path = unique_temp_path("import", "csv");
    fs::write(
        &path,
        "Squad Name,Escort\nFaction,Galactic Empire\n\"\"\nPilot Name,Ship Name,Pilot Cost,Upgrades Cost,Upgrades\nOmicron Group Pilot,Lambda-class T-4a Shuttle,43,2,Fire-control System\n\"\"\nTotal Pilot Cost,43\nTotal Upgrade Cost,2\nTotal Squad Cost,45\n",
    )
    .expect("csv should be written");

    let output = run(&["import", FIXTURE, path.to_string_lossy().as_ref()]);
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["name"], "Escort");
    assert_eq!(payload["units"][0]["upgrades"], serde_json::json!(["fire-control system"]));
    assert_eq!(payload["total_cost"], 45);
}

#[test]
fn import_command_returns_usage_without_path() {
    let output = run(&["import", FIXTURE]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("usage: wingman import"));
}
