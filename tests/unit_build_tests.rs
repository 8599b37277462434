use std::sync::Arc;

use wingman::data::catalog::{Action, BaseSize, Catalog, UpgradeDefinition};
use wingman::rules::cost::{resolve_cost, AttributeValue};
use wingman::squad::build::{EquipError, UnitBuild};

fn catalog() -> Catalog {
    Catalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/catalog.json"))
        .expect("fixture catalog should load")
}

fn shuttle(catalog: &Catalog) -> UnitBuild {
    UnitBuild::from_catalog(
        catalog,
        "galactic empire",
        "lambda-class t-4a shuttle",
        "omicron group pilot",
    )
    .expect("shuttle should exist")
}

fn upgrade(catalog: &Catalog, name: &str) -> Arc<UpgradeDefinition> {
    Arc::clone(catalog.get_upgrade(name).expect("fixture upgrade should exist"))
}

fn equip(unit: &mut UnitBuild, catalog: &Catalog, name: &str) -> Result<(), EquipError> {
    let definition = upgrade(catalog, name);
    let cost = resolve_cost(&definition, unit).expect("fixture cost should resolve");
    unit.equip_upgrade(definition, cost)
}

#[test]
fn merges_chassis_and_pilot() {
    let catalog = catalog();
    let vader = UnitBuild::from_catalog(&catalog, "galactic empire", "tie advanced x1", "darth vader")
        .expect("vader should exist");

    assert_eq!(vader.base(), BaseSize::Small);
    assert_eq!(vader.initiative(), 6);
    assert_eq!(vader.cost(), 70);
    assert_eq!(vader.statistics().hull, Some(3));
    assert_eq!(vader.statistics().force.value, Some(3));
    assert_eq!(vader.statistics().shield.value, Some(2));
    assert_eq!(
        vader.slots(),
        ["sensor", "missile", "modification", "force", "talent"]
    );
    assert_eq!(vader.actions().len(), 3);
}

#[test]
fn legacy_pilot_statistics_inherit_chassis_values() {
    let catalog = catalog();
    let iden = UnitBuild::from_catalog(&catalog, "galactic empire", "tie/ln fighter", "iden versio")
        .expect("iden should exist");
    assert_eq!(iden.statistics().agility, Some(3));
    assert_eq!(iden.statistics().shield.value, Some(0));
    assert_eq!(iden.statistics().charge.value, Some(1));
}

#[test]
fn lookup_miss_is_none() {
    let catalog = catalog();
    assert!(UnitBuild::from_catalog(&catalog, "galactic empire", "tie/ln fighter", "han solo").is_none());
    assert!(UnitBuild::from_catalog(&catalog, "galactic republic", "v-19 torrent", "odd ball").is_none());
}

#[test]
fn attributes_for_cost_lookup() {
    let catalog = catalog();
    let unit = shuttle(&catalog);
    assert_eq!(unit.get_attribute("base"), AttributeValue::Text("large".to_string()));
    assert_eq!(unit.get_attribute("initiative"), AttributeValue::Number(1));
    assert_eq!(unit.get_attribute("agility"), AttributeValue::Number(1));
    // any other attribute reads the highest attack
    assert_eq!(unit.get_attribute("attack"), AttributeValue::Number(3));
    assert_eq!(unit.get_attribute("attack").as_key(), "3");
}

#[test]
fn available_slots_subtract_equipped() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    equip(&mut unit, &catalog, "darth vader").expect("crew should fit");
    equip(&mut unit, &catalog, "fire-control system").expect("sensor should fit");

    assert_eq!(
        unit.available_slots(),
        ["cannon", "crew", "modification", "title", "command"]
    );
    assert_eq!(unit.total_equipped_upgrade_cost(), 16);
    assert_eq!(unit.total_cost(), 59);
    assert_eq!(
        unit.equipped_upgrade_names().collect::<Vec<_>>(),
        ["darth vader", "fire-control system"]
    );
}

#[test]
fn equip_beyond_capacity_is_rejected() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    equip(&mut unit, &catalog, "fire-control system").expect("first sensor should fit");

    let err = equip(&mut unit, &catalog, "collision detector").unwrap_err();
    assert_eq!(
        err,
        EquipError::NoSlotCapacity {
            upgrade: "collision detector".to_string(),
            slot: "sensor".to_string(),
        }
    );
    assert_eq!(unit.equipped_upgrades().len(), 1);
}

#[test]
fn solitary_upgrade_cannot_be_equipped_twice() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    equip(&mut unit, &catalog, "darth vader").expect("first copy should fit");
    assert_eq!(
        equip(&mut unit, &catalog, "darth vader"),
        Err(EquipError::AlreadyEquipped("darth vader".to_string()))
    );
    // non-solitary duplicates are allowed while slots remain
    equip(&mut unit, &catalog, "tactical officer").expect("crew should fit");
    assert!(unit.available_slots().iter().all(|slot| slot != "crew"));
}

#[test]
fn multi_slot_upgrade_takes_every_slot() {
    let catalog = catalog();
    let mut freighter = UnitBuild::from_catalog(
        &catalog,
        "scum and villainy",
        "customized yt-1300 light freighter",
        "freighter captain",
    )
    .expect("freighter should exist");
    equip(&mut freighter, &catalog, "jabba the hutt").expect("two crew slots should fit");
    assert!(freighter.available_slots().iter().all(|slot| slot != "crew"));

    freighter.unequip_upgrade("jabba the hutt").expect("unequip should succeed");
    assert_eq!(
        freighter.available_slots().iter().filter(|slot| *slot == "crew").count(),
        2
    );
}

#[test]
fn action_modification_round_trips() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    let before = unit.actions().to_vec();
    let fake = Action::new("fake_action", "purple");

    equip(&mut unit, &catalog, "fake upgrade").expect("modification should fit");
    assert!(unit.actions().contains(&fake));

    unit.unequip_upgrade("fake upgrade").expect("unequip should succeed");
    assert!(!unit.actions().contains(&fake));
    assert_eq!(unit.actions(), before.as_slice());
}

#[test]
fn slot_modification_round_trips() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    let before = unit.slots().to_vec();

    equip(&mut unit, &catalog, "shuttle refit").expect("title should fit");
    assert_eq!(
        unit.slots(),
        ["sensor", "cannon", "crew", "modification", "title", "command", "gunner"]
    );
    assert_eq!(
        unit.available_slots(),
        ["sensor", "cannon", "crew", "modification", "command", "gunner"]
    );

    let removed = unit.unequip_upgrade("shuttle refit").expect("unequip should succeed");
    assert_eq!(removed.cost, 2);
    assert_eq!(unit.slots(), before.as_slice());
    assert!(unit.equipped_upgrades().is_empty());
}

#[test]
fn removed_slot_must_be_free() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    equip(&mut unit, &catalog, "darth vader").expect("crew should fit");
    equip(&mut unit, &catalog, "tactical officer").expect("crew should fit");
    let slots = unit.slots().to_vec();

    let err = equip(&mut unit, &catalog, "shuttle refit").unwrap_err();
    assert!(matches!(err, EquipError::RemovedSlotUnavailable { ref slot, .. } if slot == "crew"));
    assert_eq!(unit.slots(), slots.as_slice());
    assert_eq!(unit.equipped_upgrades().len(), 2);
}

#[test]
fn unequip_keeps_slots_that_are_still_used() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    equip(&mut unit, &catalog, "shuttle refit").expect("title should fit");
    // slot arithmetic only; legality is not checked at this level
    equip(&mut unit, &catalog, "veteran turret gunner").expect("granted gunner should fit");

    let err = unit.unequip_upgrade("shuttle refit").unwrap_err();
    assert!(matches!(err, EquipError::SlotStillInUse { ref slot, .. } if slot == "gunner"));
    assert_eq!(unit.equipped_upgrades().len(), 2);

    unit.unequip_upgrade("veteran turret gunner").expect("gunner unequip should succeed");
    unit.unequip_upgrade("shuttle refit").expect("refit unequip should now succeed");
    assert_eq!(unit.slots(), shuttle(&catalog).slots());
}

#[test]
fn unequip_unknown_upgrade_is_rejected() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    assert_eq!(
        unit.unequip_upgrade("ion cannon").unwrap_err(),
        EquipError::NotEquipped("ion cannon".to_string())
    );
}

#[test]
fn slot_count_never_exceeds_capacity_over_a_sequence() {
    let catalog = catalog();
    let mut unit = shuttle(&catalog);
    let sequence = [
        ("equip", "darth vader"),
        ("equip", "shuttle refit"),
        ("equip", "tactical officer"),
        ("equip", "veteran turret gunner"),
        ("unequip", "shuttle refit"),
        ("unequip", "veteran turret gunner"),
        ("unequip", "shuttle refit"),
        ("equip", "tactical officer"),
        ("equip", "grand moff tarkin"),
        ("unequip", "darth vader"),
    ];

    for (op, name) in sequence {
        let _ = match op {
            "equip" => equip(&mut unit, &catalog, name),
            _ => unit.unequip_upgrade(name).map(|_| ()),
        };
        let occupied: Vec<&str> = unit
            .equipped_upgrades()
            .iter()
            .flat_map(|upgrade| upgrade.slots.iter().map(String::as_str))
            .collect();
        for slot in &occupied {
            let used = occupied.iter().filter(|other| *other == slot).count();
            let capacity = unit.slots().iter().filter(|other| other.as_str() == *slot).count();
            assert!(used <= capacity, "{slot} over capacity after {op} {name}");
        }
    }
}
