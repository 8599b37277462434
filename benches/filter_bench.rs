//! Upgrade filtering throughput: full candidate passes and slot-scoped queries.
//!
//! Run with: `cargo bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use wingman::config::{EngineConfig, GameMode};
use wingman::data::catalog::Catalog;
use wingman::rules::filter::UpgradeFilterEngine;
use wingman::squad::build::UnitBuild;
use wingman::squad::roster::Roster;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/catalog.json");

fn engine(mode: GameMode) -> Arc<UpgradeFilterEngine> {
    let catalog = Catalog::load(FIXTURE).expect("fixture catalog should load");
    Arc::new(UpgradeFilterEngine::new(
        Arc::new(catalog),
        EngineConfig::with_mode(mode),
    ))
}

fn unit(engine: &UpgradeFilterEngine, faction: &str, ship: &str, pilot: &str) -> UnitBuild {
    UnitBuild::from_catalog(engine.catalog(), faction, ship, pilot).expect("fixture pilot should exist")
}

fn bench_filter(c: &mut Criterion) {
    let engine = engine(GameMode::Standard);
    let shuttle = unit(&engine, "galactic empire", "lambda-class t-4a shuttle", "omicron group pilot");
    let freighter = unit(
        &engine,
        "scum and villainy",
        "customized yt-1300 light freighter",
        "freighter captain",
    );

    let mut group = c.benchmark_group("filter");
    group.sample_size(100);

    group.bench_function("filter_by_unit_shuttle", |b| {
        b.iter(|| engine.filter_by_unit(black_box(&shuttle), None))
    });
    group.bench_function("filter_by_unit_freighter", |b| {
        b.iter(|| engine.filter_by_unit(black_box(&freighter), None))
    });

    let mut roster = Roster::new("bench", Arc::clone(&engine));
    let id = roster
        .add_unit(shuttle.clone())
        .expect("shuttle should be admitted");
    let cached = roster.get_unit(id).expect("unit should exist");
    group.bench_function("filter_by_unit_and_slot_crew", |b| {
        b.iter(|| engine.filter_by_unit_and_slot(black_box(&cached), black_box("crew")))
    });

    group.finish();
}

fn bench_roster(c: &mut Criterion) {
    let engine = engine(GameMode::Freedom);
    let mut group = c.benchmark_group("roster");
    group.sample_size(50);

    // each equip refreshes every unit, so cost grows with squad size
    group.bench_function("equip_four_units", |b| {
        b.iter_batched(
            || {
                let mut roster = Roster::new("bench", Arc::clone(&engine));
                let mut ids = Vec::new();
                for _ in 0..4 {
                    let next = unit(&engine, "galactic empire", "tie/ln fighter", "academy pilot");
                    ids.push(roster.add_unit(next).expect("fighter should be admitted"));
                }
                (roster, ids)
            },
            |(mut roster, ids)| {
                for id in ids {
                    let _ = roster.equip_upgrade(id, "hull upgrade");
                }
                roster
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_filter, bench_roster);
criterion_main!(benches);
