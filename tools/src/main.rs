//! cosim-runner: headless driver loop over the scripted backend.
//!
//! Usage:
//!   cosim-runner --seed 12345 --ticks 600 --db run.db
//!   cosim-runner --seed 12345 --scenario scenarios/crossing.json

use anyhow::Result;
use cosim_core::{
    backend::TimeoutGuard,
    driver::SimDriver,
    scenario::ScenarioConfig,
    scripted_backend::ScriptedBackend,
    snapshot::SimSnapshot,
    store::SimStore,
};
use std::env;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

const BACKEND_BUDGET_MS: u64 = 250;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 600u64);
    let budget_ms = parse_arg(&args, "--budget-ms", BACKEND_BUDGET_MS);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let scenario_path = args
        .windows(2)
        .find(|w| w[0] == "--scenario")
        .map(|w| w[1].as_str());

    let scenario = match scenario_path {
        Some(path) => ScenarioConfig::from_path(Path::new(path))?,
        None => ScenarioConfig::demo(),
    };

    println!("cosim-runner");
    println!("  scenario:  {}", scenario.name);
    println!("  seed:      {seed}");
    println!("  ticks:     {ticks}");
    println!("  db:        {db}");
    println!();

    let store = if db == ":memory:" {
        SimStore::in_memory()?
    } else {
        SimStore::open(db)?
    };
    store.migrate()?;

    let run_id = format!("run-{}", Uuid::new_v4());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;
    log::info!("run {run_id} started at {}", chrono::Utc::now().to_rfc3339());

    let backend = TimeoutGuard::new(
        ScriptedBackend::new(scenario.clone(), seed),
        Duration::from_millis(budget_ms),
    );
    let mut driver = SimDriver::build(run_id.clone(), seed, Box::new(backend), store, &scenario);

    driver.run_ticks(ticks)?;
    print_summary(&driver, &run_id, ticks)?;

    Ok(())
}

fn print_summary(driver: &SimDriver, run_id: &str, ticks: u64) -> Result<()> {
    println!("Run complete: {ticks} ticks, final tick {}", driver.clock.last_tick);

    if let Some(vehicles) = driver.vehicles() {
        println!("  vehicles active:     {}", vehicles.count());
    }
    if let Some(pedestrians) = driver.pedestrians() {
        println!("  pedestrians active:  {}", pedestrians.count());
    }
    if let Some(lights) = driver.traffic_lights() {
        println!("  traffic lights:      {}", lights.count());
        for id in lights.ids() {
            if let Ok(snap) = lights.snapshot(id) {
                println!(
                    "    {} phase={} ({}) for {} ticks",
                    snap.external_id, snap.phase_index, snap.phase_name, snap.ticks_in_phase
                );
            }
        }
    }

    println!("  events logged:       {}", driver.store_event_count(run_id)?);

    if let Some((tick, json)) = driver.store_latest_snapshot_before(run_id, ticks)? {
        let snapshot: SimSnapshot = serde_json::from_str(&json)?;
        println!(
            "  last snapshot:       tick {tick} ({} vehicles, {} pedestrians)",
            snapshot.vehicles.len(),
            snapshot.pedestrians.len()
        );
    }
    Ok(())
}

fn parse_arg(args: &[String], flag: &str, default: u64) -> u64 {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
