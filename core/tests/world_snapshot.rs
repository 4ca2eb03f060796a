//! Periodic world snapshots: persisted on the interval, decodable, and
//! stamped with the tick they were taken at.

use cosim_core::{
    driver::SimDriver,
    scenario::ScenarioConfig,
    scripted_backend::ScriptedBackend,
    snapshot::{SimSnapshot, SNAPSHOT_INTERVAL},
    store::SimStore,
};

fn build_driver(run_id: &str, seed: u64) -> SimDriver {
    let scenario = ScenarioConfig::demo();
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_run(run_id, seed, "0.1.0-test").expect("insert run");

    let backend = ScriptedBackend::new(scenario.clone(), seed);
    SimDriver::build(run_id.to_string(), seed, Box::new(backend), store, &scenario)
}

#[test]
fn snapshot_is_saved_on_the_interval() {
    let mut driver = build_driver("snap-interval", 5);
    driver.run_ticks(SNAPSHOT_INTERVAL).expect("run");

    let (tick, json) = driver
        .store_latest_snapshot_before("snap-interval", SNAPSHOT_INTERVAL)
        .expect("query")
        .expect("snapshot row exists");
    assert_eq!(tick, SNAPSHOT_INTERVAL);

    let snapshot: SimSnapshot = serde_json::from_str(&json).expect("decode");
    assert_eq!(snapshot.tick, SNAPSHOT_INTERVAL);
    assert_eq!(snapshot.run_id, "snap-interval");
    assert_eq!(snapshot.clock.last_tick, SNAPSHOT_INTERVAL);
    assert_eq!(snapshot.traffic_lights.len(), 1);
    for vehicle in &snapshot.vehicles {
        assert_eq!(vehicle.tick, SNAPSHOT_INTERVAL, "snapshot holds stale vehicle data");
    }
}

#[test]
fn no_snapshot_before_the_interval() {
    let mut driver = build_driver("snap-early", 5);
    driver.run_ticks(SNAPSHOT_INTERVAL - 1).expect("run");

    let row = driver
        .store_latest_snapshot_before("snap-early", SNAPSHOT_INTERVAL)
        .expect("query");
    assert!(row.is_none());
}

#[test]
fn snapshots_accumulate_across_intervals() {
    let mut driver = build_driver("snap-multi", 5);
    driver.run_ticks(SNAPSHOT_INTERVAL * 2).expect("run");

    let (latest, _) = driver
        .store_latest_snapshot_before("snap-multi", SNAPSHOT_INTERVAL * 2)
        .expect("query")
        .expect("second snapshot");
    assert_eq!(latest, SNAPSHOT_INTERVAL * 2);

    let (earlier, _) = driver
        .store_latest_snapshot_before("snap-multi", SNAPSHOT_INTERVAL * 2 - 1)
        .expect("query")
        .expect("first snapshot");
    assert_eq!(earlier, SNAPSHOT_INTERVAL);
}
