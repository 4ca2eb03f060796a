//! Movement updates for vehicles the driver already knows about.
//!
//! A vehicle emits VehicleEntered on the tick it is first reported and a
//! movement event on every later tick it is still present. The two never
//! coincide for the same vehicle in the same tick.

use cosim_core::{
    driver::SimDriver,
    event::SimEvent,
    scenario::ScenarioConfig,
    scripted_backend::ScriptedBackend,
    store::SimStore,
};
use std::collections::HashSet;

fn build_driver(seed: u64) -> SimDriver {
    let scenario = ScenarioConfig::demo();
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let run_id = format!("movement-test-{seed}");
    store.insert_run(&run_id, seed, "0.1.0-test").expect("insert run");

    let backend = ScriptedBackend::new(scenario.clone(), seed);
    SimDriver::build(run_id, seed, Box::new(backend), store, &scenario)
}

#[test]
fn re_seen_vehicles_emit_movement_updates() {
    let mut driver = build_driver(31);
    driver.run_ticks(20).expect("run");

    let mut moved_total = 0u64;
    for tick in 1..=20u64 {
        let entries = driver
            .store_events_for_tick("movement-test-31", tick)
            .expect("read events");

        let mut entered_this_tick: HashSet<u64> = HashSet::new();
        for entry in &entries {
            let event: SimEvent =
                serde_json::from_str(&entry.payload).expect("decode payload");
            match event {
                SimEvent::VehicleEntered { internal_id, .. } => {
                    entered_this_tick.insert(internal_id);
                }
                SimEvent::VehicleMoved { internal_id, position_m, .. } => {
                    moved_total += 1;
                    assert_eq!(entry.event_type, "vehicle_moved");
                    assert!(position_m.is_finite() && position_m >= 0.0);
                    assert!(
                        !entered_this_tick.contains(&internal_id),
                        "tick {tick}: vehicle {internal_id} entered and moved in one tick"
                    );
                }
                _ => {}
            }
        }
    }

    // Demo trips last at least 5 ticks, so every spawned vehicle is
    // re-seen several times over 20 ticks.
    assert!(moved_total > 0, "no movement events over 20 ticks");
}

#[test]
fn movement_events_track_active_vehicles_per_tick() {
    let mut driver = build_driver(32);
    driver.run_ticks(1).expect("tick 1");

    for tick in 2..=15u64 {
        let known_before = driver.vehicles().expect("vehicle interface").ids().len();
        driver.run_ticks(1).expect("tick");

        let entries = driver
            .store_events_for_tick("movement-test-32", tick)
            .expect("read events");
        let moved = entries
            .iter()
            .filter(|e| e.event_type == "vehicle_moved")
            .count();
        let departed = entries
            .iter()
            .filter(|e| e.event_type == "vehicle_departed")
            .count();

        // Every vehicle known before the tick either moved or departed.
        assert_eq!(
            moved + departed,
            known_before,
            "tick {tick}: {known_before} vehicles known, {moved} moved, {departed} departed"
        );
    }
}
