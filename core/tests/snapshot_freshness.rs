//! Snapshots must reflect the current tick's backend data only.
//!
//! Every accessor-visible snapshot is replaced wholesale each tick, so
//! after a successful tick there must be no snapshot stamped with an
//! older tick and no snapshot for a departed entity.

use cosim_core::{
    driver::SimDriver,
    scenario::ScenarioConfig,
    scripted_backend::{FaultPlan, ScriptedBackend},
    store::SimStore,
};

fn build_driver(seed: u64) -> SimDriver {
    let scenario = ScenarioConfig::demo();
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let run_id = format!("freshness-test-{seed}");
    store.insert_run(&run_id, seed, "0.1.0-test").expect("insert run");

    let backend = ScriptedBackend::new(scenario.clone(), seed).with_faults(FaultPlan::default());
    SimDriver::build(run_id, seed, Box::new(backend), store, &scenario)
}

#[test]
fn all_snapshots_carry_the_current_tick() {
    let mut driver = build_driver(21);

    // Check at several points in the run, not just the end.
    for _ in 0..5 {
        driver.run_ticks(17).expect("run");
        let now = driver.clock.last_tick;

        let vehicles = driver.vehicles().expect("vehicle interface");
        for id in vehicles.ids() {
            let snap = vehicles.snapshot(id).expect("snapshot");
            assert_eq!(snap.tick, now, "stale vehicle snapshot for {id}");
        }

        let pedestrians = driver.pedestrians().expect("pedestrian interface");
        for id in pedestrians.ids() {
            let snap = pedestrians.snapshot(id).expect("snapshot");
            assert_eq!(snap.tick, now, "stale pedestrian snapshot for {id}");
        }

        let lights = driver.traffic_lights().expect("traffic light interface");
        for id in lights.ids() {
            let snap = lights.snapshot(id).expect("snapshot");
            assert_eq!(snap.tick, now, "stale traffic light snapshot for {id}");
        }
    }
}

#[test]
fn snapshot_set_matches_backend_population() {
    let mut driver = build_driver(22);
    driver.run_ticks(120).expect("run");

    // The driver's view and the backend's actual population must agree.
    let backend = driver
        .backend()
        .as_any()
        .downcast_ref::<ScriptedBackend>()
        .expect("scripted backend");
    assert_eq!(backend.vehicle_state_calls, 120, "backend not polled every tick");

    let vehicle_population = backend.active_vehicles();
    let pedestrian_population = backend.active_pedestrians();
    assert_eq!(driver.vehicles().expect("vehicle interface").count(), vehicle_population);
    assert_eq!(
        driver.pedestrians().expect("pedestrian interface").count(),
        pedestrian_population
    );
}

#[test]
fn departed_entities_lose_their_snapshots_and_mappings() {
    let mut driver = build_driver(23);

    driver.run_ticks(1).expect("first tick");
    let vehicles = driver.vehicles().expect("vehicle interface");
    let first_ids = vehicles.ids();

    // Demo trips last at most 30 ticks, so everything seen at tick 1 is
    // gone well before tick 40.
    driver.run_ticks(40).expect("run to 41");
    let vehicles = driver.vehicles().expect("vehicle interface");
    for id in first_ids {
        let gone = vehicles.snapshot(id);
        assert!(
            gone.is_err(),
            "vehicle {id} from tick 1 still has a snapshot at tick 41"
        );
    }
}

#[test]
fn external_ids_resolve_back_to_internal() {
    let mut driver = build_driver(25);

    // Check several points in the run; vehicle population varies per tick.
    let mut resolved_vehicles = 0usize;
    for _ in 0..6 {
        driver.run_ticks(10).expect("run");

        let vehicles = driver.vehicles().expect("vehicle interface");
        for id in vehicles.ids() {
            let snap = vehicles.snapshot(id).expect("snapshot");
            assert_eq!(vehicles.resolve_external(&snap.external_id).expect("resolve"), id);
            resolved_vehicles += 1;
        }

        let pedestrians = driver.pedestrians().expect("pedestrian interface");
        for id in pedestrians.ids() {
            let snap = pedestrians.snapshot(id).expect("snapshot");
            assert_eq!(pedestrians.resolve_external(&snap.external_id).expect("resolve"), id);
        }
    }
    assert!(resolved_vehicles > 0, "no vehicles seen at any checkpoint");

    let lights = driver.traffic_lights().expect("traffic light interface");
    let light_id = lights.resolve_external("tl-main").expect("resolve light");
    assert_eq!(lights.snapshot(light_id).expect("snapshot").external_id, "tl-main");

    let missing = lights.resolve_external("tl-nowhere").unwrap_err();
    assert!(missing.is_not_found());
}

#[test]
fn accessor_counts_are_consistent() {
    let mut driver = build_driver(24);
    driver.run_ticks(60).expect("run");

    let vehicles = driver.vehicles().expect("vehicle interface");
    assert_eq!(vehicles.ids().len(), vehicles.count());
    let pedestrians = driver.pedestrians().expect("pedestrian interface");
    assert_eq!(pedestrians.ids().len(), pedestrians.count());
    let lights = driver.traffic_lights().expect("traffic light interface");
    assert_eq!(lights.count(), 1, "demo scenario has one light");
}
