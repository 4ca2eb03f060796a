//! The top-level driver — advances the whole simulated world by one tick.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Vehicle interface
//!   2. Pedestrian interface
//!   3. Traffic-light interface
//!
//! The order is a correctness requirement, not an optimization: the
//! traffic-light interface extends green phases based on the occupancy
//! the vehicle and pedestrian interfaces measured earlier in the SAME
//! tick.
//!
//! RULES:
//!   - Interfaces execute in registration order, every tick.
//!   - Interfaces communicate only through this tick's events.
//!   - A failed interface aborts the tick; the remaining interfaces are
//!     not called and nothing from the tick is persisted. A partial tick
//!     is a failed tick, never a silently completed one.

use crate::{
    backend::SimulationBackend,
    clock::SimClock,
    error::SimResult,
    event::{EventLogEntry, SimEvent},
    interface::StepInterface,
    pedestrian_interface::PedestrianInterface,
    scenario::ScenarioConfig,
    snapshot::{SimSnapshot, SNAPSHOT_INTERVAL},
    store::SimStore,
    traffic_light_interface::TrafficLightInterface,
    types::{RunId, Tick},
    vehicle_interface::VehicleInterface,
};

pub struct SimDriver {
    pub run_id: RunId,
    pub clock:  SimClock,
    seed:       u64,
    backend:    Box<dyn SimulationBackend>,
    interfaces: Vec<Box<dyn StepInterface>>,
    store:      SimStore,
}

impl SimDriver {
    pub fn new(
        run_id: RunId,
        seed: u64,
        backend: Box<dyn SimulationBackend>,
        store: SimStore,
    ) -> Self {
        Self {
            clock: SimClock::new(run_id.clone()),
            seed,
            backend,
            interfaces: Vec::new(),
            store,
            run_id,
        }
    }

    /// Build a fully wired driver with all sub-interfaces registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(
        run_id: RunId,
        seed: u64,
        backend: Box<dyn SimulationBackend>,
        store: SimStore,
        scenario: &ScenarioConfig,
    ) -> Self {
        let mut driver = SimDriver::new(run_id, seed, backend, store);

        // EXECUTION ORDER — fixed, documented, never reordered.
        driver.register(Box::new(VehicleInterface::new()));
        driver.register(Box::new(PedestrianInterface::new()));
        driver.register(Box::new(TrafficLightInterface::new(
            scenario.traffic_lights.clone(),
        )));
        driver
    }

    /// Register a sub-interface. Call in the documented execution order.
    pub fn register(&mut self, interface: Box<dyn StepInterface>) {
        self.interfaces.push(interface);
    }

    /// Advance one tick. This is the core co-simulation step.
    pub fn simulate_step(&mut self) -> SimResult<Vec<SimEvent>> {
        assert!(!self.clock.paused, "simulate_step() called on paused driver");

        let observed = self.backend.advance()?;
        let current_tick = self.clock.observe(observed)?;

        let mut tick_events: Vec<SimEvent> =
            vec![SimEvent::TickStarted { tick: current_tick }];
        let mut pending: Vec<EventLogEntry> = Vec::new();

        // Execute each interface in registration order.
        // Each interface sees all events emitted so far this tick.
        // The first failure propagates; later interfaces do not run.
        for interface in &mut self.interfaces {
            let new_events =
                interface.simulate_step(current_tick, &tick_events, self.backend.as_mut())?;

            for event in &new_events {
                pending.push(EventLogEntry {
                    id:         None,
                    run_id:     self.run_id.clone(),
                    tick:       current_tick,
                    interface:  interface.name().to_string(),
                    event_type: event_type_name(event).to_string(),
                    payload:    serde_json::to_string(event)?,
                });
            }

            tick_events.extend(new_events);
        }

        tick_events.push(SimEvent::TickCompleted { tick: current_tick });

        // All three interfaces succeeded: the tick is now allowed to exist.
        self.store.append_events(&pending)?;

        if current_tick.is_multiple_of(SNAPSHOT_INTERVAL) {
            self.take_snapshot(current_tick)?;
        }

        Ok(tick_events)
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        // Record RunInitialized before the first tick so seed differences
        // are observable in the log.
        if self.clock.last_tick == 0 {
            let init_event = SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed,
            };
            self.store.append_event(&EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                tick:       0,
                interface:  "driver".to_string(),
                event_type: event_type_name(&init_event).to_string(),
                payload:    serde_json::to_string(&init_event)?,
            })?;
        }
        self.clock.resume();
        for _ in 0..n {
            self.simulate_step()?;
        }
        self.clock.pause();
        Ok(())
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(
        &self,
        run_id: &str,
        tick: Tick,
    ) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    /// Total persisted event rows for a run.
    pub fn store_event_count(&self, run_id: &str) -> SimResult<i64> {
        self.store.event_count(run_id)
    }

    /// Query the latest persisted world snapshot at or before `tick`.
    pub fn store_latest_snapshot_before(
        &self,
        run_id: &str,
        tick: Tick,
    ) -> SimResult<Option<(Tick, String)>> {
        self.store.latest_snapshot_before(run_id, tick)
    }

    /// The backend binding. Read-only; for tests and tooling.
    pub fn backend(&self) -> &dyn SimulationBackend {
        self.backend.as_ref()
    }

    // ── Domain accessors (downcasts, for tests and tooling) ────

    pub fn vehicles(&self) -> Option<&VehicleInterface> {
        self.find_interface::<VehicleInterface>()
    }

    pub fn pedestrians(&self) -> Option<&PedestrianInterface> {
        self.find_interface::<PedestrianInterface>()
    }

    pub fn traffic_lights(&self) -> Option<&TrafficLightInterface> {
        self.find_interface::<TrafficLightInterface>()
    }

    fn find_interface<T: 'static>(&self) -> Option<&T> {
        self.interfaces
            .iter()
            .find_map(|i| i.as_any().downcast_ref::<T>())
    }

    fn take_snapshot(&self, tick: Tick) -> SimResult<()> {
        let mut vehicles = Vec::new();
        if let Some(iface) = self.vehicles() {
            for id in iface.ids() {
                vehicles.push(iface.snapshot(id)?.clone());
            }
        }
        let mut pedestrians = Vec::new();
        if let Some(iface) = self.pedestrians() {
            for id in iface.ids() {
                pedestrians.push(iface.snapshot(id)?.clone());
            }
        }
        let mut traffic_lights = Vec::new();
        if let Some(iface) = self.traffic_lights() {
            for id in iface.ids() {
                traffic_lights.push(iface.snapshot(id)?.clone());
            }
        }

        let snapshot = SimSnapshot {
            run_id: self.run_id.clone(),
            tick,
            clock: self.clock.clone(),
            vehicles,
            pedestrians,
            traffic_lights,
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }
}

/// Extract a stable string name from a SimEvent variant.
/// Used for the event_type column in event_log.
fn event_type_name(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::TickStarted { .. }            => "tick_started",
        SimEvent::TickCompleted { .. }          => "tick_completed",
        SimEvent::RunInitialized { .. }         => "run_initialized",
        SimEvent::VehicleEntered { .. }         => "vehicle_entered",
        SimEvent::VehicleDeparted { .. }        => "vehicle_departed",
        SimEvent::VehicleMoved { .. }           => "vehicle_moved",
        SimEvent::EdgeOccupancyMeasured { .. }  => "edge_occupancy_measured",
        SimEvent::PedestrianEntered { .. }      => "pedestrian_entered",
        SimEvent::PedestrianDeparted { .. }     => "pedestrian_departed",
        SimEvent::CrossingDemandMeasured { .. } => "crossing_demand_measured",
        SimEvent::PhaseChanged { .. }           => "phase_changed",
        SimEvent::PhaseExtended { .. }          => "phase_extended",
    }
}
