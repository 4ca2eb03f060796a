//! The simulation backend binding.
//!
//! RULE: The backend is the only component that talks to the external
//! simulator. Sub-interfaces see it as an injected trait object and
//! never assume a concrete wire protocol.

use crate::{
    error::{SimError, SimResult},
    types::{ExternalId, Tick},
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Wire-level vehicle state as reported by the backend for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    pub external_id: ExternalId,
    pub edge: String,
    pub position_m: f64,
    pub speed_mps: f64,
}

/// Wire-level pedestrian state as reported by the backend for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedestrianState {
    pub external_id: ExternalId,
    pub crossing: String,
    pub waiting: bool,
}

/// Wire-level traffic-light state as reported by the backend for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficLightState {
    pub external_id: ExternalId,
    pub phase_index: u32,
}

/// The channel to the external simulation process.
///
/// All calls are synchronous and bounded from the driver's point of view;
/// anything slow or flaky must surface as a Backend or Timeout error, never
/// block indefinitely.
pub trait SimulationBackend: Send {
    /// The backend's current tick counter. The driver only observes this.
    fn current_tick(&self) -> SimResult<Tick>;

    /// Order the external simulator to advance one step.
    /// Returns the new tick.
    fn advance(&mut self) -> SimResult<Tick>;

    fn vehicle_states(&mut self) -> SimResult<Vec<VehicleState>>;

    fn pedestrian_states(&mut self) -> SimResult<Vec<PedestrianState>>;

    fn traffic_light_states(&mut self) -> SimResult<Vec<TrafficLightState>>;

    /// Command a traffic light into the given phase of its program.
    fn set_traffic_light_phase(&mut self, external_id: &str, phase: u32) -> SimResult<()>;

    /// For downcasting in tests and tooling only.
    /// Production driver code never uses this.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Wraps a backend and converts over-budget calls into SimError::Timeout.
///
/// The wrapped call still runs to completion (the binding is synchronous);
/// the guard ensures a stalled simulator becomes a typed, tick-aborting
/// error instead of an invisible slowdown.
pub struct TimeoutGuard<B: SimulationBackend> {
    inner: B,
    budget: Duration,
}

impl<B: SimulationBackend> TimeoutGuard<B> {
    pub fn new(inner: B, budget: Duration) -> Self {
        Self { inner, budget }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    fn checked<T>(
        &self,
        operation: &'static str,
        started: Instant,
        result: SimResult<T>,
    ) -> SimResult<T> {
        let elapsed = started.elapsed();
        if elapsed > self.budget {
            return Err(SimError::Timeout {
                operation,
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.budget.as_millis() as u64,
            });
        }
        result
    }
}

impl<B: SimulationBackend + 'static> SimulationBackend for TimeoutGuard<B> {
    fn current_tick(&self) -> SimResult<Tick> {
        let started = Instant::now();
        let result = self.inner.current_tick();
        self.checked("current_tick", started, result)
    }

    fn advance(&mut self) -> SimResult<Tick> {
        let started = Instant::now();
        let result = self.inner.advance();
        self.checked("advance", started, result)
    }

    fn vehicle_states(&mut self) -> SimResult<Vec<VehicleState>> {
        let started = Instant::now();
        let result = self.inner.vehicle_states();
        self.checked("vehicle_states", started, result)
    }

    fn pedestrian_states(&mut self) -> SimResult<Vec<PedestrianState>> {
        let started = Instant::now();
        let result = self.inner.pedestrian_states();
        self.checked("pedestrian_states", started, result)
    }

    fn traffic_light_states(&mut self) -> SimResult<Vec<TrafficLightState>> {
        let started = Instant::now();
        let result = self.inner.traffic_light_states();
        self.checked("traffic_light_states", started, result)
    }

    fn set_traffic_light_phase(&mut self, external_id: &str, phase: u32) -> SimResult<()> {
        let started = Instant::now();
        let result = self.inner.set_traffic_light_phase(external_id, phase);
        self.checked("set_traffic_light_phase", started, result)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
