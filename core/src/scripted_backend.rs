//! Scripted backend — a deterministic in-process stand-in for the
//! external simulator.
//!
//! Generates vehicle and pedestrian traffic from the scenario's knobs and
//! two independent seeded RNG streams, so two backends built with the same
//! scenario and seed report identical state tick for tick. Used by the
//! runner when no real simulator is attached and by every integration test.
//!
//! Fault injection: a FaultPlan can make a chosen state query fail at a
//! chosen tick, or stall it, to exercise the driver's abort and timeout
//! paths.

use crate::{
    backend::{PedestrianState, SimulationBackend, TrafficLightState, VehicleState},
    error::{SimError, SimResult},
    rng::{RngBank, StreamRng, StreamSlot},
    scenario::ScenarioConfig,
    types::{ExternalId, Tick},
};
use std::time::Duration;

/// Which calls should misbehave, and when.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    pub fail_vehicle_states_at: Option<Tick>,
    pub fail_pedestrian_states_at: Option<Tick>,
    pub fail_traffic_light_states_at: Option<Tick>,
    /// Stall every vehicle_states() call by this long.
    pub delay_vehicle_states: Option<Duration>,
}

#[derive(Debug, Clone)]
struct ScriptedVehicle {
    external_id: ExternalId,
    edge_index: usize,
    position_m: f64,
    speed_mps: f64,
    ticks_left: Tick,
}

#[derive(Debug, Clone)]
struct ScriptedPedestrian {
    external_id: ExternalId,
    crossing: String,
    wait_ticks_left: Tick,
    cross_ticks_left: Tick,
}

pub struct ScriptedBackend {
    scenario: ScenarioConfig,
    tick: Tick,
    vehicle_rng: StreamRng,
    pedestrian_rng: StreamRng,
    vehicles: Vec<ScriptedVehicle>,
    pedestrians: Vec<ScriptedPedestrian>,
    lights: Vec<(ExternalId, u32)>,
    next_vehicle_seq: u64,
    next_pedestrian_seq: u64,

    pub faults: FaultPlan,
    // Call counters, read by the ordering/abort tests.
    pub vehicle_state_calls: u64,
    pub pedestrian_state_calls: u64,
    pub traffic_light_state_calls: u64,
    pub phase_commands: Vec<(ExternalId, u32)>,
}

impl ScriptedBackend {
    pub fn new(scenario: ScenarioConfig, seed: u64) -> Self {
        let bank = RngBank::new(seed);
        let lights = scenario
            .traffic_lights
            .iter()
            .map(|l| (l.id.clone(), 0u32))
            .collect();
        Self {
            scenario,
            tick: 0,
            vehicle_rng: bank.for_stream(StreamSlot::Vehicle),
            pedestrian_rng: bank.for_stream(StreamSlot::Pedestrian),
            vehicles: Vec::new(),
            pedestrians: Vec::new(),
            lights,
            next_vehicle_seq: 0,
            next_pedestrian_seq: 0,
            faults: FaultPlan::default(),
            vehicle_state_calls: 0,
            pedestrian_state_calls: 0,
            traffic_light_state_calls: 0,
            phase_commands: Vec::new(),
        }
    }

    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Current scripted population, for tests comparing against the
    /// driver's view.
    pub fn active_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn active_pedestrians(&self) -> usize {
        self.pedestrians.len()
    }

    fn spawn_vehicle(&mut self) {
        let edge_index =
            self.vehicle_rng.next_u64_below(self.scenario.edges.len() as u64) as usize;
        let edge = &self.scenario.edges[edge_index];
        // Cruise somewhere between half and full speed limit.
        let speed_mps = edge.speed_limit_mps * (0.5 + self.vehicle_rng.next_f64() * 0.5);
        let ticks_left = self.vehicle_rng.next_u64_in(
            self.scenario.vehicle_trip_ticks_min,
            self.scenario.vehicle_trip_ticks_max,
        );
        self.next_vehicle_seq += 1;
        self.vehicles.push(ScriptedVehicle {
            external_id: format!("veh-{:06}", self.next_vehicle_seq),
            edge_index,
            position_m: 0.0,
            speed_mps,
            ticks_left,
        });
    }

    fn spawn_pedestrian(&mut self) {
        let edge_index =
            self.pedestrian_rng.next_u64_below(self.scenario.edges.len() as u64) as usize;
        let crossing = self.scenario.edges[edge_index].id.clone();
        let wait = self.pedestrian_rng.next_u64_in(
            self.scenario.pedestrian_crossing_ticks_min,
            self.scenario.pedestrian_crossing_ticks_max,
        );
        let cross = self.pedestrian_rng.next_u64_in(
            self.scenario.pedestrian_crossing_ticks_min,
            self.scenario.pedestrian_crossing_ticks_max,
        );
        self.next_pedestrian_seq += 1;
        self.pedestrians.push(ScriptedPedestrian {
            external_id: format!("ped-{:06}", self.next_pedestrian_seq),
            crossing,
            wait_ticks_left: wait,
            cross_ticks_left: cross,
        });
    }
}

impl SimulationBackend for ScriptedBackend {
    fn current_tick(&self) -> SimResult<Tick> {
        Ok(self.tick)
    }

    fn advance(&mut self) -> SimResult<Tick> {
        self.tick += 1;

        // Arrivals first, so a vehicle can enter and move on the same tick.
        if self.vehicle_rng.chance(self.scenario.vehicle_arrival_probability) {
            self.spawn_vehicle();
        }
        if self
            .pedestrian_rng
            .chance(self.scenario.pedestrian_arrival_probability)
        {
            self.spawn_pedestrian();
        }

        for vehicle in &mut self.vehicles {
            let edge = &self.scenario.edges[vehicle.edge_index];
            vehicle.position_m = (vehicle.position_m + vehicle.speed_mps) % edge.length_m;
            vehicle.ticks_left = vehicle.ticks_left.saturating_sub(1);
        }
        self.vehicles.retain(|v| v.ticks_left > 0);

        for pedestrian in &mut self.pedestrians {
            if pedestrian.wait_ticks_left > 0 {
                pedestrian.wait_ticks_left -= 1;
            } else {
                pedestrian.cross_ticks_left = pedestrian.cross_ticks_left.saturating_sub(1);
            }
        }
        self.pedestrians.retain(|p| p.cross_ticks_left > 0);

        Ok(self.tick)
    }

    fn vehicle_states(&mut self) -> SimResult<Vec<VehicleState>> {
        self.vehicle_state_calls += 1;
        if let Some(delay) = self.faults.delay_vehicle_states {
            std::thread::sleep(delay);
        }
        if self.faults.fail_vehicle_states_at == Some(self.tick) {
            return Err(SimError::Backend {
                operation: "vehicle_states",
                reason: "injected fault".to_string(),
            });
        }
        Ok(self
            .vehicles
            .iter()
            .map(|v| VehicleState {
                external_id: v.external_id.clone(),
                edge: self.scenario.edges[v.edge_index].id.clone(),
                position_m: v.position_m,
                speed_mps: v.speed_mps,
            })
            .collect())
    }

    fn pedestrian_states(&mut self) -> SimResult<Vec<PedestrianState>> {
        self.pedestrian_state_calls += 1;
        if self.faults.fail_pedestrian_states_at == Some(self.tick) {
            return Err(SimError::Backend {
                operation: "pedestrian_states",
                reason: "injected fault".to_string(),
            });
        }
        Ok(self
            .pedestrians
            .iter()
            .map(|p| PedestrianState {
                external_id: p.external_id.clone(),
                crossing: p.crossing.clone(),
                waiting: p.wait_ticks_left > 0,
            })
            .collect())
    }

    fn traffic_light_states(&mut self) -> SimResult<Vec<TrafficLightState>> {
        self.traffic_light_state_calls += 1;
        if self.faults.fail_traffic_light_states_at == Some(self.tick) {
            return Err(SimError::Backend {
                operation: "traffic_light_states",
                reason: "injected fault".to_string(),
            });
        }
        Ok(self
            .lights
            .iter()
            .map(|(id, phase)| TrafficLightState {
                external_id: id.clone(),
                phase_index: *phase,
            })
            .collect())
    }

    fn set_traffic_light_phase(&mut self, external_id: &str, phase: u32) -> SimResult<()> {
        let light = self
            .lights
            .iter_mut()
            .find(|(id, _)| id == external_id)
            .ok_or_else(|| SimError::Backend {
                operation: "set_traffic_light_phase",
                reason: format!("unknown light '{external_id}'"),
            })?;
        light.1 = phase;
        self.phase_commands.push((external_id.to_string(), phase));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
