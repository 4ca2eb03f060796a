//! Scenario configuration — the map description consumed once at startup.
//!
//! The scenario tells the driver which edges, crossings, and traffic
//! lights exist, and tells the scripted backend how to generate traffic.
//! It is read once and never mutated during a run.

use crate::{
    error::{SimError, SimResult},
    types::Tick,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub id: String,
    pub length_m: f64,
    pub speed_limit_mps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Display name, e.g. "green-ns" or "red-all".
    pub name: String,
    pub duration_ticks: Tick,
    /// Only green phases may be extended under occupancy pressure.
    pub extendable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficLightConfig {
    pub id: String,
    /// Edge whose vehicle occupancy and crossing demand this light watches.
    pub controlled_edge: String,
    pub phases: Vec<PhaseConfig>,
    /// Occupancy (vehicles + waiting pedestrians) at or above which an
    /// extendable phase is held for one more tick.
    pub extension_threshold: u32,
    /// Maximum ticks a single phase may be extended before it must yield.
    pub max_extension_ticks: Tick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub edges: Vec<EdgeConfig>,
    pub traffic_lights: Vec<TrafficLightConfig>,

    // Traffic generation knobs for the scripted backend.
    pub vehicle_arrival_probability: f64,
    pub vehicle_trip_ticks_min: Tick,
    pub vehicle_trip_ticks_max: Tick,
    pub pedestrian_arrival_probability: f64,
    pub pedestrian_crossing_ticks_min: Tick,
    pub pedestrian_crossing_ticks_max: Tick,
}

impl ScenarioConfig {
    /// Load and validate a scenario from a JSON file.
    pub fn from_path(path: &Path) -> SimResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| SimError::Scenario {
            reason: format!("{}: {e}", path.display()),
        })?;
        let scenario: ScenarioConfig = serde_json::from_str(&raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject scenarios the driver cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        if self.edges.is_empty() {
            return Err(invalid("scenario has no edges"));
        }
        for edge in &self.edges {
            if edge.length_m <= 0.0 {
                return Err(invalid(&format!("edge '{}' has non-positive length", edge.id)));
            }
        }
        for light in &self.traffic_lights {
            if light.phases.is_empty() {
                return Err(invalid(&format!("traffic light '{}' has no phases", light.id)));
            }
            if light.phases.iter().any(|p| p.duration_ticks == 0) {
                return Err(invalid(&format!(
                    "traffic light '{}' has a zero-length phase",
                    light.id
                )));
            }
            if !self.edges.iter().any(|e| e.id == light.controlled_edge) {
                return Err(invalid(&format!(
                    "traffic light '{}' controls unknown edge '{}'",
                    light.id, light.controlled_edge
                )));
            }
        }
        if self.vehicle_trip_ticks_min > self.vehicle_trip_ticks_max
            || self.vehicle_trip_ticks_min == 0
        {
            return Err(invalid("bad vehicle trip tick range"));
        }
        if self.pedestrian_crossing_ticks_min > self.pedestrian_crossing_ticks_max
            || self.pedestrian_crossing_ticks_min == 0
        {
            return Err(invalid("bad pedestrian crossing tick range"));
        }
        Ok(())
    }

    /// A small two-edge, one-light scenario used by tests and the runner
    /// when no scenario file is given.
    pub fn demo() -> Self {
        Self {
            name: "demo-crossing".to_string(),
            edges: vec![
                EdgeConfig {
                    id: "edge-main".to_string(),
                    length_m: 400.0,
                    speed_limit_mps: 13.9,
                },
                EdgeConfig {
                    id: "edge-side".to_string(),
                    length_m: 200.0,
                    speed_limit_mps: 8.3,
                },
            ],
            traffic_lights: vec![TrafficLightConfig {
                id: "tl-main".to_string(),
                controlled_edge: "edge-main".to_string(),
                phases: vec![
                    PhaseConfig {
                        name: "green-main".to_string(),
                        duration_ticks: 10,
                        extendable: true,
                    },
                    PhaseConfig {
                        name: "yellow-main".to_string(),
                        duration_ticks: 2,
                        extendable: false,
                    },
                    PhaseConfig {
                        name: "red-main".to_string(),
                        duration_ticks: 8,
                        extendable: false,
                    },
                ],
                extension_threshold: 3,
                max_extension_ticks: 5,
            }],
            vehicle_arrival_probability: 0.4,
            vehicle_trip_ticks_min: 5,
            vehicle_trip_ticks_max: 30,
            pedestrian_arrival_probability: 0.2,
            pedestrian_crossing_ticks_min: 3,
            pedestrian_crossing_ticks_max: 8,
        }
    }
}

fn invalid(reason: &str) -> SimError {
    SimError::Scenario {
        reason: reason.to_string(),
    }
}
