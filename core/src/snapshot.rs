//! Snapshot serialization — full world state to/from JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL ticks. It captures the
//! driver-side view of the world (clock plus every domain snapshot) at
//! that tick; entity lists are sorted by internal ID so the JSON is
//! byte-stable across runs.

use crate::{
    clock::SimClock,
    pedestrian_interface::PedestrianSnapshot,
    traffic_light_interface::TrafficLightSnapshot,
    types::{RunId, Tick},
    vehicle_interface::VehicleSnapshot,
};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_INTERVAL: Tick = 60; // one simulated minute

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id: RunId,
    pub tick: Tick,
    pub clock: SimClock,
    pub vehicles: Vec<VehicleSnapshot>,
    pub pedestrians: Vec<PedestrianSnapshot>,
    pub traffic_lights: Vec<TrafficLightSnapshot>,
}
