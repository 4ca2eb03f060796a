//! Vehicle sub-interface — owns every vehicle the backend reports.
//!
//! Each tick it pulls the full vehicle table from the backend, updates
//! the ID mapper for entries and departures, emits movement updates for
//! re-seen vehicles, and replaces the snapshot map wholesale. Snapshots
//! are valid for the current tick only.

use crate::{
    backend::SimulationBackend,
    error::{SimError, SimResult},
    event::SimEvent,
    id_map::IdMapper,
    interface::StepInterface,
    types::{ExternalId, InternalId, Tick},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub internal_id: InternalId,
    pub external_id: ExternalId,
    pub edge: String,
    pub position_m: f64,
    pub speed_mps: f64,
    /// Tick this snapshot was taken at.
    pub tick: Tick,
}

pub struct VehicleInterface {
    ids: IdMapper,
    snapshots: HashMap<InternalId, VehicleSnapshot>,
}

impl VehicleInterface {
    pub fn new() -> Self {
        Self {
            ids: IdMapper::new(),
            snapshots: HashMap::new(),
        }
    }

    /// All internal IDs with a current-tick snapshot, ascending.
    pub fn ids(&self) -> Vec<InternalId> {
        let mut ids: Vec<_> = self.snapshots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn snapshot(&self, internal: InternalId) -> SimResult<&VehicleSnapshot> {
        self.snapshots
            .get(&internal)
            .ok_or_else(|| SimError::NotFound { id: internal.to_string() })
    }

    pub fn resolve_external(&self, external: &str) -> SimResult<InternalId> {
        self.ids.resolve_external(external)
    }

    pub fn count(&self) -> usize {
        self.snapshots.len()
    }
}

impl Default for VehicleInterface {
    fn default() -> Self { Self::new() }
}

impl StepInterface for VehicleInterface {
    fn name(&self) -> &'static str {
        "vehicle"
    }

    fn simulate_step(
        &mut self,
        tick: Tick,
        _events_in: &[SimEvent],
        backend: &mut dyn SimulationBackend,
    ) -> SimResult<Vec<SimEvent>> {
        let states = backend.vehicle_states()?;

        let mut out_events = Vec::new();
        let mut fresh: HashMap<InternalId, VehicleSnapshot> =
            HashMap::with_capacity(states.len());
        // BTreeMap so occupancy events come out in a stable edge order.
        let mut occupancy: BTreeMap<String, u32> = BTreeMap::new();
        let mut seen: HashSet<ExternalId> = HashSet::with_capacity(states.len());

        for state in states {
            if state.external_id.is_empty() {
                return Err(SimError::Backend {
                    operation: "vehicle_states",
                    reason: "empty external id in vehicle table".to_string(),
                });
            }
            if !state.position_m.is_finite() || state.position_m < 0.0 {
                return Err(SimError::Backend {
                    operation: "vehicle_states",
                    reason: format!(
                        "vehicle '{}' has bad position {}",
                        state.external_id, state.position_m
                    ),
                });
            }

            let newly_seen = !self.ids.contains_external(&state.external_id);
            let internal_id = self.ids.register(&state.external_id);
            if newly_seen {
                out_events.push(SimEvent::VehicleEntered {
                    tick,
                    internal_id,
                    external_id: state.external_id.clone(),
                    edge: state.edge.clone(),
                });
            } else {
                out_events.push(SimEvent::VehicleMoved {
                    tick,
                    internal_id,
                    edge: state.edge.clone(),
                    position_m: state.position_m,
                    speed_mps: state.speed_mps,
                });
            }

            *occupancy.entry(state.edge.clone()).or_insert(0) += 1;
            seen.insert(state.external_id.clone());
            fresh.insert(
                internal_id,
                VehicleSnapshot {
                    internal_id,
                    external_id: state.external_id,
                    edge: state.edge,
                    position_m: state.position_m,
                    speed_mps: state.speed_mps,
                    tick,
                },
            );
        }

        // Entities the backend no longer reports have departed.
        // Sorted by internal ID so the event log is reproducible.
        let mut departed: Vec<(ExternalId, InternalId)> = self
            .ids
            .iter()
            .filter(|(external, _)| !seen.contains(external.as_str()))
            .map(|(external, internal)| (external.clone(), internal))
            .collect();
        departed.sort_unstable_by_key(|(_, internal)| *internal);
        for (external_id, internal_id) in departed {
            self.ids.unregister(&external_id);
            out_events.push(SimEvent::VehicleDeparted {
                tick,
                internal_id,
                external_id,
            });
        }

        for (edge, vehicles) in occupancy {
            out_events.push(SimEvent::EdgeOccupancyMeasured { tick, edge, vehicles });
        }

        self.snapshots = fresh;
        log::debug!("tick={tick} vehicle: {} active", self.snapshots.len());
        Ok(out_events)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
