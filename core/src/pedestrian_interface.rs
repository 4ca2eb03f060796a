//! Pedestrian sub-interface — owns every pedestrian the backend reports.
//!
//! Same contract as the vehicle interface: full pull, ID mapper update,
//! wholesale snapshot replacement. Also measures how many pedestrians are
//! waiting at each crossing, which the traffic-light interface reads from
//! this tick's events.

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
pub struct PedestrianSnapshot {
    pub internal_id: InternalId,
    pub external_id: ExternalId,
    pub crossing: String,
    pub waiting: bool,
    /// Tick this snapshot was taken at.
    pub tick: Tick,
}

pub struct PedestrianInterface {
    ids: IdMapper,
    snapshots: HashMap<InternalId, PedestrianSnapshot>,
}

impl PedestrianInterface {
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

    pub fn snapshot(&self, internal: InternalId) -> SimResult<&PedestrianSnapshot> {
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

impl Default for PedestrianInterface {
    fn default() -> Self { Self::new() }
}

impl StepInterface for PedestrianInterface {
    fn name(&self) -> &'static str {
        "pedestrian"
    }

    fn simulate_step(
        &mut self,
        tick: Tick,
        _events_in: &[SimEvent],
        backend: &mut dyn SimulationBackend,
    ) -> SimResult<Vec<SimEvent>> {
        let states = backend.pedestrian_states()?;

        let mut out_events = Vec::new();
        let mut fresh: HashMap<InternalId, PedestrianSnapshot> =
            HashMap::with_capacity(states.len());
        let mut waiting: BTreeMap<String, u32> = BTreeMap::new();
        let mut seen: HashSet<ExternalId> = HashSet::with_capacity(states.len());

        for state in states {
            if state.external_id.is_empty() {
                return Err(SimError::Backend {
                    operation: "pedestrian_states",
                    reason: "empty external id in pedestrian table".to_string(),
                });
            }

            let newly_seen = !self.ids.contains_external(&state.external_id);
            let internal_id = self.ids.register(&state.external_id);
            if newly_seen {
                out_events.push(SimEvent::PedestrianEntered {
                    tick,
                    internal_id,
                    external_id: state.external_id.clone(),
                    crossing: state.crossing.clone(),
                });
            }

            if state.waiting {
                *waiting.entry(state.crossing.clone()).or_insert(0) += 1;
            }
            seen.insert(state.external_id.clone());
            fresh.insert(
                internal_id,
                PedestrianSnapshot {
                    internal_id,
                    external_id: state.external_id,
                    crossing: state.crossing,
                    waiting: state.waiting,
                    tick,
                },
            );
        }

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
            out_events.push(SimEvent::PedestrianDeparted {
                tick,
                internal_id,
                external_id,
            });
        }

        for (crossing, count) in waiting {
            out_events.push(SimEvent::CrossingDemandMeasured {
                tick,
                crossing,
                waiting: count,
            });
        }

        self.snapshots = fresh;
        log::debug!("tick={tick} pedestrian: {} active", self.snapshots.len());
        Ok(out_events)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
