//! Traffic-light sub-interface — steps each light's phase program.
//!
//! Runs LAST in the tick order on purpose: a green phase is held open when
//! the occupancy measured by the vehicle and pedestrian interfaces earlier
//! in the SAME tick meets the scenario's extension threshold. Phase
//! transitions are pushed back to the backend as commands.

use crate::{
    backend::SimulationBackend,
    error::{SimError, SimResult},
    event::SimEvent,
    id_map::IdMapper,
    interface::StepInterface,
    scenario::TrafficLightConfig,
    types::{ExternalId, InternalId, Tick},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficLightSnapshot {
    pub internal_id: InternalId,
    pub external_id: ExternalId,
    pub phase_index: u32,
    pub phase_name: String,
    pub ticks_in_phase: Tick,
    /// Tick this snapshot was taken at.
    pub tick: Tick,
}

/// Per-light program position, carried across ticks.
#[derive(Debug, Clone)]
struct ProgramState {
    phase_index: u32,
    ticks_in_phase: Tick,
    extended_ticks: Tick,
}

pub struct TrafficLightInterface {
    ids: IdMapper,
    configs: HashMap<ExternalId, TrafficLightConfig>,
    programs: HashMap<ExternalId, ProgramState>,
    snapshots: HashMap<InternalId, TrafficLightSnapshot>,
}

impl TrafficLightInterface {
    pub fn new(configs: Vec<TrafficLightConfig>) -> Self {
        Self {
            ids: IdMapper::new(),
            configs: configs.into_iter().map(|c| (c.id.clone(), c)).collect(),
            programs: HashMap::new(),
            snapshots: HashMap::new(),
        }
    }

    /// All internal IDs with a current-tick snapshot, ascending.
    pub fn ids(&self) -> Vec<InternalId> {
        let mut ids: Vec<_> = self.snapshots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn snapshot(&self, internal: InternalId) -> SimResult<&TrafficLightSnapshot> {
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

    /// Vehicles + waiting pedestrians on this light's controlled edge,
    /// taken from events emitted earlier in the current tick.
    fn measured_occupancy(config: &TrafficLightConfig, events_in: &[SimEvent]) -> u32 {
        let mut total = 0;
        for event in events_in {
            match event {
                SimEvent::EdgeOccupancyMeasured { edge, vehicles, .. }
                    if *edge == config.controlled_edge =>
                {
                    total += vehicles;
                }
                SimEvent::CrossingDemandMeasured { crossing, waiting, .. }
                    if *crossing == config.controlled_edge =>
                {
                    total += waiting;
                }
                _ => {}
            }
        }
        total
    }
}

impl StepInterface for TrafficLightInterface {
    fn name(&self) -> &'static str {
        "traffic_light"
    }

    fn simulate_step(
        &mut self,
        tick: Tick,
        events_in: &[SimEvent],
        backend: &mut dyn SimulationBackend,
    ) -> SimResult<Vec<SimEvent>> {
        let states = backend.traffic_light_states()?;

        let mut out_events = Vec::new();
        let mut fresh: HashMap<InternalId, TrafficLightSnapshot> =
            HashMap::with_capacity(states.len());

        // BTreeMap keyed by external ID: lights step in a stable order so
        // the event log and backend commands are reproducible.
        let ordered: BTreeMap<ExternalId, u32> = states
            .into_iter()
            .map(|s| (s.external_id, s.phase_index))
            .collect();

        for (external_id, reported_phase) in ordered {
            let config = self.configs.get(&external_id).ok_or_else(|| SimError::Backend {
                operation: "traffic_light_states",
                reason: format!("light '{external_id}' is not in the scenario"),
            })?;
            let internal_id = self.ids.register(&external_id);

            let program = self
                .programs
                .entry(external_id.clone())
                .or_insert(ProgramState {
                    phase_index: reported_phase,
                    ticks_in_phase: 0,
                    extended_ticks: 0,
                });

            // The backend owns ground truth. If it disagrees with our
            // program position, resync to it.
            if program.phase_index != reported_phase {
                log::warn!(
                    "tick={tick} traffic_light: '{external_id}' drifted \
                     (program {} vs backend {reported_phase}), resyncing",
                    program.phase_index
                );
                program.phase_index = reported_phase;
                program.ticks_in_phase = 0;
                program.extended_ticks = 0;
            }

            let phase_count = config.phases.len() as u32;
            let current = &config.phases[program.phase_index as usize % phase_count as usize];
            program.ticks_in_phase += 1;

            let occupancy = Self::measured_occupancy(config, events_in);
            let due = program.ticks_in_phase >= current.duration_ticks;
            let may_extend = current.extendable
                && occupancy >= config.extension_threshold
                && program.extended_ticks < config.max_extension_ticks;

            if due && may_extend {
                program.extended_ticks += 1;
                out_events.push(SimEvent::PhaseExtended {
                    tick,
                    light_id: external_id.clone(),
                    phase: program.phase_index,
                    occupancy,
                });
            } else if due {
                let from_phase = program.phase_index;
                let to_phase = (from_phase + 1) % phase_count;
                backend.set_traffic_light_phase(&external_id, to_phase)?;
                program.phase_index = to_phase;
                program.ticks_in_phase = 0;
                program.extended_ticks = 0;
                out_events.push(SimEvent::PhaseChanged {
                    tick,
                    light_id: external_id.clone(),
                    from_phase,
                    to_phase,
                });
            }

            let phase_name =
                config.phases[program.phase_index as usize % phase_count as usize].name.clone();
            fresh.insert(
                internal_id,
                TrafficLightSnapshot {
                    internal_id,
                    external_id,
                    phase_index: program.phase_index,
                    phase_name,
                    ticks_in_phase: program.ticks_in_phase,
                    tick,
                },
            );
        }

        self.snapshots = fresh;
        log::debug!("tick={tick} traffic_light: {} lights", self.snapshots.len());
        Ok(out_events)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
