//! The event bus — all inter-interface communication.
//!
//! RULE: Sub-interfaces communicate ONLY through events.
//! A sub-interface may never call another sub-interface's functions
//! directly or read its snapshots. The traffic-light interface learns
//! about occupancy from events emitted earlier in the same tick.

use crate::types::{ExternalId, InternalId, RunId, Tick};
use serde::{Deserialize, Serialize};

/// Every event emitted during a run.
/// Variants are added as domains grow — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Driver events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },

    // ── Vehicle events ─────────────────────────────
    VehicleEntered {
        tick: Tick,
        internal_id: InternalId,
        external_id: ExternalId,
        edge: String,
    },
    VehicleDeparted {
        tick: Tick,
        internal_id: InternalId,
        external_id: ExternalId,
    },
    /// Position update for a vehicle already registered on a prior tick.
    /// Never emitted on the tick the vehicle entered.
    VehicleMoved {
        tick: Tick,
        internal_id: InternalId,
        edge: String,
        position_m: f64,
        speed_mps: f64,
    },
    /// Per-edge vehicle count, measured after the snapshot refresh.
    EdgeOccupancyMeasured {
        tick: Tick,
        edge: String,
        vehicles: u32,
    },

    // ── Pedestrian events ──────────────────────────
    PedestrianEntered {
        tick: Tick,
        internal_id: InternalId,
        external_id: ExternalId,
        crossing: String,
    },
    PedestrianDeparted {
        tick: Tick,
        internal_id: InternalId,
        external_id: ExternalId,
    },
    /// Pedestrians waiting at a crossing, measured after the refresh.
    CrossingDemandMeasured {
        tick: Tick,
        crossing: String,
        waiting: u32,
    },

    // ── Traffic-light events ───────────────────────
    PhaseChanged {
        tick: Tick,
        light_id: ExternalId,
        from_phase: u32,
        to_phase: u32,
    },
    PhaseExtended {
        tick: Tick,
        light_id: ExternalId,
        phase: u32,
        occupancy: u32,
    },
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub interface: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
