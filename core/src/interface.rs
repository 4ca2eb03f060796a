//! Sub-interface trait.
//!
//! RULE: Every per-domain sub-interface implements StepInterface.
//! The driver calls simulate_step() on each registered interface in a
//! fixed order, every tick. Execution order is documented in driver.rs
//! and is a correctness requirement, not an optimization.

use crate::{
    backend::SimulationBackend,
    error::SimResult,
    event::SimEvent,
    types::Tick,
};
use std::any::Any;

/// The contract every per-domain sub-interface must fulfill.
pub trait StepInterface: Send {
    /// Unique stable name for this interface.
    fn name(&self) -> &'static str;

    /// Refresh this domain for one tick.
    ///
    /// - `tick`:      the tick just observed from the backend
    /// - `events_in`: events emitted by earlier interfaces this tick
    /// - `backend`:   the backend binding, lent for the duration of the call
    ///
    /// Replaces the domain's snapshots wholesale and returns the events to
    /// append to the tick's log. The first backend failure fails the call;
    /// retries are a caller concern.
    fn simulate_step(
        &mut self,
        tick: Tick,
        events_in: &[SimEvent],
        backend: &mut dyn SimulationBackend,
    ) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in tests and tooling only.
    /// Production driver code never uses this.
    fn as_any(&self) -> &dyn Any;
}
