//! Simulation clock — observes the backend-owned tick counter.
//!
//! RULE: The tick is owned by the external simulator. The driver never
//! advances it; it only records what the backend reports and rejects
//! regressions. Speed controls the wall-clock cadence at which the
//! driver's caller invokes simulate_step().

use crate::{
    error::{SimError, SimResult},
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:    RunId,
    pub last_tick: Tick,
    pub speed:     SimSpeed,
    pub paused:    bool,
}

impl SimClock {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            last_tick: 0,
            speed: SimSpeed::Normal,
            paused: true,
        }
    }

    /// Record a tick reported by the backend. Returns the tick on success.
    /// The backend counter must be strictly monotonic.
    /// Panics if called while paused — callers must check.
    pub fn observe(&mut self, tick: Tick) -> SimResult<Tick> {
        assert!(!self.paused, "observe() called on paused clock");
        if tick <= self.last_tick {
            return Err(SimError::TickRegression {
                last: self.last_tick,
                observed: tick,
            });
        }
        self.last_tick = tick;
        Ok(tick)
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    pub fn ticks_per_real_second(&self) -> u32 {
        match self.speed {
            SimSpeed::Normal      => 1,
            SimSpeed::Accelerated => 10,
            SimSpeed::FastForward => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,       // real time (1 simulated second per real second)
    Accelerated,  // 10x
    FastForward,  // 60x
}
