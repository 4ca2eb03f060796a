//! Shared primitive types used across the entire driver.

/// A simulation tick. One tick = one discrete step of the external simulator.
pub type Tick = u64;

/// The canonical run identifier.
pub type RunId = String;

/// An identifier assigned by the external simulation backend
/// (e.g. a SUMO vehicle ID). Opaque to the driver.
pub type ExternalId = String;

/// An identifier allocated by the driver's ID mapper for its own consumers.
/// Never reused within a run, even after the entity departs.
pub type InternalId = u64;
