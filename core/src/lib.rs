//! cosim-core — a stepped co-simulation driver.
//!
//! Composes three per-domain sub-interfaces (vehicle, pedestrian,
//! traffic light) over an external simulation backend and advances them
//! in a fixed order once per backend tick. See driver.rs for the
//! execution order and abort rules.

pub mod backend;
pub mod clock;
pub mod driver;
pub mod error;
pub mod event;
pub mod id_map;
pub mod interface;
pub mod pedestrian_interface;
pub mod rng;
pub mod scenario;
pub mod scripted_backend;
pub mod snapshot;
pub mod store;
pub mod traffic_light_interface;
pub mod types;
pub mod vehicle_interface;
