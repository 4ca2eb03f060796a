//! Scenario loading and validation.

use cosim_core::{error::SimError, scenario::ScenarioConfig};
use std::path::Path;

#[test]
fn demo_scenario_is_valid() {
    ScenarioConfig::demo().validate().expect("demo must validate");
}

#[test]
fn scenario_json_round_trips() {
    let demo = ScenarioConfig::demo();
    let json = serde_json::to_string(&demo).expect("encode");
    let parsed: ScenarioConfig = serde_json::from_str(&json).expect("decode");
    parsed.validate().expect("validate");
    assert_eq!(parsed.name, demo.name);
    assert_eq!(parsed.edges.len(), demo.edges.len());
    assert_eq!(parsed.traffic_lights.len(), demo.traffic_lights.len());
}

#[test]
fn light_without_phases_is_rejected() {
    let mut scenario = ScenarioConfig::demo();
    scenario.traffic_lights[0].phases.clear();
    let err = scenario.validate().unwrap_err();
    assert!(matches!(err, SimError::Scenario { .. }));
}

#[test]
fn zero_length_phase_is_rejected() {
    let mut scenario = ScenarioConfig::demo();
    scenario.traffic_lights[0].phases[1].duration_ticks = 0;
    assert!(scenario.validate().is_err());
}

#[test]
fn light_on_unknown_edge_is_rejected() {
    let mut scenario = ScenarioConfig::demo();
    scenario.traffic_lights[0].controlled_edge = "edge-nowhere".to_string();
    assert!(scenario.validate().is_err());
}

#[test]
fn non_positive_edge_length_is_rejected() {
    let mut scenario = ScenarioConfig::demo();
    scenario.edges[0].length_m = 0.0;
    assert!(scenario.validate().is_err());
}

#[test]
fn inverted_trip_range_is_rejected() {
    let mut scenario = ScenarioConfig::demo();
    scenario.vehicle_trip_ticks_min = 50;
    scenario.vehicle_trip_ticks_max = 10;
    assert!(scenario.validate().is_err());
}

#[test]
fn missing_scenario_file_is_a_scenario_error() {
    let err = ScenarioConfig::from_path(Path::new("/no/such/scenario.json")).unwrap_err();
    assert!(matches!(err, SimError::Scenario { .. }));
}
