#![cfg(feature = "serde")]

use ai_behavior::{Archetype, BuildError, ResourceKind, Scenario, Summary, VeinId};
use ai_nav::GridError;
use ai_steering::SteeringError;

const TOWN: &str = r#"
seed: 3
zones:
  - name: mine
    grid: { origin: { x: 0.0, y: 0.0 }, columns: 10, rows: 10, column_width: 1.0, row_height: 1.0 }
    beds: [{ x: 8.5, y: 8.5 }]
    veins:
      - { kind: Gold, position: { x: 6.5, y: 1.5 } }
    deposits:
      - { kind: Gold, position: { x: 1.5, y: 1.5 }, amount: 0 }
agents:
  - id: 1
    archetype: miner
    position: { x: 1.5, y: 4.5 }
    vars: { max_speed: 4.0, max_acceleration: 20.0 }
"#;

#[test]
fn yaml_scenario_builds_with_defaults_filled_in() {
    let scenario: Scenario = serde_yaml::from_str(TOWN).expect("parse");
    assert_eq!(scenario.agents[0].archetype, Archetype::Miner);
    let vars = scenario.agents[0].vars.expect("vars");
    assert_eq!(vars.max_speed, 4.0);
    assert_eq!(vars.min_separation, 1.0);
    assert!(scenario.obstacles.is_empty());

    let mut sim = scenario.build().expect("build");
    let vein = sim.town().vein(VeinId(0)).expect("vein");
    assert_eq!(vein.kind(), ResourceKind::Gold);
    assert_eq!(vein.amount(), 10);

    sim.run(5, 0.1);
    assert_eq!(sim.state_name(1), Some("Looking for vein"));
}

#[test]
fn loaded_scenarios_are_validated_before_building() {
    let flat = TOWN.replace("columns: 10", "columns: 0");
    let scenario: Scenario = serde_yaml::from_str(&flat).expect("parse");
    assert!(matches!(
        scenario.build(),
        Err(BuildError::Grid {
            ref zone,
            source: GridError::Empty { columns: 0, .. },
        }) if zone == "mine"
    ));

    let stiff = TOWN.replace("max_acceleration: 20.0", "max_acceleration: 20.0, arrive_time: 0.0");
    let scenario: Scenario = serde_yaml::from_str(&stiff).expect("parse");
    assert!(matches!(
        scenario.build(),
        Err(BuildError::Steering(SteeringError::NonPositive {
            field: "arrive_time",
            ..
        }))
    ));
}

#[test]
fn sample_scenario_roundtrips_through_yaml() {
    let scenario = Scenario::sample();
    let yaml = serde_yaml::to_string(&scenario).expect("serialize");
    let back: Scenario = serde_yaml::from_str(&yaml).expect("deserialize");
    assert_eq!(back, scenario);
}

#[test]
fn summary_roundtrips_through_json() {
    let mut sim = Scenario::sample().build().expect("sample");
    sim.run(10, 0.1);
    let summary = sim.summary();
    let json = serde_json::to_string(&summary).expect("serialize");
    let back: Summary = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, summary);
}
