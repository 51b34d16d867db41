#![cfg(feature = "serde")]

use ai_nav::Vec2;
use ai_steering::{BodyId, DynamicBehaviour, MovementVars, Target, Wander};

#[test]
fn movement_vars_fill_missing_fields_with_defaults() {
    let vars: MovementVars =
        serde_json::from_str(r#"{ "max_speed": 4.0, "query_interval": 2 }"#).expect("vars");

    assert_eq!(vars.max_speed, 4.0);
    assert_eq!(vars.query_interval, 2);
    assert_eq!(vars.linear_friction, MovementVars::default().linear_friction);
    assert_eq!(vars.min_separation, 1.0);
}

#[test]
fn behaviours_roundtrip_via_serde() {
    let behaviours = vec![
        DynamicBehaviour::Arrive(Target::Point(Vec2::new(1.0, -2.0))),
        DynamicBehaviour::Pursue(BodyId(7)),
        DynamicBehaviour::Wander(Wander::new(2.0, 0.5, 0.4, 1.0)),
        DynamicBehaviour::LookVelocity,
    ];

    let json = serde_json::to_string(&behaviours).expect("serialize");
    let back: Vec<DynamicBehaviour> = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(behaviours, back);
}
