use ai_core::{Capabilities, CapabilityError};

#[derive(Debug, PartialEq)]
struct Thermometer(i32);

#[derive(Debug, PartialEq)]
struct Legs {
    speed: f32,
}

#[test]
fn sensors_keep_insertion_order() {
    let caps = Capabilities::new()
        .with_sensor(Thermometer(1))
        .with_sensor(Thermometer(2))
        .with_sensor(Thermometer(3));

    let readings: Vec<i32> = caps.sensors::<Thermometer>().map(|t| t.0).collect();
    assert_eq!(readings, vec![1, 2, 3]);
    assert_eq!(caps.first_sensor::<Thermometer>(), Some(&Thermometer(1)));
}

#[test]
fn duplicate_actuator_is_rejected() {
    let mut caps = Capabilities::new();
    assert!(caps.add_actuator(Legs { speed: 1.0 }));
    assert!(!caps.add_actuator(Legs { speed: 2.0 }));

    assert_eq!(caps.actuator::<Legs>(), Some(&Legs { speed: 1.0 }));
    if let Some(legs) = caps.actuator_mut::<Legs>() {
        legs.speed = 3.0;
    }
    assert_eq!(caps.actuator::<Legs>().map(|l| l.speed), Some(3.0));
}

#[test]
fn missing_capabilities_are_reported_by_type() {
    let caps = Capabilities::new().with_actuator(Legs { speed: 1.0 });

    assert!(caps.require_actuator::<Legs>().is_ok());
    assert_eq!(
        caps.require_sensor::<Thermometer>(),
        Err(CapabilityError::MissingSensor {
            capability: "Thermometer"
        })
    );
    assert!(caps.sensors::<Thermometer>().next().is_none());
    assert!(caps.first_sensor::<Thermometer>().is_none());
}
