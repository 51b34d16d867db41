//! Typed capability registry.
//!
//! An agent exposes *sensors* (any number per type, kept in insertion order) and *actuators*
//! (at most one per type). Actions and conditions resolve what they need once, at construction
//! time, through the `require_*` checks, and then look the capability up by type while ticking.

use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("missing actuator capability `{capability}`")]
    MissingActuator { capability: &'static str },

    #[error("missing sensor capability `{capability}`")]
    MissingSensor { capability: &'static str },
}

pub type Result<T> = std::result::Result<T, CapabilityError>;

#[derive(Default)]
pub struct Capabilities {
    sensors: BTreeMap<TypeId, Vec<Box<dyn Any>>>,
    actuators: BTreeMap<TypeId, Box<dyn Any>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sensor<T: Any>(&mut self, sensor: T) {
        self.sensors
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Box::new(sensor));
    }

    /// Register an actuator. A second actuator of the same type is rejected with a warning.
    pub fn add_actuator<T: Any>(&mut self, actuator: T) -> bool {
        let key = TypeId::of::<T>();
        if self.actuators.contains_key(&key) {
            tracing::warn!(
                capability = type_name::<T>(),
                "Trying to add multiple actuators of the same type"
            );
            return false;
        }
        self.actuators.insert(key, Box::new(actuator));
        true
    }

    pub fn with_sensor<T: Any>(mut self, sensor: T) -> Self {
        self.add_sensor(sensor);
        self
    }

    pub fn with_actuator<T: Any>(mut self, actuator: T) -> Self {
        self.add_actuator(actuator);
        self
    }

    pub fn actuator<T: Any>(&self) -> Option<&T> {
        self.actuators.get(&TypeId::of::<T>())?.downcast_ref()
    }

    pub fn actuator_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.actuators.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    pub fn sensors<T: Any>(&self) -> impl Iterator<Item = &T> + '_ {
        self.sensors
            .get(&TypeId::of::<T>())
            .into_iter()
            .flatten()
            .filter_map(|s| s.downcast_ref::<T>())
    }

    pub fn first_sensor<T: Any>(&self) -> Option<&T> {
        self.sensors.get(&TypeId::of::<T>())?.first()?.downcast_ref()
    }

    pub fn first_sensor_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.sensors
            .get_mut(&TypeId::of::<T>())?
            .first_mut()?
            .downcast_mut()
    }

    pub fn has_actuator<T: Any>(&self) -> bool {
        self.actuators.contains_key(&TypeId::of::<T>())
    }

    pub fn has_sensor<T: Any>(&self) -> bool {
        self.sensors
            .get(&TypeId::of::<T>())
            .is_some_and(|list| !list.is_empty())
    }

    pub fn require_actuator<T: Any>(&self) -> Result<()> {
        if self.has_actuator::<T>() {
            Ok(())
        } else {
            Err(CapabilityError::MissingActuator {
                capability: short_type_name::<T>(),
            })
        }
    }

    pub fn require_sensor<T: Any>(&self) -> Result<()> {
        if self.has_sensor::<T>() {
            Ok(())
        } else {
            Err(CapabilityError::MissingSensor {
                capability: short_type_name::<T>(),
            })
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
