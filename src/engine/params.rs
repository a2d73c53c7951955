//! Parameter types for the brightness engine.
//!
//! Defaults reproduce the tuned installation values: a 70–100 % operating
//! band, saturation after three pedestrian-equivalents of demand, a sublinear
//! response curve and a ramp limit of a quarter of the band per second.

use crate::error::{Error, Result};
use crate::types::ObjectClass;
use serde::{Deserialize, Serialize};

/// Per-class constants driving scoring and dwell times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassParams {
    /// Relative importance of the class in the demand score.
    pub weight: f64,
    /// Sensing range in metres around the extrapolated position.
    pub range_m: f64,
    /// Gain of the speed term `1 + alpha * speed / max_speed`.
    pub speed_gain: f64,
    /// Speed (m/s) at which the speed term reaches `1 + alpha`.
    pub max_speed: f64,
    /// Reaction horizon in seconds used for linear extrapolation.
    pub horizon_s: f64,
    /// Minimum time a lamp keeps ramping up before it may dim again.
    pub min_on_s: f64,
    /// Minimum time a lamp keeps ramping down before it may brighten again.
    pub min_off_s: f64,
}

impl ClassParams {
    const fn new(
        weight: f64,
        range_m: f64,
        speed_gain: f64,
        max_speed: f64,
        horizon_s: f64,
        min_on_s: f64,
        min_off_s: f64,
    ) -> Self {
        Self {
            weight,
            range_m,
            speed_gain,
            max_speed,
            horizon_s,
            min_on_s,
            min_off_s,
        }
    }
}

/// One [`ClassParams`] per road-agent class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassTable {
    pub pedestrian: ClassParams,
    pub bicycle: ClassParams,
    pub car: ClassParams,
    pub motorcycle: ClassParams,
    pub bus: ClassParams,
    pub truck: ClassParams,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            pedestrian: ClassParams::new(1.0, 32.0, 0.6, 2.5, 0.6, 8.0, 5.0),
            bicycle: ClassParams::new(0.85, 36.0, 0.7, 8.0, 0.8, 6.0, 4.0),
            car: ClassParams::new(0.75, 80.0, 0.9, 25.0, 1.4, 3.0, 2.0),
            motorcycle: ClassParams::new(0.75, 70.0, 0.9, 22.0, 1.2, 3.0, 2.0),
            bus: ClassParams::new(0.7, 85.0, 0.9, 20.0, 1.6, 3.5, 2.0),
            truck: ClassParams::new(0.7, 85.0, 0.9, 20.0, 1.6, 3.5, 2.0),
        }
    }
}

impl ClassTable {
    pub fn get(&self, class: ObjectClass) -> &ClassParams {
        match class {
            ObjectClass::Pedestrian => &self.pedestrian,
            ObjectClass::Bicycle => &self.bicycle,
            ObjectClass::Car => &self.car,
            ObjectClass::Motorcycle => &self.motorcycle,
            ObjectClass::Bus => &self.bus,
            ObjectClass::Truck => &self.truck,
        }
    }

    pub fn get_mut(&mut self, class: ObjectClass) -> &mut ClassParams {
        match class {
            ObjectClass::Pedestrian => &mut self.pedestrian,
            ObjectClass::Bicycle => &mut self.bicycle,
            ObjectClass::Car => &mut self.car,
            ObjectClass::Motorcycle => &mut self.motorcycle,
            ObjectClass::Bus => &mut self.bus,
            ObjectClass::Truck => &mut self.truck,
        }
    }
}

/// Engine-wide parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Lower brightness bound (percent), also the dark-scene idle level.
    pub base_min: f64,
    /// Upper brightness bound (percent).
    pub base_max: f64,
    /// Accumulated score that maps to full demand.
    pub saturation: f64,
    /// Exponent of the demand curve; < 1 front-loads the response.
    pub gamma: f64,
    /// Ramp limit as a fraction of `base_max - base_min` per second.
    pub rate_fraction: f64,
    /// Multiplier applied to agents flagged as bright emitters.
    pub emitter_multiplier: f64,
    /// Brightness offset (percent) of one policy step.
    pub action_step: f64,
    /// Class whose dwell times apply when no agent contributes to a lamp.
    pub fallback_dwell_class: ObjectClass,
    pub classes: ClassTable,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            base_min: 70.0,
            base_max: 100.0,
            saturation: 3.0,
            gamma: 0.6,
            rate_fraction: 0.25,
            emitter_multiplier: 1.1,
            action_step: 5.0,
            fallback_dwell_class: ObjectClass::Car,
            classes: ClassTable::default(),
        }
    }
}

impl EngineParams {
    /// Maximum brightness change per second.
    pub fn rate_limit(&self) -> f64 {
        (self.base_max - self.base_min) * self.rate_fraction
    }

    /// Idle level for a given ambient fraction.
    pub fn ambient_base(&self, ambient: f64) -> f64 {
        self.base_min + ambient * (self.base_max - self.base_min)
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.base_min,
            self.base_max,
            self.saturation,
            self.gamma,
            self.rate_fraction,
            self.emitter_multiplier,
            self.action_step,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(Error::config("engine parameters must be finite"));
        }
        if !(0.0..=100.0).contains(&self.base_min) || !(0.0..=100.0).contains(&self.base_max) {
            return Err(Error::config("brightness bounds must lie within 0..=100"));
        }
        if self.base_min > self.base_max {
            return Err(Error::config(format!(
                "base_min {} exceeds base_max {}",
                self.base_min, self.base_max
            )));
        }
        if self.saturation <= 0.0 || self.gamma <= 0.0 || self.rate_fraction <= 0.0 {
            return Err(Error::config(
                "saturation, gamma and rate_fraction must be positive",
            ));
        }
        for class in ObjectClass::ALL {
            let p = self.classes.get(class);
            let values = [
                p.weight,
                p.range_m,
                p.speed_gain,
                p.max_speed,
                p.horizon_s,
                p.min_on_s,
                p.min_off_s,
            ];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(Error::config(format!(
                    "parameters for class {class} must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }
}
