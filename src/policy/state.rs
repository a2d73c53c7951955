use crate::types::ObjectClass;
use serde::{Deserialize, Serialize};

/// Discretised scene state used as the policy table key.
///
/// Serialised as the 4-element array `[demand, ambient, hysteresis, class]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i8; 4]", into = "[i8; 4]")]
pub struct PolicyState {
    /// 0 = no demand, 1..=3 rising thirds of the normalised score.
    pub demand: u8,
    /// 0 = dark, 1 = dusk, 2 = bright.
    pub ambient: u8,
    /// -1 ramping down, 0 steady, +1 ramping up.
    pub hysteresis: i8,
    /// 0 = nobody, 1 = pedestrian, 2 = vehicle.
    pub class: u8,
}

impl PolicyState {
    pub fn new(demand: u8, ambient: u8, hysteresis: i8, class: u8) -> Self {
        Self {
            demand,
            ambient,
            hysteresis,
            class,
        }
    }

    pub fn discretize(
        norm_score: f64,
        ambient: f64,
        hysteresis: i8,
        dominant: Option<ObjectClass>,
    ) -> Self {
        let demand = if norm_score <= 0.0 {
            0
        } else if norm_score <= 0.33 {
            1
        } else if norm_score <= 0.66 {
            2
        } else {
            3
        };
        let ambient = if ambient < 0.33 {
            0
        } else if ambient < 0.66 {
            1
        } else {
            2
        };
        let class = match dominant {
            None => 0,
            Some(ObjectClass::Pedestrian) => 1,
            Some(_) => 2,
        };
        Self::new(demand, ambient, hysteresis.clamp(-1, 1), class)
    }
}

impl From<[i8; 4]> for PolicyState {
    fn from(v: [i8; 4]) -> Self {
        Self::new(v[0] as u8, v[1] as u8, v[2], v[3] as u8)
    }
}

impl From<PolicyState> for [i8; 4] {
    fn from(s: PolicyState) -> Self {
        [s.demand as i8, s.ambient as i8, s.hysteresis, s.class as i8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_buckets_use_inclusive_thresholds() {
        let d = |n| PolicyState::discretize(n, 0.0, 0, None).demand;
        assert_eq!(d(0.0), 0);
        assert_eq!(d(0.01), 1);
        assert_eq!(d(0.33), 1);
        assert_eq!(d(0.5), 2);
        assert_eq!(d(0.66), 2);
        assert_eq!(d(0.9), 3);
    }

    #[test]
    fn ambient_buckets_use_exclusive_thresholds() {
        let a = |f| PolicyState::discretize(0.0, f, 0, None).ambient;
        assert_eq!(a(0.0), 0);
        assert_eq!(a(0.33), 1);
        assert_eq!(a(0.65), 1);
        assert_eq!(a(0.66), 2);
    }

    #[test]
    fn class_buckets() {
        let c = |cls| PolicyState::discretize(0.5, 0.5, 1, cls).class;
        assert_eq!(c(None), 0);
        assert_eq!(c(Some(ObjectClass::Pedestrian)), 1);
        assert_eq!(c(Some(ObjectClass::Bicycle)), 2);
        assert_eq!(c(Some(ObjectClass::Truck)), 2);
    }

    #[test]
    fn serialises_as_tuple_array() {
        let s = PolicyState::new(3, 2, -1, 1);
        assert_eq!(serde_json::to_string(&s).unwrap(), "[3,2,-1,1]");
        let back: PolicyState = serde_json::from_str("[3,2,-1,1]").unwrap();
        assert_eq!(back, s);
    }
}
