//! Predictive illumination demand.
//!
//! Each agent is extrapolated along its velocity by its class reaction
//! horizon. Every lamp within the class sensing range of that predicted point
//! receives
//!
//! ```text
//! weight * exp(-d / range) * (1 + alpha * speed / max_speed) * emitter
//! ```
//!
//! Contributions add up per lamp; the class of the strongest single
//! contributor is kept for policy discretisation and dwell lookups.
use super::params::{ClassParams, EngineParams};
use super::spatial::LampIndex;
use crate::types::{ObjectClass, ObjectTrack};

/// Position the agent is expected to occupy after its reaction horizon.
pub fn extrapolate(track: &ObjectTrack, class: &ClassParams) -> [f64; 2] {
    [
        track.position[0] + track.velocity[0] * class.horizon_s,
        track.position[1] + track.velocity[1] * class.horizon_s,
    ]
}

/// `exp(-d / range)`, with a floor on the range and negative distances treated as 0.
pub fn distance_decay(distance: f64, range: f64) -> f64 {
    (-distance.max(0.0) / range.max(1e-6)).exp()
}

/// Contribution of one agent to a lamp `distance` metres from its predicted point.
pub fn contribution(
    track: &ObjectTrack,
    class: &ClassParams,
    distance: f64,
    emitter_multiplier: f64,
) -> f64 {
    let speed_factor = 1.0 + class.speed_gain * (track.speed() / class.max_speed.max(1e-3));
    let emitter = if track.bright_emitter {
        emitter_multiplier
    } else {
        1.0
    };
    class.weight * distance_decay(distance, class.range_m) * speed_factor * emitter
}

/// Target before policy and anti-flicker stages:
/// `base + (max - base) * norm^gamma`.
pub fn nominal_target(base: f64, max: f64, norm_score: f64, gamma: f64) -> f64 {
    base + (max - base) * norm_score.clamp(0.0, 1.0).powf(gamma)
}

/// Normalised demand in [0, 1].
pub fn normalize_score(score: f64, saturation: f64) -> f64 {
    (score / saturation).clamp(0.0, 1.0)
}

/// Per-lamp accumulated demand for one cycle.
#[derive(Clone, Debug, Default)]
pub struct DemandMap {
    pub scores: Vec<f64>,
    best: Vec<f64>,
    pub dominant: Vec<Option<ObjectClass>>,
}

impl DemandMap {
    pub fn new(lamps: usize) -> Self {
        Self {
            scores: vec![0.0; lamps],
            best: vec![0.0; lamps],
            dominant: vec![None; lamps],
        }
    }

    fn add(&mut self, lamp: usize, class: ObjectClass, value: f64) {
        self.scores[lamp] += value;
        if value > self.best[lamp] {
            self.best[lamp] = value;
            self.dominant[lamp] = Some(class);
        }
    }
}

/// Accumulate demand from every track over the lamp index.
pub fn accumulate_demand(
    tracks: &[ObjectTrack],
    index: &LampIndex,
    params: &EngineParams,
) -> DemandMap {
    let mut demand = DemandMap::new(index.len());
    for track in tracks {
        let class = params.classes.get(track.class);
        let predicted = extrapolate(track, class);
        for (lamp, distance) in index.within_radius(predicted, class.range_m) {
            let value = contribution(track, class, distance, params.emitter_multiplier);
            if value.is_finite() {
                demand.add(lamp, track.class, value);
            }
        }
    }
    demand
}
