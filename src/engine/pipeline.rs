//! Brightness engine driving one control cycle end-to-end.
//!
//! Typical usage:
//! ```
//! use lumen_control::engine::{BrightnessEngine, EngineParams, Lamp};
//! use lumen_control::policy::PolicyBook;
//! use lumen_control::{ObjectClass, ObjectTrack};
//!
//! let lamps = vec![Lamp::new("L1", [0.0, 0.0]), Lamp::new("L2", [0.0, 30.0])];
//! let mut engine =
//!     BrightnessEngine::new(lamps, EngineParams::default(), PolicyBook::empty()).unwrap();
//! let walker = ObjectTrack::new(1, ObjectClass::Pedestrian, [0.0, 2.0], [0.0, 1.2]);
//! let commands = engine.update(&[walker], 0.5, 1.0);
//! assert_eq!(commands.len(), 2);
//! ```
use super::control::{apply_dwell, smooth_toward};
use super::lamp::{round_one_decimal, Lamp, LampCommand};
use super::params::EngineParams;
use super::scoring::{accumulate_demand, nominal_target, normalize_score};
use super::spatial::LampIndex;
use crate::ambient::NEUTRAL_AMBIENT;
use crate::error::{Error, Result};
use crate::policy::{Action, PolicyAgent, PolicyBook, PolicyState};
use crate::types::{ObjectClass, ObjectTrack};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;

/// Per-lamp trace of one cycle.
#[derive(Clone, Debug, Serialize)]
pub struct LampDecision {
    pub lamp_id: String,
    /// Accumulated demand score.
    pub score: f64,
    pub norm_score: f64,
    pub dominant_class: Option<ObjectClass>,
    pub nominal_target: f64,
    pub state: PolicyState,
    pub action: Action,
    /// Target after the policy offset and dwell hysteresis.
    pub held_target: f64,
    /// Committed brightness (unrounded).
    pub brightness: f64,
    /// Rounded command sent to transport.
    pub command: f64,
}

/// Everything the engine decided in one cycle.
#[derive(Clone, Debug, Serialize)]
pub struct EngineReport {
    pub timestamp: f64,
    pub ambient: f64,
    pub ambient_base: f64,
    pub tracks: usize,
    pub decisions: Vec<LampDecision>,
}

impl EngineReport {
    pub fn commands(&self) -> Vec<LampCommand> {
        self.decisions
            .iter()
            .map(|d| LampCommand {
                lamp_id: d.lamp_id.clone(),
                brightness: d.command,
            })
            .collect()
    }
}

/// Owns all lamp state and turns tracks plus ambient light into commands.
pub struct BrightnessEngine {
    params: EngineParams,
    lamps: Vec<Lamp>,
    agents: Vec<PolicyAgent>,
    index: LampIndex,
}

impl BrightnessEngine {
    /// Build the engine for a fixed lamp layout.
    ///
    /// Fails on an empty layout, duplicate lamp identities, non-finite lamp
    /// positions or invalid parameters. Initial brightness is clipped into the
    /// operating band.
    pub fn new(lamps: Vec<Lamp>, params: EngineParams, mut policies: PolicyBook) -> Result<Self> {
        params.validate()?;
        if lamps.is_empty() {
            return Err(Error::config("lamp layout is empty"));
        }
        let mut seen = HashSet::new();
        for lamp in &lamps {
            if !seen.insert(lamp.id.as_str()) {
                return Err(Error::config(format!("duplicate lamp id {}", lamp.id)));
            }
            if !lamp.position.iter().all(|v| v.is_finite()) {
                return Err(Error::config(format!(
                    "lamp {} has a non-finite position",
                    lamp.id
                )));
            }
        }

        let lamps: Vec<Lamp> = lamps
            .into_iter()
            .map(|mut lamp| {
                lamp.brightness = clip(lamp.brightness, &params);
                if lamp.on_since.is_some() && lamp.off_since.is_some() {
                    lamp.off_since = None;
                }
                lamp
            })
            .collect();
        let agents: Vec<PolicyAgent> = lamps.iter().map(|l| policies.take(&l.id)).collect();
        for orphan in policies.lamp_ids() {
            warn!("Policy table for unknown lamp {orphan} ignored");
        }
        let index = LampIndex::build(lamps.iter().map(|l| l.position));
        debug!(
            "BrightnessEngine: {} lamp(s), {} with policy tables",
            lamps.len(),
            agents.iter().filter(|a| !a.is_empty()).count()
        );
        Ok(Self {
            params,
            lamps,
            agents,
            index,
        })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn lamps(&self) -> &[Lamp] {
        &self.lamps
    }

    pub fn lamp(&self, id: &str) -> Option<&Lamp> {
        self.lamps.iter().find(|l| l.id == id)
    }

    pub fn index(&self) -> &LampIndex {
        &self.index
    }

    /// Run one cycle and return one command per lamp, in layout order.
    pub fn update(&mut self, tracks: &[ObjectTrack], ambient: f64, now: f64) -> Vec<LampCommand> {
        self.update_with_report(tracks, ambient, now).commands()
    }

    /// Run one cycle and return the full per-lamp trace.
    pub fn update_with_report(
        &mut self,
        tracks: &[ObjectTrack],
        ambient: f64,
        now: f64,
    ) -> EngineReport {
        let ambient = sanitize_ambient(ambient);
        let params = &self.params;
        let base = params.ambient_base(ambient);
        let rate_limit = params.rate_limit();
        let demand = accumulate_demand(tracks, &self.index, params);

        let mut decisions = Vec::with_capacity(self.lamps.len());
        for (i, lamp) in self.lamps.iter_mut().enumerate() {
            let score = demand.scores[i];
            let dominant = demand.dominant[i];
            let norm_score = normalize_score(score, params.saturation);
            let nominal = nominal_target(base, params.base_max, norm_score, params.gamma);

            let state = PolicyState::discretize(norm_score, ambient, lamp.ramp_direction(), dominant);
            let action = self.agents[i].act(&state);
            let target = nominal + params.action_step * action.sign();

            let dwell_class = dominant.unwrap_or(params.fallback_dwell_class);
            let held = apply_dwell(lamp, target, params.classes.get(dwell_class), now);
            let smoothed = smooth_toward(lamp, held, rate_limit, now);
            let brightness = clip(smoothed, params);

            lamp.brightness = brightness;
            lamp.last_command = now;
            decisions.push(LampDecision {
                lamp_id: lamp.id.clone(),
                score,
                norm_score,
                dominant_class: dominant,
                nominal_target: nominal,
                state,
                action,
                held_target: held,
                brightness,
                command: round_one_decimal(brightness),
            });
        }

        EngineReport {
            timestamp: now,
            ambient,
            ambient_base: base,
            tracks: tracks.len(),
            decisions,
        }
    }
}

fn clip(value: f64, params: &EngineParams) -> f64 {
    if value.is_nan() {
        return params.base_min;
    }
    value.clamp(params.base_min, params.base_max)
}

fn sanitize_ambient(ambient: f64) -> f64 {
    if ambient.is_nan() {
        NEUTRAL_AMBIENT
    } else {
        ambient.clamp(0.0, 1.0)
    }
}
