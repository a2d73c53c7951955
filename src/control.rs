//! One synchronous control cycle, from image-space observations to published
//! lamp commands.
//!
//! Per [`ControlLoop::step`]:
//! 1. advance simulated time by the tracker step;
//! 2. fold the frame statistic into the ambient estimate;
//! 3. predict every live track, then fuse this cycle's foot points mapped to
//!    the ground plane (unprojectable points are skipped);
//! 4. expire tracks not updated within the real-time window;
//! 5. run the brightness engine, compute metrics, publish on cadence and
//!    append to the energy trace.
//!
//! Nothing in a cycle returns an error: transport and trace failures are
//! logged and the loop keeps going.
use crate::ambient::{frame_value_median, AmbientEstimator};
use crate::config::RuntimeConfig;
use crate::engine::{BrightnessEngine, EngineReport, LampCommand};
use crate::error::{Error, Result};
use crate::homography::GroundMapper;
use crate::io::create_output_file;
use crate::metrics::{CycleMetrics, EnergyTrace, MetricsPayload};
use crate::policy::PolicyBook;
use crate::tracking::TrackRegistry;
use crate::transport::{CommandSink, JsonLinesSink, Publisher};
use crate::types::{ObjectTrack, Observation};
use image::RgbImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::BufWriter;
use std::time::Instant;

/// Inputs for one cycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Frame brightness statistic on the 0–255 scale.
    pub ambient_statistic: f64,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl FrameInput {
    pub fn new(ambient_statistic: f64, observations: Vec<Observation>) -> Self {
        Self {
            ambient_statistic,
            observations,
        }
    }

    /// Uses the value-channel median of `frame` as the ambient statistic.
    /// An empty frame contributes nothing to the ambient estimate.
    pub fn from_frame(frame: &RgbImage, observations: Vec<Observation>) -> Self {
        Self::new(frame_value_median(frame).unwrap_or(f64::NAN), observations)
    }
}

/// Everything produced by one cycle.
#[derive(Clone, Debug, Serialize)]
pub struct CycleOutput {
    pub cycle: u64,
    pub sim_time: f64,
    pub ambient: f64,
    pub tracks: Vec<ObjectTrack>,
    pub expired: Vec<u64>,
    pub report: EngineReport,
    pub commands: Vec<LampCommand>,
    pub metrics: MetricsPayload,
    pub published: bool,
}

pub struct ControlLoop {
    mapper: GroundMapper,
    registry: TrackRegistry,
    ambient: AmbientEstimator,
    engine: BrightnessEngine,
    publisher: Publisher,
    trace: Option<EnergyTrace>,
    dt: f64,
    sim_time: f64,
    cycle: u64,
}

impl ControlLoop {
    /// Build the loop from configuration. Messages go to
    /// `output.messages` as JSON lines when set; otherwise publishing is
    /// disabled.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let publisher = match &config.output.messages {
            Some(path) => {
                let file = create_output_file(path).map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;
                let sink = JsonLinesSink::new(BufWriter::new(file));
                Publisher::new(config.publish.clone(), Box::new(sink))
            }
            None => Publisher::disabled(),
        };
        Self::build(config, publisher)
    }

    /// Build the loop publishing through a caller-supplied sink.
    pub fn with_sink(config: RuntimeConfig, sink: Box<dyn CommandSink>) -> Result<Self> {
        let publisher = Publisher::new(config.publish.clone(), sink);
        Self::build(config, publisher)
    }

    fn build(config: RuntimeConfig, publisher: Publisher) -> Result<Self> {
        let mapper = config.mapper()?;
        let lamps = config.build_lamps(&mapper)?;
        let policies = match &config.policy_path {
            Some(path) => PolicyBook::load_or_empty(path)?,
            None => PolicyBook::empty(),
        };
        let engine = BrightnessEngine::new(lamps, config.engine.clone(), policies)?;
        let dt = config.tracker.kalman.dt;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(Error::config(format!("tracker step must be positive, got {dt}")));
        }
        let registry =
            TrackRegistry::with_expiry(config.tracker.kalman.clone(), config.tracker.expiry()?);
        let trace = match &config.output.energy_trace {
            Some(path) => Some(EnergyTrace::create(path)?),
            None => None,
        };
        info!(
            "ControlLoop: {} lamp(s), dt={dt:.4}s, energy trace {}",
            engine.lamps().len(),
            if trace.is_some() { "on" } else { "off" }
        );
        Ok(Self {
            mapper,
            registry,
            ambient: AmbientEstimator::new(config.ambient),
            engine,
            publisher,
            trace,
            dt,
            sim_time: 0.0,
            cycle: 0,
        })
    }

    /// Run one cycle. `real_now` drives track expiry only; the engine runs on
    /// simulated time.
    pub fn step(&mut self, input: &FrameInput, real_now: Instant) -> CycleOutput {
        self.cycle += 1;
        self.sim_time += self.dt;
        let now = self.sim_time;

        let ambient = self.ambient.compute(input.ambient_statistic);

        self.registry.predict_all();
        let mut tracks = Vec::with_capacity(input.observations.len());
        for obs in &input.observations {
            let Some([gx, gy]) = self.mapper.to_ground(obs.foot_point) else {
                debug!(
                    "ControlLoop: observation {} at {:?} has no ground position",
                    obs.id, obs.foot_point
                );
                continue;
            };
            let [x, y, vx, vy] = self.registry.observe(obs.id, gx, gy, real_now);
            let mut track = ObjectTrack::new(obs.id, obs.class, [x, y], [vx, vy])
                .with_bright_emitter(obs.bright_emitter)
                .with_timestamp(now);
            track.confidence = obs.confidence;
            tracks.push(track);
        }
        let expired = self.registry.expire_stale(real_now);

        let report = self.engine.update_with_report(&tracks, ambient, now);
        let commands = report.commands();
        let metrics = CycleMetrics::compute(&commands, self.engine.lamps(), &tracks, now);
        if let Some(trace) = self.trace.as_mut() {
            if let Err(err) = trace.record(self.cycle, &metrics) {
                warn!("Energy trace {} not updated: {err}", trace.path().display());
            }
        }
        let payload = MetricsPayload::new(&commands, metrics);
        let published = self.publisher.maybe_publish(self.cycle, &commands, &payload);

        CycleOutput {
            cycle: self.cycle,
            sim_time: now,
            ambient,
            tracks,
            expired,
            report,
            commands,
            metrics: payload,
            published,
        }
    }

    pub fn engine(&self) -> &BrightnessEngine {
        &self.engine
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }
}
