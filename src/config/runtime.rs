use crate::ambient::AmbientParams;
use crate::engine::{EngineParams, Lamp};
use crate::error::{Error, Result};
use crate::homography::{Calibration, GroundMapper};
use crate::tracking::{KalmanParams, DEFAULT_TRACK_EXPIRY};
use crate::transport::PublishParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a lamp stands: either a pixel in the calibrated camera view or a
/// ground position in metres.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LampPlacement {
    Pixel { pixel: [f64; 2] },
    Ground { ground: [f64; 2] },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LampSpec {
    pub id: String,
    #[serde(flatten)]
    pub placement: LampPlacement,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    #[serde(flatten)]
    pub kalman: KalmanParams,
    /// Real-time expiry window in seconds.
    pub expiry_secs: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kalman: KalmanParams::default(),
            expiry_secs: DEFAULT_TRACK_EXPIRY.as_secs_f64(),
        }
    }
}

impl TrackerConfig {
    pub fn expiry(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.expiry_secs)
            .map_err(|_| Error::config(format!("invalid track expiry {}", self.expiry_secs)))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Per-cycle energy trace (CSV).
    pub energy_trace: Option<PathBuf>,
    /// Published messages (JSON lines); publishing is disabled when unset
    /// (`replay_demo` falls back to stdout).
    pub messages: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub calibration: Calibration,
    pub lamps: Vec<LampSpec>,
    /// Pre-trained policy tables; a missing file runs with empty tables.
    pub policy_path: Option<PathBuf>,
    pub engine: EngineParams,
    pub tracker: TrackerConfig,
    pub ambient: AmbientParams,
    pub publish: PublishParams,
    pub output: OutputConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let lamps = [[350.0, 480.0], [500.0, 320.0], [580.0, 260.0], [650.0, 230.0]]
            .into_iter()
            .enumerate()
            .map(|(i, pixel)| LampSpec {
                id: format!("L{}", i + 1),
                placement: LampPlacement::Pixel { pixel },
            })
            .collect();
        Self {
            calibration: Calibration::default(),
            lamps,
            policy_path: None,
            engine: EngineParams::default(),
            tracker: TrackerConfig::default(),
            ambient: AmbientParams::default(),
            publish: PublishParams::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn mapper(&self) -> Result<GroundMapper> {
        GroundMapper::from_calibration(&self.calibration)
    }

    /// Resolve every lamp onto the ground plane.
    pub fn build_lamps(&self, mapper: &GroundMapper) -> Result<Vec<Lamp>> {
        if self.lamps.is_empty() {
            return Err(Error::config("lamp layout is empty"));
        }
        self.lamps
            .iter()
            .map(|spec| {
                let position = match spec.placement {
                    LampPlacement::Ground { ground } => ground,
                    LampPlacement::Pixel { pixel } => mapper.to_ground(pixel).ok_or_else(|| {
                        Error::config(format!(
                            "lamp {} at pixel {:?} has no ground position",
                            spec.id, pixel
                        ))
                    })?,
                };
                Ok(Lamp::new(spec.id.clone(), position))
            })
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}
