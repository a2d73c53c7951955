use super::runtime::RuntimeConfig;
use crate::ambient::estimate_headlights;
use crate::control::FrameInput;
use crate::engine::EngineParams;
use crate::io::load_rgb_image;
use crate::types::{ObjectClass, Observation};
use image::RgbImage;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ReplayDemoConfig {
    /// Recorded detections, see [`ReplayFile`].
    pub input: PathBuf,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub engine: EngineOverrides,
    #[serde(default)]
    pub output: ReplayOutputConfig,
}

/// Optional tweaks applied on top of `runtime.engine`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct EngineOverrides {
    pub base_min: Option<f64>,
    pub base_max: Option<f64>,
    pub saturation: Option<f64>,
    pub gamma: Option<f64>,
    pub rate_fraction: Option<f64>,
    pub action_step: Option<f64>,
}

impl EngineOverrides {
    pub fn resolve(&self, base: &EngineParams) -> EngineParams {
        let mut params = base.clone();
        if let Some(v) = self.base_min {
            params.base_min = v;
        }
        if let Some(v) = self.base_max {
            params.base_max = v;
        }
        if let Some(v) = self.saturation {
            params.saturation = v;
        }
        if let Some(v) = self.gamma {
            params.gamma = v;
        }
        if let Some(v) = self.rate_fraction {
            params.rate_fraction = v;
        }
        if let Some(v) = self.action_step {
            params.action_step = v;
        }
        params
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplayOutputConfig {
    /// Per-cycle outputs as one pretty JSON array.
    pub json_out: Option<PathBuf>,
    /// Print a one-line summary per cycle.
    pub summary: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReplayDetection {
    pub id: u64,
    pub class: ObjectClass,
    /// `[x1, y1, x2, y2]` in pixels.
    pub bbox: [f64; 4],
    /// Recorded emitter flag; cars, buses and trucks are also checked
    /// against the frame image when one is given.
    #[serde(default)]
    pub bright_emitter: bool,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ReplayDetection {
    pub fn to_observation(&self, frame: Option<&RgbImage>) -> Observation {
        let mut obs = Observation::from_bbox(self.id, self.class, self.bbox);
        let lit = match frame {
            Some(frame) if self.class.has_headlights() => estimate_headlights(frame, self.bbox),
            _ => false,
        };
        obs.bright_emitter = self.bright_emitter || lit;
        if let Some(c) = self.confidence {
            obs.confidence = c;
        }
        obs
    }
}

/// One recorded frame: either a brightness statistic or an image to take it
/// from, plus the tracked detections.
#[derive(Clone, Debug, Deserialize)]
pub struct ReplayFrame {
    #[serde(default)]
    pub ambient_statistic: Option<f64>,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub detections: Vec<ReplayDetection>,
}

impl ReplayFrame {
    /// Image paths are resolved against `base_dir`. A recorded
    /// `ambient_statistic` wins over the image median; the image still feeds
    /// headlight estimation.
    pub fn to_input(&self, base_dir: &Path) -> Result<FrameInput, String> {
        let frame = match &self.image {
            Some(image) => Some(load_rgb_image(&base_dir.join(image))?),
            None => None,
        };
        let observations = self
            .detections
            .iter()
            .map(|d| d.to_observation(frame.as_ref()))
            .collect();
        match (frame, self.ambient_statistic) {
            (_, Some(stat)) => Ok(FrameInput::new(stat, observations)),
            (Some(frame), None) => Ok(FrameInput::from_frame(&frame, observations)),
            (None, None) => Err("frame needs ambient_statistic or image".to_string()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReplayFile {
    pub frames: Vec<ReplayFrame>,
}

pub fn load_replay_config(path: &Path) -> Result<ReplayDemoConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: ReplayDemoConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

pub fn load_replay(path: &Path) -> Result<ReplayFile, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read replay {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse replay {}: {e}", path.display()))
}
