#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod homography;
pub mod io;
pub mod metrics;
pub mod types;

// Building blocks of a cycle, usable on their own.
pub mod ambient;
pub mod policy;
pub mod tracking;
pub mod transport;

// --- High-level re-exports -------------------------------------------------

// Main entry points: control loop + engine.
pub use crate::control::{ControlLoop, CycleOutput, FrameInput};
pub use crate::engine::{BrightnessEngine, EngineParams, Lamp, LampCommand};
pub use crate::error::{Error, Result};
pub use crate::types::{ObjectClass, ObjectTrack, Observation};

// Convenience homography helpers that are generally useful.
pub use crate::homography::{apply_homography_points, GroundMapper};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use lumen_control::prelude::*;
/// use std::time::Instant;
///
/// # fn main() -> Result<(), lumen_control::Error> {
/// let mut control = ControlLoop::new(RuntimeConfig::default())?;
/// let walker = Observation::from_bbox(1, ObjectClass::Pedestrian, [500.0, 400.0, 540.0, 500.0]);
/// let out = control.step(&FrameInput::new(40.0, vec![walker]), Instant::now());
/// for cmd in &out.commands {
///     println!("{} -> {:.1}", cmd.lamp_id, cmd.brightness);
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::{ControlLoop, FrameInput, ObjectClass, ObjectTrack, Observation};
}
