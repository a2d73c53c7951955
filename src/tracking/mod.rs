//! Ground-plane motion tracking.
//!
//! Each external track identity gets its own constant-velocity Kalman filter
//! ([`ConstantVelocityKalman`]). The [`TrackRegistry`] owns them: it predicts
//! all filters once per cycle, fuses new measurements, and drops filters that
//! have not been updated for a real-time expiry window (3 s by default). There
//! is no cap on the number of live tracks.

mod kalman;
mod registry;

pub use kalman::{ConstantVelocityKalman, KalmanParams};
pub use registry::{TrackRegistry, DEFAULT_TRACK_EXPIRY};
